pub mod cli;
pub mod config;
pub mod database;
pub mod gateway;
pub mod models;
pub mod reports;
pub mod timer;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use gateway::Gateway;
pub use models::{Project, Task, TimeEntry, TimeLog, UserContext};
pub use timer::Timer;
pub use utils::Profile;

use clap::Parser;
use color_eyre::Result;
use std::path::Path;
use taskclock::{Config, Database, Profile, cli::{self, Cli, Commands}};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    // An explicit --config file replaces the profile's config file
    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(Path::new(path))?,
        None => Config::load_with_profile(profile)?,
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // Initialize database
    let db_path = config.get_database_path();
    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;
    db.set_single_active_guard(config.timer.enforce_single_active)?;
    tracing::debug!(path = %db_path.display(), "database opened");

    let ctx = config.resolve_user(cli.user.as_deref())?;

    // Dispatch to appropriate command handler
    cli::run(cli.command.unwrap_or(Commands::Status), &ctx, &db, &config)?;

    Ok(())
}

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "taskclock-dev",
            Profile::Prod => "taskclock",
        }
    }
}

/// Get the configuration directory path
/// If profile is Dev, uses "taskclock-dev" instead of "taskclock"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "taskclock", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "taskclock", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<chrono::NaiveDate, chrono::ParseError> {
    chrono::NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
}

/// Today's date in UTC
pub fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Format seconds as a running clock, `HH:MM:SS`
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format whole minutes as `1h 30m`, or `45m` under an hour
pub fn format_duration(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pads_each_component() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(65), "00:01:05");
        assert_eq!(format_clock(3_723), "01:02:03");
        assert_eq!(format_clock(-4), "00:00:00");
    }

    #[test]
    fn duration_drops_zero_hours() {
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(90), "1h 30m");
        assert_eq!(format_duration(120), "2h 0m");
    }

    #[test]
    fn parse_date_accepts_iso_only() {
        assert!(parse_date("2024-05-06").is_ok());
        assert!(parse_date(" 2024-05-06 ").is_ok());
        assert!(parse_date("06/05/2024").is_err());
    }

    #[test]
    fn expand_path_leaves_absolute_paths_alone() {
        assert_eq!(expand_path("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
    }
}

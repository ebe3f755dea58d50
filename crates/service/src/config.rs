use std::path::PathBuf;
use std::time::Duration;

use common::access::ThrottleConfig;

#[derive(Debug)]
pub struct Config {
    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // login throttle configuration
    /// password attempts allowed per client within one window,
    ///  if not set then 5 will be used
    pub login_max_attempts: Option<u32>,
    /// length of the throttle window in seconds,
    ///  if not set then 60 will be used
    pub login_window_secs: Option<u64>,

    // misc
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sqlite_path: None,
            login_max_attempts: None,
            login_window_secs: None,
            log_level: tracing::Level::INFO,
        }
    }
}

impl Config {
    /// Resolve the throttle settings, falling back to the defaults for
    /// anything unset.
    pub fn throttle(&self) -> ThrottleConfig {
        let defaults = ThrottleConfig::default();
        ThrottleConfig {
            max_attempts: self.login_max_attempts.unwrap_or(defaults.max_attempts),
            window: self
                .login_window_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }
}

use log::LevelFilter;

/// Log levels matching the UQM numeric scheme
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    #[default]
    Warning = 3,
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    /// Get the integer representation
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Parse a level given by name ("warning") or number ("3")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i32>() {
            return (0..=6).contains(&n).then(|| LogLevel::from_i32(n));
        }
        match s.to_lowercase().as_str() {
            "nothing" | "off" => Some(LogLevel::Nothing),
            "user" => Some(LogLevel::User),
            "error" => Some(LogLevel::Error),
            "warning" | "warn" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "all" | "trace" => Some(LogLevel::All),
            _ => None,
        }
    }

    /// The `log` crate filter for this level.
    ///
    /// User messages are always shown, so `User` and `Error` share a filter.
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            LogLevel::User | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }
}

fn rust_log() -> Option<String> {
    std::env::var("RUST_LOG").ok()
}

/// Install the process-wide logger.
///
/// The backend accepts everything and `level` is applied through the
/// global maximum, so [`set_log_level`] can change it later. `RUST_LOG`
/// takes precedence over `level` when set. Returns false if a logger was
/// already installed.
pub fn log_init(level: LogLevel) -> bool {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(LevelFilter::Trace);
    let env = rust_log();
    if let Some(ref filters) = env {
        builder.parse_filters(filters);
    }
    if builder.try_init().is_err() {
        return false;
    }
    if env.is_none() {
        log::set_max_level(level.to_level_filter());
    }
    true
}

/// Change the level of an installed logger, unless `RUST_LOG` is set
pub fn set_log_level(level: LogLevel) {
    if rust_log().is_none() {
        log::set_max_level(level.to_level_filter());
    }
}

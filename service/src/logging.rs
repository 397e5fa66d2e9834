use crate::config::Config;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Crates whose records are dropped below Trace. The database driver and the
/// HTTP stack log every query and request; tungstenite logs every WebSocket
/// frame, which floods the console as soon as a few clients are connected.
const NOISY_CRATES: &[&str] = &[
    "sqlx",
    "sea_orm",
    "tower",
    "tracing",
    "hyper",
    "axum",
    "tungstenite",
];

pub struct Logger {}

impl Logger {
    /// Installs the terminal logger at `config.log_level_filter`.
    ///
    /// Returns `false` if a logger was already installed, in which case the
    /// existing one stays in place.
    pub fn init_logger(config: &Config) -> bool {
        let level = config.log_level_filter;

        match TermLogger::init(
            level,
            Self::log_config(level),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("Logger already initialized: {e}");
                false
            }
        }
    }

    fn ignored_crates(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            NOISY_CRATES
        }
    }

    fn log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        for name in Self::ignored_crates(level) {
            builder.add_filter_ignore_str(name);
        }

        builder.build()
    }
}

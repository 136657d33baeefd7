//! Logging setup.
//!
//! Log lines go to stderr so they never mix with a tool's stdout.

use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{XtaskError, XtaskResult};

/// Filter directives, takes precedence over `RUST_LOG`.
pub const LOG_ENV: &str = "FIXCAP_LOG";

/// `json` switches to structured output.
pub const LOG_FORMAT_ENV: &str = "FIXCAP_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Logging configuration derived from the command line.
#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub format: LogFormat,
    /// Include targets and source locations.
    pub detailed: bool,
}

impl LogConfig {
    /// `-q` keeps errors only; each `-v` raises the level one step from `info`.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let level = match verbose {
            0 if quiet => LevelFilter::ERROR,
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };

        Self {
            level,
            format: std::env::var(LOG_FORMAT_ENV)
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            detailed: verbose >= 2,
        }
    }

    fn filter(&self) -> EnvFilter {
        [LOG_ENV, EnvFilter::DEFAULT_ENV]
            .into_iter()
            .find_map(|var| EnvFilter::try_from_env(var).ok())
            .unwrap_or_else(|| EnvFilter::default().add_directive(self.level.into()))
    }
}

/// Install the global subscriber.
pub fn init(config: LogConfig) -> XtaskResult<()> {
    let registry = tracing_subscriber::registry().with(config.filter());

    let result = match config.format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(config.detailed)
                    .with_file(config.detailed)
                    .with_line_number(config.detailed),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| XtaskError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(0, true, LevelFilter::ERROR ; "quiet")]
    #[test_case(0, false, LevelFilter::INFO ; "default")]
    #[test_case(1, false, LevelFilter::DEBUG ; "verbose")]
    #[test_case(3, false, LevelFilter::TRACE ; "very verbose")]
    fn test_level_from_verbosity(verbose: u8, quiet: bool, expected: LevelFilter) {
        assert_eq!(expected, LogConfig::from_verbosity(verbose, quiet).level);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::Json, LogFormat::parse("JSON"));
        assert_eq!(LogFormat::Compact, LogFormat::parse("pretty"));
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::from_verbosity(0, false);
        let _ = init(config);

        assert!(matches!(init(config), Err(XtaskError::Logging(_))));
    }
}

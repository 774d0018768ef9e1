//! Logging configuration

use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or unparseable
pub const DEFAULT_LEVEL: &str = "info";

/// Filter from `RUST_LOG`, falling back to `default`
pub fn env_filter(rust_log: Option<&str>, default: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Initialize logging to stderr so command output stays clean
pub fn init() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref(), DEFAULT_LEVEL))
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_rust_log_overrides_default() {
        let filter = env_filter(Some("debug"), DEFAULT_LEVEL);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_default_level_without_rust_log() {
        let filter = env_filter(None, DEFAULT_LEVEL);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_per_target_directive_is_kept() {
        let filter = env_filter(Some("warn,dksap=trace"), DEFAULT_LEVEL);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }
}

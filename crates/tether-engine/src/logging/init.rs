use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "tether_engine=debug,wgpu=warn"). When unset, `RUST_LOG` is consulted and
/// `default_level` applies if that is missing too.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
    /// Route output through the test harness capture.
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
            is_test: false,
        }
    }
}

impl LoggingConfig {
    /// Debug-level config for unit tests.
    pub fn for_tests() -> Self {
        Self {
            default_level: log::LevelFilter::Debug,
            is_test: true,
            ..Self::default()
        }
    }

    fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &self.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(self.default_level);
            // wgpu is chatty at info.
            builder.filter_module("wgpu_core", log::LevelFilter::Warn);
            builder.filter_module("wgpu_hal", log::LevelFilter::Warn);
            builder.filter_module("naga", log::LevelFilter::Warn);
        }

        builder.write_style(self.write_style);
        builder.is_test(self.is_test);
        builder.format_timestamp_millis();
        builder
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Subsequent calls are ignored. Intended usage is early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        if config.builder().try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

/// Like [`init_logging`] but reports whether this call installed the logger.
pub fn try_init_logging(config: LoggingConfig) -> bool {
    let mut installed = false;
    INIT.call_once(|| installed = config.builder().try_init().is_ok());
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_initialization_installs() {
        let _ = try_init_logging(LoggingConfig::for_tests());
        assert!(!try_init_logging(LoggingConfig::for_tests()));
        init_logging(LoggingConfig::default());
        log::debug!("still usable");
    }

    #[test]
    fn explicit_filter_wins_over_defaults() {
        let config = LoggingConfig {
            env_filter: Some("warn".to_string()),
            ..LoggingConfig::for_tests()
        };
        let logger = config.builder().build();
        assert_eq!(logger.filter(), log::LevelFilter::Warn);
    }
}

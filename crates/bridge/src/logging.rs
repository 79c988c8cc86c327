pub use via_common::logging::finalize as finalize_logging;
use via_common::logging::{init_logging_from_config, LoggingError, LoggingInitConfig};
use via_config::LoggingConfig;

/// Base service name in log output.
pub const SERVICE_NAME: &str = "via-bridge";

/// Installs the global subscriber described by the `[logging]` section.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    init_logging_from_config(LoggingInitConfig {
        service_base_name: SERVICE_NAME,
        service_label: config.service_label.as_deref(),
        log_dir: config.log_dir.as_ref(),
        log_file_prefix: config.log_file_prefix.as_deref(),
        json_format: config.json_format,
        default_log_prefix: SERVICE_NAME,
    })
}

//! Configuration types for the logging subsystem.

use std::path::PathBuf;

use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::format::FmtSpan;

/// Configuration for the stdout logging layer
#[derive(Debug, Clone)]
pub struct StdoutConfig {
    /// Use JSON format instead of compact format
    pub json_format: bool,
    /// Span events to log (ENTER, EXIT, CLOSE, etc.)
    pub fmt_span: FmtSpan,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            // CLOSE events carry the span duration, which is how long each RPC round-trip took.
            fmt_span: FmtSpan::CLOSE,
        }
    }
}

/// Configuration for file-based logging with rotation
#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    /// Directory where log files will be written
    pub directory: PathBuf,
    /// Base filename prefix (e.g., "via-bridge" -> "via-bridge.2026-01-01")
    pub file_name_prefix: String,
    pub rotation: Rotation,
    /// Use JSON format for file logs (default: false, uses compact)
    pub json_format: bool,
}

impl FileLoggingConfig {
    pub fn new(directory: PathBuf, file_name_prefix: String) -> Self {
        Self {
            directory,
            file_name_prefix,
            rotation: Rotation::DAILY,
            json_format: false,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_json_format(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }
}

/// Main logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub service_name: String,
    pub service_version: Option<String>,
    pub stdout_config: StdoutConfig,
    /// File logging configuration (optional)
    pub file_logging_config: Option<FileLoggingConfig>,
}

impl LoggerConfig {
    /// Creates a new configuration with service name
    pub fn new(service_name: String) -> Self {
        Self {
            service_name,
            service_version: None,
            stdout_config: StdoutConfig::default(),
            file_logging_config: None,
        }
    }

    pub fn with_service_version(mut self, version: String) -> Self {
        self.service_version = Some(version);
        self
    }

    /// Enable JSON logging format
    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.stdout_config.json_format = enabled;
        self
    }

    /// Enable file logging with configuration
    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file_logging_config = Some(config);
        self
    }

    /// Configure which span events to log
    pub fn with_fmt_span(mut self, fmt_span: FmtSpan) -> Self {
        self.stdout_config.fmt_span = fmt_span;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new("(via-bridge)".to_string())
    }
}

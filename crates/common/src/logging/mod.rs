//! Logging subsystem.

pub mod manager;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use manager::{finalize, init, LoggingError};
pub use service::{init_logging_from_config, LoggingInitConfig};
pub use types::{FileLoggingConfig, LoggerConfig, StdoutConfig};

// Re-export tracing-appender types for convenience
pub use tracing_appender::rolling::Rotation;

/// Formats a service name with an optional label suffix.
pub fn format_service_name(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

//! Logging initialization and shutdown management.

use std::sync::{Mutex, OnceLock};

use thiserror::Error;
use tracing::*;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender},
};
use tracing_subscriber::{
    fmt::layer, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt, EnvFilter,
    Layer,
};

use super::types::LoggerConfig;

/// Keeps the non-blocking file writer alive until [`finalize`].
static FILE_GUARD: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file: {0}")]
    File(#[from] InitError),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Default filter is INFO, overridable via `RUST_LOG`.
fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy()
}

/// Builds the stdout layer and, when configured, the file layer with the guard flushing it.
pub(crate) fn build_layers(
    config: &LoggerConfig,
) -> Result<(Vec<BoxedLayer>, Option<WorkerGuard>), LoggingError> {
    let mut layers = Vec::with_capacity(2);

    let stdout_layer = if config.stdout_config.json_format {
        layer()
            .json()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(env_filter())
            .boxed()
    } else {
        layer()
            .compact()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(env_filter())
            .boxed()
    };
    layers.push(stdout_layer);

    let mut guard = None;
    if let Some(file_config) = &config.file_logging_config {
        let appender = RollingFileAppender::builder()
            .rotation(file_config.rotation.clone())
            .filename_prefix(&file_config.file_name_prefix)
            .build(&file_config.directory)?;
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);

        let file_layer = if file_config.json_format {
            layer()
                .json()
                .with_writer(writer)
                .with_ansi(false) // No color codes in files
                .with_filter(env_filter())
                .boxed()
        } else {
            layer()
                .compact()
                .with_writer(writer)
                .with_ansi(false) // No color codes in files
                .with_filter(env_filter())
                .boxed()
        };
        layers.push(file_layer);
    }

    Ok((layers, guard))
}

/// Initializes the logging subsystem with the provided config.
pub fn init(config: LoggerConfig) -> Result<(), LoggingError> {
    let (layers, guard) = build_layers(&config)?;

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    if let Some(guard) = guard {
        let slot = FILE_GUARD.get_or_init(|| Mutex::new(None));
        if let Ok(mut slot) = slot.lock() {
            *slot = Some(guard);
        }
    }

    info!(
        service_name = %config.service_name,
        service_version = ?config.service_version,
        "logging initialized"
    );
    Ok(())
}

/// Flushes buffered file output.
///
/// Should be called before the process exits; events emitted afterwards only reach stdout.
pub fn finalize() {
    info!("shutting down logging");

    let Some(slot) = FILE_GUARD.get() else {
        debug!("no file writer to flush");
        return;
    };
    match slot.lock() {
        Ok(mut guard) => drop(guard.take()),
        Err(e) => error!(%e, "file log guard poisoned"),
    }
}

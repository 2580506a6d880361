use crate::error::ConfigError;
use crate::settings::LoggingSettings;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global tracing subscriber: an optional console layer plus a
/// daily-rolling file in `settings.directory`.
///
/// The returned guard flushes the file writer on drop, so keep it alive for the
/// lifetime of the program.
pub fn init_tracing(settings: &LoggingSettings) -> Result<WorkerGuard, ConfigError> {
    std::fs::create_dir_all(&settings.directory)
        .map_err(|e| ConfigError::Logging(format!("{}: {}", settings.directory.display(), e)))?;

    let file_appender = tracing_appender::rolling::daily(&settings.directory, &settings.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    let console_layer = settings.console.then(|| fmt::layer().with_target(false));
    let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    info!(
        directory = %settings.directory.display(),
        level = %settings.level,
        "Logging initialized"
    );
    Ok(guard)
}

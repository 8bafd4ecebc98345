use tracing_appender::{
    non_blocking,
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{layer::Layer, registry::LookupSpan};

use crate::logging::{
    config::{FileRotation, LoggingConfig, LoggingError},
    formatter,
};

/// Файловый слой с ротацией и неблокирующей записью.
///
/// Возвращённый guard нужно держать до конца работы: при его drop-е
/// буфер сбрасывается на диск.
pub fn layer_with_config<S>(
    config: &LoggingConfig
) -> Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard), LoggingError>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let rotation = match config.file.rotation {
        FileRotation::Daily => Rotation::DAILY,
        FileRotation::Hourly => Rotation::HOURLY,
        FileRotation::Never => Rotation::NEVER,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.file.filename)
        .build(&config.file.dir)
        .map_err(|e| LoggingError::Appender(e.to_string()))?;
    let (writer, guard) = non_blocking(appender);

    let layer = formatter::build_layer(config.file.format, writer, false, &config.console);
    Ok((layer, guard))
}

use std::io::{self, Stderr};

use tracing_subscriber::{layer::Layer, registry::LookupSpan};

use crate::logging::{config::LoggingConfig, formatter};

/// Консольный слой. Пишет в stderr: stdout занят протоколом моста.
pub fn layer_with_config<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stderr = io::stderr;
    formatter::build_layer(
        config.format,
        writer,
        config.console.with_ansi,
        &config.console,
    )
}

#[cfg(test)]
mod tests {
    use tracing::info;
    use tracing_subscriber::{prelude::*, registry::Registry};

    use super::*;
    use crate::logging::config::LogFormat;

    /// Тест проверяет, что слой строится для всех форматов и не паникует
    /// при логировании.
    #[test]
    fn test_layer_with_config_all_formats() {
        for format in [LogFormat::Compact, LogFormat::Pretty, LogFormat::Json] {
            let mut cfg = LoggingConfig::default();
            cfg.format = format;
            cfg.console.with_ansi = false;

            let layer = layer_with_config::<Registry>(&cfg);
            tracing::subscriber::with_default(Registry::default().with(layer), || {
                info!("console sink smoke test");
            });
        }
    }
}

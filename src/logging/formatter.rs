use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::Layer,
    registry::LookupSpan,
};

use crate::logging::config::{ConsoleConfig, LogFormat};

/// Собирает fmt-слой нужного формата поверх `writer`.
///
/// Тип формата стирается в `Box<dyn Layer>`, чтобы консоль и файл
/// складывались в один `Vec` слоёв.
pub fn build_layer<S, W>(
    format: LogFormat,
    writer: W,
    with_ansi: bool,
    options: &ConsoleConfig,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(with_ansi)
        .with_target(options.with_target)
        .with_thread_ids(options.with_thread_ids)
        .with_line_number(options.with_line_numbers);

    match format {
        LogFormat::Json => base.json().with_current_span(true).boxed(),
        LogFormat::Pretty => base.pretty().with_span_events(FmtSpan::CLOSE).boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    use tracing_subscriber::{prelude::*, registry::Registry};

    use super::*;

    #[derive(Clone)]
    struct VecWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for VecWriter {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(format: LogFormat) -> String {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = VecWriter(buffer.clone());
        let layer = build_layer::<Registry, _>(
            format,
            move || writer.clone(),
            false,
            &ConsoleConfig::default(),
        );
        tracing::subscriber::with_default(Registry::default().with(layer), || {
            tracing::info!(hub = 3, "hub attached");
        });
        let out = buffer.lock().unwrap();
        String::from_utf8_lossy(&out).to_string()
    }

    /// Тест проверяет, что JSON-формат даёт разбираемую строку с полями
    /// события.
    #[test]
    fn test_json_format() {
        let out = capture(LogFormat::Json);
        let line = out.lines().next().unwrap();
        let json: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(json["fields"]["message"], "hub attached");
        assert_eq!(json["fields"]["hub"], 3);
    }

    #[test]
    fn test_compact_and_pretty_formats() {
        assert!(capture(LogFormat::Compact).contains("hub attached"));
        assert!(capture(LogFormat::Pretty).contains("hub attached"));
    }
}

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{logging::LoggingConfig, pubsub::PubSubConfig};

/// Префикс переменных окружения: `POSTBOX_PUBSUB__DISPATCH=snapshot`.
pub const ENV_PREFIX: &str = "POSTBOX";

/// Настройки процесса.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub pubsub: PubSubConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Загружает настройки: значения по умолчанию, затем файл (если указан),
    /// затем переменные окружения, затем короткие `POSTBOX_LOG_*`.
    ///
    /// Всё, что вызывающий код меняет после `load` (флаги CLI), имеет
    /// приоритет над окружением.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("pubsub.dispatch", "locked")?
            .set_default("pubsub.reject_unsafe_payloads", true)?
            .set_default("pubsub.max_payload_depth", 1024)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let cfg = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Десериализуем конфигурацию в нашу структуру
        let mut settings: Self = cfg.try_deserialize()?;
        settings.logging.apply_env_overrides();
        Ok(settings)
    }
}

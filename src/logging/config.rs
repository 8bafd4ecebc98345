use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_LEVEL: &str = "POSTBOX_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "POSTBOX_LOG_FORMAT";
pub const ENV_LOG_DIR: &str = "POSTBOX_LOG_DIR";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },
    #[error("unknown log format '{0}' (expected compact, pretty or json)")]
    UnknownFormat(String),
    #[error("file logging needs a non-empty file name")]
    EmptyFileName,
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create file appender: {0}")]
    Appender(String),
    #[error("global subscriber is already set: {0}")]
    Init(String),
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Настройки вывода в консоль (stderr).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

/// Настройки записи в файл.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub filename: String,
    pub rotation: FileRotation,
    /// Формат файла; по умолчанию JSON.
    pub format: LogFormat,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень (`info`) или полная директива (`postbox=debug,warn`).
    pub level: String,
    /// Формат консольного вывода.
    pub format: LogFormat,
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl LoggingConfig {
    /// Переопределения из окружения: `POSTBOX_LOG_LEVEL`,
    /// `POSTBOX_LOG_FORMAT`, `POSTBOX_LOG_DIR` (последнее включает запись в
    /// файл). Некорректный формат игнорируется с сообщением в stderr.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            if !level.trim().is_empty() {
                self.level = level.trim().to_string();
            }
        }
        if let Ok(format) = env::var(ENV_LOG_FORMAT) {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => eprintln!("Ignoring {ENV_LOG_FORMAT}: {e}"),
            }
        }
        if let Ok(dir) = env::var(ENV_LOG_DIR) {
            if !dir.trim().is_empty() {
                self.file.dir = PathBuf::from(dir.trim());
                self.file.enabled = true;
            }
        }
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        let directive = self.build_filter_directive();
        EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
            directive,
            reason: e.to_string(),
        })?;
        if self.file.enabled && self.file.filename.trim().is_empty() {
            return Err(LoggingError::EmptyFileName);
        }
        Ok(())
    }

    /// Создаёт каталог логов, если включена запись в файл.
    pub fn ensure_log_dir(&self) -> Result<(), LoggingError> {
        if !self.file.enabled {
            return Ok(());
        }
        fs::create_dir_all(&self.file.dir).map_err(|source| LoggingError::CreateDir {
            path: self.file.dir.clone(),
            source,
        })
    }

    /// Директива для [`EnvFilter`]. Голый уровень применяется к этому
    /// crate-у, для остальных остаётся `warn`.
    pub fn build_filter_directive(&self) -> String {
        let level = self.level.trim();
        if level.contains('=') || level.contains(',') {
            level.to_string()
        } else {
            format!("postbox={level},warn")
        }
    }

    pub fn log_file_path(&self) -> PathBuf {
        Path::new(&self.file.dir).join(&self.file.filename)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("logs"),
            filename: "postbox.log".to_string(),
            rotation: FileRotation::Daily,
            format: LogFormat::Json,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        })
    }
}

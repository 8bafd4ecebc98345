use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Сообщение, которое получает страница при попытке отправить
/// непередаваемый объект.
pub const DATA_TRANSFER_MESSAGE: &str = "Objects of that type cannot be sent through postMessage";

/// Ошибка, возвращённая callback-ом получателя.
///
/// Ядро не перехватывает такие ошибки: fan-out прерывается, ошибка уходит
/// к издателю.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Получатель отклонил сообщение.
    #[error("receiver rejected message: {reason}")]
    Rejected { reason: String },
    /// Контекст получателя уже недоступен (страница закрыта).
    #[error("receiver is no longer reachable")]
    Disconnected,
}

/// Ошибки публикации сообщения.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// В payload есть значение, которое нельзя передавать между контекстами.
    #[error("Objects of that type cannot be sent through postMessage ({kind} at {path})")]
    DataTransfer { path: String, kind: String },
    /// Вложенность payload превышает лимит из конфигурации.
    #[error("payload nesting depth {depth} exceeds limit {limit}")]
    PayloadTooDeep { depth: usize, limit: usize },
    /// Вызов `publish` из callback-а, пока fan-out держит блокировку реестра.
    #[error("publish called from a listener during fan-out")]
    Reentrant,
    /// Callback получателя вернул ошибку.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl ErrorExt for DeliveryError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejected { .. } => StatusCode::DeliveryFailed,
            Self::Disconnected => StatusCode::ReceiverGone,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ErrorExt for PublishError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::DataTransfer { .. } => StatusCode::DataTransfer,
            Self::PayloadTooDeep { .. } => StatusCode::DepthLimit,
            Self::Reentrant => StatusCode::ReentrantCall,
            Self::Delivery(e) => e.status_code(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            // Путь к значению внутри payload странице не нужен.
            Self::DataTransfer { .. } | Self::PayloadTooDeep { .. } => {
                DATA_TRANSFER_MESSAGE.to_string()
            }
            Self::Reentrant => self.to_string(),
            Self::Delivery(e) => e.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "pubsub_publish".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::DataTransfer { kind, .. } => {
                tags.push(("value_kind", kind.clone()));
            }
            Self::PayloadTooDeep { depth, limit } => {
                tags.push(("depth", depth.to_string()));
                tags.push(("limit", limit.to_string()));
            }
            _ => {}
        }

        tags
    }
}

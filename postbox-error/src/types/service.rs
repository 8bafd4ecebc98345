use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, PublishError, StatusCode};

/// Ошибки вызова метода сервиса со стороны хоста.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("unknown method '{method}'")]
    UnknownMethod { method: String },

    #[error("{method}: required argument '{name}' is missing")]
    MissingArgument { method: &'static str, name: &'static str },

    #[error("{method}: argument '{name}' must be {expected}, got {found}")]
    InvalidArgument {
        method: &'static str,
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl ServiceError {
    /// Имя ошибки, под которым хост отдаёт её в страницу.
    pub fn host_kind(&self) -> &'static str {
        match self {
            Self::UnknownMethod { .. } => "UnknownMethod",
            Self::MissingArgument { .. } | Self::InvalidArgument { .. } => "InvalidArguments",
            Self::Publish(PublishError::DataTransfer { .. })
            | Self::Publish(PublishError::PayloadTooDeep { .. }) => "DataTransferError",
            Self::Publish(PublishError::Reentrant) => "ReentrantCall",
            Self::Publish(PublishError::Delivery(_)) => "DeliveryError",
        }
    }
}

impl ErrorExt for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownMethod { .. } => StatusCode::NotImplemented,
            Self::MissingArgument { .. } => StatusCode::MissingArgument,
            Self::InvalidArgument { .. } => StatusCode::InvalidArgs,
            Self::Publish(e) => e.status_code(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::Publish(e) => e.client_message(),
            _ => self.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Publish(e) => e.metrics_tags(),
            _ => vec![
                ("error_type", "service".to_string()),
                ("status_code", self.status_code().to_string()),
                ("host_kind", self.host_kind().to_string()),
            ],
        }
    }
}

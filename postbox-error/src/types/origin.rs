use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки вычисления origin из URI контекста.
///
/// Наружу не пробрасываются: hub логирует их и продолжает работу с пустым
/// origin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginError {
    /// URI не разбирается.
    #[error("could not parse context uri '{uri}': {reason}")]
    Parse { uri: String, reason: String },
}

impl ErrorExt for OriginError {
    fn status_code(&self) -> StatusCode {
        StatusCode::InvalidOrigin
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let Self::Parse { uri, .. } = self;
        vec![
            ("error_type", "origin".to_string()),
            ("status_code", self.status_code().to_string()),
            ("uri", uri.clone()),
        ]
    }
}

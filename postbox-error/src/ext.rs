use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок библиотеки (object-safe).
///
/// Даёт единый набор вспомогательных методов:
/// - статус-код для хоста,
/// - безопасное сообщение для вызывающего контекста (страницы),
/// - детализированное сообщение для логов,
/// - теги для систем наблюдаемости.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки для хоста.
    ///
    /// По умолчанию возвращает [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any) для downcast.
    fn as_any(&self) -> &dyn Any;

    /// Сообщение, которое можно отдать в страницу.
    ///
    /// Внутренние ошибки не раскрывают деталей и превращаются в
    /// `"Internal error"`.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal | StatusCode::Unexpected => {
                "Internal error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Детализированное сообщение для логов.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Набор тегов (ключ–значение) для метрик.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Теги одной строкой `key=value` для полей лога.
    fn render_tags(&self) -> String {
        self.metrics_tags()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Имя типа ошибки без пути модуля.
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}

/// Обёртка над любой ошибкой, реализующей `ErrorExt`.
pub struct BoxedError {
    inner: Box<dyn ErrorExt>,
}

impl BoxedError {
    pub fn new<E: ErrorExt>(err: E) -> Self {
        Self {
            inner: Box::new(err),
        }
    }

    pub fn into_inner(self) -> Box<dyn ErrorExt> {
        self.inner
    }

    /// Пытается получить ссылку на конкретный тип ошибки.
    pub fn downcast_ref<E: ErrorExt>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref::<E>()
    }
}

impl std::fmt::Debug for BoxedError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

impl std::fmt::Display for BoxedError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for BoxedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl ErrorExt for BoxedError {
    fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }

    fn client_message(&self) -> String {
        self.inner.client_message()
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        self.inner.metrics_tags()
    }
}

#[cfg(test)]
mod tests {
    use std::{any::Any, error::Error, fmt};

    use super::*;

    // Ошибка без переопределения status_code (default = Internal).
    #[derive(Debug)]
    struct DefaultError(pub &'static str);

    impl fmt::Display for DefaultError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "DefaultError: {}", self.0)
        }
    }

    impl Error for DefaultError {}

    impl ErrorExt for DefaultError {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct BadArgs(pub &'static str);

    impl fmt::Display for BadArgs {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "bad argument: {}", self.0)
        }
    }

    impl Error for BadArgs {}

    impl ErrorExt for BadArgs {
        fn status_code(&self) -> StatusCode {
            StatusCode::InvalidArgs
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Тест проверяет, что по умолчанию статус ошибки — `Internal`, а
    /// сообщение для страницы не содержит деталей.
    #[test]
    fn test_default_is_internal_and_hidden() {
        let e = DefaultError("secret path /home/user");
        assert_eq!(e.status_code(), StatusCode::Internal);
        assert_eq!(e.client_message(), "Internal error");
    }

    /// Тест проверяет, что для клиентских кодов `client_message` совпадает с
    /// `Display`.
    #[test]
    fn test_client_message_passthrough() {
        let e = BadArgs("origin");
        assert_eq!(e.client_message(), "bad argument: origin");
    }

    #[test]
    fn test_type_name_and_tags() {
        let e = BadArgs("x");
        assert_eq!(e.type_name(), "BadArgs");
        let tags = e.metrics_tags();
        assert!(tags.contains(&("error_type", "BadArgs".to_string())));
    }

    /// Тест проверяет, что `BoxedError` отдаёт теги вложенной ошибки, а не
    /// свои.
    #[test]
    fn test_boxed_error_renders_inner_tags() {
        let boxed = BoxedError::new(BadArgs("x"));
        assert_eq!(
            boxed.render_tags(),
            format!("error_type=BadArgs status_code={}", StatusCode::InvalidArgs)
        );
    }

    /// Тест проверяет downcast через `BoxedError`.
    #[test]
    fn test_boxed_error_downcast() {
        let boxed = BoxedError::new(BadArgs("receiver"));
        assert_eq!(boxed.status_code(), StatusCode::InvalidArgs);
        assert!(boxed.downcast_ref::<BadArgs>().is_some());
        assert!(boxed.downcast_ref::<DefaultError>().is_none());
        assert_eq!(boxed.to_string(), "bad argument: receiver");
    }
}

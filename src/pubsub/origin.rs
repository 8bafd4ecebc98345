use std::{fmt, sync::Arc};

use postbox_error::OriginError;
use url::Url;

/// Значение фильтра, пропускающее любой origin.
pub const WILDCARD: &str = "*";

/// Origin контекста: строка вида `scheme://domain`.
///
/// Вычисляется один раз при создании hub-а и дальше не меняется.
/// Сравнение строковое, без нормализации.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin(Arc<str>);

/// Фильтр по origin: `*` или точное совпадение.
///
/// Используется и как accept-origin слушателя, и как target-origin
/// публикации.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum OriginFilter {
    #[default]
    Any,
    Exact(Origin),
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Origin {
    /// Оборачивает уже готовую строку origin-а.
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    /// Origin контекста, URI которого не удалось разобрать.
    pub fn unresolved() -> Self {
        Self(Arc::from(""))
    }

    /// Вычисляет origin из URI контекста.
    ///
    /// - схема `file` даёт пустой домен: `file://`;
    /// - хост из двух меток получает префикс `www`:
    ///   `http://example.com/x` → `http://www.example.com`;
    /// - порт, путь и query отбрасываются.
    pub fn from_uri(uri: &str) -> Result<Self, OriginError> {
        let url = Url::parse(uri).map_err(|e| OriginError::Parse {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme();
        let domain = if scheme == "file" {
            String::new()
        } else {
            let mut labels: Vec<&str> = url.host_str().unwrap_or("").split('.').collect();
            if labels.len() == 2 {
                labels.insert(0, "www");
            }
            labels.join(".")
        };

        Ok(Self(Arc::from(format!("{scheme}://{domain}"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unresolved(&self) -> bool {
        self.0.is_empty()
    }
}

impl OriginFilter {
    /// `"*"` → `Any`, всё остальное — точное совпадение со строкой как есть.
    pub fn parse(s: &str) -> Self {
        if s == WILDCARD {
            OriginFilter::Any
        } else {
            OriginFilter::Exact(Origin::new(s))
        }
    }

    pub fn matches(
        &self,
        origin: &Origin,
    ) -> bool {
        match self {
            OriginFilter::Any => true,
            OriginFilter::Exact(expected) => expected == origin,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, OriginFilter::Any)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for Origin {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Origin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Origin {
    fn eq(
        &self,
        other: &str,
    ) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Origin {
    fn eq(
        &self,
        other: &&str,
    ) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for OriginFilter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            OriginFilter::Any => f.write_str(WILDCARD),
            OriginFilter::Exact(origin) => origin.fmt(f),
        }
    }
}

impl From<&str> for OriginFilter {
    fn from(s: &str) -> Self {
        OriginFilter::parse(s)
    }
}

impl From<Origin> for OriginFilter {
    fn from(origin: Origin) -> Self {
        OriginFilter::Exact(origin)
    }
}

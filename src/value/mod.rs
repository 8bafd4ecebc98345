//! Модель значений, которыми обмениваются хост и контексты.
//!
//! [`Value`] — закрытый enum: всё, что хост умеет передать в сервис.
//! Передаваемые между контекстами варианты (`Null`, `Bool`, `Integer`,
//! `Double`, `String`, `Map`, `List`) и непередаваемые (`Callback`,
//! `NativePath`, `WritableNativePath`, `Any`) живут в одном типе, а решение о
//! публикации принимает [`crate::pubsub::is_safe_to_publish`].

pub mod json;

use std::{collections::BTreeMap, fmt, path::PathBuf};

use serde::Serialize;

pub use json::{from_json, to_json, JsonError};

/// Идентификатор callback-а, выданный хостом.
///
/// Сам callback живёт на стороне хоста; сервис хранит только id и вызывает
/// его через [`crate::service::Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct CallbackId(pub u64);

impl fmt::Display for CallbackId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "callback#{}", self.0)
    }
}

/// Значение, пришедшее от хоста.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    /// Ключи уникальны, порядок обхода детерминирован.
    Map(BTreeMap<String, Value>),
    List(Vec<Value>),
    /// Ссылка на функцию в контексте страницы.
    Callback(CallbackId),
    /// Путь в локальной файловой системе (read-only).
    NativePath(PathBuf),
    /// Путь, открытый страницей на запись.
    WritableNativePath(PathBuf),
    /// Значение неизвестного хосту типа.
    Any,
}

/// Тег варианта [`Value`] без данных.
///
/// Имена совпадают с именами типов в описании сервиса.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    Map,
    List,
    CallBack,
    NativePath,
    WritableNativePath,
    Any,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Value {
    /// Создаёт `Value::Map` из пар ключ–значение.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Map(_) => ValueKind::Map,
            Value::List(_) => ValueKind::List,
            Value::Callback(_) => ValueKind::CallBack,
            Value::NativePath(_) => ValueKind::NativePath,
            Value::WritableNativePath(_) => ValueKind::WritableNativePath,
            Value::Any => ValueKind::Any,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<CallbackId> {
        match self {
            Value::Callback(id) => Some(*id),
            _ => None,
        }
    }

    /// Значение по ключу, если `self` — `Map`.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Глубина вложенности: скаляр и пустой контейнер имеют глубину 1.
    ///
    /// Считается без рекурсии, поэтому безопасна для сколь угодно глубоких
    /// деревьев.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((value, depth)) = stack.pop() {
            max = max.max(depth);
            match value {
                Value::Map(m) => stack.extend(m.values().map(|v| (v, depth + 1))),
                Value::List(l) => stack.extend(l.iter().map(|v| (v, depth + 1))),
                _ => {}
            }
        }
        max
    }
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "Null",
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Double => "Double",
            ValueKind::String => "String",
            ValueKind::Map => "Map",
            ValueKind::List => "List",
            ValueKind::CallBack => "CallBack",
            ValueKind::NativePath => "NativePath",
            ValueKind::WritableNativePath => "WritableNativePath",
            ValueKind::Any => "Any",
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for ValueKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<CallbackId> for Value {
    fn from(id: CallbackId) -> Self {
        Value::Callback(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_builder_and_get() {
        let v = Value::map([("a", Value::from(1)), ("b", Value::from("x"))]);
        assert_eq!(v.get("a"), Some(&Value::Integer(1)));
        assert_eq!(v.get("b").and_then(Value::as_str), Some("x"));
        assert_eq!(v.get("c"), None);
        assert_eq!(Value::Null.get("a"), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Bool(true).kind().to_string(), "Boolean");
        assert_eq!(Value::Callback(CallbackId(1)).kind().as_str(), "CallBack");
        assert_eq!(
            Value::WritableNativePath("/tmp".into()).kind(),
            ValueKind::WritableNativePath
        );
    }

    /// Тест проверяет подсчёт глубины для скаляров, пустых и вложенных
    /// контейнеров.
    #[test]
    fn test_depth() {
        assert_eq!(Value::Null.depth(), 1);
        assert_eq!(Value::List(vec![]).depth(), 1);
        let nested = Value::List(vec![Value::map([("k", Value::List(vec![Value::Null]))])]);
        assert_eq!(nested.depth(), 4);
    }

    /// Тест проверяет, что глубина считается без переполнения стека на очень
    /// глубоком дереве.
    #[test]
    fn test_depth_of_deep_chain() {
        let mut v = Value::Null;
        for _ in 0..10_000 {
            v = Value::List(vec![v]);
        }
        assert_eq!(v.depth(), 10_001);
        // Рекурсивный drop 10k уровней может не влезть в стек тестового
        // потока, поэтому разбираем цепочку вручную.
        let mut cur = v;
        while let Value::List(mut items) = cur {
            cur = items.pop().unwrap_or(Value::Null);
        }
    }

    #[test]
    fn test_callback_display() {
        assert_eq!(CallbackId(42).to_string(), "callback#42");
        assert_eq!(Value::from(CallbackId(3)).as_callback(), Some(CallbackId(3)));
    }
}

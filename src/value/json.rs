//! Мост между [`serde_json::Value`] и [`Value`].
//!
//! JSON не умеет выражать callback-и и пути, поэтому для них используются
//! объекты-маркеры с одним ключом:
//!
//! - `{"$callback": 7}` → `Value::Callback(CallbackId(7))`
//! - `{"$path": "/tmp/a"}` → `Value::NativePath`
//! - `{"$writablePath": "/tmp/a"}` → `Value::WritableNativePath`
//!
//! Обратное преобразование возможно только для передаваемых значений.
//!
//! Обычный map из одного ключа, совпадающего с маркером (включая `$map`),
//! кодируется в обёртке `{"$map": {...}}`, чтобы при обратном разборе не
//! стать callback-ом или путём. Содержимое обёртки маркером не считается.

use serde_json::{Map as JsonMap, Number, Value as Json};
use thiserror::Error;

use super::{CallbackId, Value, ValueKind};

pub const CALLBACK_MARKER: &str = "$callback";
pub const PATH_MARKER: &str = "$path";
pub const WRITABLE_PATH_MARKER: &str = "$writablePath";
pub const MAP_MARKER: &str = "$map";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonError {
    #[error("{0} values cannot be encoded as JSON")]
    NotTransmissible(ValueKind),
    #[error("non-finite double cannot be encoded as JSON")]
    NonFiniteDouble,
}

/// Преобразует JSON в [`Value`], раскрывая объекты-маркеры.
pub fn from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => number(&n),
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
        Json::Object(map) => object(map),
    }
}

/// Преобразует [`Value`] в JSON.
///
/// Возвращает ошибку на первом непередаваемом значении.
pub fn to_json(value: &Value) -> Result<Json, JsonError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(n) => Json::Number((*n).into()),
        Value::Double(d) => Json::Number(Number::from_f64(*d).ok_or(JsonError::NonFiniteDouble)?),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect::<Result<_, _>>()?),
        Value::Map(m) => {
            let object = m
                .iter()
                .map(|(k, v)| Ok((k.clone(), to_json(v)?)))
                .collect::<Result<JsonMap<_, _>, JsonError>>()?;
            if m.len() == 1 && m.keys().all(|k| is_marker(k)) {
                let mut wrapper = JsonMap::new();
                wrapper.insert(MAP_MARKER.to_string(), Json::Object(object));
                Json::Object(wrapper)
            } else {
                Json::Object(object)
            }
        }
        Value::Callback(_) | Value::NativePath(_) | Value::WritableNativePath(_) | Value::Any => {
            return Err(JsonError::NotTransmissible(value.kind()))
        }
    })
}

fn number(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Integer(i),
        // u64 за пределами i64 и дробные числа
        None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn is_marker(key: &str) -> bool {
    matches!(
        key,
        CALLBACK_MARKER | PATH_MARKER | WRITABLE_PATH_MARKER | MAP_MARKER
    )
}

fn plain_map(map: JsonMap<String, Json>) -> Value {
    Value::Map(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
}

fn object(mut map: JsonMap<String, Json>) -> Value {
    if map.len() == 1 {
        if let Some(Json::Object(_)) = map.get(MAP_MARKER) {
            if let Some(Json::Object(inner)) = map.remove(MAP_MARKER) {
                return plain_map(inner);
            }
        }
        if let Some(id) = map.get(CALLBACK_MARKER).and_then(Json::as_u64) {
            return Value::Callback(CallbackId(id));
        }
        if let Some(path) = map.get(PATH_MARKER).and_then(Json::as_str) {
            return Value::NativePath(path.into());
        }
        if let Some(path) = map.get(WRITABLE_PATH_MARKER).and_then(Json::as_str) {
            return Value::WritableNativePath(path.into());
        }
    }
    plain_map(map)
}

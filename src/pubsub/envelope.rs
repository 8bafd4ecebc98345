use super::Origin;
use crate::value::Value;

/// Сообщение, которое получает слушатель: `{data, origin}`.
///
/// Создаётся заново на каждую публикацию и живёт один проход fan-out-а.
/// `data` — глубокая копия опубликованного payload, `origin` — origin
/// hub-а-издателя.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    data: Value,
    origin: Origin,
}

impl Envelope {
    pub fn new(
        data: Value,
        origin: Origin,
    ) -> Self {
        Self { data, origin }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Представление для хоста: `Map{data, origin}`.
    pub fn to_value(&self) -> Value {
        Value::map([
            ("data", self.data.clone()),
            ("origin", Value::from(self.origin.as_str())),
        ])
    }

    pub fn into_parts(self) -> (Value, Origin) {
        (self.data, self.origin)
    }
}

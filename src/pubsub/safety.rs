//! Проверка, можно ли передать payload между контекстами.
//!
//! Передаются только данные: `Null`, `Bool`, `Integer`, `Double`, `String`,
//! а также `Map` и `List`, все элементы которых передаваемы. Callback-и,
//! пути к файлам и `Any` не покидают контекст, в котором созданы.
//!
//! Обход идёт по явному стеку, поэтому глубина входа ограничена только
//! памятью, а не стеком потока.

use std::fmt;

use crate::value::{Value, ValueKind};

/// Первое непередаваемое значение внутри payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafeValue {
    /// Путь от корня: `data`, `data.items[2]`, `data.user.cb`.
    pub path: String,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// `true`, если значение можно опубликовать.
pub fn is_safe_to_publish(value: &Value) -> bool {
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Null
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::Double(_)
            | Value::String(_) => {}
            Value::Map(m) => stack.extend(m.values()),
            Value::List(l) => stack.extend(l.iter()),
            Value::Callback(_)
            | Value::NativePath(_)
            | Value::WritableNativePath(_)
            | Value::Any => return false,
        }
    }
    true
}

/// Ищет первое (в порядке документа) непередаваемое значение.
///
/// Медленнее [`is_safe_to_publish`]: хранит путь до каждого узла. Вызывается
/// только когда payload уже отклонён, чтобы построить сообщение об ошибке.
pub fn find_unsafe(value: &Value) -> Option<UnsafeValue> {
    // Узлы пути: (родитель, сегмент). Корень — индекс usize::MAX.
    let mut segments: Vec<(usize, Segment<'_>)> = Vec::new();
    let mut stack: Vec<(&Value, usize)> = vec![(value, usize::MAX)];

    while let Some((value, node)) = stack.pop() {
        match value {
            Value::Null
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::Double(_)
            | Value::String(_) => {}
            Value::Map(m) => {
                // в обратном порядке, чтобы первый ключ снимался со стека первым
                for (key, child) in m.iter().rev() {
                    segments.push((node, Segment::Key(key)));
                    stack.push((child, segments.len() - 1));
                }
            }
            Value::List(l) => {
                for (i, child) in l.iter().enumerate().rev() {
                    segments.push((node, Segment::Index(i)));
                    stack.push((child, segments.len() - 1));
                }
            }
            Value::Callback(_)
            | Value::NativePath(_)
            | Value::WritableNativePath(_)
            | Value::Any => {
                return Some(UnsafeValue {
                    path: render_path(&segments, node),
                    kind: value.kind(),
                });
            }
        }
    }
    None
}

fn render_path(
    segments: &[(usize, Segment<'_>)],
    mut node: usize,
) -> String {
    let mut chain = Vec::new();
    while node != usize::MAX {
        let (parent, segment) = segments[node];
        chain.push(segment);
        node = parent;
    }

    let mut path = String::from("data");
    for segment in chain.iter().rev() {
        match segment {
            Segment::Key(key) => {
                path.push('.');
                path.push_str(key);
            }
            Segment::Index(i) => {
                path.push('[');
                path.push_str(&i.to_string());
                path.push(']');
            }
        }
    }
    path
}

impl fmt::Display for UnsafeValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.path)
    }
}

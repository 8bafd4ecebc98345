//! Генераторы деревьев `Value` для property-based тестов.

use std::path::PathBuf;

use postbox::{CallbackId, Value};
use proptest::{collection, prelude::*};

/// Скаляры, которые можно публиковать.
pub fn safe_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        // конечные числа: JSON не кодирует NaN и бесконечности
        (-1.0e12f64..1.0e12).prop_map(Value::Double),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
    ]
}

/// Значения, которые нельзя публиковать.
pub fn unsafe_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(|id| Value::Callback(CallbackId(id))),
        "/[a-z]{1,8}".prop_map(|p| Value::NativePath(PathBuf::from(p))),
        "/[a-z]{1,8}".prop_map(|p| Value::WritableNativePath(PathBuf::from(p))),
        Just(Value::Any),
    ]
}

/// Ключи map-ов; изредка совпадают с JSON-маркерами.
pub fn map_key() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => "[a-z]{1,6}",
        1 => prop_oneof![
            Just("$callback".to_string()),
            Just("$path".to_string()),
            Just("$writablePath".to_string()),
            Just("$map".to_string()),
        ],
    ]
}

/// Деревья только из передаваемых значений, включая пустые контейнеры.
pub fn safe_tree() -> impl Strategy<Value = Value> {
    safe_leaf().prop_recursive(6, 64, 6, |inner| {
        prop_oneof![
            collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            collection::btree_map(map_key(), inner, 0..6).prop_map(Value::Map),
        ]
    })
}

/// Путь от корня к месту вставки: индексы детей на каждом уровне.
pub fn insertion_path() -> impl Strategy<Value = Vec<usize>> {
    collection::vec(any::<usize>(), 0..8)
}

/// Вставляет `leaf` в дерево: спускается по `path`, пока есть дети, и
/// добавляет лист в ближайший контейнер (или оборачивает скаляр в список).
pub fn plant(
    tree: Value,
    path: &[usize],
    leaf: Value,
) -> Value {
    match tree {
        Value::List(mut items) => {
            match path.split_first() {
                Some((&i, rest)) if !items.is_empty() => {
                    let idx = i % items.len();
                    let child = std::mem::replace(&mut items[idx], Value::Null);
                    items[idx] = plant(child, rest, leaf);
                }
                _ => items.push(leaf),
            }
            Value::List(items)
        }
        Value::Map(mut map) => {
            match path.split_first() {
                Some((&i, rest)) if !map.is_empty() => {
                    let key = map.keys().nth(i % map.len()).cloned().unwrap_or_default();
                    let child = map.remove(&key).unwrap_or(Value::Null);
                    map.insert(key, plant(child, rest, leaf));
                }
                _ => {
                    map.insert("planted".to_string(), leaf);
                }
            }
            Value::Map(map)
        }
        scalar => Value::List(vec![scalar, leaf]),
    }
}

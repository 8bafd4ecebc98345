use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки и ошибки вызова метода
/// - 2xxx: Ошибки данных (payload)
/// - 3xxx: Origin
/// - 4xxx: Диспетчеризация (блокировки, реентерабельность)
/// - 6xxx: Доставка в callback
#[cfg_attr(feature = "serde", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,
    NotImplemented = 1005,
    MissingArgument = 1006,

    // === 2xxx: Ошибки данных ===
    TypeError = 2002,
    InvalidData = 2009,
    DataTransfer = 2010,
    DepthLimit = 2011,

    // === 3xxx: Origin ===
    InvalidOrigin = 3000,

    // === 4xxx: Диспетчеризация ===
    ReentrantCall = 4000,

    // === 6xxx: Доставка ===
    DeliveryFailed = 6000,
    ReceiverGone = 6001,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Вернёт `true`, если переданный `code` означает успешный результат.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Ошибка вызывающей стороны: неверные аргументы, данные или origin.
    pub fn is_client_error(&self) -> bool {
        matches!(self.code(), 2000..=3999)
            || matches!(self, Self::InvalidArgs | Self::MissingArgument)
    }

    /// Ошибка на стороне процесса-хоста или получателя.
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error() && *self != Self::Success
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет разделение клиентских и серверных ошибок.
    #[test]
    fn test_client_vs_server() {
        assert!(StatusCode::DataTransfer.is_client_error());
        assert!(StatusCode::InvalidOrigin.is_client_error());
        assert!(StatusCode::MissingArgument.is_client_error());
        assert!(StatusCode::ReentrantCall.is_server_error());
        assert!(StatusCode::DeliveryFailed.is_server_error());
        assert!(!StatusCode::Success.is_server_error());
    }

    /// Тест проверяет конвертацию через `TryFrom<u32>` и `from_u32`.
    #[test]
    fn test_from_try_from_u32() {
        let n = StatusCode::DataTransfer.code();
        assert_eq!(StatusCode::try_from(n).unwrap(), StatusCode::DataTransfer);
        assert!(StatusCode::from_u32(99999).is_none());
    }

    #[test]
    fn test_code_and_into() {
        let n: u32 = StatusCode::ReentrantCall.into();
        assert_eq!(n, 4000);
        assert!(StatusCode::is_success(StatusCode::Success.code()));
        assert!(!StatusCode::is_success(n));
    }

    /// Тест проверяет формат `Display`: имя варианта и числовой код.
    #[test]
    fn test_display_contains_name_and_code() {
        let s = format!("{}", StatusCode::DataTransfer);
        assert_eq!(s, "DataTransfer (2010)");
    }
}

use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Коды статуса ошибок relay.
///
/// # Диапазоны:
/// - 2xxx: Каналы доставки
/// - 3xxx: Конфигурация
/// - 4xxx: Логирование
///
/// `TryFrom<u32>` выводится через `num_enum::TryFromPrimitive`.
#[cfg_attr(feature = "serde", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 2xxx: Каналы доставки ===
    ChannelClosed = 2000,
    ChannelEmpty = 2001,

    // === 3xxx: Конфигурация ===
    ConfigLoadFailed = 3000,
    InvalidConfig = 3001,

    // === 4xxx: Логирование ===
    LoggingInitFailed = 4000,
    InvalidLogDirective = 4001,
}

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }
}

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

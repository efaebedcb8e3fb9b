use std::sync::Arc;

use bytes::Bytes;

use super::Event;

/// Готовое событие: имя плюс произвольная бинарная нагрузка.
///
/// Клонирование дешёвое: имя лежит в `Arc<str>`, нагрузка в [`Bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub name: Arc<str>,
    pub payload: Bytes,
}

impl Message {
    pub fn new(
        name: impl Into<Arc<str>>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Событие без нагрузки.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, Bytes::new())
    }
}

impl Event for Message {
    fn name(&self) -> &str {
        &self.name
    }
}

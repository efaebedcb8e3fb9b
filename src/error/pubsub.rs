use std::any::Any;

use pubrelay_error::{ErrorExt, StatusCode};
use thiserror::Error;
use tokio::sync::mpsc;

/// Ошибка регистрации потребителя.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    /// Принимающая сторона канала уже закрыта: доставлять некуда.
    #[error("subscribe using closed channel (consumer #{0})")]
    ClosedChannel(u64),
}

/// Ошибка при ожидании события в `Inbox`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecvError {
    #[error("channel is closed")]
    Closed,
}

/// Ошибка при неблокирующем получении события.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TryRecvError {
    #[error("no events available")]
    Empty,

    #[error("channel is closed")]
    Closed,
}

// === Преобразования ===

impl From<mpsc::error::TryRecvError> for TryRecvError {
    fn from(err: mpsc::error::TryRecvError) -> Self {
        match err {
            mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        }
    }
}

impl ErrorExt for SubscribeError {
    fn status_code(&self) -> StatusCode {
        StatusCode::ChannelClosed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ErrorExt for RecvError {
    fn status_code(&self) -> StatusCode {
        StatusCode::ChannelClosed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ErrorExt for TryRecvError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Empty => StatusCode::ChannelEmpty,
            Self::Closed => StatusCode::ChannelClosed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

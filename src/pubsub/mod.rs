//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Этот модуль реализует внутрипроцессный relay событий: производители
//! публикуют именованные события, потребители регистрируют интерес к части
//! имён (или ко всем сразу) через собственный ограниченный канал, а relay
//! раздаёт каждое событие всем подходящим потребителям, не блокируя
//! производителя.
//!
//! - `event`: трейт [`Event`] и его реализации для `Arc`/`Box`/строк.
//! - `message`: готовое событие [`Message`] с бинарной нагрузкой.
//! - `consumer`: канал доставки: handle [`Consumer`] и приёмник [`Inbox`].
//! - `registry` (приватный): состояние подписок и счётчики ссылок.
//! - `relay`: [`Relay`] - подписка, публикация, отписка, диагностика.
//!
//! ```text
//!    publish(ev)
//!        │              (клон на каждого потребителя, try_send)
//!        ├──────────► [буфер A: "alert"] ─► Inbox A
//!        ├──────────► [буфер B: все]     ─► Inbox B
//!        └─ x         [буфер C: "info"]     (имя не совпало)
//! ```

mod consumer;
mod event;
mod message;
mod registry;
mod relay;

pub use consumer::{Consumer, ConsumerId, Inbox};
pub use event::{Event, SharedEvent};
pub use message::Message;
pub use registry::Interest;
pub use relay::{Relay, RelayStats};

//! # pubrelay
//!
//! Внутрипроцессный publish/subscribe relay: производители публикуют
//! именованные события, потребители подписываются на часть имён (или на
//! все) через собственный ограниченный канал, а relay раздаёт каждое
//! событие подходящим потребителям, никогда не блокируя производителя.
//!
//! ```
//! use pubrelay::{Consumer, Message, Relay};
//!
//! let relay = Relay::new();
//!
//! let (alerts, alert_inbox) = Consumer::bounded(8);
//! let (everything, all_inbox) = Consumer::bounded(8);
//! relay.subscribe(&alerts, &[&"alert"]);
//! relay.subscribe_all(&everything);
//!
//! relay.publish(Message::new("alert", "disk full"));
//! relay.publish(Message::named("info"));
//!
//! assert_eq!(alert_inbox.len(), 1);
//! assert_eq!(all_inbox.len(), 2);
//! assert_eq!(relay.ref_count("alert"), 1);
//!
//! relay.unsubscribe(&alerts);
//! assert_eq!(relay.ref_count("alert"), 0);
//! ```

/// Configuration loading: relay defaults, logging, env overrides.
pub mod config;
/// Error types of the relay, config and logging layers.
pub mod error;
/// tracing-based logging setup.
pub mod logging;
/// Pub/Sub: Relay, Consumer, Inbox, Event, Message.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Configuration.
pub use config::{RelayConfig, Settings};
/// Operation errors.
pub use error::{ConfigError, LoggingError, RecvError, SubscribeError, TryRecvError};
/// Logging.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Pub/Sub API.
pub use pubsub::{
    Consumer, ConsumerId, Event, Inbox, Interest, Message, Relay, RelayStats, SharedEvent,
};
/// Status codes and the error extension trait.
pub use pubrelay_error::{ErrorExt, StatusCode};

//! Логирование на базе `tracing`.
//!
//! Внутри крейта используются только макросы `tracing`. Установить
//! глобальный subscriber - дело приложения: [`init_logging`] делает это по
//! [`LoggingConfig`].

#[cfg(test)]
pub(crate) mod capture;
pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig};
pub use filters::build_filter;
pub use formatter::build_layer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::LoggingError;

/// Устанавливает глобальный tracing subscriber с выводом в stdout.
///
/// Возвращает `LoggingError::AlreadyInitialized`, если subscriber уже
/// установлен.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter = build_filter(config)?;
    let layer = build_layer(config, std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .map_err(|err| LoggingError::AlreadyInitialized(err.to_string()))?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = config.format.as_str(),
        "logging initialized"
    );
    Ok(())
}

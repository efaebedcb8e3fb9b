use std::path::Path;

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{logging::LoggingConfig, ConfigError, ErrorExt};

/// Префикс переменных окружения: `PUBRELAY_RELAY__DEFAULT_CAPACITY=128`.
pub const ENV_PREFIX: &str = "PUBRELAY";

/// Настройки самого relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Ёмкость буфера для каналов, созданных через `Relay::consumer()`.
    pub default_capacity: usize,
    /// Писать отброшенные доставки на уровне `debug` вместо `trace`.
    pub log_drops: bool,
}

/// Полная конфигурация: relay + логирование.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_capacity: 64,
            log_drops: false,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "relay.default_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Settings {
    /// Загружает настройки: значения по умолчанию + переменные окружения.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Загружает настройки с необязательным файлом между значениями по
    /// умолчанию и окружением. Формат файла определяется по расширению.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::build(path).inspect_err(|err| {
            warn!(
                status = %err.status_code(),
                kind = err.type_name(),
                error = %err,
                "settings rejected"
            );
        })
    }

    fn build(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            // Добавляем значения по умолчанию
            .set_default(
                "relay.default_capacity",
                defaults.relay.default_capacity as u64,
            )?
            .set_default("relay.log_drops", defaults.relay.log_drops)?
            .set_default("logging.level", defaults.logging.level.as_str())?
            .set_default("logging.format", defaults.logging.format.as_str())?
            .set_default("logging.with_ansi", defaults.logging.with_ansi)?
            .set_default("logging.with_target", defaults.logging.with_target)?
            .set_default("logging.with_thread_ids", defaults.logging.with_thread_ids)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Переменные окружения с префиксом PUBRELAY_ перекрывают всё остальное
        let cfg = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relay.validate()?;
        self.logging
            .validate()
            .map_err(|err| ConfigError::InvalidValue {
                key: "logging.level",
                reason: err.to_string(),
            })
    }
}

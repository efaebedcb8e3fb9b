use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    EnvFilter,
};

use crate::LoggingError;

/// Формат вывода логов.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Одна строка на событие.
    #[default]
    Compact,
    /// Многострочный человекочитаемый вывод.
    Pretty,
    /// JSON, по объекту на строку.
    Json,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Директива фильтра: `info`, `pubrelay=debug,warn` и т.п.
    /// `RUST_LOG`, если задана, имеет приоритет.
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Директива для `EnvFilter`.
    pub fn build_filter_directive(&self) -> String {
        self.level.trim().to_string()
    }

    /// Проверяет директиву и собирает из неё `EnvFilter`.
    ///
    /// `EnvFilter` принимает любое голое слово как имя target, поэтому
    /// каждая часть без `=` обязана быть уровнем (`info`, `off`, ...), а
    /// части вида `target=level` разбираются как [`Directive`].
    pub fn validate(&self) -> Result<(), LoggingError> {
        self.env_filter().map(drop)
    }

    pub(crate) fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let directive = self.build_filter_directive();
        let invalid = |reason: String| LoggingError::InvalidDirective {
            directive: directive.clone(),
            reason,
        };

        for part in directive.split(',').map(str::trim) {
            if part.is_empty() {
                return Err(invalid("empty directive".to_string()));
            }
            if part.contains('=') {
                part.parse::<Directive>()
                    .map_err(|err| invalid(format!("`{part}`: {err}")))?;
            } else {
                part.parse::<LevelFilter>()
                    .map_err(|err| invalid(format!("`{part}` is not a level: {err}")))?;
            }
        }

        EnvFilter::try_new(&directive).map_err(|err| invalid(err.to_string()))
    }
}

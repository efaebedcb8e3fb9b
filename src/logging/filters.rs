use tracing_subscriber::EnvFilter;

use crate::{logging::config::LoggingConfig, LoggingError};

/// Собирает фильтр: `RUST_LOG`, если задана, иначе директива из конфига
/// (проверенная [`LoggingConfig::validate`]).
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    // Если RUST_LOG задана - используем её.
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return Ok(env_filter);
    }

    config.env_filter()
}

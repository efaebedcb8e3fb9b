pub mod pubsub;
pub mod settings;

// Публичный экспорт всех типов ошибок из вложенных модулей, чтобы упростить
// доступ к ним из внешнего кода.
pub use pubsub::*;
pub use settings::*;

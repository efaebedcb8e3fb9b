pub mod ext;
pub mod status_code;

// Публичный реэкспорт, чтобы внешний код мог писать просто
// `pubrelay_error::{ErrorExt, StatusCode}`.
pub use ext::*;
pub use status_code::*;

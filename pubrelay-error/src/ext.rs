use std::{any::Any, error::Error};

use crate::StatusCode;

/// Общие сведения об ошибке relay (object-safe): код статуса и короткое
/// имя типа для полей логов.
pub trait ErrorExt: Error + Send + Sync + 'static {
    fn status_code(&self) -> StatusCode;

    /// Возвращает ошибку как [`Any`] для downcast из `&dyn ErrorExt`.
    fn as_any(&self) -> &dyn Any;

    /// Короткое имя типа ошибки, без пути модуля.
    fn type_name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

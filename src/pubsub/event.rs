use std::sync::Arc;

/// Событие, которое relay развозит потребителям.
///
/// Relay смотрит только на [`Event::name`]: это ключ маршрутизации.
/// Событие с пустым именем никогда не регистрируется и не доставляется.
///
/// [`Event::on_deliver`] relay не вызывает никогда. Это реакция, которую
/// потребитель запускает сам после получения (см.
/// [`Inbox::recv_and_deliver`](super::Inbox::recv_and_deliver)).
///
/// Если relay развозит сам тип события (а не [`SharedEvent`]), его `Clone`
/// и `Drop` выполняются под блокировкой relay и не должны к нему
/// обращаться.
pub trait Event: Send + Sync + 'static {
    /// Имя события (ключ маршрутизации).
    fn name(&self) -> &str;

    /// Реакция на доставку. По умолчанию ничего не делает.
    fn on_deliver(&self) {}
}

/// Событие с динамическим типом: удобный тип элемента канала, когда
/// разные производители публикуют разные типы событий.
pub type SharedEvent = Arc<dyn Event>;

impl<T: Event + ?Sized> Event for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_deliver(&self) {
        (**self).on_deliver()
    }
}

impl<T: Event + ?Sized> Event for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_deliver(&self) {
        (**self).on_deliver()
    }
}

/// Строка сама по себе - событие без нагрузки. Удобно для подписки по имени.
impl Event for &'static str {
    fn name(&self) -> &str {
        self
    }
}

impl Event for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

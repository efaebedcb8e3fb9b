use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{
    consumer::Delivery, registry::Registry, Consumer, ConsumerId, Event, Inbox, Interest,
    SharedEvent,
};
use crate::{config::RelayConfig, SubscribeError};

/// Внутрипроцессный pub/sub relay.
///
/// Хранит реестр `потребитель -> интересы` и глобальные счётчики ссылок на
/// имена событий. Все операции берут один и тот же `Mutex` на всё время
/// работы, но внутри него нет ни ожиданий, ни I/O: доставка - это
/// неблокирующий `try_send`, а логирование выполняется уже после
/// освобождения блокировки.
///
/// Поддерживает:
/// - Подписку на конкретные имена и wildcard-подписку (без имён)
/// - Неблокирующую fan-out доставку с отбрасыванием при полном буфере
/// - Полную и частичную отписку
/// - Диагностику: счётчики ссылок, интересы, статистику доставки
///
/// Relay не синглтон: создайте экземпляр и раздайте его через `Arc`.
///
/// # Блокировка и пользовательский код
/// `publish` клонирует событие для каждого потребителя под блокировкой
/// реестра, и там же уничтожается клон, который не влез в буфер. Поэтому
/// `Clone` и `Drop` типа `E` не должны обращаться к этому же relay:
/// `Mutex` нереентерабельный, и такой вызов зависнет. С [`SharedEvent`]
/// под блокировкой меняется только счётчик `Arc`, а `Drop` самого
/// события выполняется уже после её освобождения.
pub struct Relay<E = SharedEvent> {
    registry: Mutex<Registry<E>>,
    config: RelayConfig,
    counters: Counters,
}

/// Снимок статистики relay.
///
/// Только диагностика: доставка от этих чисел не зависит.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Количество вызовов `publish` с непустым именем.
    pub published: u64,
    /// Количество вызовов `publish` с пустым именем (проигнорированы).
    pub ignored: u64,
    /// Успешные доставки (по одной на потребителя).
    pub delivered: u64,
    /// Отброшено из-за полного буфера потребителя.
    pub dropped_full: u64,
    /// Отброшено из-за закрытого канала потребителя.
    pub dropped_closed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    ignored: AtomicU64,
    delivered: AtomicU64,
    dropped_full: AtomicU64,
    dropped_closed: AtomicU64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<E: Event + Clone> Relay<E> {
    /// Создаёт relay с конфигурацией по умолчанию.
    pub fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    pub fn with_config(config: RelayConfig) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            config,
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Создаёт канал доставки с ёмкостью из `RelayConfig::default_capacity`.
    ///
    /// Канал ещё не подписан: передайте handle в [`Relay::subscribe`].
    pub fn consumer(&self) -> (Consumer<E>, Inbox<E>) {
        Consumer::bounded(self.config.default_capacity)
    }

    /// Подписывает `consumer` на перечисленные события.
    ///
    /// - Без событий потребитель получает **все** события (wildcard).
    /// - Повторная подписка на то же имя ничего не меняет.
    /// - Повторный вызов с новыми именами расширяет набор интересов.
    /// - События с пустым именем пропускаются.
    ///
    /// Relay не блокируется на отправке: потребитель сам должен выбрать
    /// буфер, достаточный для ожидаемого потока событий.
    ///
    /// # Panics
    /// Если принимающая сторона канала уже закрыта. Это ошибка
    /// программиста; для проверки без паники используйте
    /// [`Relay::try_subscribe`].
    pub fn subscribe(
        &self,
        consumer: &Consumer<E>,
        events: &[&dyn Event],
    ) {
        if let Err(err) = self.try_subscribe(consumer, events) {
            panic!("relay: {err}");
        }
    }

    /// Wildcard-подписка: то же, что `subscribe(consumer, &[])`.
    pub fn subscribe_all(
        &self,
        consumer: &Consumer<E>,
    ) {
        self.subscribe(consumer, &[]);
    }

    /// Как [`Relay::subscribe`], но вместо паники возвращает ошибку.
    pub fn try_subscribe(
        &self,
        consumer: &Consumer<E>,
        events: &[&dyn Event],
    ) -> Result<(), SubscribeError> {
        if consumer.is_closed() {
            return Err(SubscribeError::ClosedChannel(consumer.id().get()));
        }

        let added = self
            .registry
            .lock()
            .subscribe(consumer, events.iter().map(|e| e.name()));

        debug!(
            consumer = %consumer.id(),
            requested = events.len(),
            added,
            "consumer subscribed"
        );
        Ok(())
    }

    /// Публикует событие всем подходящим потребителям.
    ///
    /// Событие с пустым именем игнорируется. Каждый потребитель получает
    /// свой клон события; если его буфер полон (или канал закрыт), событие
    /// для него молча отбрасывается. Метод никогда не ждёт и не повторяет
    /// попыток.
    ///
    /// Клонирование выполняется под блокировкой реестра (см. раздел о
    /// блокировке у [`Relay`]).
    pub fn publish(
        &self,
        event: E,
    ) {
        let name = event.name();
        if name.is_empty() {
            self.counters.ignored.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.counters.published.fetch_add(1, Ordering::Relaxed);

        let mut dropped: Vec<(ConsumerId, Delivery)> = Vec::new();
        let mut delivered = 0u64;
        {
            let registry = self.registry.lock();
            for consumer in registry.matching(name) {
                match consumer.try_deliver(event.clone()) {
                    Delivery::Sent => delivered += 1,
                    miss => dropped.push((consumer.id(), miss)),
                }
            }
        }

        self.counters
            .delivered
            .fetch_add(delivered, Ordering::Relaxed);
        for (id, miss) in dropped {
            let reason = match miss {
                Delivery::Full => {
                    self.counters.dropped_full.fetch_add(1, Ordering::Relaxed);
                    "full"
                }
                _ => {
                    self.counters.dropped_closed.fetch_add(1, Ordering::Relaxed);
                    "closed"
                }
            };
            if self.config.log_drops {
                debug!(consumer = %id, event = name, reason, "event dropped");
            } else {
                trace!(consumer = %id, event = name, reason, "event dropped");
            }
        }
    }

    /// Полностью отписывает потребителя.
    ///
    /// Снимает по одной ссылке с каждого имени из его интересов и удаляет
    /// запись. После возврата потребитель больше ничего не получит.
    /// Неизвестный потребитель - no-op.
    pub fn unsubscribe(
        &self,
        consumer: &Consumer<E>,
    ) {
        let removed = self.registry.lock().unsubscribe(consumer.id());
        if let Some(names) = removed {
            debug!(consumer = %consumer.id(), names, "consumer unsubscribed");
        }
    }

    /// Снимает с потребителя только перечисленные события.
    ///
    /// Если интересов не осталось, потребитель удаляется целиком, как при
    /// [`Relay::unsubscribe`]: иначе он стал бы wildcard-потребителем.
    /// Wildcard-потребитель этим методом не меняется.
    pub fn unsubscribe_events(
        &self,
        consumer: &Consumer<E>,
        events: &[&dyn Event],
    ) {
        let removal = self
            .registry
            .lock()
            .unsubscribe_names(consumer.id(), events.iter().map(|e| e.name()));

        if let Some(removal) = removal {
            debug!(
                consumer = %consumer.id(),
                names = removal.names,
                removed = removal.dropped_entry,
                "consumer interest narrowed"
            );
        }
    }

    /// Количество потребителей, явно подписанных на `name`.
    ///
    /// Wildcard-потребители здесь не учитываются, поэтому число может быть
    /// меньше реального количества получателей.
    pub fn ref_count(
        &self,
        name: &str,
    ) -> u64 {
        self.registry.lock().ref_count(name)
    }

    /// Копия всей таблицы счётчиков ссылок.
    pub fn ref_counts(&self) -> BTreeMap<String, u64> {
        self.registry.lock().ref_counts()
    }

    /// Интересы потребителя или `None`, если он не подписан.
    pub fn interest(
        &self,
        consumer: &Consumer<E>,
    ) -> Option<Interest> {
        self.registry.lock().interest(consumer.id())
    }

    pub fn is_subscribed(
        &self,
        consumer: &Consumer<E>,
    ) -> bool {
        self.registry.lock().contains(consumer.id())
    }

    pub fn consumer_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    /// Удаляет всех потребителей и обнуляет счётчики ссылок.
    pub fn clear(&self) {
        let removed = self.registry.lock().clear();
        debug!(consumers = removed, "relay cleared");
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            published: self.counters.published.load(Ordering::Relaxed),
            ignored: self.counters.ignored.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped_full: self.counters.dropped_full.load(Ordering::Relaxed),
            dropped_closed: self.counters.dropped_closed.load(Ordering::Relaxed),
        }
    }
}

impl<E: Event + Clone> Default for Relay<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
        Arc, Weak,
    };

    use rstest::rstest;
    use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt};

    use super::*;
    use crate::{
        logging::{build_layer, capture::VecMakeWriter, LoggingConfig},
        pubsub::Message,
        TryRecvError,
    };

    #[test]
    fn test_publish_and_receive() {
        let relay = Relay::new();
        let (c, mut inbox) = Consumer::bounded(4);
        relay.subscribe(&c, &[&"chan"]);

        relay.publish(Message::new("chan", "x"));

        let msg = inbox.try_recv().expect("no message");
        assert_eq!(msg.name(), "chan");
        assert_eq!(msg.payload.as_ref(), b"x");
        assert_eq!(
            relay.stats(),
            RelayStats {
                published: 1,
                delivered: 1,
                ..Default::default()
            }
        );
    }

    /// Тест проверяет, что публикация без подписчиков просто считается.
    #[test]
    fn test_publish_without_consumers() {
        let relay = Relay::<Message>::new();
        relay.publish(Message::named("nochan"));

        assert_eq!(relay.stats().published, 1);
        assert_eq!(relay.stats().delivered, 0);
        assert!(relay.is_empty());
    }

    #[test]
    fn test_empty_name_is_ignored() {
        let relay = Relay::new();
        let (c, mut inbox) = Consumer::bounded(4);
        relay.subscribe_all(&c);

        relay.publish(Message::named(""));

        assert_eq!(inbox.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(relay.stats().ignored, 1);
        assert_eq!(relay.stats().published, 0);
    }

    /// Тест проверяет, что полный буфер одного потребителя не мешает
    /// другому.
    #[test]
    fn test_full_consumer_does_not_affect_others() {
        let relay = Relay::new();
        let (slow, mut slow_inbox) = Consumer::bounded(1);
        let (fast, mut fast_inbox) = Consumer::bounded(8);
        relay.subscribe(&slow, &[&"tick"]);
        relay.subscribe(&fast, &[&"tick"]);

        for _ in 0..3 {
            relay.publish(Message::named("tick"));
        }

        assert_eq!(slow_inbox.len(), 1);
        assert_eq!(fast_inbox.len(), 3);
        let stats = relay.stats();
        assert_eq!(stats.delivered, 4);
        assert_eq!(stats.dropped_full, 2);

        slow_inbox.try_recv().unwrap();
        fast_inbox.try_recv().unwrap();
    }

    /// Тест проверяет, что закрытый после подписки канал не ломает
    /// публикацию и не удаляется из реестра сам.
    #[test]
    fn test_closed_consumer_is_counted_not_pruned() {
        let relay = Relay::new();
        let (c, inbox) = Consumer::bounded(1);
        relay.subscribe(&c, &[&"a"]);
        drop(inbox);

        relay.publish(Message::named("a"));

        assert_eq!(relay.stats().dropped_closed, 1);
        assert!(relay.is_subscribed(&c));
        assert_eq!(relay.ref_count("a"), 1);
    }

    #[test]
    #[should_panic(expected = "subscribe using closed channel")]
    fn test_subscribe_closed_channel_panics() {
        let relay = Relay::<Message>::new();
        let (c, inbox) = Consumer::bounded(1);
        drop(inbox);
        relay.subscribe(&c, &[&"a"]);
    }

    #[test]
    fn test_try_subscribe_closed_channel() {
        let relay = Relay::<Message>::new();
        let (c, inbox) = Consumer::bounded(1);
        drop(inbox);

        let err = relay.try_subscribe(&c, &[]).unwrap_err();
        assert_eq!(err, SubscribeError::ClosedChannel(c.id().get()));
        assert!(!relay.is_subscribed(&c));
    }

    #[test]
    fn test_consumer_uses_configured_capacity() {
        let relay = Relay::<Message>::with_config(RelayConfig {
            default_capacity: 3,
            ..Default::default()
        });
        let (c, _inbox) = relay.consumer();
        assert_eq!(c.capacity(), 3);
        assert_eq!(relay.config().default_capacity, 3);
    }

    /// Тест проверяет работу с `Arc<dyn Event>` разных конкретных типов.
    #[test]
    fn test_shared_events_of_different_types() {
        struct Alert;
        impl Event for Alert {
            fn name(&self) -> &str {
                "alert"
            }
        }

        let relay: Relay = Relay::new();
        let (c, mut inbox) = Consumer::bounded(4);
        relay.subscribe(&c, &[&Alert, &"info"]);

        relay.publish(Arc::new(Alert));
        relay.publish(Arc::new(Message::named("info")));
        relay.publish(Arc::new(Message::named("debug")));

        assert_eq!(inbox.try_recv().unwrap().name(), "alert");
        assert_eq!(inbox.try_recv().unwrap().name(), "info");
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn test_clear_resets_registry() {
        let relay = Relay::<Message>::new();
        let (a, _ia) = Consumer::bounded(1);
        let (b, _ib) = Consumer::bounded(1);
        relay.subscribe(&a, &[&"x"]);
        relay.subscribe_all(&b);

        relay.clear();

        assert_eq!(relay.consumer_count(), 0);
        assert!(relay.ref_counts().is_empty());
    }

    /// Тест проверяет переключатель `log_drops`: отброшенная доставка видна
    /// на уровне `debug` только когда он включён.
    #[rstest]
    #[case::enabled(true)]
    #[case::disabled(false)]
    fn test_log_drops_switches_level(#[case] log_drops: bool) {
        let writer = VecMakeWriter::default();
        let cfg = LoggingConfig {
            with_ansi: false,
            ..Default::default()
        };
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::DEBUG)
            .with(build_layer(&cfg, writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let relay = Relay::<Message>::with_config(RelayConfig {
                log_drops,
                ..Default::default()
            });
            let (c, _inbox) = Consumer::bounded(1);
            relay.subscribe(&c, &[&"tick"]);
            relay.publish(Message::named("tick"));
            relay.publish(Message::named("tick"));
            assert_eq!(relay.stats().dropped_full, 1);
        });

        let out = writer.contents();
        assert!(out.contains("consumer subscribed"), "got: {out}");
        assert_eq!(out.contains("event dropped"), log_drops, "got: {out}");
    }

    /// Событие, которое при уничтожении обращается к relay.
    struct Reentrant {
        relay: Weak<Relay>,
        seen: Arc<AtomicUsize>,
    }

    impl Event for Reentrant {
        fn name(&self) -> &str {
            "reentrant"
        }
    }

    impl Drop for Reentrant {
        fn drop(&mut self) {
            if let Some(relay) = self.relay.upgrade() {
                self.seen
                    .store(relay.consumer_count() + 1, AtomicOrdering::SeqCst);
            }
        }
    }

    /// Тест проверяет, что с `SharedEvent` `Drop` события выполняется вне
    /// блокировки: обращение к relay из него не зависает, даже когда клон
    /// отброшен из-за полного буфера.
    #[test]
    fn test_shared_event_drop_runs_outside_lock() {
        let relay: Arc<Relay> = Arc::new(Relay::new());
        let seen = Arc::new(AtomicUsize::new(0));
        let (c, mut inbox) = Consumer::bounded(1);
        relay.subscribe_all(&c);
        relay.publish(Arc::new(Message::named("filler")));

        relay.publish(Arc::new(Reentrant {
            relay: Arc::downgrade(&relay),
            seen: seen.clone(),
        }));

        assert_eq!(relay.stats().dropped_full, 1);
        assert_eq!(seen.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(inbox.try_recv().unwrap().name(), "filler");
    }
}

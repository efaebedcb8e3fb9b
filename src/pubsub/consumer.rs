use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::sync::mpsc;

use super::Event;
use crate::{RecvError, TryRecvError};

/// Счётчик для генерации уникальных идентификаторов потребителей.
static NEXT_CONSUMER_ID: AtomicU64 = AtomicU64::new(1);

/// Непрозрачный идентификатор канала доставки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(u64);

/// Результат неблокирующей попытки доставки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    Full,
    Closed,
}

/// Отправляющая сторона канала доставки.
///
/// Это и есть "consumer handle": его передают в
/// [`Relay::subscribe`](super::Relay::subscribe) и
/// [`Relay::unsubscribe`](super::Relay::unsubscribe). Клоны одного handle
/// равны между собой и указывают на один и тот же канал.
///
/// Ёмкость буфера выбирает потребитель при создании, relay её не меняет.
pub struct Consumer<E> {
    id: ConsumerId,
    tx: mpsc::Sender<E>,
}

/// Принимающая сторона канала доставки.
///
/// Закрытие или drop `Inbox` не отписывает потребителя: relay просто
/// перестаёт доставлять в закрытый канал. Отписка делается явно.
pub struct Inbox<E> {
    id: ConsumerId,
    rx: mpsc::Receiver<E>,
}

impl ConsumerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<E> Consumer<E> {
    /// Создаёт канал доставки с буфером на `capacity` событий.
    ///
    /// Ёмкость 0 поднимается до 1.
    pub fn bounded(capacity: usize) -> (Consumer<E>, Inbox<E>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = ConsumerId(NEXT_CONSUMER_ID.fetch_add(1, Ordering::Relaxed));
        (Consumer { id, tx }, Inbox { id, rx })
    }

    pub fn id(&self) -> ConsumerId {
        self.id
    }

    /// Размер буфера, выбранный при создании.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Проверяет, закрыта ли принимающая сторона.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Неблокирующая отправка: при полном буфере событие отбрасывается.
    pub(crate) fn try_deliver(
        &self,
        event: E,
    ) -> Delivery {
        match self.tx.try_send(event) {
            Ok(()) => Delivery::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

impl<E> Inbox<E> {
    pub fn id(&self) -> ConsumerId {
        self.id
    }

    /// Асинхронно ожидает следующее событие.
    ///
    /// # Возвращает
    /// - `Ok(E)` при успешном получении
    /// - `Err(RecvError::Closed)` если канал закрыт и буфер пуст
    pub async fn recv(&mut self) -> Result<E, RecvError> {
        self.rx.recv().await.ok_or(RecvError::Closed)
    }

    /// Пытается получить событие без ожидания.
    ///
    /// # Возвращает
    /// - `Ok(E)` если событие уже в буфере
    /// - `Err(TryRecvError::Empty)` если буфер пуст
    /// - `Err(TryRecvError::Closed)` если канал закрыт и буфер пуст
    pub fn try_recv(&mut self) -> Result<E, TryRecvError> {
        self.rx.try_recv().map_err(Into::into)
    }

    /// Блокирующее получение для потоков вне async runtime.
    ///
    /// Паникует, если вызвано из контекста tokio runtime.
    pub fn blocking_recv(&mut self) -> Result<E, RecvError> {
        self.rx.blocking_recv().ok_or(RecvError::Closed)
    }

    /// Закрывает канал: новые события больше не принимаются, уже
    /// буферизованные можно дочитать.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Количество событий в буфере.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<E: Event> Inbox<E> {
    /// Получает следующее событие и запускает его реакцию
    /// [`Event::on_deliver`].
    pub async fn recv_and_deliver(&mut self) -> Result<E, RecvError> {
        let event = self.recv().await?;
        event.on_deliver();
        Ok(event)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl<E> Clone for Consumer<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
        }
    }
}

impl<E> PartialEq for Consumer<E> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for Consumer<E> {}

impl<E> Hash for Consumer<E> {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.id.hash(state);
    }
}

impl<E> fmt::Debug for Consumer<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<E> fmt::Debug for Inbox<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Inbox")
            .field("id", &self.id)
            .field("len", &self.len())
            .finish()
    }
}

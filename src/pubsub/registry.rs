//! Состояние подписок: кто чем интересуется и сколько у каждого имени
//! слушателей.
//!
//! `Registry` - голая структура данных без блокировок. Синхронизацию
//! обеспечивает [`Relay`](super::Relay), который держит её под одним
//! `Mutex`.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use super::{Consumer, ConsumerId};

/// Снимок интересов потребителя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interest {
    /// Подписка без имён: получает все события.
    All,
    /// Получает только перечисленные события.
    Only(BTreeSet<String>),
}

impl Interest {
    /// Проверяет, будет ли событие `name` доставлено этому потребителю.
    pub fn matches(
        &self,
        name: &str,
    ) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }
}

struct Entry<E> {
    consumer: Consumer<E>,
    /// Пустое множество означает wildcard.
    interest: HashSet<Arc<str>>,
}

impl<E> Entry<E> {
    fn matches(
        &self,
        name: &str,
    ) -> bool {
        self.interest.is_empty() || self.interest.contains(name)
    }
}

/// Результат частичной отписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Removal {
    /// Сколько имён было снято с потребителя.
    pub names: usize,
    /// Запись потребителя удалена целиком.
    pub dropped_entry: bool,
}

pub(crate) struct Registry<E> {
    consumers: HashMap<ConsumerId, Entry<E>>,
    /// Имя события -> число потребителей, явно подписанных на него.
    /// Wildcard-потребители здесь не учитываются.
    refs: HashMap<Arc<str>, u64>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<E> Registry<E> {
    pub fn new() -> Self {
        Self {
            consumers: HashMap::new(),
            refs: HashMap::new(),
        }
    }

    /// Регистрирует потребителя (если его ещё нет) и добавляет имена в его
    /// интересы.
    ///
    /// Пустые имена и уже известные этому потребителю имена пропускаются.
    /// Возвращает количество реально добавленных имён.
    pub fn subscribe<'a, I>(
        &mut self,
        consumer: &Consumer<E>,
        names: I,
    ) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entry = self
            .consumers
            .entry(consumer.id())
            .or_insert_with(|| Entry {
                consumer: consumer.clone(),
                interest: HashSet::new(),
            });

        let mut added = 0;
        for name in names {
            if name.is_empty() || entry.interest.contains(name) {
                continue;
            }
            let key = intern(&self.refs, name);
            entry.interest.insert(key.clone());
            *self.refs.entry(key).or_insert(0) += 1;
            added += 1;
        }
        added
    }

    /// Удаляет потребителя целиком, снимая по одной ссылке с каждого его
    /// имени. Возвращает `None`, если потребитель не зарегистрирован.
    pub fn unsubscribe(
        &mut self,
        id: ConsumerId,
    ) -> Option<usize> {
        let mut entry = self.consumers.remove(&id)?;
        let names = entry.interest.len();
        for name in entry.interest.drain() {
            release(&mut self.refs, &name);
        }
        Some(names)
    }

    /// Снимает с потребителя только перечисленные имена.
    ///
    /// Если после этого интересов не осталось, запись удаляется целиком:
    /// иначе потребитель молча превратился бы в wildcard. Wildcard-потребитель
    /// не меняется вовсе.
    pub fn unsubscribe_names<'a, I>(
        &mut self,
        id: ConsumerId,
        names: I,
    ) -> Option<Removal>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entry = self.consumers.get_mut(&id)?;
        let mut removed = 0;
        for name in names {
            if entry.interest.remove(name) {
                release(&mut self.refs, name);
                removed += 1;
            }
        }

        let dropped_entry = removed > 0 && entry.interest.is_empty();
        if dropped_entry {
            self.consumers.remove(&id);
        }

        Some(Removal {
            names: removed,
            dropped_entry,
        })
    }

    /// Потребители, которым надо доставить событие `name`.
    pub fn matching<'s>(
        &'s self,
        name: &'s str,
    ) -> impl Iterator<Item = &'s Consumer<E>> + 's {
        self.consumers
            .values()
            .filter(move |entry| entry.matches(name))
            .map(|entry| &entry.consumer)
    }

    pub fn ref_count(
        &self,
        name: &str,
    ) -> u64 {
        self.refs.get(name).copied().unwrap_or(0)
    }

    pub fn ref_counts(&self) -> BTreeMap<String, u64> {
        self.refs
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect()
    }

    pub fn interest(
        &self,
        id: ConsumerId,
    ) -> Option<Interest> {
        let entry = self.consumers.get(&id)?;
        if entry.interest.is_empty() {
            return Some(Interest::All);
        }
        Some(Interest::Only(
            entry.interest.iter().map(|n| n.to_string()).collect(),
        ))
    }

    pub fn contains(
        &self,
        id: ConsumerId,
    ) -> bool {
        self.consumers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Удаляет всех потребителей и все счётчики.
    pub fn clear(&mut self) -> usize {
        let n = self.consumers.len();
        self.consumers.clear();
        self.refs.clear();
        n
    }
}

/// Одно `Arc<str>` на имя: ключ в `refs` и элементы интересов делят одну
/// аллокацию.
fn intern(
    refs: &HashMap<Arc<str>, u64>,
    name: &str,
) -> Arc<str> {
    match refs.get_key_value(name) {
        Some((key, _)) => key.clone(),
        None => Arc::from(name),
    }
}

/// Снимает одну ссылку с имени и удаляет его из таблицы на нуле.
fn release(
    refs: &mut HashMap<Arc<str>, u64>,
    name: &str,
) {
    if let Some(count) = refs.get_mut(name) {
        *count -= 1;
        if *count == 0 {
            refs.remove(name);
        }
    }
}

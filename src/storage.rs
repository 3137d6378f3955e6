use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use rand::seq::IteratorRandom;

use crate::config::StoreConfig;
use crate::entry::{Entry, Expiry};
use crate::error::VatError;
use crate::glob::GlobPattern;
use crate::notify::{Emitter, Notifier};
use crate::scheduler::{Scheduler, TimerHandle, TimerTask, TokioScheduler};
use crate::value::{Kind, Value};

/// Longest TTL a key can carry, roughly a hundred years.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

pub(crate) struct StoreInner {
    name: String,
    pub(crate) data: DashMap<String, Entry>,
    scheduler: Arc<dyn Scheduler>,
    notifier: Arc<dyn Notifier>,
}

/// An in-process keyspace that announces every change.
///
/// `Store` is a handle: clones share the same keyspace, while two stores
/// built separately share nothing. Every command runs to completion before
/// returning and notifications are emitted only after the change is in
/// place, with no internal lock held.
///
/// ```rust
/// use eventvat::{Kind, Store, Value};
///
/// let store = Store::new();
/// store.set("foo", "hello world!", None);
/// store.set("bar", 42, None);
///
/// assert_eq!(
///     store.mget(&["foo", "bar", "baz"]),
///     vec![Some(Value::from("hello world!")), Some(Value::from(42)), None]
/// );
/// assert_eq!(store.type_of("bar"), Kind::Number);
/// assert_eq!(store.incr("bar"), Some(43.0));
/// ```
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Arc<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Store::with_config(StoreConfig::default())
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let data = DashMap::with_capacity(config.data.len());
        for (key, value) in config.data {
            if !value.is_storable() {
                log::warn!("[store] seeded key {:?} skipped, hash fields must be scalars", key);
                continue;
            }
            data.insert(key, Entry::new(value));
        }

        let notifier = config
            .notifier
            .unwrap_or_else(|| Arc::new(Emitter::new()) as Arc<dyn Notifier>);
        let scheduler = config
            .scheduler
            .unwrap_or_else(|| Arc::new(TokioScheduler::new()) as Arc<dyn Scheduler>);

        log::debug!("[store] {} created with {} seeded keys", config.name, data.len());

        Store {
            inner: Arc::new(StoreInner {
                name: config.name,
                data,
                scheduler,
                notifier,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    /// Cancels every pending expiration without deleting anything. Keys
    /// that had a TTL become persistent.
    pub fn die(&self) {
        let mut cancelled = 0;
        for mut entry in self.inner.data.iter_mut() {
            if let Some(expiry) = entry.expiry.take() {
                self.inner.scheduler.cancel(expiry.handle);
                cancelled += 1;
            }
        }
        log::debug!("[store] {} torn down, {} timers cancelled", self.inner.name, cancelled);
    }

    // Notification helpers.

    /// Emits `"<command> <key>"` with `args`, then `"<command>"` with the key
    /// prepended.
    pub(crate) fn notify(&self, command: &str, key: &str, args: Vec<Value>) {
        self.inner
            .notifier
            .emit(&format!("{} {}", command, key), &args);

        let mut generic = Vec::with_capacity(args.len() + 1);
        generic.push(Value::from(key));
        generic.extend(args);
        self.inner.notifier.emit(command, &generic);
    }

    pub(crate) fn publish(&self, event: &str, args: &[Value]) {
        self.inner.notifier.emit(event, args);
    }

    // Entry lifecycle.

    pub(crate) fn kind_at(&self, key: &str) -> Kind {
        self.inner
            .data
            .get(key)
            .map_or(Kind::None, |entry| entry.value.kind())
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.inner.data.contains_key(key)
    }

    /// Drops the TTL of `key` without notifying. Returns whether one existed.
    pub(crate) fn clear_expiry(&self, key: &str) -> bool {
        let expiry = self
            .inner
            .data
            .get_mut(key)
            .and_then(|mut entry| entry.expiry.take());

        match expiry {
            Some(expiry) => {
                self.inner.scheduler.cancel(expiry.handle);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_entry(&self, key: &str) -> Option<Entry> {
        self.clear_expiry(key);
        self.inner.data.remove(key).map(|(_, entry)| entry)
    }

    /// Stores `entry` at `key`. A displaced entry's timer is cancelled.
    pub(crate) fn replace_entry(&self, key: &str, entry: Entry) {
        self.clear_expiry(key);
        if let Some(displaced) = self.inner.data.insert(key.to_string(), entry) {
            if let Some(expiry) = displaced.expiry {
                self.inner.scheduler.cancel(expiry.handle);
            }
        }
    }

    fn arm(&self, key: &str, delay: Duration) -> bool {
        let Some(deadline) = self.inner.scheduler.now().checked_add(delay) else {
            log::warn!("[expire] deadline of {:?} is not representable", key);
            return false;
        };

        let Some(mut entry) = self.inner.data.get_mut(key) else {
            return false;
        };

        if let Some(previous) = entry.expiry.take() {
            self.inner.scheduler.cancel(previous.handle);
        }

        let weak = Arc::downgrade(&self.inner);
        let owned = key.to_string();
        let task: TimerTask = Box::new(move |handle| {
            if let Some(inner) = weak.upgrade() {
                Store { inner }.fire_expiration(&owned, handle);
            }
        });

        // Scheduled while the entry is locked: the timer cannot fire before
        // its handle is recorded.
        match self.inner.scheduler.schedule(delay, task) {
            Ok(handle) => {
                entry.expiry = Some(Expiry { handle, deadline });
                true
            }
            Err(err) => {
                log::warn!("[expire] cannot schedule expiration of {:?}: {}", key, err);
                false
            }
        }
    }

    fn fire_expiration(&self, key: &str, handle: TimerHandle) {
        let removed = self
            .inner
            .data
            .remove_if(key, |_, entry| entry.armed_with(handle));

        if removed.is_some() {
            log::debug!("[expire] {} expired from {}", key, self.inner.name);
            self.notify("del", key, Vec::new());
        }
    }

    // Key-space commands.

    pub fn del<K: AsRef<str>>(&self, keys: &[K]) -> usize {
        let mut removed = 0;
        for key in keys {
            let key = key.as_ref();
            if self.remove_entry(key).is_some() {
                self.notify("del", key, Vec::new());
                removed += 1;
            }
        }
        removed
    }

    pub fn exists(&self, key: &str) -> bool {
        let exists = self.contains(key);
        self.notify("exists", key, vec![Value::Bool(exists)]);
        exists
    }

    /// Deletes `key` after `seconds`. Replaces any earlier TTL. Fails for a
    /// missing key or a negative or non-finite duration.
    /// A TTL beyond [`MAX_TTL`] is clamped to it.
    pub fn expire(&self, key: &str, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            return false;
        }
        let delay = Duration::try_from_secs_f64(seconds)
            .unwrap_or(MAX_TTL)
            .min(MAX_TTL);
        if !self.arm(key, delay) {
            return false;
        }
        self.notify("expire", key, vec![Value::Number(seconds)]);
        true
    }

    /// Like `expire`, with an absolute unix timestamp in seconds. A
    /// timestamp in the past deletes the key as soon as the scheduler runs.
    pub fn expireat(&self, key: &str, timestamp: i64) -> bool {
        let seconds = timestamp.saturating_sub(unix_now()).max(0);
        if !self.expire(key, seconds as f64) {
            return false;
        }
        self.notify("expireat", key, vec![Value::from(timestamp)]);
        true
    }

    /// Keys matching a Redis glob (`*`, `?`, `[a-z]`, `\x`). The pattern
    /// is not a regular expression: `^foo` matches only the literal key
    /// `^foo`, use `foo*` for a prefix.
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let glob = GlobPattern::new(pattern);
        let keys: Vec<String> = self
            .inner
            .data
            .iter()
            .filter(|entry| glob.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        let listed = keys.iter().map(|k| Value::from(k.as_str())).collect();
        self.publish("keys", &[Value::List(listed), Value::from(pattern)]);
        keys
    }

    /// Moves `key` into `destination`, dropping its TTL. An entry already
    /// at `key` in `destination` is overwritten.
    pub fn move_key(&self, key: &str, destination: &Store) -> bool {
        if Arc::ptr_eq(&self.inner, &destination.inner) || !self.contains(key) {
            return false;
        }

        self.clear_expiry(key);
        let Some(value) = self.inner.data.get(key).map(|entry| entry.value.clone()) else {
            return false;
        };
        destination.replace_entry(key, Entry::new(value));
        self.inner.data.remove(key);

        self.notify("move", key, vec![Value::from(destination.name())]);
        true
    }

    pub fn object(&self, _subcommand: &str) -> Result<Value, VatError> {
        Err(VatError::NotImplemented("object"))
    }

    pub fn persist(&self, key: &str) -> bool {
        if !self.clear_expiry(key) {
            return false;
        }
        self.notify("persist", key, Vec::new());
        true
    }

    pub fn randomkey(&self) -> Option<String> {
        let key = self
            .inner
            .data
            .iter()
            .map(|entry| entry.key().clone())
            .choose(&mut rand::thread_rng());

        self.publish(
            "randomkey",
            &[Value::or_sentinel(key.as_deref().map(Value::from))],
        );
        key
    }

    pub fn rename(&self, old: &str, new: &str) -> bool {
        if !self.contains(old) {
            return false;
        }
        self.relocate(old, new);
        self.notify("rename", old, vec![Value::from(new)]);
        true
    }

    pub fn renamenx(&self, old: &str, new: &str) -> bool {
        if !self.contains(old) || self.contains(new) {
            return false;
        }
        self.relocate(old, new);
        self.notify("renamenx", old, vec![Value::from(new)]);
        true
    }

    fn relocate(&self, old: &str, new: &str) {
        self.clear_expiry(old);
        if old == new {
            return;
        }
        if let Some((_, entry)) = self.inner.data.remove(old) {
            self.replace_entry(new, entry);
        }
    }

    pub fn sort(&self, _key: &str) -> Result<Vec<Value>, VatError> {
        Err(VatError::NotImplemented("sort"))
    }

    pub fn type_of(&self, key: &str) -> Kind {
        self.kind_at(key)
    }

    /// Remaining whole seconds (rounded) before `key` expires, or `-1` when
    /// it has no TTL or does not exist.
    pub fn ttl(&self, key: &str) -> i64 {
        let deadline = self
            .inner
            .data
            .get(key)
            .and_then(|entry| entry.expiry.map(|expiry| expiry.deadline));

        let ttl = match deadline {
            Some(deadline) => remaining_seconds(deadline, self.inner.scheduler.now()),
            None => -1,
        };

        self.notify("ttl", key, vec![Value::from(ttl)]);
        ttl
    }

    // Non-standard commands.

    /// Snapshot of every raw value.
    pub fn dump(&self) -> HashMap<String, Value> {
        let dump: HashMap<String, Value> = self
            .inner
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value.clone()))
            .collect();

        self.publish("dump", &[Value::Hash(dump.clone())]);
        dump
    }

    pub fn dump_string(&self) -> Result<String, VatError> {
        Err(VatError::NotImplemented("dump_string"))
    }

    /// Exchanges the values of two existing keys. Both lose their TTL.
    pub fn swap(&self, a: &str, b: &str) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }

        self.clear_expiry(a);
        self.clear_expiry(b);

        if a != b {
            let Some(b_value) = self.inner.data.get(b).map(|entry| entry.value.clone()) else {
                return false;
            };
            let Some(a_value) = self
                .inner
                .data
                .get_mut(a)
                .map(|mut entry| std::mem::replace(&mut entry.value, b_value))
            else {
                return false;
            };
            if let Some(mut entry) = self.inner.data.get_mut(b) {
                entry.value = a_value;
            }
        }

        self.inner
            .notifier
            .emit(&format!("swap {}", a), &[Value::from(b)]);
        self.inner
            .notifier
            .emit(&format!("swap {}", b), &[Value::from(a)]);
        self.publish("swap", &[Value::from(a), Value::from(b)]);
        true
    }

    /// Char position of `needle` in a string value, or element position in
    /// a list value; `-1` when absent. `None` for missing keys and other kinds.
    pub fn findin(&self, key: &str, needle: impl Into<Value>) -> Option<i64> {
        let needle = needle.into();
        let index = {
            let entry = self.inner.data.get(key)?;
            match &entry.value {
                Value::Str(haystack) => {
                    let pattern = needle.to_string();
                    haystack
                        .find(pattern.as_str())
                        .map_or(-1, |byte| haystack[..byte].chars().count() as i64)
                }
                Value::List(items) => items
                    .iter()
                    .position(|item| *item == needle)
                    .map_or(-1, |pos| pos as i64),
                _ => return None,
            }
        };

        self.notify("findin", key, vec![needle, Value::from(index)]);
        Some(index)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64().round() as i64)
        .unwrap_or(0)
}

fn remaining_seconds(deadline: Instant, now: Instant) -> i64 {
    if deadline >= now {
        deadline.duration_since(now).as_secs_f64().round() as i64
    } else {
        -(now.duration_since(deadline).as_secs_f64().round() as i64)
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::value::Value;

/// The only capability the store needs from the outside world: announce
/// that something happened.
pub trait Notifier: Send + Sync {
    fn emit(&self, event: &str, args: &[Value]);
}

pub type Listener = Arc<dyn Fn(&str, &[Value]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    // `None` receives every event.
    event: Option<String>,
    listener: Listener,
}

/// A plain listener registry. Listeners run synchronously, in registration
/// order, with no lock held, so they are free to call back into the store.
pub struct Emitter {
    next_id: AtomicU64,
    registrations: Mutex<Vec<Registration>>,
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter {
            next_id: AtomicU64::new(1),
            registrations: Mutex::new(Vec::new()),
        }
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listens for one exact event name, e.g. `"del foo"` or `"set"`.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&str, &[Value]) + Send + Sync + 'static,
    {
        self.register(Some(event.to_string()), Arc::new(listener))
    }

    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str, &[Value]) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let mut registrations = self.lock();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        registrations.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn register(&self, event: Option<String>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Registration {
            id,
            event,
            listener,
        });
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for Emitter {
    fn emit(&self, event: &str, args: &[Value]) {
        let targets: Vec<Listener> = self
            .lock()
            .iter()
            .filter(|r| r.event.as_deref().map_or(true, |name| name == event))
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in targets {
            listener(event, args);
        }
    }
}

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::error::VatError;

/// Opaque identifier of one scheduled deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Work run when a timer fires. It receives the handle it was scheduled under.
pub type TimerTask = Box<dyn FnOnce(TimerHandle) + Send + 'static>;

/// Time source and timer backend the store depends on for TTLs.
///
/// Implementations must never run `task` synchronously from inside
/// `schedule`: the store may be holding a lock on the entry at that point.
pub trait Scheduler: Send + Sync {
    fn now(&self) -> Instant;

    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, VatError>;

    /// Returns true if the timer was still pending and will now never fire.
    fn cancel(&self, handle: TimerHandle) -> bool;

    fn pending(&self) -> usize;
}

/// One tokio task per timer.
///
/// The runtime is captured at construction when one is current, otherwise
/// looked up again on every `schedule` call.
pub struct TokioScheduler {
    runtime: Option<Handle>,
    next_id: AtomicU64,
    // The slot is inserted before the task is spawned so a zero-delay timer
    // can never observe a missing entry. Whoever removes the slot first wins.
    timers: Arc<DashMap<u64, Option<AbortHandle>>>,
}

impl Default for TokioScheduler {
    fn default() -> Self {
        TokioScheduler {
            runtime: Handle::try_current().ok(),
            next_id: AtomicU64::new(1),
            timers: Arc::new(DashMap::new()),
        }
    }
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle(runtime: Handle) -> Self {
        TokioScheduler {
            runtime: Some(runtime),
            ..Self::default()
        }
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, VatError> {
        let runtime = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .ok_or(VatError::NoTimerRuntime)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.timers.insert(id, None);

        let timers = Arc::clone(&self.timers);
        let join = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if timers.remove(&id).is_some() {
                task(TimerHandle(id));
            }
        });

        if let Some(mut slot) = self.timers.get_mut(&id) {
            *slot = Some(join.abort_handle());
        }

        Ok(TimerHandle(id))
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        match self.timers.remove(&handle.0) {
            Some((_, abort)) => {
                if let Some(abort) = abort {
                    abort.abort();
                }
                true
            }
            None => false,
        }
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }
}

struct ManualTimer {
    due: Duration,
    task: TimerTask,
}

struct ManualState {
    elapsed: Duration,
    next_id: u64,
    timers: BTreeMap<u64, ManualTimer>,
}

/// A virtual clock. Nothing fires until `advance` is called, which makes
/// expiration fully deterministic.
pub struct ManualScheduler {
    origin: Instant,
    state: Mutex<ManualState>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        ManualScheduler {
            origin: Instant::now(),
            state: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                next_id: 1,
                timers: BTreeMap::new(),
            }),
        }
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the clock forward and runs every timer that became due, in
    /// deadline order (ties broken by scheduling order). Timers scheduled by
    /// a firing task are considered too. Returns how many fired.
    pub fn advance(&self, by: Duration) -> usize {
        {
            let mut state = self.lock();
            state.elapsed = state.elapsed.saturating_add(by);
        }

        let mut fired = 0;
        loop {
            let next = {
                let mut state = self.lock();
                let elapsed = state.elapsed;
                let due = state
                    .timers
                    .iter()
                    .filter(|(_, timer)| timer.due <= elapsed)
                    .min_by_key(|(id, timer)| (timer.due, **id))
                    .map(|(id, _)| *id);
                due.and_then(|id| state.timers.remove(&id).map(|timer| (id, timer)))
            };

            // Run outside the lock, the task may schedule or cancel timers.
            let Some((id, timer)) = next else {
                return fired;
            };
            (timer.task)(TimerHandle(id));
            fired += 1;
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant {
        let elapsed = self.lock().elapsed;
        self.origin.checked_add(elapsed).unwrap_or(self.origin)
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, VatError> {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.elapsed.saturating_add(delay);
        state.timers.insert(id, ManualTimer { due, task });
        Ok(TimerHandle(id))
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        self.lock().timers.remove(&handle.0).is_some()
    }

    fn pending(&self) -> usize {
        self.lock().timers.len()
    }
}

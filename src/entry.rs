use std::time::Instant;

use crate::scheduler::TimerHandle;
use crate::value::Value;

/// A pending deletion. The handle and the deadline only ever exist together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Expiry {
    pub(crate) handle: TimerHandle,
    pub(crate) deadline: Instant,
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) value: Value,
    pub(crate) expiry: Option<Expiry>,
}

impl Entry {
    pub(crate) fn new(value: Value) -> Self {
        Entry {
            value,
            expiry: None,
        }
    }

    /// True when this entry is still waiting on the given timer.
    pub(crate) fn armed_with(&self, handle: TimerHandle) -> bool {
        self.expiry.map(|e| e.handle) == Some(handle)
    }
}

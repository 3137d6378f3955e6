use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;

use crate::error::VatError;
use crate::notify::Notifier;
use crate::scheduler::Scheduler;
use crate::value::Value;

pub const DEFAULT_NAME: &str = "vat";

/// Construction options for a [`Store`](crate::Store).
///
/// ```rust
/// use eventvat::{Store, StoreConfig};
///
/// let store = Store::with_config(
///     StoreConfig::new()
///         .with_name("sessions")
///         .with_entry("greeting", "hello"),
/// );
/// assert_eq!(store.name(), "sessions");
/// ```
#[derive(Clone)]
pub struct StoreConfig {
    pub name: String,
    /// Raw values the keyspace starts with. None of them carry a TTL. A
    /// hash holding lists or hashes is skipped when the store is built.
    pub data: HashMap<String, Value>,
    /// Defaults to a fresh [`Emitter`](crate::Emitter) with no listeners.
    pub notifier: Option<Arc<dyn Notifier>>,
    /// Defaults to a [`TokioScheduler`](crate::TokioScheduler).
    pub scheduler: Option<Arc<dyn Scheduler>>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: DEFAULT_NAME.to_string(),
            data: HashMap::new(),
            notifier: None,
            scheduler: None,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("name", &self.name)
            .field("data", &self.data)
            .field("notifier", &self.notifier.is_some())
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `VAT_NAME` and `VAT_SEED` (`key=value;key=value`). Seed values
    /// are parsed with [`Value::from_token`].
    pub fn from_env() -> Result<Self, VatError> {
        let mut config = StoreConfig::default();

        if let Ok(name) = env::var("VAT_NAME") {
            if !name.trim().is_empty() {
                config.name = name.trim().to_string();
            }
        }

        if let Ok(seed) = env::var("VAT_SEED") {
            config.data = parse_seed(&seed)?;
        }

        Ok(config)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_data(mut self, data: HashMap<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }
}

fn parse_seed(seed: &str) -> Result<HashMap<String, Value>, VatError> {
    let mut data = HashMap::new();
    for pair in seed.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(VatError::InvalidSeed(pair.to_string()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(VatError::InvalidSeed(pair.to_string()));
        }
        data.insert(key.to_string(), Value::from_token(value.trim()));
    }
    Ok(data)
}

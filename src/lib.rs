//! # eventvat
//!
//! An embeddable, in-process keyspace with a Redis-flavoured command set
//! where every command announces what it did.
//!
//! - Values are strings, numbers, booleans, lists or hashes ([`Value`]).
//! - Keys may carry a TTL; deletion is driven by a pluggable [`Scheduler`].
//! - Notifications go through a [`Notifier`]; [`Emitter`] is the default
//!   listener registry.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use eventvat::{Emitter, Store, StoreConfig, Value};
//!
//! let emitter = Arc::new(Emitter::new());
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! emitter.on("set", move |_, args| sink.lock().unwrap().push(args.to_vec()));
//!
//! let store = Store::with_config(StoreConfig::new().with_notifier(emitter));
//! store.set("greeting", "hello", None);
//!
//! assert_eq!(
//!     *seen.lock().unwrap(),
//!     vec![vec![Value::from("greeting"), Value::from("hello")]]
//! );
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod glob;
pub mod notify;
pub mod reply;
pub mod scheduler;
pub mod storage;
pub mod value;

mod entry;
mod hashes;
mod strings;

pub use config::StoreConfig;
pub use error::VatError;
pub use notify::{Emitter, ListenerId, Notifier};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
pub use storage::Store;
pub use value::{Kind, Value};

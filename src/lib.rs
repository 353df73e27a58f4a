//! Spec Registry - owner-scoped registry of rule and unit specs
//!
//! Maps an owner plus a name to an opaque spec, keeps per-rule drain and
//! failure metadata, caches hot spec reads, and announces new rules on a
//! notification queue.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod mirror;
pub mod models;
pub mod notify;
pub mod registry;
pub mod spec;
pub mod table;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{NotificationError, RegistryError, Result};
pub use key::EntryKey;
pub use mirror::Mirrored;
pub use notify::{ChangeEvent, Notifier, NullNotifier, QueueNotifier};
pub use registry::{Registry, RegistryConfig, Rule, Rules, Unit, Units};
pub use spec::{SpecValue, DEFAULT_ACL, DISCARD_DRAIN};
pub use table::{Backend, MemoryBackend, SqliteBackend};
pub use tasks::{spawn_cleanup_task, spawn_event_forwarder};

//! Background Tasks Module
//!
//! Contains background tasks that run alongside the registry service.
//!
//! # Tasks
//! - Cache sweep: purges expired cached specs at configured intervals
//! - Event forwarder: drains the change notification queue

mod cleanup;
mod events;

pub use cleanup::spawn_cleanup_task;
pub use events::spawn_event_forwarder;

//! Lifecycle event bus.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] -- the domain event envelope.
//! - [`event_types`] -- names of the events the lifecycle engines emit.
//! - [`EventLogger`] -- background subscriber that writes every event to the
//!   tracing log.

pub mod bus;
pub mod event_types;
pub mod logger;

pub use bus::{EventBus, PlatformEvent};
pub use logger::EventLogger;

//! `vergeerp-events` — entitlement change notifications.
//!
//! Every successful mutation of the registry, template, or assignment stores
//! publishes a [`ModuleEvent`]. Delivery is best-effort: the store write is
//! the source of truth and a failed publish never rolls it back.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, PublishError, Subscription};
pub use event::{EventKind, ModuleEvent, WIRE_VERSION};
pub use in_memory_bus::InMemoryEventBus;

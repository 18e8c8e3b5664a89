//! Change notification plumbing for the ledger.
//!
//! Committed changes are wrapped in tenant-scoped [`EventEnvelope`]s and
//! fanned out over an [`EventBus`]. Subscribers that only care about one
//! business wrap their subscription in a [`TenantFeed`].

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod tenant;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use tenant::{TenantFeed, TenantScoped};

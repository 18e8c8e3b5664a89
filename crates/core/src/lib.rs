//! `rentbook-core` — shared building blocks for the rental ledger.
//!
//! Pure domain primitives only: identifiers, the domain error model, aggregate
//! traits and optimistic-concurrency expectations. No storage, no IO.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};
pub use value_object::ValueObject;

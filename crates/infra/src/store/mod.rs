//! Document store boundary for the ledger.
//!
//! Stock items and bookings are kept as versioned snapshots. All mutation goes
//! through [`LedgerStore::commit`], which applies a multi-document
//! [`WriteBatch`] all-or-nothing under optimistic version checks.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::{LedgerStore, StoreError, Write, WriteBatch};

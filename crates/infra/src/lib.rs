//! Ledger service and its infrastructure: the document store boundary, an
//! in-memory store, configuration, alerts and the membership directory.

pub mod alerts;
pub mod config;
pub mod error;
pub mod ledger;
pub mod membership;
pub mod store;

pub use alerts::{Alert, AlertCounts, AlertKind, AlertSubject, Severity, generate_alerts};
pub use config::{ConfigError, LedgerConfig};
pub use error::LedgerError;
pub use ledger::{
    BOOKING_AGGREGATE, ChangeEnvelope, Dashboard, ITEM_AGGREGATE, ItemEdit, Ledger,
    NewPartnerRental, NewReminder, NewStockItem, REMINDER_AGGREGATE, RENTAL_AGGREGATE,
};
pub use membership::{Business, Member, MembershipDirectory, Role};
pub use store::{InMemoryLedgerStore, LedgerStore, StoreError, Write, WriteBatch};

//! The ledger service: catalog administration, reservations, returns, partner
//! rentals, reminders and dashboard queries on top of a [`LedgerStore`] and an [`EventBus`].
//!
//! Every mutating operation runs through the same pipeline:
//!
//! ```text
//! read current documents (tenant-scoped)
//!   ↓
//! decide with the pure aggregates (StockItem, Booking)
//!   ↓
//! commit all touched documents in one WriteBatch (version-checked)
//!   ↓  conflict? start over from a fresh read, bounded
//! publish change envelopes to the bus
//! ```
//!
//! Nothing is published for an attempt that did not commit.

mod catalog;
mod closing;
mod partners;
mod queries;
mod reminders;
mod reservation;
mod sweep;
mod unit_of_work;

pub use catalog::{ItemEdit, NewStockItem};
pub use partners::NewPartnerRental;
pub use queries::Dashboard;
pub use reminders::NewReminder;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use rentbook_bookings::{Booking, BookingId};
use rentbook_core::TenantId;
use rentbook_events::{EventBus, EventEnvelope, TenantFeed};
use rentbook_inventory::{StockItem, StockItemId};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::store::{LedgerStore, StoreError};

use unit_of_work::UnitOfWork;

/// What subscribers receive: an envelope around the JSON-encoded domain event.
pub type ChangeEnvelope = EventEnvelope<JsonValue>;

/// `aggregate_type` of stock item envelopes.
pub const ITEM_AGGREGATE: &str = "inventory.item";
/// `aggregate_type` of booking envelopes.
pub const BOOKING_AGGREGATE: &str = "booking";
/// `aggregate_type` of partner rental envelopes.
pub const RENTAL_AGGREGATE: &str = "partner_rental";
/// `aggregate_type` of reminder envelopes.
pub const REMINDER_AGGREGATE: &str = "reminder";

/// Inventory & booking ledger for any number of tenants.
///
/// `S` is the document store, `B` the bus committed changes are announced on.
/// The ledger holds no per-tenant state of its own and can be shared across
/// threads behind an `Arc`.
#[derive(Debug)]
pub struct Ledger<S, B> {
    store: S,
    bus: B,
    config: LedgerConfig,
}

impl<S, B> Ledger<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self::with_config(store, bus, LedgerConfig::default())
    }

    pub fn with_config(store: S, bus: B, config: LedgerConfig) -> Self {
        Self { store, bus, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<ChangeEnvelope>,
{
    /// Changes committed for `tenant_id` from now on.
    pub fn subscribe(&self, tenant_id: TenantId) -> TenantFeed<ChangeEnvelope> {
        TenantFeed::new(tenant_id, self.bus.subscribe())
    }

    /// Run `attempt` against a fresh [`UnitOfWork`] and commit what it staged.
    ///
    /// A version conflict discards the attempt and runs it again from the top,
    /// up to `max_commit_attempts` times. Any other error ends the operation
    /// at once. An attempt that stages nothing commits nothing.
    fn run_atomic<T, F>(
        &self,
        tenant_id: TenantId,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut(&mut UnitOfWork) -> Result<T, LedgerError>,
    {
        let max_attempts = self.config.max_commit_attempts.max(1);
        let mut last_conflict = String::new();

        for attempt_no in 1..=max_attempts {
            let mut uow = UnitOfWork::new(tenant_id);
            let value = attempt(&mut uow)?;
            if uow.is_empty() {
                return Ok(value);
            }

            let (batch, envelopes) = uow.into_parts();
            let writes = batch.len();
            match self.store.commit(tenant_id, batch) {
                Ok(()) => {
                    debug!(operation, attempt = attempt_no, writes, "committed");
                    self.publish(envelopes);
                    return Ok(value);
                }
                Err(StoreError::Conflict(msg)) => {
                    debug!(operation, attempt = attempt_no, conflict = %msg, "commit conflict, retrying");
                    last_conflict = msg;
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(operation, attempts = max_attempts, "giving up after repeated conflicts");
        Err(LedgerError::conflict(format!(
            "{operation} gave up after {max_attempts} attempts: {last_conflict}"
        )))
    }

    fn publish(&self, envelopes: Vec<ChangeEnvelope>) {
        for envelope in envelopes {
            let event_type = envelope.event_type().to_string();
            if let Err(err) = self.bus.publish(envelope) {
                warn!(event_type, error = ?err, "change notification failed after commit");
            }
        }
    }

    fn require_item(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
    ) -> Result<StockItem, LedgerError> {
        self.store
            .load_item(tenant_id, item_id)?
            .ok_or_else(|| LedgerError::not_found(format!("stock item {item_id}")))
    }

    fn require_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
    ) -> Result<Booking, LedgerError> {
        self.store
            .load_booking(tenant_id, booking_id)?
            .ok_or_else(|| LedgerError::not_found(format!("booking {booking_id}")))
    }
}

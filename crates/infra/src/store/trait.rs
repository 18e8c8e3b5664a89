use std::sync::Arc;

use thiserror::Error;

use rentbook_bookings::{Booking, BookingId};
use rentbook_core::{ExpectedVersion, TenantId};
use rentbook_inventory::{StockItem, StockItemId};
use rentbook_partners::{PartnerRental, PartnerRentalId};
use rentbook_reminders::{Reminder, ReminderId};

/// One document change inside a [`WriteBatch`].
///
/// Every write carries the version the caller read, so the store can refuse
/// the whole batch if anything moved underneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    PutItem {
        item: StockItem,
        expected: ExpectedVersion,
    },
    DeleteItem {
        item_id: StockItemId,
        expected: ExpectedVersion,
    },
    PutBooking {
        booking: Booking,
        expected: ExpectedVersion,
    },
    DeleteBooking {
        booking_id: BookingId,
        expected: ExpectedVersion,
    },
    PutRental {
        rental: PartnerRental,
        expected: ExpectedVersion,
    },
    DeleteRental {
        rental_id: PartnerRentalId,
        expected: ExpectedVersion,
    },
    PutReminder {
        reminder: Reminder,
        expected: ExpectedVersion,
    },
    DeleteReminder {
        reminder_id: ReminderId,
        expected: ExpectedVersion,
    },
}

impl Write {
    pub fn expected(&self) -> ExpectedVersion {
        match self {
            Write::PutItem { expected, .. }
            | Write::DeleteItem { expected, .. }
            | Write::PutBooking { expected, .. }
            | Write::DeleteBooking { expected, .. }
            | Write::PutRental { expected, .. }
            | Write::DeleteRental { expected, .. }
            | Write::PutReminder { expected, .. }
            | Write::DeleteReminder { expected, .. } => *expected,
        }
    }
}

/// Document changes that commit together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_item(&mut self, item: StockItem, expected: ExpectedVersion) {
        self.writes.push(Write::PutItem { item, expected });
    }

    pub fn delete_item(&mut self, item_id: StockItemId, expected: ExpectedVersion) {
        self.writes.push(Write::DeleteItem { item_id, expected });
    }

    pub fn put_booking(&mut self, booking: Booking, expected: ExpectedVersion) {
        self.writes.push(Write::PutBooking { booking, expected });
    }

    pub fn delete_booking(&mut self, booking_id: BookingId, expected: ExpectedVersion) {
        self.writes.push(Write::DeleteBooking {
            booking_id,
            expected,
        });
    }

    pub fn put_rental(&mut self, rental: PartnerRental, expected: ExpectedVersion) {
        self.writes.push(Write::PutRental { rental, expected });
    }

    pub fn delete_rental(&mut self, rental_id: PartnerRentalId, expected: ExpectedVersion) {
        self.writes.push(Write::DeleteRental {
            rental_id,
            expected,
        });
    }

    pub fn put_reminder(&mut self, reminder: Reminder, expected: ExpectedVersion) {
        self.writes.push(Write::PutReminder { reminder, expected });
    }

    pub fn delete_reminder(&mut self, reminder_id: ReminderId, expected: ExpectedVersion) {
        self.writes.push(Write::DeleteReminder {
            reminder_id,
            expected,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Storage-level failure.
///
/// Only `Conflict` is worth retrying: the caller re-reads and decides again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("invalid write batch: {0}")]
    InvalidBatch(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Tenant-scoped document store for stock items, bookings, partner rentals
/// and reminders.
///
/// Reads return the latest committed snapshot of each document, carrying its
/// version. [`commit`](LedgerStore::commit) applies a [`WriteBatch`]
/// atomically:
///
/// - every write's `ExpectedVersion` is checked against the current document
///   version; any mismatch rejects the whole batch with `Conflict`
/// - documents in the batch must belong to `tenant_id`, or `TenantIsolation`
/// - item names stay unique per tenant (trimmed, case-insensitive); a batch
///   that would break this is a `Conflict`
///
/// Nothing is visible to readers until the whole batch has been applied.
pub trait LedgerStore: Send + Sync {
    fn load_item(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
    ) -> Result<Option<StockItem>, StoreError>;

    fn list_items(&self, tenant_id: TenantId) -> Result<Vec<StockItem>, StoreError>;

    fn load_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
    ) -> Result<Option<Booking>, StoreError>;

    fn list_bookings(&self, tenant_id: TenantId) -> Result<Vec<Booking>, StoreError>;

    fn load_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
    ) -> Result<Option<PartnerRental>, StoreError>;

    fn list_rentals(&self, tenant_id: TenantId) -> Result<Vec<PartnerRental>, StoreError>;

    fn load_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
    ) -> Result<Option<Reminder>, StoreError>;

    fn list_reminders(&self, tenant_id: TenantId) -> Result<Vec<Reminder>, StoreError>;

    fn commit(&self, tenant_id: TenantId, batch: WriteBatch) -> Result<(), StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn load_item(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
    ) -> Result<Option<StockItem>, StoreError> {
        (**self).load_item(tenant_id, item_id)
    }

    fn list_items(&self, tenant_id: TenantId) -> Result<Vec<StockItem>, StoreError> {
        (**self).list_items(tenant_id)
    }

    fn load_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
    ) -> Result<Option<Booking>, StoreError> {
        (**self).load_booking(tenant_id, booking_id)
    }

    fn list_bookings(&self, tenant_id: TenantId) -> Result<Vec<Booking>, StoreError> {
        (**self).list_bookings(tenant_id)
    }

    fn load_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
    ) -> Result<Option<PartnerRental>, StoreError> {
        (**self).load_rental(tenant_id, rental_id)
    }

    fn list_rentals(&self, tenant_id: TenantId) -> Result<Vec<PartnerRental>, StoreError> {
        (**self).list_rentals(tenant_id)
    }

    fn load_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
    ) -> Result<Option<Reminder>, StoreError> {
        (**self).load_reminder(tenant_id, reminder_id)
    }

    fn list_reminders(&self, tenant_id: TenantId) -> Result<Vec<Reminder>, StoreError> {
        (**self).list_reminders(tenant_id)
    }

    fn commit(&self, tenant_id: TenantId, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).commit(tenant_id, batch)
    }
}

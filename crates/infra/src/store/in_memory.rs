use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use rentbook_bookings::{Booking, BookingId};
use rentbook_core::{AggregateRoot, TenantId};
use rentbook_inventory::{StockItem, StockItemId, normalize_name};
use rentbook_partners::{PartnerRental, PartnerRentalId};
use rentbook_reminders::{Reminder, ReminderId};

use super::r#trait::{LedgerStore, StoreError, Write, WriteBatch};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum DocKey {
    Item(StockItemId),
    Booking(BookingId),
    Rental(PartnerRentalId),
    Reminder(ReminderId),
}

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<(TenantId, StockItemId), StockItem>,
    bookings: HashMap<(TenantId, BookingId), Booking>,
    rentals: HashMap<(TenantId, PartnerRentalId), PartnerRental>,
    reminders: HashMap<(TenantId, ReminderId), Reminder>,
}

impl Tables {
    fn current_version(&self, tenant_id: TenantId, key: DocKey) -> Option<u64> {
        match key {
            DocKey::Item(id) => self.items.get(&(tenant_id, id)).map(|i| i.version()),
            DocKey::Booking(id) => self.bookings.get(&(tenant_id, id)).map(|b| b.version()),
            DocKey::Rental(id) => self.rentals.get(&(tenant_id, id)).map(|r| r.version()),
            DocKey::Reminder(id) => self.reminders.get(&(tenant_id, id)).map(|r| r.version()),
        }
    }

    /// Item names for the tenant as they would be after `writes`.
    fn check_unique_names(&self, tenant_id: TenantId, writes: &[Write]) -> Result<(), StoreError> {
        let mut names: HashMap<StockItemId, String> = self
            .items
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|((_, id), item)| (*id, normalize_name(item.name())))
            .collect();

        for write in writes {
            match write {
                Write::PutItem { item, .. } => {
                    names.insert(item.id_typed(), normalize_name(item.name()));
                }
                Write::DeleteItem { item_id, .. } => {
                    names.remove(item_id);
                }
                _ => {}
            }
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in names.into_values() {
            if !seen.insert(name.clone()) {
                return Err(StoreError::Conflict(format!(
                    "an item named '{name}' already exists"
                )));
            }
        }
        Ok(())
    }
}

/// In-memory ledger store.
///
/// Intended for tests/dev. A single lock covers every collection, so a batch
/// touching items and a booking is applied atomically.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `Unavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.ensure_available()?;
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn validate(tenant_id: TenantId, batch: &WriteBatch) -> Result<Vec<DocKey>, StoreError> {
        let mut keys = Vec::with_capacity(batch.len());
        let mut seen = HashSet::with_capacity(batch.len());

        for (idx, write) in batch.writes().iter().enumerate() {
            let (key, owner) = match write {
                Write::PutItem { item, .. } => {
                    if !item.is_live() {
                        return Err(StoreError::InvalidBatch(format!(
                            "write {idx}: only live items can be stored"
                        )));
                    }
                    (DocKey::Item(item.id_typed()), item.tenant_id())
                }
                Write::DeleteItem { item_id, .. } => (DocKey::Item(*item_id), Some(tenant_id)),
                Write::PutBooking { booking, .. } => {
                    (DocKey::Booking(booking.id_typed()), booking.tenant_id())
                }
                Write::DeleteBooking { booking_id, .. } => {
                    (DocKey::Booking(*booking_id), Some(tenant_id))
                }
                Write::PutRental { rental, .. } => {
                    (DocKey::Rental(rental.id_typed()), rental.tenant_id())
                }
                Write::DeleteRental { rental_id, .. } => {
                    (DocKey::Rental(*rental_id), Some(tenant_id))
                }
                Write::PutReminder { reminder, .. } => {
                    (DocKey::Reminder(reminder.id_typed()), reminder.tenant_id())
                }
                Write::DeleteReminder { reminder_id, .. } => {
                    (DocKey::Reminder(*reminder_id), Some(tenant_id))
                }
            };

            if owner != Some(tenant_id) {
                return Err(StoreError::TenantIsolation(format!(
                    "write {idx} does not belong to tenant {tenant_id}"
                )));
            }
            if !seen.insert(key) {
                return Err(StoreError::InvalidBatch(format!(
                    "write {idx} touches a document already in the batch"
                )));
            }
            keys.push(key);
        }

        Ok(keys)
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load_item(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
    ) -> Result<Option<StockItem>, StoreError> {
        Ok(self.read()?.items.get(&(tenant_id, item_id)).cloned())
    }

    fn list_items(&self, tenant_id: TenantId) -> Result<Vec<StockItem>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .items
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, item)| item.clone())
            .collect())
    }

    fn load_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(self.read()?.bookings.get(&(tenant_id, booking_id)).cloned())
    }

    fn list_bookings(&self, tenant_id: TenantId) -> Result<Vec<Booking>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .bookings
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, booking)| booking.clone())
            .collect())
    }

    fn load_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
    ) -> Result<Option<PartnerRental>, StoreError> {
        Ok(self.read()?.rentals.get(&(tenant_id, rental_id)).cloned())
    }

    fn list_rentals(&self, tenant_id: TenantId) -> Result<Vec<PartnerRental>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .rentals
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, rental)| rental.clone())
            .collect())
    }

    fn load_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
    ) -> Result<Option<Reminder>, StoreError> {
        Ok(self.read()?.reminders.get(&(tenant_id, reminder_id)).cloned())
    }

    fn list_reminders(&self, tenant_id: TenantId) -> Result<Vec<Reminder>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .reminders
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, reminder)| reminder.clone())
            .collect())
    }

    fn commit(&self, tenant_id: TenantId, batch: WriteBatch) -> Result<(), StoreError> {
        self.ensure_available()?;
        if batch.is_empty() {
            return Ok(());
        }

        let keys = Self::validate(tenant_id, &batch)?;

        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        // Check everything before touching anything.
        for (write, key) in batch.writes().iter().zip(&keys) {
            let current = tables.current_version(tenant_id, *key);
            let expected = write.expected();
            if !expected.matches(current) {
                return Err(StoreError::Conflict(format!(
                    "{key:?}: expected {expected:?}, found {current:?}"
                )));
            }
        }
        tables.check_unique_names(tenant_id, batch.writes())?;

        for write in batch.into_writes() {
            match write {
                Write::PutItem { item, .. } => {
                    tables.items.insert((tenant_id, item.id_typed()), item);
                }
                Write::DeleteItem { item_id, .. } => {
                    tables.items.remove(&(tenant_id, item_id));
                }
                Write::PutBooking { booking, .. } => {
                    tables.bookings.insert((tenant_id, booking.id_typed()), booking);
                }
                Write::DeleteBooking { booking_id, .. } => {
                    tables.bookings.remove(&(tenant_id, booking_id));
                }
                Write::PutRental { rental, .. } => {
                    tables.rentals.insert((tenant_id, rental.id_typed()), rental);
                }
                Write::DeleteRental { rental_id, .. } => {
                    tables.rentals.remove(&(tenant_id, rental_id));
                }
                Write::PutReminder { reminder, .. } => {
                    tables.reminders.insert((tenant_id, reminder.id_typed()), reminder);
                }
                Write::DeleteReminder { reminder_id, .. } => {
                    tables.reminders.remove(&(tenant_id, reminder_id));
                }
            }
        }

        Ok(())
    }
}

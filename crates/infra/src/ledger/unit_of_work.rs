use serde::Serialize;
use uuid::Uuid;

use rentbook_bookings::{Booking, BookingEvent};
use rentbook_core::{AggregateId, ExpectedVersion, TenantId};
use rentbook_events::{Event, EventEnvelope};
use rentbook_inventory::{InventoryEvent, StockItem};
use rentbook_partners::{PartnerRental, RentalEvent};
use rentbook_reminders::{Reminder, ReminderEvent};

use crate::error::LedgerError;
use crate::store::WriteBatch;

use super::{BOOKING_AGGREGATE, ChangeEnvelope, ITEM_AGGREGATE, REMINDER_AGGREGATE, RENTAL_AGGREGATE};

/// Writes and change notifications collected during one attempt of an
/// atomic operation.
///
/// Each staged aggregate is written back with the version it was loaded at as
/// its expectation, so a concurrent writer turns the whole batch into a
/// conflict. Envelopes are only handed out after the batch commits.
#[derive(Debug)]
pub(crate) struct UnitOfWork {
    tenant_id: TenantId,
    batch: WriteBatch,
    envelopes: Vec<ChangeEnvelope>,
}

impl UnitOfWork {
    pub(crate) fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            batch: WriteBatch::new(),
            envelopes: Vec::new(),
        }
    }

    /// Stage `item` (already mutated by `events`) for write-back. No events, no write.
    pub(crate) fn stage_item(
        &mut self,
        item: &StockItem,
        loaded_version: u64,
        events: &[InventoryEvent],
    ) -> Result<(), LedgerError> {
        if events.is_empty() {
            return Ok(());
        }
        let expected = ExpectedVersion::for_loaded(loaded_version);
        if item.is_removed() {
            self.batch.delete_item(item.id_typed(), expected);
        } else {
            self.batch.put_item(item.clone(), expected);
        }
        self.record(ITEM_AGGREGATE, item.id_typed().0, loaded_version, events)
    }

    pub(crate) fn stage_booking(
        &mut self,
        booking: &Booking,
        loaded_version: u64,
        events: &[BookingEvent],
    ) -> Result<(), LedgerError> {
        if events.is_empty() {
            return Ok(());
        }
        let expected = ExpectedVersion::for_loaded(loaded_version);
        if booking.is_deleted() {
            self.batch.delete_booking(booking.id_typed(), expected);
        } else {
            self.batch.put_booking(booking.clone(), expected);
        }
        self.record(BOOKING_AGGREGATE, booking.id_typed().0, loaded_version, events)
    }

    pub(crate) fn stage_rental(
        &mut self,
        rental: &PartnerRental,
        loaded_version: u64,
        events: &[RentalEvent],
    ) -> Result<(), LedgerError> {
        if events.is_empty() {
            return Ok(());
        }
        let expected = ExpectedVersion::for_loaded(loaded_version);
        if rental.is_deleted() {
            self.batch.delete_rental(rental.id_typed(), expected);
        } else {
            self.batch.put_rental(rental.clone(), expected);
        }
        self.record(RENTAL_AGGREGATE, rental.id_typed().0, loaded_version, events)
    }

    pub(crate) fn stage_reminder(
        &mut self,
        reminder: &Reminder,
        loaded_version: u64,
        events: &[ReminderEvent],
    ) -> Result<(), LedgerError> {
        if events.is_empty() {
            return Ok(());
        }
        let expected = ExpectedVersion::for_loaded(loaded_version);
        if reminder.is_deleted() {
            self.batch.delete_reminder(reminder.id_typed(), expected);
        } else {
            self.batch.put_reminder(reminder.clone(), expected);
        }
        self.record(REMINDER_AGGREGATE, reminder.id_typed().0, loaded_version, events)
    }

    fn record<E>(
        &mut self,
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
        loaded_version: u64,
        events: &[E],
    ) -> Result<(), LedgerError>
    where
        E: Event + Serialize,
    {
        for (offset, event) in (1u64..).zip(events) {
            let payload = serde_json::to_value(event)
                .map_err(|e| LedgerError::Serialization(format!("{aggregate_type}: {e}")))?;
            self.envelopes.push(EventEnvelope::new(
                Uuid::now_v7(),
                self.tenant_id,
                aggregate_id,
                aggregate_type,
                loaded_version + offset,
                event.event_type(),
                event.occurred_at(),
                payload,
            ));
        }
        Ok(())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub(crate) fn into_parts(self) -> (WriteBatch, Vec<ChangeEnvelope>) {
        (self.batch, self.envelopes)
    }
}

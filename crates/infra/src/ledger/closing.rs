use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span};

use rentbook_bookings::{
    Booking, BookingCommand, BookingId, CancelBooking, DeleteBooking, RecordPayment,
    ReturnBooking,
};
use rentbook_core::{Aggregate, AggregateRoot, TenantId};
use rentbook_events::EventBus;
use rentbook_inventory::{InventoryCommand, RestoreStock, StockItemId};

use crate::error::LedgerError;
use crate::store::LedgerStore;

use super::unit_of_work::UnitOfWork;
use super::{ChangeEnvelope, Ledger};

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<ChangeEnvelope>,
{
    /// Close an active or overdue booking and put its stock back.
    ///
    /// Only `quantity - shortage` of each line is restored, capped at the
    /// item's total; items deleted since the booking was made are skipped.
    /// Returning an already returned booking changes nothing.
    pub fn return_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
        at: DateTime<Utc>,
    ) -> Result<Booking, LedgerError> {
        let _span = info_span!("ledger.return_booking", tenant = %tenant_id, %booking_id).entered();
        let command = BookingCommand::ReturnBooking(ReturnBooking {
            tenant_id,
            booking_id,
            occurred_at: at,
        });
        self.close_booking(tenant_id, booking_id, "return_booking", &command, at)
    }

    /// Call off an active booking, restoring stock the same way a return does.
    pub fn cancel_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Booking, LedgerError> {
        let _span = info_span!("ledger.cancel_booking", tenant = %tenant_id, %booking_id).entered();
        let command = BookingCommand::CancelBooking(CancelBooking {
            tenant_id,
            booking_id,
            reason,
            occurred_at: at,
        });
        self.close_booking(tenant_id, booking_id, "cancel_booking", &command, at)
    }

    /// Drop the booking record. Stock is not restored.
    pub fn delete_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let _span = info_span!("ledger.delete_booking", tenant = %tenant_id, %booking_id).entered();

        self.run_atomic(tenant_id, "delete_booking", |uow| {
            let mut booking = self.require_booking(tenant_id, booking_id)?;
            let loaded = booking.version();
            let events = booking.execute(&BookingCommand::DeleteBooking(DeleteBooking {
                tenant_id,
                booking_id,
                occurred_at: at,
            }))?;
            uow.stage_booking(&booking, loaded, &events)
        })?;

        info!("booking deleted");
        Ok(())
    }

    pub fn record_payment(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<Booking, LedgerError> {
        let _span = info_span!("ledger.record_payment", tenant = %tenant_id, %booking_id).entered();

        let booking = self.run_atomic(tenant_id, "record_payment", |uow| {
            let mut booking = self.require_booking(tenant_id, booking_id)?;
            let loaded = booking.version();
            let events = booking.execute(&BookingCommand::RecordPayment(RecordPayment {
                tenant_id,
                booking_id,
                amount,
                occurred_at: at,
            }))?;
            uow.stage_booking(&booking, loaded, &events)?;
            Ok(booking)
        })?;

        info!(
            amount,
            outstanding = booking.payment().outstanding(),
            "payment recorded"
        );
        Ok(booking)
    }

    fn close_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
        operation: &'static str,
        command: &BookingCommand,
        at: DateTime<Utc>,
    ) -> Result<Booking, LedgerError> {
        let mut transitioned = false;
        let booking = self.run_atomic(tenant_id, operation, |uow| {
            let mut booking = self.require_booking(tenant_id, booking_id)?;
            let loaded = booking.version();
            let events = booking.execute(command)?;
            transitioned = !events.is_empty();
            if !transitioned {
                return Ok(booking);
            }

            self.stage_restorations(uow, tenant_id, &booking, at)?;
            uow.stage_booking(&booking, loaded, &events)?;
            Ok(booking)
        })?;

        if transitioned {
            info!(status = ?booking.status(), "booking closed, stock restored");
        } else {
            debug!(status = ?booking.status(), "booking already closed, nothing to do");
        }
        Ok(booking)
    }

    fn stage_restorations(
        &self,
        uow: &mut UnitOfWork,
        tenant_id: TenantId,
        booking: &Booking,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut per_item: BTreeMap<StockItemId, u64> = BTreeMap::new();
        for (item_id, quantity) in booking.restorations() {
            let total = per_item.entry(item_id).or_default();
            *total = total.saturating_add(quantity);
        }

        for (item_id, quantity) in per_item {
            let Some(mut item) = self.store.load_item(tenant_id, item_id)? else {
                debug!(%item_id, quantity, "item no longer in catalog, skipping restore");
                continue;
            };
            let loaded = item.version();
            let events = item.execute(&InventoryCommand::RestoreStock(RestoreStock {
                tenant_id,
                item_id,
                quantity: i64::try_from(quantity).unwrap_or(i64::MAX),
                occurred_at: at,
            }))?;
            uow.stage_item(&item, loaded, &events)?;
        }
        Ok(())
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, info_span, warn};

use rentbook_bookings::{BookingCommand, BookingId, BookingStatus, MarkOverdue};
use rentbook_core::{Aggregate, AggregateRoot, TenantId};
use rentbook_events::EventBus;

use crate::error::LedgerError;
use crate::store::LedgerStore;

use super::{ChangeEnvelope, Ledger};

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<ChangeEnvelope>,
{
    /// Relabel active bookings whose return-by date is before `today` as
    /// overdue. Returns the ids that were relabeled.
    ///
    /// Each booking commits on its own. A booking that keeps conflicting is
    /// skipped and left for the next sweep; a storage outage stops the sweep.
    pub fn sweep_overdue(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Vec<BookingId>, LedgerError> {
        let _span = info_span!("ledger.sweep_overdue", tenant = %tenant_id, %today).entered();

        let candidates: Vec<BookingId> = self
            .store
            .list_bookings(tenant_id)?
            .into_iter()
            .filter(|b| b.status() == BookingStatus::Active && b.details().return_by < today)
            .map(|b| b.id_typed())
            .collect();

        let mut marked = Vec::with_capacity(candidates.len());
        for booking_id in candidates {
            let outcome = self.run_atomic(tenant_id, "mark_overdue", |uow| {
                // Re-read: it may have been returned or deleted since the listing.
                let Some(mut booking) = self.store.load_booking(tenant_id, booking_id)? else {
                    return Ok(false);
                };
                let loaded = booking.version();
                let events = booking.execute(&BookingCommand::MarkOverdue(MarkOverdue {
                    tenant_id,
                    booking_id,
                    today,
                    occurred_at: at,
                }))?;
                uow.stage_booking(&booking, loaded, &events)?;
                Ok(!events.is_empty())
            });

            match outcome {
                Ok(true) => marked.push(booking_id),
                Ok(false) => {}
                Err(LedgerError::Conflict(msg)) => {
                    warn!(%booking_id, conflict = %msg, "skipping booking in overdue sweep");
                }
                Err(err) => return Err(err),
            }
        }

        info!(marked = marked.len(), "overdue sweep finished");
        Ok(marked)
    }
}

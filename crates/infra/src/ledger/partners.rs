use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use rentbook_bookings::BookingId;
use rentbook_core::{Aggregate, AggregateRoot, TenantId};
use rentbook_events::EventBus;
use rentbook_inventory::{StockItemId, find_by_name};
use rentbook_partners::{
    AmendRental, DeleteRental, MarkRentalOverdue, PartnerRental, PartnerRentalId, RecordRental,
    RentalCommand, RentalDirection, RentalFilter, RentalStatus, RentalSummary, RentalTerms,
    ReturnRental, ShortageCover, shortage_cover,
};

use crate::error::LedgerError;
use crate::store::LedgerStore;

use super::{ChangeEnvelope, Ledger};

/// An item lent to, or borrowed from, another business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPartnerRental {
    pub direction: RentalDirection,
    /// Lent items only. Resolved from the catalog by name when absent.
    #[serde(default)]
    pub item_id: Option<StockItemId>,
    /// Borrowed items only: the booking the items were sourced for.
    #[serde(default)]
    pub booking_id: Option<BookingId>,
    pub terms: RentalTerms,
}

impl NewPartnerRental {
    pub fn lent(terms: RentalTerms) -> Self {
        Self {
            direction: RentalDirection::Lent,
            item_id: None,
            booking_id: None,
            terms,
        }
    }

    pub fn borrowed(terms: RentalTerms) -> Self {
        Self {
            direction: RentalDirection::Borrowed,
            item_id: None,
            booking_id: None,
            terms,
        }
    }

    pub fn for_booking(mut self, booking_id: BookingId) -> Self {
        self.booking_id = Some(booking_id);
        self
    }
}

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<ChangeEnvelope>,
{
    /// Record a partner rental as `active`. Catalog stock is not touched.
    pub fn record_rental(
        &self,
        tenant_id: TenantId,
        new_rental: NewPartnerRental,
        at: DateTime<Utc>,
    ) -> Result<PartnerRental, LedgerError> {
        let _span = info_span!(
            "ledger.record_rental",
            tenant = %tenant_id,
            direction = ?new_rental.direction
        )
        .entered();

        let rental_id = PartnerRentalId::generate();
        let mut command = RecordRental {
            tenant_id,
            rental_id,
            direction: new_rental.direction,
            item_id: new_rental.item_id,
            booking_id: new_rental.booking_id,
            terms: new_rental.terms,
            occurred_at: at,
        };
        PartnerRental::empty(rental_id).handle(&RentalCommand::RecordRental(command.clone()))?;

        if let Some(booking_id) = command.booking_id {
            self.require_booking(tenant_id, booking_id)?;
        }
        if command.direction == RentalDirection::Lent {
            command.item_id = match command.item_id {
                Some(item_id) => Some(self.require_item(tenant_id, item_id)?.id_typed()),
                None => {
                    let items = self.store.list_items(tenant_id)?;
                    find_by_name(&items, &command.terms.item_name).map(|i| i.id_typed())
                }
            };
        }

        let command = RentalCommand::RecordRental(command);
        let rental = self.run_atomic(tenant_id, "record_rental", |uow| {
            let mut rental = PartnerRental::empty(rental_id);
            let events = rental.execute(&command)?;
            uow.stage_rental(&rental, 0, &events)?;
            Ok(rental)
        })?;

        info!(%rental_id, "rental recorded");
        Ok(rental)
    }

    /// Replace the rental's terms. An overdue rental becomes active again.
    pub fn amend_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
        terms: RentalTerms,
        at: DateTime<Utc>,
    ) -> Result<PartnerRental, LedgerError> {
        let _span = info_span!("ledger.amend_rental", tenant = %tenant_id, %rental_id).entered();
        let command = RentalCommand::AmendRental(AmendRental {
            tenant_id,
            rental_id,
            terms,
            occurred_at: at,
        });
        self.execute_rental(tenant_id, rental_id, "amend_rental", &command)
    }

    /// Mark the rental returned. Returning it again changes nothing.
    pub fn return_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
        at: DateTime<Utc>,
    ) -> Result<PartnerRental, LedgerError> {
        let _span = info_span!("ledger.return_rental", tenant = %tenant_id, %rental_id).entered();
        let command = RentalCommand::ReturnRental(ReturnRental {
            tenant_id,
            rental_id,
            occurred_at: at,
        });
        self.execute_rental(tenant_id, rental_id, "return_rental", &command)
    }

    pub fn delete_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let _span = info_span!("ledger.delete_rental", tenant = %tenant_id, %rental_id).entered();
        let command = RentalCommand::DeleteRental(DeleteRental {
            tenant_id,
            rental_id,
            occurred_at: at,
        });
        self.execute_rental(tenant_id, rental_id, "delete_rental", &command)?;
        Ok(())
    }

    pub fn get_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
    ) -> Result<PartnerRental, LedgerError> {
        self.require_rental(tenant_id, rental_id)
    }

    /// Rentals matching `filter`, earliest return-by date first.
    pub fn list_rentals(
        &self,
        tenant_id: TenantId,
        filter: &RentalFilter,
    ) -> Result<Vec<PartnerRental>, LedgerError> {
        Ok(filter.apply(self.store.list_rentals(tenant_id)?))
    }

    pub fn rental_summary(&self, tenant_id: TenantId) -> Result<RentalSummary, LedgerError> {
        let rentals = self.store.list_rentals(tenant_id)?;
        Ok(RentalSummary::from_rentals(&rentals))
    }

    /// How much of each short line of the booking has been borrowed in.
    pub fn shortage_cover(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
    ) -> Result<Vec<ShortageCover>, LedgerError> {
        let booking = self.require_booking(tenant_id, booking_id)?;
        let rentals = self.store.list_rentals(tenant_id)?;
        Ok(shortage_cover(&booking, &rentals))
    }

    /// Relabel active rentals, in either direction, whose return-by date is
    /// before `today` as overdue. Returns the ids that were relabeled.
    ///
    /// Same contract as the booking sweep: one commit per rental, persistent
    /// conflicts are skipped, an outage stops the sweep.
    pub fn sweep_overdue_rentals(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Vec<PartnerRentalId>, LedgerError> {
        let _span = info_span!("ledger.sweep_overdue_rentals", tenant = %tenant_id, %today).entered();

        let candidates: Vec<PartnerRentalId> = self
            .store
            .list_rentals(tenant_id)?
            .into_iter()
            .filter(|r| r.status() == RentalStatus::Active && r.terms().return_by < today)
            .map(|r| r.id_typed())
            .collect();

        let mut marked = Vec::with_capacity(candidates.len());
        for rental_id in candidates {
            let outcome = self.run_atomic(tenant_id, "mark_rental_overdue", |uow| {
                let Some(mut rental) = self.store.load_rental(tenant_id, rental_id)? else {
                    return Ok(false);
                };
                let loaded = rental.version();
                let events = rental.execute(&RentalCommand::MarkRentalOverdue(MarkRentalOverdue {
                    tenant_id,
                    rental_id,
                    today,
                    occurred_at: at,
                }))?;
                uow.stage_rental(&rental, loaded, &events)?;
                Ok(!events.is_empty())
            });

            match outcome {
                Ok(true) => marked.push(rental_id),
                Ok(false) => {}
                Err(LedgerError::Conflict(msg)) => {
                    warn!(%rental_id, conflict = %msg, "skipping rental in overdue sweep");
                }
                Err(err) => return Err(err),
            }
        }

        info!(marked = marked.len(), "rental overdue sweep finished");
        Ok(marked)
    }

    fn execute_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
        operation: &'static str,
        command: &RentalCommand,
    ) -> Result<PartnerRental, LedgerError> {
        self.run_atomic(tenant_id, operation, |uow| {
            let mut rental = self.require_rental(tenant_id, rental_id)?;
            let loaded = rental.version();
            let events = rental.execute(command)?;
            uow.stage_rental(&rental, loaded, &events)?;
            Ok(rental)
        })
    }

    fn require_rental(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
    ) -> Result<PartnerRental, LedgerError> {
        self.store
            .load_rental(tenant_id, rental_id)?
            .ok_or_else(|| LedgerError::not_found(format!("partner rental {rental_id}")))
    }
}

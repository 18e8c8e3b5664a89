use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{info, info_span};

use rentbook_bookings::{
    Booking, BookingCommand, BookingId, BookingRequest, LineItem, OpenBooking, RequestedLine,
};
use rentbook_core::{Aggregate, AggregateRoot, TenantId, UserId};
use rentbook_events::EventBus;
use rentbook_inventory::{
    InventoryCommand, InventoryEvent, ReserveStock, StockItem, StockItemId, find_by_name,
};

use crate::error::LedgerError;
use crate::store::LedgerStore;

use super::{ChangeEnvelope, Ledger};

/// A catalog item drawn from during one reservation attempt.
struct Drawn {
    item: StockItem,
    loaded_version: u64,
    events: Vec<InventoryEvent>,
}

/// Allocate one requested line against the catalog.
///
/// Lines naming the same item share one [`Drawn`] entry, so the second line
/// sees what the first one left.
fn allocate_line(
    tenant_id: TenantId,
    catalog: &[StockItem],
    drawn: &mut BTreeMap<StockItemId, Drawn>,
    requested: &RequestedLine,
    at: DateTime<Utc>,
) -> Result<LineItem, LedgerError> {
    let quantity = requested.quantity as u64;
    let price_override = requested.unit_price.map(|p| p as u64);

    let Some(found) = find_by_name(catalog, &requested.name) else {
        // Not stocked at all: borrowed from outside in full.
        return Ok(LineItem {
            item_id: None,
            name: requested.name.trim().to_string(),
            quantity,
            unit_price: price_override.unwrap_or(0),
            shortage: quantity,
        });
    };

    let item_id = found.id_typed();
    let entry = drawn.entry(item_id).or_insert_with(|| Drawn {
        item: found.clone(),
        loaded_version: found.version(),
        events: Vec::new(),
    });

    let events = entry.item.execute(&InventoryCommand::ReserveStock(ReserveStock {
        tenant_id,
        item_id,
        quantity: requested.quantity,
        occurred_at: at,
    }))?;
    let reserved = events
        .iter()
        .find_map(|e| match e {
            InventoryEvent::StockReserved(r) => Some(r.clone()),
            _ => None,
        })
        .ok_or_else(|| LedgerError::invariant("reservation produced no allocation"))?;
    entry.events.extend(events);

    Ok(LineItem {
        item_id: Some(item_id),
        name: entry.item.name().to_string(),
        quantity: reserved.requested,
        unit_price: price_override.unwrap_or(entry.item.unit_price()),
        shortage: reserved.shortage,
    })
}

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<ChangeEnvelope>,
{
    /// Reserve stock for `request` and record the booking, in one commit.
    ///
    /// Insufficient stock is not an error: whatever is on hand is deducted and
    /// the rest is recorded as the line's shortage. On a version conflict the
    /// whole allocation is redone from a fresh read.
    pub fn create_booking(
        &self,
        tenant_id: TenantId,
        created_by: UserId,
        request: BookingRequest,
        at: DateTime<Utc>,
    ) -> Result<Booking, LedgerError> {
        let _span = info_span!("ledger.create_booking", tenant = %tenant_id).entered();
        request.validate()?;

        let booking_id = BookingId::generate();
        let booking = self.run_atomic(tenant_id, "create_booking", |uow| {
            let catalog = self.store.list_items(tenant_id)?;
            let mut drawn = BTreeMap::new();

            let lines = request
                .lines
                .iter()
                .map(|requested| allocate_line(tenant_id, &catalog, &mut drawn, requested, at))
                .collect::<Result<Vec<_>, _>>()?;

            let total_due = match request.total_due {
                Some(total) => total as u64,
                None => lines
                    .iter()
                    .map(LineItem::line_total)
                    .fold(0, u64::saturating_add),
            };

            let mut booking = Booking::empty(booking_id);
            let events = booking.execute(&BookingCommand::OpenBooking(OpenBooking {
                tenant_id,
                booking_id,
                created_by,
                details: request.details.clone(),
                lines,
                total_due,
                amount_paid: request.deposit as u64,
                occurred_at: at,
            }))?;

            for entry in drawn.values() {
                uow.stage_item(&entry.item, entry.loaded_version, &entry.events)?;
            }
            uow.stage_booking(&booking, 0, &events)?;
            Ok(booking)
        })?;

        info!(
            %booking_id,
            lines = booking.lines().len(),
            shortage = booking.total_shortage(),
            total_due = booking.payment().total_due,
            "booking created"
        );
        Ok(booking)
    }
}

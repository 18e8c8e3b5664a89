use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use rentbook_bookings::RequestedLine;
use rentbook_core::{Aggregate, AggregateRoot, DomainError, TenantId};
use rentbook_events::EventBus;
use rentbook_inventory::{
    AddItem, AdjustStock, AvailabilityLine, EditItem, InventoryCommand, InventorySummary,
    RemoveItem, StockItem, StockItemId, check_availability, find_by_name, low_stock,
    normalize_name,
};

use crate::error::LedgerError;
use crate::store::LedgerStore;

use super::{ChangeEnvelope, Ledger};

/// A new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockItem {
    pub name: String,
    pub total_quantity: i64,
    pub unit_price: i64,
    /// Falls back to the configured default.
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
}

impl NewStockItem {
    pub fn new(name: impl Into<String>, total_quantity: i64, unit_price: i64) -> Self {
        Self {
            name: name.into(),
            total_quantity,
            unit_price,
            low_stock_threshold: None,
        }
    }

    pub fn with_threshold(mut self, low_stock_threshold: i64) -> Self {
        self.low_stock_threshold = Some(low_stock_threshold);
        self
    }
}

/// Administrative overwrite of an item's counts and price.
///
/// `available_quantity` is clamped into `[0, total_quantity]`. `None` fields
/// keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEdit {
    #[serde(default)]
    pub name: Option<String>,
    pub total_quantity: i64,
    pub available_quantity: i64,
    pub unit_price: i64,
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
}

impl ItemEdit {
    pub fn counts(total_quantity: i64, available_quantity: i64, unit_price: i64) -> Self {
        Self {
            name: None,
            total_quantity,
            available_quantity,
            unit_price,
            low_stock_threshold: None,
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.total_quantity < 0 {
            return Err(DomainError::validation("total quantity cannot be negative"));
        }
        if self.unit_price < 0 {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        if self.low_stock_threshold.is_some_and(|t| t < 0) {
            return Err(DomainError::validation("low-stock threshold cannot be negative"));
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(())
    }
}

fn name_taken(items: &[StockItem], name: &str, except: Option<StockItemId>) -> Option<LedgerError> {
    find_by_name(items, name)
        .filter(|existing| Some(existing.id_typed()) != except)
        .map(|existing| {
            LedgerError::conflict(format!("an item named '{}' already exists", existing.name()))
        })
}

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<ChangeEnvelope>,
{
    /// Add a catalog entry with `available = total`.
    pub fn add_item(
        &self,
        tenant_id: TenantId,
        new_item: NewStockItem,
        at: DateTime<Utc>,
    ) -> Result<StockItem, LedgerError> {
        let _span = info_span!("ledger.add_item", tenant = %tenant_id).entered();

        let item_id = StockItemId::generate();
        let name = new_item.name.clone();
        let threshold = new_item.low_stock_threshold.unwrap_or_else(|| {
            i64::try_from(self.config.default_low_stock_threshold).unwrap_or(i64::MAX)
        });
        let command = InventoryCommand::AddItem(AddItem {
            tenant_id,
            item_id,
            name: new_item.name,
            total_quantity: new_item.total_quantity,
            unit_price: new_item.unit_price,
            low_stock_threshold: threshold,
            occurred_at: at,
        });
        // Bad input is rejected before the store is touched.
        StockItem::empty(item_id).handle(&command)?;

        let item = self.run_atomic(tenant_id, "add_item", |uow| {
            let items = self.store.list_items(tenant_id)?;
            if let Some(err) = name_taken(&items, &name, None) {
                return Err(err);
            }
            let mut item = StockItem::empty(item_id);
            let events = item.execute(&command)?;
            uow.stage_item(&item, 0, &events)?;
            Ok(item)
        })?;

        info!(item_id = %item.id_typed(), name = item.name(), total = item.total(), "stock item added");
        Ok(item)
    }

    pub fn get_item(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
    ) -> Result<StockItem, LedgerError> {
        self.require_item(tenant_id, item_id)
    }

    /// Case-insensitive exact match on the trimmed name.
    pub fn find_item_by_name(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> Result<Option<StockItem>, LedgerError> {
        let items = self.store.list_items(tenant_id)?;
        Ok(find_by_name(&items, name).cloned())
    }

    /// The whole catalog, sorted by name.
    pub fn list_items(&self, tenant_id: TenantId) -> Result<Vec<StockItem>, LedgerError> {
        let mut items = self.store.list_items(tenant_id)?;
        items.sort_by_cached_key(|item| normalize_name(item.name()));
        Ok(items)
    }

    /// `available += delta`, clamped into `[0, total]`.
    pub fn adjust_item(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        delta: i64,
        at: DateTime<Utc>,
    ) -> Result<StockItem, LedgerError> {
        let _span = info_span!("ledger.adjust_item", tenant = %tenant_id, %item_id).entered();

        self.run_atomic(tenant_id, "adjust_item", |uow| {
            let mut item = self.require_item(tenant_id, item_id)?;
            let loaded = item.version();
            let events = item.execute(&InventoryCommand::AdjustStock(AdjustStock {
                tenant_id,
                item_id,
                delta,
                occurred_at: at,
            }))?;
            uow.stage_item(&item, loaded, &events)?;
            Ok(item)
        })
    }

    pub fn edit_item(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        edit: ItemEdit,
        at: DateTime<Utc>,
    ) -> Result<StockItem, LedgerError> {
        let _span = info_span!("ledger.edit_item", tenant = %tenant_id, %item_id).entered();
        edit.validate()?;

        let item = self.run_atomic(tenant_id, "edit_item", |uow| {
            let mut item = self.require_item(tenant_id, item_id)?;
            let loaded = item.version();
            let name = edit.name.clone().unwrap_or_else(|| item.name().to_string());
            if normalize_name(&name) != normalize_name(item.name()) {
                let items = self.store.list_items(tenant_id)?;
                if let Some(err) = name_taken(&items, &name, Some(item_id)) {
                    return Err(err);
                }
            }
            let low_stock_threshold = edit.low_stock_threshold.unwrap_or_else(|| {
                i64::try_from(item.low_stock_threshold()).unwrap_or(i64::MAX)
            });

            let events = item.execute(&InventoryCommand::EditItem(EditItem {
                tenant_id,
                item_id,
                name,
                total_quantity: edit.total_quantity,
                available_quantity: edit.available_quantity,
                unit_price: edit.unit_price,
                low_stock_threshold,
                occurred_at: at,
            }))?;
            uow.stage_item(&item, loaded, &events)?;
            Ok(item)
        })?;

        info!(total = item.total(), available = item.available(), "stock item edited");
        Ok(item)
    }

    /// Delete the item. Bookings keep their line-item snapshots.
    pub fn remove_item(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let _span = info_span!("ledger.remove_item", tenant = %tenant_id, %item_id).entered();

        self.run_atomic(tenant_id, "remove_item", |uow| {
            let mut item = self.require_item(tenant_id, item_id)?;
            let loaded = item.version();
            let events = item.execute(&InventoryCommand::RemoveItem(RemoveItem {
                tenant_id,
                item_id,
                occurred_at: at,
            }))?;
            uow.stage_item(&item, loaded, &events)
        })?;

        info!("stock item removed");
        Ok(())
    }

    /// Items at or below their threshold, sorted by name.
    pub fn low_stock_items(&self, tenant_id: TenantId) -> Result<Vec<StockItem>, LedgerError> {
        let items = self.list_items(tenant_id)?;
        Ok(low_stock(&items).into_iter().cloned().collect())
    }

    pub fn inventory_summary(&self, tenant_id: TenantId) -> Result<InventorySummary, LedgerError> {
        let items = self.store.list_items(tenant_id)?;
        Ok(InventorySummary::from_items(&items))
    }

    /// What reserving `lines` right now would do, without reserving anything.
    pub fn check_availability(
        &self,
        tenant_id: TenantId,
        lines: &[RequestedLine],
    ) -> Result<Vec<AvailabilityLine>, LedgerError> {
        for (idx, line) in lines.iter().enumerate() {
            if line.name.trim().is_empty() {
                return Err(LedgerError::Validation(format!(
                    "line {idx}: item name cannot be empty"
                )));
            }
            if line.quantity <= 0 {
                return Err(LedgerError::Validation(format!(
                    "line {idx}: quantity must be positive"
                )));
            }
        }

        let items = self.store.list_items(tenant_id)?;
        Ok(check_availability(
            &items,
            lines.iter().map(|l| (l.name.as_str(), l.quantity as u64)),
        ))
    }
}

//! Read-side helpers over a tenant's item list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::item::{StockItem, StockItemId};

/// Key used for case-insensitive name matching and uniqueness.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Case-insensitive exact lookup, ignoring removed items.
pub fn find_by_name<'a, I>(items: I, name: &str) -> Option<&'a StockItem>
where
    I: IntoIterator<Item = &'a StockItem>,
{
    let key = normalize_name(name);
    items
        .into_iter()
        .find(|item| item.is_live() && normalize_name(item.name()) == key)
}

/// Items at or below their low-stock threshold.
pub fn low_stock<'a, I>(items: I) -> Vec<&'a StockItem>
where
    I: IntoIterator<Item = &'a StockItem>,
{
    items
        .into_iter()
        .filter(|item| item.is_live() && item.is_low_stock())
        .collect()
}

/// Dashboard totals for a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub item_count: usize,
    pub total_owned: u64,
    pub total_available: u64,
    pub total_out: u64,
    pub low_stock_count: usize,
}

impl InventorySummary {
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a StockItem>,
    {
        items
            .into_iter()
            .filter(|item| item.is_live())
            .fold(Self::default(), |mut acc, item| {
                acc.item_count += 1;
                acc.total_owned = acc.total_owned.saturating_add(item.total());
                acc.total_available = acc.total_available.saturating_add(item.available());
                acc.total_out = acc.total_out.saturating_add(item.out());
                if item.is_low_stock() {
                    acc.low_stock_count += 1;
                }
                acc
            })
    }
}

/// One line of an availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityLine {
    pub name: String,
    /// `None` when the catalog has no such item.
    pub item_id: Option<StockItemId>,
    pub requested: u64,
    /// On hand for this line, after earlier lines naming the same item.
    pub available: u64,
    pub shortage: u64,
    /// Left on the shelf if this line were booked.
    pub remaining: u64,
}

impl AvailabilityLine {
    pub fn is_covered(&self) -> bool {
        self.shortage == 0
    }
}

/// Preview what a reservation would do, without touching stock.
///
/// Lines naming the same item draw from a shared running count, the same way
/// an actual reservation allocates them.
pub fn check_availability<'a, I, R, S>(items: I, requests: R) -> Vec<AvailabilityLine>
where
    I: IntoIterator<Item = &'a StockItem>,
    R: IntoIterator<Item = (S, u64)>,
    S: AsRef<str>,
{
    let live: Vec<&StockItem> = items.into_iter().filter(|i| i.is_live()).collect();
    let mut running: HashMap<StockItemId, u64> = HashMap::new();

    requests
        .into_iter()
        .map(|(name, requested)| {
            let name = name.as_ref();
            match find_by_name(live.iter().copied(), name) {
                Some(item) => {
                    let on_hand = running
                        .entry(item.id_typed())
                        .or_insert_with(|| item.available());
                    let available = *on_hand;
                    let covered = requested.min(available);
                    *on_hand -= covered;
                    AvailabilityLine {
                        name: item.name().to_string(),
                        item_id: Some(item.id_typed()),
                        requested,
                        available,
                        shortage: requested - covered,
                        remaining: available - covered,
                    }
                }
                None => AvailabilityLine {
                    name: name.trim().to_string(),
                    item_id: None,
                    requested,
                    available: 0,
                    shortage: requested,
                    remaining: 0,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AddItem, InventoryCommand, ReserveStock, RemoveItem};
    use chrono::Utc;
    use rentbook_core::{Aggregate, TenantId};

    fn item(tenant_id: TenantId, name: &str, total: i64, threshold: i64) -> StockItem {
        let item_id = StockItemId::generate();
        let mut item = StockItem::empty(item_id);
        item.execute(&InventoryCommand::AddItem(AddItem {
            tenant_id,
            item_id,
            name: name.to_string(),
            total_quantity: total,
            unit_price: 50,
            low_stock_threshold: threshold,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        item
    }

    fn take(item: &mut StockItem, tenant_id: TenantId, quantity: i64) {
        item.execute(&InventoryCommand::ReserveStock(ReserveStock {
            tenant_id,
            item_id: item.id_typed(),
            quantity,
            occurred_at: Utc::now(),
        }))
        .unwrap();
    }

    #[test]
    fn find_by_name_is_case_insensitive_and_trimmed() {
        let tenant_id = TenantId::new();
        let items = vec![item(tenant_id, "Chairs", 5, 1), item(tenant_id, "Tables", 3, 1)];

        let found = find_by_name(&items, "  cHaIrS ").unwrap();
        assert_eq!(found.name(), "Chairs");
        assert!(find_by_name(&items, "chair").is_none());
    }

    #[test]
    fn find_by_name_skips_removed_items() {
        let tenant_id = TenantId::new();
        let mut chairs = item(tenant_id, "Chairs", 5, 1);
        chairs
            .execute(&InventoryCommand::RemoveItem(RemoveItem {
                tenant_id,
                item_id: chairs.id_typed(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        assert!(find_by_name([&chairs], "chairs").is_none());
    }

    #[test]
    fn summary_and_low_stock_use_threshold_inclusively() {
        let tenant_id = TenantId::new();
        let mut chairs = item(tenant_id, "Chairs", 50, 10);
        let tables = item(tenant_id, "Tables", 8, 10);
        take(&mut chairs, tenant_id, 40);

        let items = vec![chairs, tables];
        let summary = InventorySummary::from_items(&items);
        assert_eq!(
            summary,
            InventorySummary {
                item_count: 2,
                total_owned: 58,
                total_available: 18,
                total_out: 40,
                low_stock_count: 2,
            }
        );

        let names: Vec<&str> = low_stock(&items).into_iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Chairs", "Tables"]);
    }

    #[test]
    fn check_availability_shares_stock_between_lines() {
        let tenant_id = TenantId::new();
        let items = vec![item(tenant_id, "Chairs", 20, 0)];

        let lines = check_availability(&items, [("chairs", 15), ("Chairs", 10), ("Tents", 2)]);

        assert_eq!(lines[0].shortage, 0);
        assert_eq!(lines[0].remaining, 5);
        assert_eq!(lines[1].available, 5);
        assert_eq!(lines[1].shortage, 5);
        assert!(!lines[1].is_covered());
        assert_eq!(lines[2].item_id, None);
        assert_eq!(lines[2].shortage, 2);
        // Preview only: nothing was deducted.
        assert_eq!(items[0].available(), 20);
    }

    #[test]
    fn summary_totals_saturate() {
        let tenant_id = TenantId::new();
        let items: Vec<StockItem> = ["Chairs", "Tables", "Tents"]
            .into_iter()
            .map(|name| item(tenant_id, name, i64::MAX, 1))
            .collect();
        let summary = InventorySummary::from_items(&items);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total_owned, u64::MAX);
        assert_eq!(summary.total_available, u64::MAX);
        assert_eq!(summary.total_out, 0);
    }
}

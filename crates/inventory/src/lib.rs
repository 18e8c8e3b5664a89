//! Stock catalog domain (pure, no IO).
//!
//! A [`StockItem`] is one rentable SKU of a business. Every mutation keeps
//! `0 <= available <= total`: reservations deduct only what is on hand and
//! report the rest as shortage, restorations and adjustments saturate.

pub mod catalog;
pub mod item;

pub use catalog::{
    AvailabilityLine, InventorySummary, check_availability, find_by_name, low_stock,
    normalize_name,
};
pub use item::{
    AddItem, AdjustStock, EditItem, InventoryCommand, InventoryEvent, ItemAdded, ItemEdited,
    ItemRemoved, RemoveItem, ReserveStock, RestoreStock, StockAdjusted, StockItem, StockItemId,
    StockReserved, StockRestored,
};

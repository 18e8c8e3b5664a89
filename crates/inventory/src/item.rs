use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rentbook_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use rentbook_events::Event;

/// Stock item identifier (tenant-scoped via `tenant_id` fields in commands/events).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockItemId(pub AggregateId);

impl StockItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for StockItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: one rentable SKU owned by a business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    id: StockItemId,
    tenant_id: Option<TenantId>,
    name: String,
    total: u64,
    available: u64,
    /// Minor currency units per rented unit.
    unit_price: u64,
    low_stock_threshold: u64,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
    removed: bool,
}

impl StockItem {
    /// Not-yet-created instance, the starting point for `AddItem`.
    pub fn empty(id: StockItemId) -> Self {
        Self {
            id,
            tenant_id: None,
            name: String::new(),
            total: 0,
            available: 0,
            unit_price: 0,
            low_stock_threshold: 0,
            updated_at: None,
            version: 0,
            created: false,
            removed: false,
        }
    }

    pub fn id_typed(&self) -> StockItemId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn available(&self) -> u64 {
        self.available
    }

    /// Units currently out with clients.
    pub fn out(&self) -> u64 {
        self.total - self.available
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn low_stock_threshold(&self) -> u64 {
        self.low_stock_threshold
    }

    pub fn is_low_stock(&self) -> bool {
        self.available <= self.low_stock_threshold
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Created and not removed.
    pub fn is_live(&self) -> bool {
        self.created && !self.removed
    }
}

impl AggregateRoot for StockItem {
    type Id = StockItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddItem. Quantities arrive signed so that bad input can be rejected
/// instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub name: String,
    pub total_quantity: i64,
    pub unit_price: i64,
    pub low_stock_threshold: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReserveStock. Deducts what is on hand; the remainder is shortage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStock {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RestoreStock. Gives back units, saturating at `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreStock {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock. `available += delta`, clamped into `[0, total]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EditItem. Administrative overwrite; `available_quantity` is
/// re-clamped against the new total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditItem {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub name: String,
    pub total_quantity: i64,
    pub available_quantity: i64,
    pub unit_price: i64,
    pub low_stock_threshold: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItem {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    AddItem(AddItem),
    ReserveStock(ReserveStock),
    RestoreStock(RestoreStock),
    AdjustStock(AdjustStock),
    EditItem(EditItem),
    RemoveItem(RemoveItem),
}

/// Event: ItemAdded. Available starts equal to total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub name: String,
    pub total_quantity: u64,
    pub unit_price: u64,
    pub low_stock_threshold: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReserved. `deducted + shortage == requested`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReserved {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub requested: u64,
    pub deducted: u64,
    pub shortage: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockRestored. `restored <= requested`; the gap was absorbed by the cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRestored {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub requested: u64,
    pub restored: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub requested_delta: i64,
    pub available_after: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemEdited. Carries the already-clamped values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEdited {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub name: String,
    pub total_quantity: u64,
    pub available_quantity: u64,
    pub unit_price: u64,
    pub low_stock_threshold: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub tenant_id: TenantId,
    pub item_id: StockItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemAdded(ItemAdded),
    StockReserved(StockReserved),
    StockRestored(StockRestored),
    StockAdjusted(StockAdjusted),
    ItemEdited(ItemEdited),
    ItemRemoved(ItemRemoved),
}

impl InventoryEvent {
    pub fn item_id(&self) -> StockItemId {
        match self {
            InventoryEvent::ItemAdded(e) => e.item_id,
            InventoryEvent::StockReserved(e) => e.item_id,
            InventoryEvent::StockRestored(e) => e.item_id,
            InventoryEvent::StockAdjusted(e) => e.item_id,
            InventoryEvent::ItemEdited(e) => e.item_id,
            InventoryEvent::ItemRemoved(e) => e.item_id,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemAdded(_) => "inventory.item.added",
            InventoryEvent::StockReserved(_) => "inventory.item.stock_reserved",
            InventoryEvent::StockRestored(_) => "inventory.item.stock_restored",
            InventoryEvent::StockAdjusted(_) => "inventory.item.stock_adjusted",
            InventoryEvent::ItemEdited(_) => "inventory.item.edited",
            InventoryEvent::ItemRemoved(_) => "inventory.item.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemAdded(e) => e.occurred_at,
            InventoryEvent::StockReserved(e) => e.occurred_at,
            InventoryEvent::StockRestored(e) => e.occurred_at,
            InventoryEvent::StockAdjusted(e) => e.occurred_at,
            InventoryEvent::ItemEdited(e) => e.occurred_at,
            InventoryEvent::ItemRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemAdded(e) => {
                self.id = e.item_id;
                self.tenant_id = Some(e.tenant_id);
                self.name = e.name.clone();
                self.total = e.total_quantity;
                self.available = e.total_quantity;
                self.unit_price = e.unit_price;
                self.low_stock_threshold = e.low_stock_threshold;
                self.created = true;
                self.removed = false;
            }
            InventoryEvent::StockReserved(e) => {
                self.available = self.available.saturating_sub(e.deducted);
            }
            InventoryEvent::StockRestored(e) => {
                self.available = (self.available + e.restored).min(self.total);
            }
            InventoryEvent::StockAdjusted(e) => {
                self.available = e.available_after.min(self.total);
            }
            InventoryEvent::ItemEdited(e) => {
                self.name = e.name.clone();
                self.total = e.total_quantity;
                self.available = e.available_quantity.min(e.total_quantity);
                self.unit_price = e.unit_price;
                self.low_stock_threshold = e.low_stock_threshold;
            }
            InventoryEvent::ItemRemoved(_) => {
                self.removed = true;
            }
        }

        self.updated_at = Some(Event::occurred_at(event));
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::AddItem(cmd) => self.handle_add(cmd),
            InventoryCommand::ReserveStock(cmd) => self.handle_reserve(cmd),
            InventoryCommand::RestoreStock(cmd) => self.handle_restore(cmd),
            InventoryCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
            InventoryCommand::EditItem(cmd) => self.handle_edit(cmd),
            InventoryCommand::RemoveItem(cmd) => self.handle_remove(cmd),
        }
    }
}

fn non_negative(value: i64, field: &str) -> Result<u64, DomainError> {
    u64::try_from(value).map_err(|_| DomainError::validation(format!("{field} cannot be negative")))
}

fn clean_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

impl StockItem {
    fn ensure_live(&self, tenant_id: TenantId, item_id: StockItemId) -> Result<(), DomainError> {
        if !self.is_live() {
            return Err(DomainError::not_found(format!("stock item {item_id}")));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_add(&self, cmd: &AddItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already exists"));
        }
        let name = clean_name(&cmd.name)?;
        let total_quantity = non_negative(cmd.total_quantity, "total quantity")?;
        let unit_price = non_negative(cmd.unit_price, "unit price")?;
        let low_stock_threshold = non_negative(cmd.low_stock_threshold, "low-stock threshold")?;

        Ok(vec![InventoryEvent::ItemAdded(ItemAdded {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            name,
            total_quantity,
            unit_price,
            low_stock_threshold,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reserve(&self, cmd: &ReserveStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.item_id)?;
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let requested = cmd.quantity as u64;
        let deducted = requested.min(self.available);

        Ok(vec![InventoryEvent::StockReserved(StockReserved {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            requested,
            deducted,
            shortage: requested - deducted,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_restore(&self, cmd: &RestoreStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.item_id)?;
        let requested = non_negative(cmd.quantity, "quantity")?;
        if requested == 0 {
            return Ok(vec![]);
        }

        // Over-restoration (e.g. a double return) saturates at total.
        let restored = requested.min(self.total - self.available);

        Ok(vec![InventoryEvent::StockRestored(StockRestored {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            requested,
            restored,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.item_id)?;
        if cmd.delta == 0 {
            return Ok(vec![]);
        }

        let target = i128::from(self.available) + i128::from(cmd.delta);
        let available_after = target.clamp(0, i128::from(self.total)) as u64;

        Ok(vec![InventoryEvent::StockAdjusted(StockAdjusted {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            requested_delta: cmd.delta,
            available_after,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_edit(&self, cmd: &EditItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.item_id)?;
        let name = clean_name(&cmd.name)?;
        let total_quantity = non_negative(cmd.total_quantity, "total quantity")?;
        let unit_price = non_negative(cmd.unit_price, "unit price")?;
        let low_stock_threshold = non_negative(cmd.low_stock_threshold, "low-stock threshold")?;
        let available_quantity = cmd.available_quantity.clamp(0, total_quantity as i64) as u64;

        Ok(vec![InventoryEvent::ItemEdited(ItemEdited {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            name,
            total_quantity,
            available_quantity,
            unit_price,
            low_stock_threshold,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.item_id)?;
        Ok(vec![InventoryEvent::ItemRemoved(ItemRemoved {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chairs(tenant_id: TenantId, total: i64) -> StockItem {
        let item_id = StockItemId::generate();
        let mut item = StockItem::empty(item_id);
        item.execute(&InventoryCommand::AddItem(AddItem {
            tenant_id,
            item_id,
            name: "  Chairs ".to_string(),
            total_quantity: total,
            unit_price: 100,
            low_stock_threshold: 10,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        item
    }

    fn reserve(item: &mut StockItem, tenant_id: TenantId, quantity: i64) -> StockReserved {
        let events = item
            .execute(&InventoryCommand::ReserveStock(ReserveStock {
                tenant_id,
                item_id: item.id_typed(),
                quantity,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        match events.as_slice() {
            [InventoryEvent::StockReserved(e)] => e.clone(),
            other => panic!("expected one StockReserved, got {other:?}"),
        }
    }

    fn restore(item: &mut StockItem, tenant_id: TenantId, quantity: i64) -> Vec<InventoryEvent> {
        item.execute(&InventoryCommand::RestoreStock(RestoreStock {
            tenant_id,
            item_id: item.id_typed(),
            quantity,
            occurred_at: Utc::now(),
        }))
        .unwrap()
    }

    #[test]
    fn add_item_starts_fully_available_with_trimmed_name() {
        let item = chairs(TenantId::new(), 50);
        assert_eq!(item.name(), "Chairs");
        assert_eq!(item.total(), 50);
        assert_eq!(item.available(), 50);
        assert_eq!(item.unit_price(), 100);
        assert_eq!(item.version(), 1);
    }

    #[test]
    fn add_item_rejects_negative_total() {
        let item_id = StockItemId::generate();
        let err = StockItem::empty(item_id)
            .handle(&InventoryCommand::AddItem(AddItem {
                tenant_id: TenantId::new(),
                item_id,
                name: "Tables".to_string(),
                total_quantity: -1,
                unit_price: 0,
                low_stock_threshold: 0,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn add_item_twice_is_a_conflict() {
        let tenant_id = TenantId::new();
        let item = chairs(tenant_id, 5);
        let err = item
            .handle(&InventoryCommand::AddItem(AddItem {
                tenant_id,
                item_id: item.id_typed(),
                name: "Chairs".to_string(),
                total_quantity: 5,
                unit_price: 0,
                low_stock_threshold: 0,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn reserve_records_shortage_instead_of_failing() {
        let tenant_id = TenantId::new();
        let mut item = chairs(tenant_id, 50);

        let first = reserve(&mut item, tenant_id, 30);
        assert_eq!((first.deducted, first.shortage), (30, 0));
        assert_eq!(item.available(), 20);

        let second = reserve(&mut item, tenant_id, 30);
        assert_eq!((second.deducted, second.shortage), (20, 10));
        assert_eq!(item.available(), 0);
    }

    #[test]
    fn reserve_rejects_non_positive_quantity() {
        let tenant_id = TenantId::new();
        let item = chairs(tenant_id, 5);
        let err = item
            .handle(&InventoryCommand::ReserveStock(ReserveStock {
                tenant_id,
                item_id: item.id_typed(),
                quantity: 0,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn restore_saturates_at_total() {
        let tenant_id = TenantId::new();
        let mut item = chairs(tenant_id, 10);
        reserve(&mut item, tenant_id, 4);

        let events = restore(&mut item, tenant_id, 9);
        match events.as_slice() {
            [InventoryEvent::StockRestored(e)] => assert_eq!((e.requested, e.restored), (9, 4)),
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(item.available(), 10);
    }

    #[test]
    fn restore_of_zero_is_a_no_op() {
        let tenant_id = TenantId::new();
        let mut item = chairs(tenant_id, 10);
        let version = item.version();
        assert!(restore(&mut item, tenant_id, 0).is_empty());
        assert_eq!(item.version(), version);
    }

    #[test]
    fn adjust_clamps_both_ways() {
        let tenant_id = TenantId::new();
        let mut item = chairs(tenant_id, 10);
        let adjust = |item: &mut StockItem, delta| {
            item.execute(&InventoryCommand::AdjustStock(AdjustStock {
                tenant_id,
                item_id: item.id_typed(),
                delta,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        };

        adjust(&mut item, -25);
        assert_eq!(item.available(), 0);
        adjust(&mut item, 3);
        assert_eq!(item.available(), 3);
        adjust(&mut item, i64::MAX);
        assert_eq!(item.available(), 10);
    }

    #[test]
    fn edit_reclamps_available_into_new_total() {
        let tenant_id = TenantId::new();
        let mut item = chairs(tenant_id, 50);
        item.execute(&InventoryCommand::EditItem(EditItem {
            tenant_id,
            item_id: item.id_typed(),
            name: "Folding chairs".to_string(),
            total_quantity: 20,
            available_quantity: 45,
            unit_price: 120,
            low_stock_threshold: 5,
            occurred_at: Utc::now(),
        }))
        .unwrap();

        assert_eq!(item.name(), "Folding chairs");
        assert_eq!(item.total(), 20);
        assert_eq!(item.available(), 20);
        assert_eq!(item.unit_price(), 120);

        item.execute(&InventoryCommand::EditItem(EditItem {
            tenant_id,
            item_id: item.id_typed(),
            name: "Folding chairs".to_string(),
            total_quantity: 20,
            available_quantity: -3,
            unit_price: 120,
            low_stock_threshold: 5,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        assert_eq!(item.available(), 0);
    }

    #[test]
    fn removed_item_rejects_further_commands() {
        let tenant_id = TenantId::new();
        let mut item = chairs(tenant_id, 10);
        item.execute(&InventoryCommand::RemoveItem(RemoveItem {
            tenant_id,
            item_id: item.id_typed(),
            occurred_at: Utc::now(),
        }))
        .unwrap();
        assert!(item.is_removed());

        let err = item
            .handle(&InventoryCommand::ReserveStock(ReserveStock {
                tenant_id,
                item_id: item.id_typed(),
                quantity: 1,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn foreign_tenant_is_rejected() {
        let mut item = chairs(TenantId::new(), 10);
        let id = item.id_typed();
        let err = item
            .execute(&InventoryCommand::ReserveStock(ReserveStock {
                tenant_id: TenantId::new(),
                item_id: id,
                quantity: 1,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(item.available(), 10);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let tenant_id = TenantId::new();
        let item = chairs(tenant_id, 10);
        let before = item.clone();
        let cmd = InventoryCommand::ReserveStock(ReserveStock {
            tenant_id,
            item_id: item.id_typed(),
            quantity: 3,
            occurred_at: Utc::now(),
        });
        let a = item.handle(&cmd).unwrap();
        let b = item.handle(&cmd).unwrap();
        assert_eq!(a, b);
        assert_eq!(item, before);
    }

    #[test]
    fn events_round_trip_through_json() {
        let tenant_id = TenantId::new();
        let mut item = chairs(tenant_id, 10);
        let events = restore(&mut item, tenant_id, 1);
        let reserved = reserve(&mut item, tenant_id, 2);
        let all: Vec<InventoryEvent> = events
            .into_iter()
            .chain([InventoryEvent::StockReserved(reserved)])
            .collect();
        let json = serde_json::to_value(&all).unwrap();
        let back: Vec<InventoryEvent> = serde_json::from_value(json).unwrap();
        assert_eq!(back, all);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Reserve(i64),
            Restore(i64),
            Adjust(i64),
            Edit { total: i64, available: i64 },
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1i64..200).prop_map(Op::Reserve),
                (0i64..200).prop_map(Op::Restore),
                (-300i64..300).prop_map(Op::Adjust),
                (0i64..200, -50i64..300).prop_map(|(total, available)| Op::Edit { total, available }),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: available stays within [0, total] whatever happens.
            #[test]
            fn available_never_leaves_bounds(total in 0i64..200, ops in proptest::collection::vec(op(), 0..40)) {
                let tenant_id = TenantId::new();
                let mut item = chairs(tenant_id, total);
                let item_id = item.id_typed();
                let now = Utc::now();

                for op in ops {
                    let cmd = match op {
                        Op::Reserve(quantity) => InventoryCommand::ReserveStock(ReserveStock { tenant_id, item_id, quantity, occurred_at: now }),
                        Op::Restore(quantity) => InventoryCommand::RestoreStock(RestoreStock { tenant_id, item_id, quantity, occurred_at: now }),
                        Op::Adjust(delta) => InventoryCommand::AdjustStock(AdjustStock { tenant_id, item_id, delta, occurred_at: now }),
                        Op::Edit { total, available } => InventoryCommand::EditItem(EditItem {
                            tenant_id,
                            item_id,
                            name: "Chairs".to_string(),
                            total_quantity: total,
                            available_quantity: available,
                            unit_price: 100,
                            low_stock_threshold: 10,
                            occurred_at: now,
                        }),
                    };
                    let events = item.execute(&cmd).unwrap();
                    for event in &events {
                        if let InventoryEvent::StockReserved(e) = event {
                            prop_assert!(e.shortage <= e.requested);
                            prop_assert_eq!(e.deducted + e.shortage, e.requested);
                        }
                    }
                    prop_assert!(item.available() <= item.total());
                }
            }

            /// Property: reserve then restore the deducted part is conservative.
            #[test]
            fn reserve_then_restore_conserves_available(total in 0i64..100, quantity in 1i64..150) {
                let tenant_id = TenantId::new();
                let mut item = chairs(tenant_id, total);
                let before = item.available();
                let reserved = reserve(&mut item, tenant_id, quantity);
                restore(&mut item, tenant_id, (reserved.requested - reserved.shortage) as i64);
                prop_assert_eq!(item.available(), before);
            }
        }
    }
}

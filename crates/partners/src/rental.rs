use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use rentbook_bookings::BookingId;
use rentbook_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId, ValueObject};
use rentbook_events::Event;
use rentbook_inventory::StockItemId;

/// Partner rental identifier (tenant-scoped via `tenant_id` fields in commands/events).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerRentalId(pub AggregateId);

impl PartnerRentalId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for PartnerRentalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Which way the goods went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalDirection {
    /// Borrowed from another business; we owe the return.
    Borrowed,
    /// Rented out to another business; they owe the return.
    Lent,
}

/// `Active -> Overdue` is detected by the sweep; `Active | Overdue -> Returned`
/// is explicit and final. Amending an overdue rental makes it active again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Active,
    Overdue,
    Returned,
}

impl RentalStatus {
    pub fn is_open(self) -> bool {
        matches!(self, RentalStatus::Active | RentalStatus::Overdue)
    }
}

/// The other rental business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub business_name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_phone: String,
}

impl ValueObject for Counterparty {}

/// What changed hands, with whom, and until when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalTerms {
    pub item_name: String,
    pub quantity: u64,
    pub counterparty: Counterparty,
    pub start_date: NaiveDate,
    pub return_by: NaiveDate,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub notes: String,
}

impl ValueObject for RentalTerms {}

impl RentalTerms {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.item_name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if self.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.counterparty.business_name.trim().is_empty() {
            return Err(DomainError::validation(
                "the other business must be named",
            ));
        }
        if self.return_by < self.start_date {
            return Err(DomainError::validation(
                "return-by date cannot be before the start date",
            ));
        }
        Ok(())
    }

    fn normalized(&self) -> Self {
        Self {
            item_name: self.item_name.trim().to_string(),
            counterparty: Counterparty {
                business_name: self.counterparty.business_name.trim().to_string(),
                contact_person: self.counterparty.contact_person.trim().to_string(),
                contact_phone: self.counterparty.contact_phone.trim().to_string(),
            },
            event_name: self.event_name.trim().to_string(),
            ..self.clone()
        }
    }

    fn placeholder() -> Self {
        Self {
            item_name: String::new(),
            quantity: 0,
            counterparty: Counterparty::default(),
            start_date: NaiveDate::MIN,
            return_by: NaiveDate::MIN,
            event_name: String::new(),
            notes: String::new(),
        }
    }
}

/// Aggregate root: PartnerRental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRental {
    id: PartnerRentalId,
    tenant_id: Option<TenantId>,
    direction: RentalDirection,
    item_id: Option<StockItemId>,
    booking_id: Option<BookingId>,
    terms: RentalTerms,
    status: RentalStatus,
    overdue_since: Option<NaiveDate>,
    created_at: Option<DateTime<Utc>>,
    returned_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl PartnerRental {
    pub fn empty(id: PartnerRentalId) -> Self {
        Self {
            id,
            tenant_id: None,
            direction: RentalDirection::Borrowed,
            item_id: None,
            booking_id: None,
            terms: RentalTerms::placeholder(),
            status: RentalStatus::Active,
            overdue_since: None,
            created_at: None,
            returned_at: None,
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> PartnerRentalId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn direction(&self) -> RentalDirection {
        self.direction
    }

    /// Catalog item that was lent out, if it is one of ours.
    pub fn item_id(&self) -> Option<StockItemId> {
        self.item_id
    }

    /// Booking a borrowed quantity was sourced for.
    pub fn booking_id(&self) -> Option<BookingId> {
        self.booking_id
    }

    pub fn terms(&self) -> &RentalTerms {
        &self.terms
    }

    pub fn status(&self) -> RentalStatus {
        self.status
    }

    pub fn overdue_since(&self) -> Option<NaiveDate> {
        self.overdue_since
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Already marked overdue, or still active with the return-by date passed.
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        match self.status {
            RentalStatus::Overdue => true,
            RentalStatus::Active => self.terms.return_by < today,
            RentalStatus::Returned => false,
        }
    }
}

impl AggregateRoot for PartnerRental {
    type Id = PartnerRentalId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordRental.
///
/// `item_id` only applies to lent rentals and `booking_id` only to borrowed
/// ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRental {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub direction: RentalDirection,
    pub item_id: Option<StockItemId>,
    pub booking_id: Option<BookingId>,
    pub terms: RentalTerms,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AmendRental. Replaces the terms of an open rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendRental {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub terms: RentalTerms,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReturnRental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRental {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkRentalOverdue. No-op unless active and past `today`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkRentalOverdue {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub today: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteRental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRental {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalCommand {
    RecordRental(RecordRental),
    AmendRental(AmendRental),
    ReturnRental(ReturnRental),
    MarkRentalOverdue(MarkRentalOverdue),
    DeleteRental(DeleteRental),
}

/// Event: RentalRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRecorded {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub direction: RentalDirection,
    pub item_id: Option<StockItemId>,
    pub booking_id: Option<BookingId>,
    pub terms: RentalTerms,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RentalAmended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalAmended {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub terms: RentalTerms,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RentalReturned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalReturned {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RentalMarkedOverdue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalMarkedOverdue {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub as_of: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RentalDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalDeleted {
    pub tenant_id: TenantId,
    pub rental_id: PartnerRentalId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalEvent {
    RentalRecorded(RentalRecorded),
    RentalAmended(RentalAmended),
    RentalReturned(RentalReturned),
    RentalMarkedOverdue(RentalMarkedOverdue),
    RentalDeleted(RentalDeleted),
}

impl Event for RentalEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RentalEvent::RentalRecorded(_) => "partner_rental.recorded",
            RentalEvent::RentalAmended(_) => "partner_rental.amended",
            RentalEvent::RentalReturned(_) => "partner_rental.returned",
            RentalEvent::RentalMarkedOverdue(_) => "partner_rental.marked_overdue",
            RentalEvent::RentalDeleted(_) => "partner_rental.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RentalEvent::RentalRecorded(e) => e.occurred_at,
            RentalEvent::RentalAmended(e) => e.occurred_at,
            RentalEvent::RentalReturned(e) => e.occurred_at,
            RentalEvent::RentalMarkedOverdue(e) => e.occurred_at,
            RentalEvent::RentalDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PartnerRental {
    type Command = RentalCommand;
    type Event = RentalEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RentalEvent::RentalRecorded(e) => {
                self.id = e.rental_id;
                self.tenant_id = Some(e.tenant_id);
                self.direction = e.direction;
                self.item_id = e.item_id;
                self.booking_id = e.booking_id;
                self.terms = e.terms.clone();
                self.status = RentalStatus::Active;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            RentalEvent::RentalAmended(e) => {
                self.terms = e.terms.clone();
                self.status = RentalStatus::Active;
                self.overdue_since = None;
            }
            RentalEvent::RentalReturned(e) => {
                self.status = RentalStatus::Returned;
                self.returned_at = Some(e.occurred_at);
            }
            RentalEvent::RentalMarkedOverdue(e) => {
                self.status = RentalStatus::Overdue;
                self.overdue_since = Some(e.as_of);
            }
            RentalEvent::RentalDeleted(_) => {
                self.deleted = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RentalCommand::RecordRental(cmd) => self.handle_record(cmd),
            RentalCommand::AmendRental(cmd) => self.handle_amend(cmd),
            RentalCommand::ReturnRental(cmd) => self.handle_return(cmd),
            RentalCommand::MarkRentalOverdue(cmd) => self.handle_mark_overdue(cmd),
            RentalCommand::DeleteRental(cmd) => self.handle_delete(cmd),
        }
    }
}

impl PartnerRental {
    fn ensure_existing(
        &self,
        tenant_id: TenantId,
        rental_id: PartnerRentalId,
    ) -> Result<(), DomainError> {
        if !self.created || self.deleted {
            return Err(DomainError::not_found(format!("partner rental {rental_id}")));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != rental_id {
            return Err(DomainError::invariant("rental_id mismatch"));
        }
        Ok(())
    }

    fn handle_record(&self, cmd: &RecordRental) -> Result<Vec<RentalEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("partner rental already exists"));
        }
        cmd.terms.validate()?;
        match cmd.direction {
            RentalDirection::Lent if cmd.booking_id.is_some() => {
                return Err(DomainError::validation(
                    "only borrowed items can be tied to a booking",
                ));
            }
            RentalDirection::Borrowed if cmd.item_id.is_some() => {
                return Err(DomainError::validation(
                    "only lent items can come from the catalog",
                ));
            }
            _ => {}
        }

        Ok(vec![RentalEvent::RentalRecorded(RentalRecorded {
            tenant_id: cmd.tenant_id,
            rental_id: cmd.rental_id,
            direction: cmd.direction,
            item_id: cmd.item_id,
            booking_id: cmd.booking_id,
            terms: cmd.terms.normalized(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_amend(&self, cmd: &AmendRental) -> Result<Vec<RentalEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.rental_id)?;
        cmd.terms.validate()?;
        if self.status == RentalStatus::Returned {
            return Err(DomainError::invariant("cannot amend a returned rental"));
        }

        let terms = cmd.terms.normalized();
        if terms == self.terms {
            return Ok(vec![]);
        }
        Ok(vec![RentalEvent::RentalAmended(RentalAmended {
            tenant_id: cmd.tenant_id,
            rental_id: cmd.rental_id,
            terms,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_return(&self, cmd: &ReturnRental) -> Result<Vec<RentalEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.rental_id)?;

        if self.status == RentalStatus::Returned {
            return Ok(vec![]);
        }
        Ok(vec![RentalEvent::RentalReturned(RentalReturned {
            tenant_id: cmd.tenant_id,
            rental_id: cmd.rental_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_overdue(&self, cmd: &MarkRentalOverdue) -> Result<Vec<RentalEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.rental_id)?;

        if self.status != RentalStatus::Active || self.terms.return_by >= cmd.today {
            return Ok(vec![]);
        }
        Ok(vec![RentalEvent::RentalMarkedOverdue(RentalMarkedOverdue {
            tenant_id: cmd.tenant_id,
            rental_id: cmd.rental_id,
            as_of: cmd.today,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteRental) -> Result<Vec<RentalEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.rental_id)?;

        Ok(vec![RentalEvent::RentalDeleted(RentalDeleted {
            tenant_id: cmd.tenant_id,
            rental_id: cmd.rental_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

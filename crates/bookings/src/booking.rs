use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use rentbook_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, TenantId, UserId, ValueObject,
};
use rentbook_events::Event;
use rentbook_inventory::StockItemId;

/// Booking identifier (tenant-scoped via `tenant_id` fields in commands/events).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub AggregateId);

impl BookingId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for BookingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Booking status lifecycle.
///
/// `Active -> Overdue` is detected by the sweep; `Active | Overdue -> Returned`
/// and `Active -> Cancelled` are explicit. Returned and cancelled are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Overdue,
    #[serde(alias = "completed")]
    Returned,
    Cancelled,
}

impl BookingStatus {
    /// Stock is still out with the client.
    pub fn is_open(self) -> bool {
        matches!(self, BookingStatus::Active | BookingStatus::Overdue)
    }
}

/// One rented line, frozen at reservation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog item the quantity was drawn from; `None` if the business does
    /// not stock it at all.
    pub item_id: Option<StockItemId>,
    /// Display snapshot; later catalog renames do not touch it.
    pub name: String,
    pub quantity: u64,
    /// Minor currency units at booking time.
    pub unit_price: u64,
    /// Units that could not be covered from own stock.
    pub shortage: u64,
}

impl ValueObject for LineItem {}

impl LineItem {
    /// Units that came out of the catalog and go back on return.
    pub fn restorable(&self) -> u64 {
        self.quantity - self.shortage
    }

    pub fn line_total(&self) -> u64 {
        self.quantity.saturating_mul(self.unit_price)
    }

    pub fn is_short(&self) -> bool {
        self.shortage > 0
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("line item name cannot be empty"));
        }
        if self.quantity == 0 {
            return Err(DomainError::validation("line item quantity must be positive"));
        }
        if self.shortage > self.quantity {
            return Err(DomainError::invariant("shortage cannot exceed quantity"));
        }
        if self.item_id.is_none() && self.shortage != self.quantity {
            return Err(DomainError::invariant(
                "an unstocked line must be entirely shortage",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl ValueObject for ClientInfo {}

/// Event and client metadata supplied when the booking is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub event_name: String,
    pub client: ClientInfo,
    pub event_date: NaiveDate,
    pub return_by: NaiveDate,
    pub location: String,
    pub notes: String,
}

impl ValueObject for BookingDetails {}

impl BookingDetails {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.event_name.trim().is_empty() {
            return Err(DomainError::validation("event name cannot be empty"));
        }
        if self.client.name.trim().is_empty() {
            return Err(DomainError::validation("client name cannot be empty"));
        }
        if self.return_by < self.event_date {
            return Err(DomainError::validation(
                "return-by date cannot be before the event date",
            ));
        }
        Ok(())
    }

    fn placeholder() -> Self {
        Self {
            event_name: String::new(),
            client: ClientInfo::default(),
            event_date: NaiveDate::MIN,
            return_by: NaiveDate::MIN,
            location: String::new(),
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub total_due: u64,
    pub amount_paid: u64,
}

impl ValueObject for PaymentSummary {}

impl PaymentSummary {
    pub fn outstanding(&self) -> u64 {
        self.total_due.saturating_sub(self.amount_paid)
    }

    pub fn status(&self) -> PaymentStatus {
        if self.outstanding() == 0 {
            PaymentStatus::Paid
        } else if self.amount_paid == 0 {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Partial
        }
    }
}

/// Aggregate root: Booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    id: BookingId,
    tenant_id: Option<TenantId>,
    details: BookingDetails,
    lines: Vec<LineItem>,
    payment: PaymentSummary,
    status: BookingStatus,
    created_by: Option<UserId>,
    created_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    overdue_since: Option<NaiveDate>,
    cancellation_reason: Option<String>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl Booking {
    /// Not-yet-opened instance, the starting point for `OpenBooking`.
    pub fn empty(id: BookingId) -> Self {
        Self {
            id,
            tenant_id: None,
            details: BookingDetails::placeholder(),
            lines: Vec::new(),
            payment: PaymentSummary::default(),
            status: BookingStatus::Active,
            created_by: None,
            created_at: None,
            closed_at: None,
            overdue_since: None,
            cancellation_reason: None,
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> BookingId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn details(&self) -> &BookingDetails {
        &self.details
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn payment(&self) -> PaymentSummary {
        self.payment
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn overdue_since(&self) -> Option<NaiveDate> {
        self.overdue_since
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn has_shortage(&self) -> bool {
        self.lines.iter().any(LineItem::is_short)
    }

    /// Saturates at `u64::MAX`.
    pub fn total_shortage(&self) -> u64 {
        self.lines
            .iter()
            .map(|l| l.shortage)
            .fold(0, u64::saturating_add)
    }

    /// Read-time overdue check: open and the return-by date has passed.
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.details.return_by < today
    }

    /// Catalog quantities to give back when the booking closes.
    pub fn restorations(&self) -> Vec<(StockItemId, u64)> {
        self.lines
            .iter()
            .filter_map(|line| match line.item_id {
                Some(item_id) if line.restorable() > 0 => Some((item_id, line.restorable())),
                _ => None,
            })
            .collect()
    }
}

impl AggregateRoot for Booking {
    type Id = BookingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenBooking. Lines arrive already allocated (shortages computed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenBooking {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub created_by: UserId,
    pub details: BookingDetails,
    pub lines: Vec<LineItem>,
    pub total_due: u64,
    pub amount_paid: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReturnBooking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBooking {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelBooking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBooking {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkOverdue. No-op unless active and past `today`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkOverdue {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub today: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteBooking. Drops the record without touching stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBooking {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub amount: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCommand {
    OpenBooking(OpenBooking),
    ReturnBooking(ReturnBooking),
    CancelBooking(CancelBooking),
    MarkOverdue(MarkOverdue),
    RecordPayment(RecordPayment),
    DeleteBooking(DeleteBooking),
}

/// Event: BookingOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOpened {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub created_by: UserId,
    pub details: BookingDetails,
    pub lines: Vec<LineItem>,
    pub total_due: u64,
    pub amount_paid: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BookingReturned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReturned {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BookingCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCancelled {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BookingMarkedOverdue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingMarkedOverdue {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub as_of: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BookingDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDeleted {
    pub tenant_id: TenantId,
    pub booking_id: BookingId,
    pub status_at_deletion: BookingStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    BookingOpened(BookingOpened),
    BookingReturned(BookingReturned),
    BookingCancelled(BookingCancelled),
    BookingMarkedOverdue(BookingMarkedOverdue),
    PaymentRecorded(PaymentRecorded),
    BookingDeleted(BookingDeleted),
}

impl BookingEvent {
    pub fn booking_id(&self) -> BookingId {
        match self {
            BookingEvent::BookingOpened(e) => e.booking_id,
            BookingEvent::BookingReturned(e) => e.booking_id,
            BookingEvent::BookingCancelled(e) => e.booking_id,
            BookingEvent::BookingMarkedOverdue(e) => e.booking_id,
            BookingEvent::PaymentRecorded(e) => e.booking_id,
            BookingEvent::BookingDeleted(e) => e.booking_id,
        }
    }
}

impl Event for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::BookingOpened(_) => "booking.opened",
            BookingEvent::BookingReturned(_) => "booking.returned",
            BookingEvent::BookingCancelled(_) => "booking.cancelled",
            BookingEvent::BookingMarkedOverdue(_) => "booking.marked_overdue",
            BookingEvent::PaymentRecorded(_) => "booking.payment_recorded",
            BookingEvent::BookingDeleted(_) => "booking.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BookingEvent::BookingOpened(e) => e.occurred_at,
            BookingEvent::BookingReturned(e) => e.occurred_at,
            BookingEvent::BookingCancelled(e) => e.occurred_at,
            BookingEvent::BookingMarkedOverdue(e) => e.occurred_at,
            BookingEvent::PaymentRecorded(e) => e.occurred_at,
            BookingEvent::BookingDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Booking {
    type Command = BookingCommand;
    type Event = BookingEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            BookingEvent::BookingOpened(e) => {
                self.id = e.booking_id;
                self.tenant_id = Some(e.tenant_id);
                self.details = e.details.clone();
                self.lines = e.lines.clone();
                self.payment = PaymentSummary {
                    total_due: e.total_due,
                    amount_paid: e.amount_paid,
                };
                self.status = BookingStatus::Active;
                self.created_by = Some(e.created_by);
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            BookingEvent::BookingReturned(e) => {
                self.status = BookingStatus::Returned;
                self.closed_at = Some(e.occurred_at);
            }
            BookingEvent::BookingCancelled(e) => {
                self.status = BookingStatus::Cancelled;
                self.cancellation_reason = e.reason.clone();
                self.closed_at = Some(e.occurred_at);
            }
            BookingEvent::BookingMarkedOverdue(e) => {
                self.status = BookingStatus::Overdue;
                self.overdue_since = Some(e.as_of);
            }
            BookingEvent::PaymentRecorded(e) => {
                self.payment.amount_paid = self.payment.amount_paid.saturating_add(e.amount);
            }
            BookingEvent::BookingDeleted(_) => {
                self.deleted = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            BookingCommand::OpenBooking(cmd) => self.handle_open(cmd),
            BookingCommand::ReturnBooking(cmd) => self.handle_return(cmd),
            BookingCommand::CancelBooking(cmd) => self.handle_cancel(cmd),
            BookingCommand::MarkOverdue(cmd) => self.handle_mark_overdue(cmd),
            BookingCommand::RecordPayment(cmd) => self.handle_payment(cmd),
            BookingCommand::DeleteBooking(cmd) => self.handle_delete(cmd),
        }
    }
}

impl Booking {
    fn ensure_existing(&self, tenant_id: TenantId, booking_id: BookingId) -> Result<(), DomainError> {
        if !self.created || self.deleted {
            return Err(DomainError::not_found(format!("booking {booking_id}")));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != booking_id {
            return Err(DomainError::invariant("booking_id mismatch"));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenBooking) -> Result<Vec<BookingEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("booking already exists"));
        }
        cmd.details.validate()?;
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("a booking needs at least one line item"));
        }
        for line in &cmd.lines {
            line.validate()?;
        }

        Ok(vec![BookingEvent::BookingOpened(BookingOpened {
            tenant_id: cmd.tenant_id,
            booking_id: cmd.booking_id,
            created_by: cmd.created_by,
            details: cmd.details.clone(),
            lines: cmd.lines.clone(),
            total_due: cmd.total_due,
            amount_paid: cmd.amount_paid,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_return(&self, cmd: &ReturnBooking) -> Result<Vec<BookingEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.booking_id)?;

        match self.status {
            BookingStatus::Returned => Ok(vec![]),
            BookingStatus::Cancelled => Err(DomainError::invariant(
                "cannot return a cancelled booking",
            )),
            BookingStatus::Active | BookingStatus::Overdue => {
                Ok(vec![BookingEvent::BookingReturned(BookingReturned {
                    tenant_id: cmd.tenant_id,
                    booking_id: cmd.booking_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }

    fn handle_cancel(&self, cmd: &CancelBooking) -> Result<Vec<BookingEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.booking_id)?;

        match self.status {
            BookingStatus::Cancelled => Ok(vec![]),
            BookingStatus::Active => {
                let reason = cmd
                    .reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string);
                Ok(vec![BookingEvent::BookingCancelled(BookingCancelled {
                    tenant_id: cmd.tenant_id,
                    booking_id: cmd.booking_id,
                    reason,
                    occurred_at: cmd.occurred_at,
                })])
            }
            BookingStatus::Overdue | BookingStatus::Returned => Err(DomainError::invariant(
                "only active bookings can be cancelled",
            )),
        }
    }

    fn handle_mark_overdue(&self, cmd: &MarkOverdue) -> Result<Vec<BookingEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.booking_id)?;

        if self.status != BookingStatus::Active || self.details.return_by >= cmd.today {
            return Ok(vec![]);
        }

        Ok(vec![BookingEvent::BookingMarkedOverdue(BookingMarkedOverdue {
            tenant_id: cmd.tenant_id,
            booking_id: cmd.booking_id,
            as_of: cmd.today,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_payment(&self, cmd: &RecordPayment) -> Result<Vec<BookingEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.booking_id)?;

        if cmd.amount <= 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        if self.status == BookingStatus::Cancelled {
            return Err(DomainError::invariant(
                "cannot record a payment on a cancelled booking",
            ));
        }

        Ok(vec![BookingEvent::PaymentRecorded(PaymentRecorded {
            tenant_id: cmd.tenant_id,
            booking_id: cmd.booking_id,
            amount: cmd.amount as u64,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteBooking) -> Result<Vec<BookingEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.booking_id)?;

        Ok(vec![BookingEvent::BookingDeleted(BookingDeleted {
            tenant_id: cmd.tenant_id,
            booking_id: cmd.booking_id,
            status_at_deletion: self.status,
            occurred_at: cmd.occurred_at,
        })])
    }
}

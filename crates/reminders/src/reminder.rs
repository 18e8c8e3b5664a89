use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use rentbook_bookings::BookingId;
use rentbook_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use rentbook_events::Event;
use rentbook_partners::PartnerRentalId;

/// Reminder identifier (tenant-scoped via `tenant_id` fields in commands/events).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(pub AggregateId);

impl ReminderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for ReminderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    #[default]
    Custom,
    CallSupplier,
    Booking,
    RentalReturn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Completed,
    Dismissed,
}

/// The record a reminder is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RelatedRecord {
    Booking(BookingId),
    Rental(PartnerRentalId),
}

/// Aggregate root: Reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    id: ReminderId,
    tenant_id: Option<TenantId>,
    kind: ReminderKind,
    title: String,
    message: String,
    due_date: NaiveDate,
    priority: Priority,
    status: ReminderStatus,
    related: Option<RelatedRecord>,
    created_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl Reminder {
    pub fn empty(id: ReminderId) -> Self {
        Self {
            id,
            tenant_id: None,
            kind: ReminderKind::Custom,
            title: String::new(),
            message: String::new(),
            due_date: NaiveDate::MIN,
            priority: Priority::Medium,
            status: ReminderStatus::Pending,
            related: None,
            created_at: None,
            closed_at: None,
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> ReminderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn kind(&self) -> ReminderKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> ReminderStatus {
        self.status
    }

    pub fn related(&self) -> Option<RelatedRecord> {
        self.related
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReminderStatus::Pending
    }
}

impl AggregateRoot for Reminder {
    type Id = ReminderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateReminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReminder {
    pub tenant_id: TenantId,
    pub reminder_id: ReminderId,
    pub kind: ReminderKind,
    pub title: String,
    pub message: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub related: Option<RelatedRecord>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteReminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteReminder {
    pub tenant_id: TenantId,
    pub reminder_id: ReminderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DismissReminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissReminder {
    pub tenant_id: TenantId,
    pub reminder_id: ReminderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteReminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReminder {
    pub tenant_id: TenantId,
    pub reminder_id: ReminderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderCommand {
    CreateReminder(CreateReminder),
    CompleteReminder(CompleteReminder),
    DismissReminder(DismissReminder),
    DeleteReminder(DeleteReminder),
}

/// Event: ReminderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderCreated {
    pub tenant_id: TenantId,
    pub reminder_id: ReminderId,
    pub kind: ReminderKind,
    pub title: String,
    pub message: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub related: Option<RelatedRecord>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReminderCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderCompleted {
    pub tenant_id: TenantId,
    pub reminder_id: ReminderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReminderDismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDismissed {
    pub tenant_id: TenantId,
    pub reminder_id: ReminderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReminderDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDeleted {
    pub tenant_id: TenantId,
    pub reminder_id: ReminderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderEvent {
    ReminderCreated(ReminderCreated),
    ReminderCompleted(ReminderCompleted),
    ReminderDismissed(ReminderDismissed),
    ReminderDeleted(ReminderDeleted),
}

impl Event for ReminderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReminderEvent::ReminderCreated(_) => "reminder.created",
            ReminderEvent::ReminderCompleted(_) => "reminder.completed",
            ReminderEvent::ReminderDismissed(_) => "reminder.dismissed",
            ReminderEvent::ReminderDeleted(_) => "reminder.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReminderEvent::ReminderCreated(e) => e.occurred_at,
            ReminderEvent::ReminderCompleted(e) => e.occurred_at,
            ReminderEvent::ReminderDismissed(e) => e.occurred_at,
            ReminderEvent::ReminderDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Reminder {
    type Command = ReminderCommand;
    type Event = ReminderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReminderEvent::ReminderCreated(e) => {
                self.id = e.reminder_id;
                self.tenant_id = Some(e.tenant_id);
                self.kind = e.kind;
                self.title = e.title.clone();
                self.message = e.message.clone();
                self.due_date = e.due_date;
                self.priority = e.priority;
                self.status = ReminderStatus::Pending;
                self.related = e.related;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            ReminderEvent::ReminderCompleted(e) => {
                self.status = ReminderStatus::Completed;
                self.closed_at = Some(e.occurred_at);
            }
            ReminderEvent::ReminderDismissed(e) => {
                self.status = ReminderStatus::Dismissed;
                self.closed_at = Some(e.occurred_at);
            }
            ReminderEvent::ReminderDeleted(_) => {
                self.deleted = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReminderCommand::CreateReminder(cmd) => self.handle_create(cmd),
            ReminderCommand::CompleteReminder(cmd) => {
                self.ensure_existing(cmd.tenant_id, cmd.reminder_id)?;
                if !self.may_close(ReminderStatus::Completed)? {
                    return Ok(vec![]);
                }
                Ok(vec![ReminderEvent::ReminderCompleted(ReminderCompleted {
                    tenant_id: cmd.tenant_id,
                    reminder_id: cmd.reminder_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            ReminderCommand::DismissReminder(cmd) => {
                self.ensure_existing(cmd.tenant_id, cmd.reminder_id)?;
                if !self.may_close(ReminderStatus::Dismissed)? {
                    return Ok(vec![]);
                }
                Ok(vec![ReminderEvent::ReminderDismissed(ReminderDismissed {
                    tenant_id: cmd.tenant_id,
                    reminder_id: cmd.reminder_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            ReminderCommand::DeleteReminder(cmd) => {
                self.ensure_existing(cmd.tenant_id, cmd.reminder_id)?;
                Ok(vec![ReminderEvent::ReminderDeleted(ReminderDeleted {
                    tenant_id: cmd.tenant_id,
                    reminder_id: cmd.reminder_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl Reminder {
    fn ensure_existing(&self, tenant_id: TenantId, reminder_id: ReminderId) -> Result<(), DomainError> {
        if !self.created || self.deleted {
            return Err(DomainError::not_found(format!("reminder {reminder_id}")));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != reminder_id {
            return Err(DomainError::invariant("reminder_id mismatch"));
        }
        Ok(())
    }

    /// `Ok(false)` when already in `target`; closing the other way is refused.
    fn may_close(&self, target: ReminderStatus) -> Result<bool, DomainError> {
        match self.status {
            ReminderStatus::Pending => Ok(true),
            status if status == target => Ok(false),
            status => Err(DomainError::invariant(format!(
                "reminder is already {status:?}"
            ))),
        }
    }

    fn handle_create(&self, cmd: &CreateReminder) -> Result<Vec<ReminderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("reminder already exists"));
        }
        let title = cmd.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("reminder title cannot be empty"));
        }

        Ok(vec![ReminderEvent::ReminderCreated(ReminderCreated {
            tenant_id: cmd.tenant_id,
            reminder_id: cmd.reminder_id,
            kind: cmd.kind,
            title: title.to_string(),
            message: cmd.message.trim().to_string(),
            due_date: cmd.due_date,
            priority: cmd.priority,
            related: cmd.related,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(tenant_id: TenantId) -> Reminder {
        let reminder_id = ReminderId::generate();
        let mut reminder = Reminder::empty(reminder_id);
        reminder
            .execute(&ReminderCommand::CreateReminder(CreateReminder {
                tenant_id,
                reminder_id,
                kind: ReminderKind::CallSupplier,
                title: " Call Bola about tents ".to_string(),
                message: "Need 4 more".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                priority: Priority::High,
                related: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        reminder
    }

    fn complete(reminder: &Reminder, tenant_id: TenantId) -> ReminderCommand {
        ReminderCommand::CompleteReminder(CompleteReminder {
            tenant_id,
            reminder_id: reminder.id_typed(),
            occurred_at: Utc::now(),
        })
    }

    fn dismiss(reminder: &Reminder, tenant_id: TenantId) -> ReminderCommand {
        ReminderCommand::DismissReminder(DismissReminder {
            tenant_id,
            reminder_id: reminder.id_typed(),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn create_trims_and_starts_pending() {
        let reminder = created(TenantId::new());
        assert_eq!(reminder.title(), "Call Bola about tents");
        assert!(reminder.is_pending());
        assert_eq!(reminder.priority(), Priority::High);
    }

    #[test]
    fn empty_title_is_rejected() {
        let reminder_id = ReminderId::generate();
        let cmd = ReminderCommand::CreateReminder(CreateReminder {
            tenant_id: TenantId::new(),
            reminder_id,
            kind: ReminderKind::default(),
            title: "   ".to_string(),
            message: String::new(),
            due_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            priority: Priority::default(),
            related: None,
            occurred_at: Utc::now(),
        });
        assert!(matches!(
            Reminder::empty(reminder_id).handle(&cmd),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn completing_twice_is_a_no_op_but_dismissing_after_is_refused() {
        let tenant_id = TenantId::new();
        let mut reminder = created(tenant_id);

        assert_eq!(reminder.execute(&complete(&reminder, tenant_id)).unwrap().len(), 1);
        assert!(reminder.execute(&complete(&reminder, tenant_id)).unwrap().is_empty());
        assert_eq!(reminder.status(), ReminderStatus::Completed);
        assert!(reminder.closed_at().is_some());
        assert!(matches!(
            reminder.handle(&dismiss(&reminder, tenant_id)),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn other_tenant_cannot_touch_it() {
        let reminder = created(TenantId::new());
        assert!(matches!(
            reminder.handle(&dismiss(&reminder, TenantId::new())),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn related_record_serializes_with_a_type_tag() {
        let json = serde_json::to_value(RelatedRecord::Rental(PartnerRentalId::generate())).unwrap();
        assert_eq!(json["type"], "rental");
        assert_eq!(
            serde_json::to_string(&ReminderKind::CallSupplier).unwrap(),
            "\"call_supplier\""
        );
    }
}

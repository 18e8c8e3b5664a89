use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use rentbook_bookings::query;
use rentbook_core::{Aggregate, AggregateRoot, TenantId};
use rentbook_events::EventBus;
use rentbook_reminders::{
    CompleteReminder, CreateReminder, DeleteReminder, DismissReminder, Priority, RelatedRecord,
    Reminder, ReminderCommand, ReminderFilter, ReminderId, ReminderKind,
};

use crate::error::LedgerError;
use crate::store::LedgerStore;

use super::{ChangeEnvelope, Ledger};

/// A reminder written by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    #[serde(default)]
    pub kind: ReminderKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub related: Option<RelatedRecord>,
}

impl NewReminder {
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            kind: ReminderKind::Custom,
            title: title.into(),
            message: String::new(),
            due_date,
            priority: Priority::Medium,
            related: None,
        }
    }

    pub fn about(mut self, kind: ReminderKind, related: RelatedRecord) -> Self {
        self.kind = kind;
        self.related = Some(related);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<ChangeEnvelope>,
{
    /// Create a pending reminder. A related booking or rental must exist.
    pub fn create_reminder(
        &self,
        tenant_id: TenantId,
        new_reminder: NewReminder,
        at: DateTime<Utc>,
    ) -> Result<Reminder, LedgerError> {
        let _span = info_span!("ledger.create_reminder", tenant = %tenant_id).entered();

        let reminder_id = ReminderId::generate();
        let command = ReminderCommand::CreateReminder(CreateReminder {
            tenant_id,
            reminder_id,
            kind: new_reminder.kind,
            title: new_reminder.title,
            message: new_reminder.message,
            due_date: new_reminder.due_date,
            priority: new_reminder.priority,
            related: new_reminder.related,
            occurred_at: at,
        });
        Reminder::empty(reminder_id).handle(&command)?;

        match new_reminder.related {
            Some(RelatedRecord::Booking(booking_id)) => {
                self.require_booking(tenant_id, booking_id)?;
            }
            Some(RelatedRecord::Rental(rental_id)) => {
                self.get_rental(tenant_id, rental_id)?;
            }
            None => {}
        }

        let reminder = self.run_atomic(tenant_id, "create_reminder", |uow| {
            let mut reminder = Reminder::empty(reminder_id);
            let events = reminder.execute(&command)?;
            uow.stage_reminder(&reminder, 0, &events)?;
            Ok(reminder)
        })?;

        info!(%reminder_id, "reminder created");
        Ok(reminder)
    }

    /// Completing a completed reminder changes nothing; a dismissed one is refused.
    pub fn complete_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
        at: DateTime<Utc>,
    ) -> Result<Reminder, LedgerError> {
        let _span = info_span!("ledger.complete_reminder", tenant = %tenant_id, %reminder_id).entered();
        let command = ReminderCommand::CompleteReminder(CompleteReminder {
            tenant_id,
            reminder_id,
            occurred_at: at,
        });
        self.execute_reminder(tenant_id, reminder_id, "complete_reminder", &command)
    }

    pub fn dismiss_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
        at: DateTime<Utc>,
    ) -> Result<Reminder, LedgerError> {
        let _span = info_span!("ledger.dismiss_reminder", tenant = %tenant_id, %reminder_id).entered();
        let command = ReminderCommand::DismissReminder(DismissReminder {
            tenant_id,
            reminder_id,
            occurred_at: at,
        });
        self.execute_reminder(tenant_id, reminder_id, "dismiss_reminder", &command)
    }

    pub fn delete_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let _span = info_span!("ledger.delete_reminder", tenant = %tenant_id, %reminder_id).entered();
        let command = ReminderCommand::DeleteReminder(DeleteReminder {
            tenant_id,
            reminder_id,
            occurred_at: at,
        });
        self.execute_reminder(tenant_id, reminder_id, "delete_reminder", &command)?;
        Ok(())
    }

    pub fn get_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
    ) -> Result<Reminder, LedgerError> {
        self.require_reminder(tenant_id, reminder_id)
    }

    /// Reminders matching `filter`, soonest due first.
    pub fn list_reminders(
        &self,
        tenant_id: TenantId,
        filter: &ReminderFilter,
    ) -> Result<Vec<Reminder>, LedgerError> {
        Ok(filter.apply(self.store.list_reminders(tenant_id)?))
    }

    /// One high-priority reminder per upcoming booking that has none yet,
    /// due `reminder_lead_days` before the event. Returns the new ids.
    ///
    /// A generated reminder shares its booking's id, so two concurrent runs
    /// cannot both create one; the loser sees it on retry and skips it.
    /// Completed or dismissed reminders still count, so nothing reappears.
    pub fn auto_generate_booking_reminders(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Vec<ReminderId>, LedgerError> {
        let _span = info_span!("ledger.auto_generate_reminders", tenant = %tenant_id, %today).entered();

        let upcoming = query::upcoming(
            self.store.list_bookings(tenant_id)?,
            today,
            self.config.upcoming_window_days,
        );
        let existing = self.store.list_reminders(tenant_id)?;

        let mut created = Vec::new();
        for booking in upcoming {
            let booking_id = booking.id_typed();
            let covered = existing.iter().any(|r| {
                r.kind() == ReminderKind::Booking
                    && r.related() == Some(RelatedRecord::Booking(booking_id))
            });
            if covered {
                continue;
            }

            let details = booking.details();
            let reminder_id = ReminderId::new(booking_id.0);
            let command = ReminderCommand::CreateReminder(CreateReminder {
                tenant_id,
                reminder_id,
                kind: ReminderKind::Booking,
                title: "Upcoming Event Reminder".to_string(),
                message: format!(
                    "Prepare items for {} - {}",
                    details.event_name, details.client.name
                ),
                due_date: details
                    .event_date
                    .checked_sub_days(Days::new(self.config.reminder_lead_days))
                    .unwrap_or(NaiveDate::MIN),
                priority: Priority::High,
                related: Some(RelatedRecord::Booking(booking_id)),
                occurred_at: at,
            });

            let made = self.run_atomic(tenant_id, "auto_generate_reminder", |uow| {
                if self.store.load_reminder(tenant_id, reminder_id)?.is_some() {
                    return Ok(false);
                }
                let mut reminder = Reminder::empty(reminder_id);
                let events = reminder.execute(&command)?;
                uow.stage_reminder(&reminder, 0, &events)?;
                Ok(true)
            })?;
            if made {
                created.push(reminder_id);
            } else {
                debug!(%booking_id, "booking reminder already exists");
            }
        }

        info!(created = created.len(), "booking reminders generated");
        Ok(created)
    }

    fn execute_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
        operation: &'static str,
        command: &ReminderCommand,
    ) -> Result<Reminder, LedgerError> {
        self.run_atomic(tenant_id, operation, |uow| {
            let mut reminder = self.require_reminder(tenant_id, reminder_id)?;
            let loaded = reminder.version();
            let events = reminder.execute(command)?;
            uow.stage_reminder(&reminder, loaded, &events)?;
            Ok(reminder)
        })
    }

    fn require_reminder(
        &self,
        tenant_id: TenantId,
        reminder_id: ReminderId,
    ) -> Result<Reminder, LedgerError> {
        self.store
            .load_reminder(tenant_id, reminder_id)?
            .ok_or_else(|| LedgerError::not_found(format!("reminder {reminder_id}")))
    }
}

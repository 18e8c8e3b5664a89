//! Reminders: dated to-dos for the business (pure, no IO).
//!
//! Created by hand ("call the supplier on Friday") or generated ahead of
//! upcoming bookings. A reminder is pending until completed or dismissed.

pub mod query;
pub mod reminder;

pub use query::{ReminderCounts, ReminderFilter};
pub use reminder::{
    CompleteReminder, CreateReminder, DeleteReminder, DismissReminder, Priority, RelatedRecord,
    Reminder, ReminderCommand, ReminderCompleted, ReminderCreated, ReminderDeleted,
    ReminderDismissed, ReminderEvent, ReminderId, ReminderKind, ReminderStatus,
};

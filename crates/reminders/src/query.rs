use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reminder::{Reminder, ReminderStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderFilter {
    pub status: Option<ReminderStatus>,
}

impl ReminderFilter {
    pub fn pending() -> Self {
        Self {
            status: Some(ReminderStatus::Pending),
        }
    }

    pub fn matches(&self, reminder: &Reminder) -> bool {
        self.status.is_none_or(|s| reminder.status() == s)
    }

    /// Matching reminders, soonest due first; higher priority breaks ties.
    pub fn apply(&self, reminders: Vec<Reminder>) -> Vec<Reminder> {
        let mut out: Vec<Reminder> = reminders.into_iter().filter(|r| self.matches(r)).collect();
        out.sort_by(|a, b| {
            a.due_date()
                .cmp(&b.due_date())
                .then_with(|| b.priority().cmp(&a.priority()))
                .then_with(|| a.created_at().cmp(&b.created_at()))
        });
        out
    }
}

/// Pending reminders bucketed against `today`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderCounts {
    pub total: usize,
    pub today: usize,
    pub upcoming: usize,
    pub overdue: usize,
}

impl ReminderCounts {
    pub fn from_reminders<'a, I>(reminders: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Reminder>,
    {
        reminders
            .into_iter()
            .filter(|r| r.is_pending())
            .fold(Self::default(), |mut acc, r| {
                acc.total += 1;
                match r.due_date().cmp(&today) {
                    core::cmp::Ordering::Less => acc.overdue += 1,
                    core::cmp::Ordering::Equal => acc.today += 1,
                    core::cmp::Ordering::Greater => acc.upcoming += 1,
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{
        CompleteReminder, CreateReminder, Priority, ReminderCommand, ReminderId, ReminderKind,
    };
    use chrono::Utc;
    use rentbook_core::{Aggregate, TenantId};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn reminder(tenant_id: TenantId, title: &str, due_day: u32, priority: Priority) -> Reminder {
        let reminder_id = ReminderId::generate();
        let mut reminder = Reminder::empty(reminder_id);
        reminder
            .execute(&ReminderCommand::CreateReminder(CreateReminder {
                tenant_id,
                reminder_id,
                kind: ReminderKind::Custom,
                title: title.to_string(),
                message: String::new(),
                due_date: date(due_day),
                priority,
                related: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        reminder
    }

    fn completed(mut reminder: Reminder) -> Reminder {
        let tenant_id = reminder.tenant_id().unwrap();
        reminder
            .execute(&ReminderCommand::CompleteReminder(CompleteReminder {
                tenant_id,
                reminder_id: reminder.id_typed(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        reminder
    }

    #[test]
    fn pending_filter_sorts_by_due_date_then_priority() {
        let t = TenantId::new();
        let all = vec![
            reminder(t, "later", 9, Priority::High),
            reminder(t, "low", 5, Priority::Low),
            reminder(t, "high", 5, Priority::High),
            completed(reminder(t, "done", 1, Priority::Medium)),
        ];

        let titles: Vec<String> = ReminderFilter::pending()
            .apply(all.clone())
            .iter()
            .map(|r| r.title().to_string())
            .collect();
        assert_eq!(titles, vec!["high", "low", "later"]);
        assert_eq!(ReminderFilter::default().apply(all).len(), 4);
    }

    #[test]
    fn counts_only_pending_reminders() {
        let t = TenantId::new();
        let all = vec![
            reminder(t, "yesterday", 4, Priority::Medium),
            reminder(t, "today", 5, Priority::Medium),
            reminder(t, "tomorrow", 6, Priority::Medium),
            completed(reminder(t, "done", 4, Priority::Medium)),
        ];

        assert_eq!(
            ReminderCounts::from_reminders(&all, date(5)),
            ReminderCounts {
                total: 3,
                today: 1,
                upcoming: 1,
                overdue: 1
            }
        );
    }
}

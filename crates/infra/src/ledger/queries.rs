use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rentbook_bookings::query::{self, BookingFilter, BookingStats};
use rentbook_bookings::{Booking, BookingId};
use rentbook_core::TenantId;
use rentbook_events::EventBus;
use rentbook_partners::RentalSummary;
use rentbook_reminders::{Reminder, ReminderCounts, ReminderFilter};

use crate::alerts::{Alert, AlertCounts, generate_alerts};
use crate::error::LedgerError;
use crate::store::LedgerStore;

use super::{ChangeEnvelope, Ledger};

/// Everything the dashboard shows at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub alerts: Vec<Alert>,
    pub alert_counts: AlertCounts,
    /// Pending only, soonest due first.
    pub reminders: Vec<Reminder>,
    pub reminder_counts: ReminderCounts,
    pub rentals: RentalSummary,
}

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<ChangeEnvelope>,
{
    pub fn get_booking(
        &self,
        tenant_id: TenantId,
        booking_id: BookingId,
    ) -> Result<Booking, LedgerError> {
        self.require_booking(tenant_id, booking_id)
    }

    /// Bookings matching `filter`, newest event first.
    pub fn list_bookings(
        &self,
        tenant_id: TenantId,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, LedgerError> {
        Ok(filter.apply(self.store.list_bookings(tenant_id)?))
    }

    /// Case-insensitive match on client or event name.
    pub fn search_bookings(
        &self,
        tenant_id: TenantId,
        term: &str,
    ) -> Result<Vec<Booking>, LedgerError> {
        let bookings = BookingFilter::default().apply(self.store.list_bookings(tenant_id)?);
        Ok(query::search(bookings, term))
    }

    pub fn todays_bookings(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
    ) -> Result<Vec<Booking>, LedgerError> {
        Ok(query::todays(self.store.list_bookings(tenant_id)?, today))
    }

    /// Active bookings within the configured window, soonest first.
    pub fn upcoming_bookings(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
    ) -> Result<Vec<Booking>, LedgerError> {
        Ok(query::upcoming(
            self.store.list_bookings(tenant_id)?,
            today,
            self.config.upcoming_window_days,
        ))
    }

    pub fn recent_bookings(
        &self,
        tenant_id: TenantId,
        limit: usize,
    ) -> Result<Vec<Booking>, LedgerError> {
        Ok(query::recent(self.store.list_bookings(tenant_id)?, limit))
    }

    /// Open bookings with at least one short line.
    pub fn overbooked_bookings(&self, tenant_id: TenantId) -> Result<Vec<Booking>, LedgerError> {
        Ok(query::overbooked(self.store.list_bookings(tenant_id)?))
    }

    pub fn booking_stats(&self, tenant_id: TenantId) -> Result<BookingStats, LedgerError> {
        let bookings = self.store.list_bookings(tenant_id)?;
        Ok(BookingStats::from_bookings(&bookings))
    }

    pub fn alerts(&self, tenant_id: TenantId, today: NaiveDate) -> Result<Vec<Alert>, LedgerError> {
        let items = self.store.list_items(tenant_id)?;
        let bookings = self.store.list_bookings(tenant_id)?;
        let rentals = self.store.list_rentals(tenant_id)?;
        Ok(generate_alerts(
            &items,
            &bookings,
            &rentals,
            today,
            self.config.alert_lookahead_days,
        ))
    }

    pub fn dashboard(&self, tenant_id: TenantId, today: NaiveDate) -> Result<Dashboard, LedgerError> {
        let alerts = self.alerts(tenant_id, today)?;
        let reminders = ReminderFilter::pending().apply(self.store.list_reminders(tenant_id)?);
        Ok(Dashboard {
            alert_counts: AlertCounts::from_alerts(&alerts),
            alerts,
            reminder_counts: ReminderCounts::from_reminders(&reminders, today),
            reminders,
            rentals: self.rental_summary(tenant_id)?,
        })
    }
}

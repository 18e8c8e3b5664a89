//! Read-side selections over a tenant's bookings.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::booking::{Booking, BookingStatus, PaymentStatus};

/// Status and event-date range filter. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl BookingFilter {
    pub fn with_status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        let date = booking.details().event_date;
        self.status.is_none_or(|s| booking.status() == s)
            && self.from.is_none_or(|from| date >= from)
            && self.to.is_none_or(|to| date <= to)
    }

    /// Matching bookings, newest event first.
    pub fn apply(&self, bookings: Vec<Booking>) -> Vec<Booking> {
        let mut out: Vec<Booking> = bookings.into_iter().filter(|b| self.matches(b)).collect();
        out.sort_by(|a, b| b.details().event_date.cmp(&a.details().event_date));
        out
    }
}

/// Case-insensitive substring match on client or event name.
pub fn search(bookings: Vec<Booking>, term: &str) -> Vec<Booking> {
    let term = term.trim().to_lowercase();
    bookings
        .into_iter()
        .filter(|b| {
            b.details().client.name.to_lowercase().contains(&term)
                || b.details().event_name.to_lowercase().contains(&term)
        })
        .collect()
}

/// Active bookings whose event is today.
pub fn todays(bookings: Vec<Booking>, today: NaiveDate) -> Vec<Booking> {
    bookings
        .into_iter()
        .filter(|b| b.status() == BookingStatus::Active && b.details().event_date == today)
        .collect()
}

/// Active bookings with an event in `[today, today + days]`, soonest first.
pub fn upcoming(bookings: Vec<Booking>, today: NaiveDate, days: u64) -> Vec<Booking> {
    let until = today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
    let mut out: Vec<Booking> = bookings
        .into_iter()
        .filter(|b| {
            let date = b.details().event_date;
            b.status() == BookingStatus::Active && date >= today && date <= until
        })
        .collect();
    out.sort_by_key(|b| b.details().event_date);
    out
}

/// Most recently created first.
pub fn recent(mut bookings: Vec<Booking>, limit: usize) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    bookings.truncate(limit);
    bookings
}

/// Open bookings that borrowed stock from outside (any line with a shortage).
pub fn overbooked(bookings: Vec<Booking>) -> Vec<Booking> {
    bookings
        .into_iter()
        .filter(|b| b.status().is_open() && b.has_shortage())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStats {
    pub total: usize,
    pub active: usize,
    pub overdue: usize,
    pub returned: usize,
    pub cancelled: usize,
    /// Σ amount paid, minor units.
    pub revenue: u64,
    /// Bookings with a pending or partial payment.
    pub pending_payments: usize,
}

impl BookingStats {
    pub fn from_bookings<'a, I>(bookings: I) -> Self
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        bookings.into_iter().fold(Self::default(), |mut acc, b| {
            acc.total += 1;
            match b.status() {
                BookingStatus::Active => acc.active += 1,
                BookingStatus::Overdue => acc.overdue += 1,
                BookingStatus::Returned => acc.returned += 1,
                BookingStatus::Cancelled => acc.cancelled += 1,
            }
            acc.revenue = acc.revenue.saturating_add(b.payment().amount_paid);
            if b.payment().status() != PaymentStatus::Paid {
                acc.pending_payments += 1;
            }
            acc
        })
    }
}

//! Dashboard alerts derived from the current catalog, bookings and partner
//! rentals.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use rentbook_bookings::{Booking, BookingId, BookingStatus};
use rentbook_inventory::{StockItem, StockItemId};
use rentbook_partners::{PartnerRental, PartnerRentalId, RentalDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowStock,
    UpcomingEvent,
    OverdueReturn,
    OverdueLent,
    OverdueBorrowed,
    Overbooked,
    PendingPayment,
}

impl AlertKind {
    pub fn severity(self) -> Severity {
        match self {
            AlertKind::UpcomingEvent => Severity::Info,
            AlertKind::LowStock | AlertKind::Overbooked | AlertKind::PendingPayment => {
                Severity::Warning
            }
            AlertKind::OverdueReturn | AlertKind::OverdueLent | AlertKind::OverdueBorrowed => {
                Severity::Error
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AlertSubject {
    Item(StockItemId),
    Booking(BookingId),
    Rental(PartnerRentalId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub subject: AlertSubject,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, subject: AlertSubject, message: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            subject,
            message,
        }
    }
}

/// Per-severity counts, for a dashboard badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl AlertCounts {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        alerts.iter().fold(Self::default(), |mut acc, alert| {
            acc.total += 1;
            match alert.severity {
                Severity::Error => acc.errors += 1,
                Severity::Warning => acc.warnings += 1,
                Severity::Info => acc.info += 1,
            }
            acc
        })
    }
}

/// Alerts as of `today`, grouped by kind in a fixed order: low stock,
/// upcoming events, overdue returns, overdue lent items, overdue borrowed
/// items, overbooked, pending payments.
///
/// An event counts as upcoming when it falls within `lookahead_days` of today.
/// Bookings and rentals are overdue once past their return-by date, whether or
/// not a sweep has relabeled them yet.
pub fn generate_alerts(
    items: &[StockItem],
    bookings: &[Booking],
    rentals: &[PartnerRental],
    today: NaiveDate,
    lookahead_days: u64,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for item in items.iter().filter(|i| i.is_live() && i.is_low_stock()) {
        alerts.push(Alert::new(
            AlertKind::LowStock,
            AlertSubject::Item(item.id_typed()),
            format!(
                "{} is running low: {} available, threshold {}",
                item.name(),
                item.available(),
                item.low_stock_threshold()
            ),
        ));
    }

    let horizon = today
        .checked_add_days(Days::new(lookahead_days))
        .unwrap_or(NaiveDate::MAX);
    let mut upcoming: Vec<&Booking> = bookings
        .iter()
        .filter(|b| {
            let date = b.details().event_date;
            b.status() == BookingStatus::Active && date >= today && date <= horizon
        })
        .collect();
    upcoming.sort_by_key(|b| b.details().event_date);
    for booking in upcoming {
        let details = booking.details();
        alerts.push(Alert::new(
            AlertKind::UpcomingEvent,
            AlertSubject::Booking(booking.id_typed()),
            format!(
                "{} for {} on {}",
                details.event_name, details.client.name, details.event_date
            ),
        ));
    }

    for booking in bookings.iter().filter(|b| b.is_past_due(today)) {
        let details = booking.details();
        alerts.push(Alert::new(
            AlertKind::OverdueReturn,
            AlertSubject::Booking(booking.id_typed()),
            format!(
                "items for {} ({}) were due back on {}",
                details.client.name, details.event_name, details.return_by
            ),
        ));
    }

    let mut late: Vec<&PartnerRental> = rentals.iter().filter(|r| r.is_past_due(today)).collect();
    late.sort_by_key(|r| r.terms().return_by);
    for direction in [RentalDirection::Lent, RentalDirection::Borrowed] {
        for rental in late.iter().filter(|r| r.direction() == direction) {
            let terms = rental.terms();
            let (kind, preposition) = match direction {
                RentalDirection::Lent => (AlertKind::OverdueLent, "lent to"),
                RentalDirection::Borrowed => (AlertKind::OverdueBorrowed, "borrowed from"),
            };
            alerts.push(Alert::new(
                kind,
                AlertSubject::Rental(rental.id_typed()),
                format!(
                    "{} {} {} {} was due on {}",
                    terms.quantity,
                    terms.item_name,
                    preposition,
                    terms.counterparty.business_name,
                    terms.return_by
                ),
            ));
        }
    }

    for booking in bookings
        .iter()
        .filter(|b| b.status().is_open() && b.has_shortage())
    {
        alerts.push(Alert::new(
            AlertKind::Overbooked,
            AlertSubject::Booking(booking.id_typed()),
            format!(
                "{} is short {} unit(s); source them before {}",
                booking.details().event_name,
                booking.total_shortage(),
                booking.details().event_date
            ),
        ));
    }

    for booking in bookings.iter().filter(|b| {
        b.status() == BookingStatus::Active && b.payment().outstanding() > 0
    }) {
        alerts.push(Alert::new(
            AlertKind::PendingPayment,
            AlertSubject::Booking(booking.id_typed()),
            format!(
                "{} has {} outstanding for {}",
                booking.details().client.name,
                booking.payment().outstanding(),
                booking.details().event_name
            ),
        ));
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rentbook_bookings::{
        BookingCommand, BookingDetails, ClientInfo, LineItem, MarkOverdue, OpenBooking,
    };
    use rentbook_core::{Aggregate, TenantId, UserId};
    use rentbook_inventory::{AddItem, InventoryCommand};
    use rentbook_partners::{
        Counterparty, PartnerRentalId, RecordRental, RentalCommand, RentalTerms, ReturnRental,
    };

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, d).unwrap()
    }

    fn item(tenant_id: TenantId, name: &str, total: i64, threshold: i64) -> StockItem {
        let item_id = StockItemId::generate();
        let mut item = StockItem::empty(item_id);
        item.execute(&InventoryCommand::AddItem(AddItem {
            tenant_id,
            item_id,
            name: name.to_string(),
            total_quantity: total,
            unit_price: 10,
            low_stock_threshold: threshold,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        item
    }

    fn booking(
        tenant_id: TenantId,
        client: &str,
        event_day: u32,
        return_day: u32,
        shortage: u64,
        paid: u64,
    ) -> Booking {
        let booking_id = BookingId::generate();
        let mut booking = Booking::empty(booking_id);
        booking
            .execute(&BookingCommand::OpenBooking(OpenBooking {
                tenant_id,
                booking_id,
                created_by: UserId::new(),
                details: BookingDetails {
                    event_name: format!("{client}'s party"),
                    client: ClientInfo {
                        name: client.to_string(),
                        ..ClientInfo::default()
                    },
                    event_date: date(event_day),
                    return_by: date(return_day),
                    location: String::new(),
                    notes: String::new(),
                },
                lines: vec![LineItem {
                    item_id: Some(StockItemId::generate()),
                    name: "Chairs".to_string(),
                    quantity: 10,
                    unit_price: 10,
                    shortage,
                }],
                total_due: 100,
                amount_paid: paid,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        booking
    }

    fn rental(
        tenant_id: TenantId,
        direction: RentalDirection,
        item: &str,
        return_day: u32,
    ) -> PartnerRental {
        let rental_id = PartnerRentalId::generate();
        let mut rental = PartnerRental::empty(rental_id);
        rental
            .execute(&RentalCommand::RecordRental(RecordRental {
                tenant_id,
                rental_id,
                direction,
                item_id: None,
                booking_id: None,
                terms: RentalTerms {
                    item_name: item.to_string(),
                    quantity: 3,
                    counterparty: Counterparty {
                        business_name: "Bola Rentals".to_string(),
                        ..Counterparty::default()
                    },
                    start_date: date(1),
                    return_by: date(return_day),
                    event_name: String::new(),
                    notes: String::new(),
                },
                occurred_at: Utc::now(),
            }))
            .unwrap();
        rental
    }

    fn kinds(alerts: &[Alert]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn quiet_ledger_has_no_alerts() {
        let tenant_id = TenantId::new();
        let items = vec![item(tenant_id, "Chairs", 50, 10)];
        let bookings = vec![booking(tenant_id, "Ada", 20, 21, 0, 100)];
        assert!(generate_alerts(&items, &bookings, &[], date(10), 2).is_empty());
    }

    #[test]
    fn each_condition_raises_its_kind() {
        let tenant_id = TenantId::new();
        let items = vec![item(tenant_id, "Tables", 5, 10), item(tenant_id, "Chairs", 50, 10)];
        let upcoming = booking(tenant_id, "Ada", 11, 12, 0, 100);
        let mut overdue = booking(tenant_id, "Bola", 1, 3, 0, 100);
        overdue
            .execute(&BookingCommand::MarkOverdue(MarkOverdue {
                tenant_id,
                booking_id: overdue.id_typed(),
                today: date(4),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        let short = booking(tenant_id, "Chidi", 25, 26, 4, 100);
        let unpaid = booking(tenant_id, "Dayo", 25, 26, 0, 40);

        let rentals = vec![
            rental(tenant_id, RentalDirection::Borrowed, "Tents", 8),
            rental(tenant_id, RentalDirection::Lent, "Tables", 9),
        ];

        let alerts = generate_alerts(
            &items,
            &[upcoming, overdue, short, unpaid],
            &rentals,
            date(10),
            2,
        );

        assert_eq!(
            kinds(&alerts),
            vec![
                AlertKind::LowStock,
                AlertKind::UpcomingEvent,
                AlertKind::OverdueReturn,
                AlertKind::OverdueLent,
                AlertKind::OverdueBorrowed,
                AlertKind::Overbooked,
                AlertKind::PendingPayment,
            ]
        );
        assert_eq!(alerts[2].severity, Severity::Error);
        assert_eq!(
            alerts[3].message,
            format!("3 Tables lent to Bola Rentals was due on {}", date(9))
        );
        assert_eq!(
            alerts[4].message,
            format!("3 Tents borrowed from Bola Rentals was due on {}", date(8))
        );
        assert!(alerts[6].message.contains("60"));

        let counts = AlertCounts::from_alerts(&alerts);
        assert_eq!(counts.total, 7);
        assert_eq!(counts.errors, 3);
        assert_eq!(counts.warnings, 3);
        assert_eq!(counts.info, 1);
    }

    #[test]
    fn active_booking_past_return_by_is_overdue_before_the_sweep() {
        let tenant_id = TenantId::new();
        let late = booking(tenant_id, "Efe", 1, 2, 0, 100);
        let alerts = generate_alerts(&[], &[late], &[], date(5), 2);
        assert_eq!(kinds(&alerts), vec![AlertKind::OverdueReturn]);
    }

    #[test]
    fn returned_or_not_yet_due_rentals_stay_quiet() {
        let tenant_id = TenantId::new();
        let due_today = rental(tenant_id, RentalDirection::Lent, "Tables", 10);
        let mut returned = rental(tenant_id, RentalDirection::Borrowed, "Tents", 2);
        returned
            .execute(&RentalCommand::ReturnRental(ReturnRental {
                tenant_id,
                rental_id: returned.id_typed(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        assert!(generate_alerts(&[], &[], &[due_today, returned], date(10), 2).is_empty());
    }

    #[test]
    fn subject_serializes_with_a_type_tag() {
        let id = BookingId::generate();
        let json = serde_json::to_value(AlertSubject::Booking(id)).unwrap();
        assert_eq!(json["type"], "booking");
    }
}

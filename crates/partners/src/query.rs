//! Listing and summarizing partner rentals.

use serde::{Deserialize, Serialize};

use rentbook_bookings::Booking;
use rentbook_inventory::normalize_name;

use crate::rental::{PartnerRental, RentalDirection, RentalStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalFilter {
    pub direction: Option<RentalDirection>,
    pub status: Option<RentalStatus>,
}

impl RentalFilter {
    pub fn borrowed() -> Self {
        Self {
            direction: Some(RentalDirection::Borrowed),
            status: None,
        }
    }

    pub fn lent() -> Self {
        Self {
            direction: Some(RentalDirection::Lent),
            status: None,
        }
    }

    pub fn with_status(mut self, status: RentalStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, rental: &PartnerRental) -> bool {
        self.direction.is_none_or(|d| rental.direction() == d)
            && self.status.is_none_or(|s| rental.status() == s)
    }

    /// Matching rentals, earliest return-by date first.
    pub fn apply(&self, rentals: Vec<PartnerRental>) -> Vec<PartnerRental> {
        let mut out: Vec<PartnerRental> = rentals.into_iter().filter(|r| self.matches(r)).collect();
        out.sort_by(|a, b| {
            a.terms()
                .return_by
                .cmp(&b.terms().return_by)
                .then_with(|| a.created_at().cmp(&b.created_at()))
        });
        out
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalCounts {
    pub total: usize,
    pub active: usize,
    pub overdue: usize,
    pub returned: usize,
}

/// Counts per direction, for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalSummary {
    pub borrowed: RentalCounts,
    pub lent: RentalCounts,
}

impl RentalSummary {
    pub fn from_rentals<'a, I>(rentals: I) -> Self
    where
        I: IntoIterator<Item = &'a PartnerRental>,
    {
        rentals.into_iter().fold(Self::default(), |mut acc, r| {
            let counts = match r.direction() {
                RentalDirection::Borrowed => &mut acc.borrowed,
                RentalDirection::Lent => &mut acc.lent,
            };
            counts.total += 1;
            match r.status() {
                RentalStatus::Active => counts.active += 1,
                RentalStatus::Overdue => counts.overdue += 1,
                RentalStatus::Returned => counts.returned += 1,
            }
            acc
        })
    }
}

/// How much of one short line has been borrowed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortageCover {
    pub name: String,
    pub shortage: u64,
    pub borrowed: u64,
    pub uncovered: u64,
}

/// Per short line of `booking`, the quantity borrowed for it.
///
/// A borrowed rental counts toward a line when it was recorded against this
/// booking and its item name matches the line's (trimmed, case-insensitive).
/// Lines naming the same item share the borrowed quantity in order.
pub fn shortage_cover(booking: &Booking, rentals: &[PartnerRental]) -> Vec<ShortageCover> {
    let mut pool: Vec<(String, u64)> = rentals
        .iter()
        .filter(|r| {
            r.direction() == RentalDirection::Borrowed && r.booking_id() == Some(booking.id_typed())
        })
        .map(|r| (normalize_name(&r.terms().item_name), r.terms().quantity))
        .collect();

    booking
        .lines()
        .iter()
        .filter(|line| line.is_short())
        .map(|line| {
            let key = normalize_name(&line.name);
            let mut borrowed = 0u64;
            for (_, left) in pool.iter_mut().filter(|(name, _)| *name == key) {
                if borrowed == line.shortage {
                    break;
                }
                let take = (*left).min(line.shortage - borrowed);
                borrowed += take;
                *left -= take;
            }
            ShortageCover {
                name: line.name.clone(),
                shortage: line.shortage,
                borrowed,
                uncovered: line.shortage - borrowed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::{
        Counterparty, MarkRentalOverdue, PartnerRentalId, RecordRental, RentalCommand,
        RentalTerms, ReturnRental,
    };
    use chrono::{NaiveDate, Utc};
    use rentbook_bookings::{
        BookingCommand, BookingDetails, BookingId, ClientInfo, LineItem, OpenBooking,
    };
    use rentbook_core::{Aggregate, TenantId, UserId};
    use rentbook_inventory::StockItemId;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn rental(
        tenant_id: TenantId,
        direction: RentalDirection,
        item: &str,
        quantity: u64,
        return_day: u32,
        booking_id: Option<BookingId>,
    ) -> PartnerRental {
        let rental_id = PartnerRentalId::generate();
        let mut rental = PartnerRental::empty(rental_id);
        rental
            .execute(&RentalCommand::RecordRental(RecordRental {
                tenant_id,
                rental_id,
                direction,
                item_id: None,
                booking_id,
                terms: RentalTerms {
                    item_name: item.to_string(),
                    quantity,
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

    fn booking(tenant_id: TenantId, lines: Vec<(&str, u64, u64)>) -> Booking {
        let booking_id = BookingId::generate();
        let mut booking = Booking::empty(booking_id);
        booking
            .execute(&BookingCommand::OpenBooking(OpenBooking {
                tenant_id,
                booking_id,
                created_by: UserId::new(),
                details: BookingDetails {
                    event_name: "Wedding".to_string(),
                    client: ClientInfo {
                        name: "Ada".to_string(),
                        ..ClientInfo::default()
                    },
                    event_date: date(10),
                    return_by: date(11),
                    location: String::new(),
                    notes: String::new(),
                },
                lines: lines
                    .into_iter()
                    .map(|(name, quantity, shortage)| LineItem {
                        item_id: (shortage < quantity).then(StockItemId::generate),
                        name: name.to_string(),
                        quantity,
                        unit_price: 0,
                        shortage,
                    })
                    .collect(),
                total_due: 0,
                amount_paid: 0,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        booking
    }

    #[test]
    fn filter_by_direction_and_status_sorts_by_return_date() {
        let t = TenantId::new();
        let mut late = rental(t, RentalDirection::Borrowed, "Tents", 2, 3, None);
        late.execute(&RentalCommand::MarkRentalOverdue(MarkRentalOverdue {
            tenant_id: t,
            rental_id: late.id_typed(),
            today: date(4),
            occurred_at: Utc::now(),
        }))
        .unwrap();
        let all = vec![
            rental(t, RentalDirection::Borrowed, "Chairs", 10, 9, None),
            rental(t, RentalDirection::Lent, "Tables", 4, 5, None),
            late,
        ];

        let borrowed: Vec<String> = RentalFilter::borrowed()
            .apply(all.clone())
            .iter()
            .map(|r| r.terms().item_name.clone())
            .collect();
        assert_eq!(borrowed, vec!["Tents", "Chairs"]);

        let overdue = RentalFilter::borrowed()
            .with_status(RentalStatus::Overdue)
            .apply(all.clone());
        assert_eq!(overdue.len(), 1);
        assert_eq!(RentalFilter::lent().apply(all.clone()).len(), 1);
        assert_eq!(RentalFilter::default().apply(all).len(), 3);
    }

    #[test]
    fn summary_counts_each_direction() {
        let t = TenantId::new();
        let mut returned = rental(t, RentalDirection::Lent, "Tables", 4, 5, None);
        returned
            .execute(&RentalCommand::ReturnRental(ReturnRental {
                tenant_id: t,
                rental_id: returned.id_typed(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        let all = vec![
            rental(t, RentalDirection::Borrowed, "Chairs", 10, 9, None),
            rental(t, RentalDirection::Lent, "Tents", 1, 5, None),
            returned,
        ];

        let summary = RentalSummary::from_rentals(&all);
        assert_eq!(
            summary.borrowed,
            RentalCounts {
                total: 1,
                active: 1,
                overdue: 0,
                returned: 0
            }
        );
        assert_eq!(
            summary.lent,
            RentalCounts {
                total: 2,
                active: 1,
                overdue: 0,
                returned: 1
            }
        );
    }

    #[test]
    fn cover_matches_borrowed_items_by_booking_and_name() {
        let t = TenantId::new();
        let b = booking(t, vec![("Chairs", 30, 10), ("Tables", 5, 0), ("Tents", 2, 2)]);
        let other = BookingId::generate();
        let rentals = vec![
            rental(t, RentalDirection::Borrowed, "chairs ", 6, 12, Some(b.id_typed())),
            rental(t, RentalDirection::Borrowed, "Chairs", 9, 12, Some(b.id_typed())),
            rental(t, RentalDirection::Borrowed, "Tents", 2, 12, Some(other)),
            rental(t, RentalDirection::Lent, "Tents", 2, 12, None),
        ];

        let cover = shortage_cover(&b, &rentals);
        assert_eq!(
            cover,
            vec![
                ShortageCover {
                    name: "Chairs".to_string(),
                    shortage: 10,
                    borrowed: 10,
                    uncovered: 0,
                },
                ShortageCover {
                    name: "Tents".to_string(),
                    shortage: 2,
                    borrowed: 0,
                    uncovered: 2,
                },
            ]
        );
    }

    #[test]
    fn lines_for_the_same_item_share_what_was_borrowed() {
        let t = TenantId::new();
        let b = booking(t, vec![("Chairs", 10, 4), ("chairs", 10, 4)]);
        let rentals = vec![rental(t, RentalDirection::Borrowed, "Chairs", 6, 12, Some(b.id_typed()))];

        let borrowed: Vec<u64> = shortage_cover(&b, &rentals).iter().map(|c| c.borrowed).collect();
        assert_eq!(borrowed, vec![4, 2]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                .. ProptestConfig::default()
            })]

            /// Borrowed quantity is handed out at most once and never exceeds a line's shortage.
            #[test]
            fn cover_splits_each_shortage_exactly(
                shortages in prop::collection::vec(1u64..20, 1..5),
                borrowed in prop::collection::vec(1u64..15, 0..4),
            ) {
                let t = TenantId::new();
                let b = booking(t, shortages.iter().map(|s| ("Chairs", s + 5, *s)).collect());
                let rentals: Vec<PartnerRental> = borrowed
                    .iter()
                    .map(|q| rental(t, RentalDirection::Borrowed, "Chairs", *q, 12, Some(b.id_typed())))
                    .collect();

                let cover = shortage_cover(&b, &rentals);
                prop_assert_eq!(cover.len(), shortages.len());
                for (c, s) in cover.iter().zip(&shortages) {
                    prop_assert_eq!(c.shortage, *s);
                    prop_assert_eq!(c.borrowed + c.uncovered, *s);
                }
                let handed_out: u64 = cover.iter().map(|c| c.borrowed).sum();
                let pool: u64 = borrowed.iter().sum();
                let needed: u64 = shortages.iter().sum();
                prop_assert_eq!(handed_out, pool.min(needed));
            }
        }
    }
}

//! Rental-to-rental tracking (pure, no IO).
//!
//! Small rental businesses lend to and borrow from each other. A
//! [`PartnerRental`] records one such arrangement in either direction: stock
//! lent out to another business, or items borrowed from one, typically to
//! cover a booking's shortage. Neither direction moves catalog stock.

pub mod query;
pub mod rental;

pub use query::{RentalCounts, RentalFilter, RentalSummary, ShortageCover, shortage_cover};
pub use rental::{
    AmendRental, Counterparty, DeleteRental, MarkRentalOverdue, PartnerRental, PartnerRentalId,
    RecordRental, RentalAmended, RentalCommand, RentalDeleted, RentalDirection, RentalEvent,
    RentalMarkedOverdue, RentalRecorded, RentalReturned, RentalStatus, RentalTerms, ReturnRental,
};

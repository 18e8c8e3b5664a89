//! Booking domain module (pure, no IO).
//!
//! A [`Booking`] is one rental transaction: who rents, for which event, until
//! when, and which line items. Line items are snapshots taken at reservation
//! time; they record how much of each quantity could not be covered from the
//! business's own stock (the shortage) so that returns only give back what was
//! actually deducted.

pub mod booking;
pub mod query;
pub mod request;

pub use booking::{
    Booking, BookingCancelled, BookingCommand, BookingDeleted, BookingDetails, BookingEvent,
    BookingId, BookingMarkedOverdue, BookingOpened, BookingReturned, BookingStatus, CancelBooking,
    ClientInfo, DeleteBooking, LineItem, MarkOverdue, OpenBooking, PaymentRecorded, PaymentStatus,
    PaymentSummary, RecordPayment, ReturnBooking,
};
pub use query::{BookingFilter, BookingStats};
pub use request::{BookingRequest, RequestedLine};

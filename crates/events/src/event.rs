use chrono::{DateTime, Utc};

/// A fact about a ledger document.
///
/// Events are immutable, versioned by schema, and named with a stable dotted
/// type (`"inventory.item.stock_reserved"`, `"booking.returned"`, ...).
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name.
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// Business time the event happened.
    fn occurred_at(&self) -> DateTime<Utc>;
}

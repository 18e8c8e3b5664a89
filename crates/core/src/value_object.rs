//! Value objects: compared by value, no identity.

/// Marker for immutable records embedded in aggregates (line items, client
/// details, payment summaries). Two values with equal fields are the same value.
///
/// To "change" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

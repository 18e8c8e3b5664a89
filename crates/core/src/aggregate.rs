//! Aggregate traits and optimistic-concurrency expectations.

use crate::error::{DomainError, DomainResult};

/// Aggregate root: identity plus a monotonically increasing version.
///
/// The version is what the store compares against when a change is committed,
/// so every accepted event must bump it by exactly one.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied so far. `0` means "never persisted".
    fn version(&self) -> u64;
}

/// What a writer expects the stored version of a document to be at commit time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// The document must not exist yet.
    NoDocument,
    /// The document must exist at exactly this version.
    Exact(u64),
}

impl ExpectedVersion {
    /// Expectation for writing back an aggregate that was loaded at `version`.
    ///
    /// A version of `0` means the aggregate was never stored.
    pub fn for_loaded(version: u64) -> Self {
        if version == 0 {
            ExpectedVersion::NoDocument
        } else {
            ExpectedVersion::Exact(version)
        }
    }

    /// `actual` is `None` when no document is stored.
    pub fn matches(self, actual: Option<u64>) -> bool {
        match (self, actual) {
            (ExpectedVersion::Any, _) => true,
            (ExpectedVersion::NoDocument, None) => true,
            (ExpectedVersion::Exact(v), Some(a)) => v == a,
            _ => false,
        }
    }

    pub fn check(self, actual: Option<u64>) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual:?})"
            )))
        }
    }
}

/// Aggregate execution semantics.
///
/// - `handle(&self, cmd)` decides which events happen, without mutating state.
/// - `apply(&mut self, event)` evolves state from one event.
///
/// Both must be deterministic. An empty event list from `handle` means the
/// command was accepted but changes nothing (idempotent repeat).
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Decide and immediately apply, returning the applied events.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }
}

//! Mutation events emitted by the record store.
//!
//! Every committed-to-be write on a shift or staff row is described by a
//! [`MutationEvent`] carrying the operation and before/after images. The
//! recalculation policy is a pure function of these events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identity::Identifier;

use super::{Shift, StaffMember};

/// The kind of write that happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// A new row.
    Insert,
    /// A changed row.
    Update,
    /// A removed row.
    Delete,
}

/// Before and after images of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowChange<T> {
    /// The kind of write.
    pub operation: Operation,
    /// The row before the write (absent for inserts).
    pub before: Option<T>,
    /// The row after the write (absent for deletes).
    pub after: Option<T>,
}

impl<T> RowChange<T> {
    /// An insert of `after`.
    pub fn inserted(after: T) -> Self {
        Self {
            operation: Operation::Insert,
            before: None,
            after: Some(after),
        }
    }

    /// An update from `before` to `after`.
    pub fn updated(before: T, after: T) -> Self {
        Self {
            operation: Operation::Update,
            before: Some(before),
            after: Some(after),
        }
    }

    /// A delete of `before`.
    pub fn deleted(before: T) -> Self {
        Self {
            operation: Operation::Delete,
            before: Some(before),
            after: None,
        }
    }

    /// The most recent image: after if present, otherwise before.
    pub fn current(&self) -> Option<&T> {
        self.after.as_ref().or(self.before.as_ref())
    }
}

/// A change notification from the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum MutationEvent {
    /// A shift was written or deleted.
    Shift {
        /// The row change.
        change: RowChange<Shift>,
    },
    /// A staff row was written or deleted.
    Staff {
        /// The row change.
        change: RowChange<StaffMember>,
        /// An employment end date supplied alongside the write, if any.
        employment_end_override: Option<NaiveDate>,
    },
}

impl MutationEvent {
    /// Wraps a shift change.
    pub fn shift(change: RowChange<Shift>) -> Self {
        Self::Shift { change }
    }

    /// Wraps a staff change.
    pub fn staff(change: RowChange<StaffMember>, employment_end_override: Option<NaiveDate>) -> Self {
        Self::Staff {
            change,
            employment_end_override,
        }
    }

    /// The operation that produced the event.
    pub fn operation(&self) -> Operation {
        match self {
            Self::Shift { change } => change.operation,
            Self::Staff { change, .. } => change.operation,
        }
    }

    /// The staff member the event concerns.
    pub fn staff_id(&self) -> Option<Identifier> {
        match self {
            Self::Shift { change } => change.current().map(|s| s.staff_id),
            Self::Staff { change, .. } => change.current().map(|s| s.id),
        }
    }

    /// A short name for logging.
    pub fn entity_name(&self) -> &'static str {
        match self {
            Self::Shift { .. } => "shift",
            Self::Staff { .. } => "staff",
        }
    }
}

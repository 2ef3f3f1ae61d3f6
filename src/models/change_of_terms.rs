//! Change-of-terms records.
//!
//! A change-of-terms row notes that a field of a staff member's contract
//! changed at a point in time. The recalculation policy only reads them to
//! find a contracted-hours change inside the active accrual year.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::identity::{IdentityGenerator, Identifier};

/// Field name recorded for contracted-hours changes.
pub const CONTRACTED_HOURS_FIELD: &str = "contracted_hours";

/// The category of a change of terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A change to the contract itself (hours, pattern).
    Contract,
    /// A change to employment dates.
    Employment,
}

impl ChangeKind {
    /// Returns the stable tag used in natural keys and storage.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Contract => "contract",
            Self::Employment => "employment",
        }
    }

    /// Parses a stored tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "contract" => Some(Self::Contract),
            "employment" => Some(Self::Employment),
            _ => None,
        }
    }
}

/// A recorded change to a staff member's terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOfTerms {
    /// Identifier derived from (staff id, kind, field, timestamp).
    pub id: Identifier,
    /// The staff member whose terms changed.
    pub staff_id: Identifier,
    /// The category of change.
    pub kind: ChangeKind,
    /// The name of the changed field.
    pub field: String,
    /// When the change took effect.
    pub changed_at: NaiveDateTime,
}

impl ChangeOfTerms {
    /// Creates a change record, deriving its identifier.
    pub fn new(
        generator: &IdentityGenerator,
        staff_id: Identifier,
        kind: ChangeKind,
        field: impl Into<String>,
        changed_at: NaiveDateTime,
    ) -> Self {
        let field = field.into();
        Self {
            id: generator.change_of_terms_id(staff_id, kind.tag(), &field, changed_at),
            staff_id,
            kind,
            field,
            changed_at,
        }
    }

    /// Creates a contracted-hours change record.
    pub fn contracted_hours(
        generator: &IdentityGenerator,
        staff_id: Identifier,
        changed_at: NaiveDateTime,
    ) -> Self {
        Self::new(
            generator,
            staff_id,
            ChangeKind::Contract,
            CONTRACTED_HOURS_FIELD,
            changed_at,
        )
    }
}

/// Candidate change events, ordered by timestamp ascending.
///
/// The sequence is finite and can be iterated any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeHistory {
    events: Vec<ChangeOfTerms>,
}

impl ChangeHistory {
    /// Builds a history, sorting by timestamp then identifier.
    pub fn new(mut events: Vec<ChangeOfTerms>) -> Self {
        events.sort_by(|a, b| a.changed_at.cmp(&b.changed_at).then(a.id.cmp(&b.id)));
        Self { events }
    }

    /// Iterates the events from earliest to latest.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeOfTerms> {
        self.events.iter()
    }

    /// The earliest event, if any.
    pub fn first(&self) -> Option<&ChangeOfTerms> {
        self.events.first()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if there are no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChangeHistory {
    type Item = &'a ChangeOfTerms;
    type IntoIter = std::slice::Iter<'a, ChangeOfTerms>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

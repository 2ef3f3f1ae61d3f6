//! Deterministic identifier generation.
//!
//! Identifiers are UUIDv5 values derived from the deployment namespace, an
//! entity-type tag and the ordered natural-key fields of a record. The same
//! inputs give the same identifier on every machine with no shared state.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::IdentityNamespace;

/// Canonical date format for key components.
pub const KEY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical timestamp format for key components.
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// The kind of record an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A staff member, keyed by name.
    Staff,
    /// A shift, keyed by (accrual year id, staff name, start, shift type).
    Shift,
    /// An accrual year, keyed by (start, end).
    AccrualYear,
    /// An entitlement record, keyed by (staff id, year start).
    Entitlement,
    /// A change-of-terms record, keyed by (staff id, kind, field, timestamp).
    ChangeOfTerms,
}

impl EntityType {
    /// Returns the stable tag mixed into every identifier of this type.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Shift => "shift",
            Self::AccrualYear => "accrual_year",
            Self::Entitlement => "entitlement",
            Self::ChangeOfTerms => "change_of_terms",
        }
    }
}

/// A 128-bit record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Uuid);

impl Identifier {
    /// Wraps a raw uuid.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying uuid.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for Identifier {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A value that can appear as one field of a natural key.
pub trait KeyField {
    /// Returns the canonical string form of the value.
    fn key_component(&self) -> String;
}

impl KeyField for str {
    fn key_component(&self) -> String {
        self.to_string()
    }
}

impl KeyField for String {
    fn key_component(&self) -> String {
        self.clone()
    }
}

impl KeyField for Identifier {
    fn key_component(&self) -> String {
        self.to_string()
    }
}

impl KeyField for NaiveDate {
    fn key_component(&self) -> String {
        self.format(KEY_DATE_FORMAT).to_string()
    }
}

impl KeyField for NaiveDateTime {
    fn key_component(&self) -> String {
        self.format(KEY_TIMESTAMP_FORMAT).to_string()
    }
}

impl KeyField for Decimal {
    fn key_component(&self) -> String {
        self.normalize().to_string()
    }
}

impl KeyField for bool {
    fn key_component(&self) -> String {
        self.to_string()
    }
}

impl<T: KeyField + ?Sized> KeyField for &T {
    fn key_component(&self) -> String {
        (**self).key_component()
    }
}

// Missing fields are empty components, never errors.
impl<T: KeyField> KeyField for Option<T> {
    fn key_component(&self) -> String {
        self.as_ref().map(KeyField::key_component).unwrap_or_default()
    }
}

/// An entity tag plus its ordered natural-key components.
///
/// # Example
///
/// ```
/// use holiday_ledger::identity::{EntityType, NaturalKey};
///
/// let key = NaturalKey::new(EntityType::Staff).field("Alice");
/// assert_eq!(key.encode(), b"5:staff|5:Alice".to_vec());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalKey {
    entity: EntityType,
    components: Vec<String>,
}

impl NaturalKey {
    /// Starts a key for the given entity type.
    pub fn new(entity: EntityType) -> Self {
        Self {
            entity,
            components: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn field(mut self, value: impl KeyField) -> Self {
        self.components.push(value.key_component());
        self
    }

    /// Returns the entity type.
    pub fn entity(&self) -> EntityType {
        self.entity
    }

    /// Encodes the key as length-prefixed components, tag first.
    ///
    /// Length prefixes keep the encoding injective, so `("a|b", "c")` and
    /// `("a", "b|c")` never share a byte string.
    pub fn encode(&self) -> Vec<u8> {
        let mut parts = Vec::with_capacity(self.components.len() + 1);
        parts.push(length_prefixed(self.entity.tag()));
        parts.extend(self.components.iter().map(|c| length_prefixed(c)));
        parts.join("|").into_bytes()
    }
}

fn length_prefixed(value: &str) -> String {
    format!("{}:{}", value.len(), value)
}

/// Derives the identifier for `key` under `namespace`.
///
/// # Example
///
/// ```
/// use holiday_ledger::identity::{identify, EntityType, IdentityNamespace, NaturalKey};
///
/// let key = NaturalKey::new(EntityType::Staff).field("Alice");
/// let first = identify(&IdentityNamespace::V1, &key);
/// let second = identify(&IdentityNamespace::V1, &key);
/// assert_eq!(first, second);
/// ```
pub fn identify(namespace: &IdentityNamespace, key: &NaturalKey) -> Identifier {
    Identifier(Uuid::new_v5(&namespace.uuid(), &key.encode()))
}

/// Identifier factory bound to one namespace.
///
/// Holds the namespace for the life of the process and exposes typed
/// helpers for each record kind in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityGenerator {
    namespace: IdentityNamespace,
}

impl IdentityGenerator {
    /// Creates a generator for the given namespace.
    pub const fn new(namespace: IdentityNamespace) -> Self {
        Self { namespace }
    }

    /// Returns the namespace this generator derives under.
    pub const fn namespace(&self) -> IdentityNamespace {
        self.namespace
    }

    /// Derives the identifier of a natural key.
    pub fn identify(&self, key: &NaturalKey) -> Identifier {
        identify(&self.namespace, key)
    }

    /// Derives an identifier from loosely typed fields; `None` encodes as "".
    pub fn identify_fields<S: AsRef<str>>(
        &self,
        entity: EntityType,
        fields: &[Option<S>],
    ) -> Identifier {
        let key = fields.iter().fold(NaturalKey::new(entity), |key, field| {
            let value: Option<&str> = field.as_ref().map(|s| s.as_ref());
            key.field(value)
        });
        self.identify(&key)
    }

    /// Identifier of a staff member.
    pub fn staff_id(&self, name: &str) -> Identifier {
        self.identify(&NaturalKey::new(EntityType::Staff).field(name))
    }

    /// Identifier of an accrual year.
    pub fn accrual_year_id(&self, start: NaiveDate, end: NaiveDate) -> Identifier {
        self.identify(&NaturalKey::new(EntityType::AccrualYear).field(start).field(end))
    }

    /// Identifier of a shift.
    pub fn shift_id(
        &self,
        accrual_year_id: Identifier,
        staff_name: &str,
        start: NaiveDateTime,
        shift_type_tag: &str,
    ) -> Identifier {
        self.identify(
            &NaturalKey::new(EntityType::Shift)
                .field(accrual_year_id)
                .field(staff_name)
                .field(start)
                .field(shift_type_tag),
        )
    }

    /// Identifier of the entitlement record for a staff member and year.
    pub fn entitlement_id(&self, staff_id: Identifier, year_start: NaiveDate) -> Identifier {
        self.identify(
            &NaturalKey::new(EntityType::Entitlement)
                .field(staff_id)
                .field(year_start),
        )
    }

    /// Identifier of a change-of-terms record.
    pub fn change_of_terms_id(
        &self,
        staff_id: Identifier,
        kind_tag: &str,
        field_name: &str,
        changed_at: NaiveDateTime,
    ) -> Identifier {
        self.identify(
            &NaturalKey::new(EntityType::ChangeOfTerms)
                .field(staff_id)
                .field(kind_tag)
                .field(field_name)
                .field(changed_at),
        )
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        Self::new(IdentityNamespace::default())
    }
}

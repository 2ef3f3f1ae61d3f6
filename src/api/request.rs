//! Request types for the holiday ledger API.
//!
//! Staff and shift bodies reuse [`NewStaff`](crate::store::NewStaff) and
//! [`NewShift`](crate::models::NewShift) directly; this module holds the
//! bodies that have no store counterpart.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::{EntityType, Identifier};
use crate::store::TermsUpdate;

/// Request body for `POST /identify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyRequest {
    /// The kind of record to identify.
    pub entity_type: EntityType,
    /// Natural-key fields in order; `null` encodes as the empty string.
    pub fields: Vec<Option<String>>,
}

/// Response body for `POST /identify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyResponse {
    /// The kind of record identified.
    pub entity_type: EntityType,
    /// The derived identifier.
    pub identifier: Identifier,
    /// The namespace version it was derived under.
    pub namespace_version: u32,
}

/// Request body for `PATCH /staff/:name/terms`.
///
/// An omitted field is left alone; an explicit `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermsRequest {
    /// New contracted weekly hours.
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub contracted_hours: Option<Option<Decimal>>,
    /// New employment start date.
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub employment_start: Option<Option<NaiveDate>>,
    /// New employment end date.
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub employment_end: Option<Option<NaiveDate>>,
    /// Employment end to use for this recompute only.
    #[serde(default)]
    pub employment_end_override: Option<NaiveDate>,
    /// When the change takes effect.
    #[serde(default)]
    pub effective_at: Option<NaiveDateTime>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<TermsRequest> for TermsUpdate {
    fn from(req: TermsRequest) -> Self {
        TermsUpdate {
            contracted_hours: req.contracted_hours,
            employment_start: req.employment_start,
            employment_end: req.employment_end,
            employment_end_override: req.employment_end_override,
            effective_at: req.effective_at,
        }
    }
}

/// Request body for `POST /staff/:name/recalculate`. The body is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecalculateRequest {
    /// Employment end to use for this recompute only.
    #[serde(default)]
    pub employment_end_override: Option<NaiveDate>,
}

//! Recalculation policy.
//!
//! A pure decision table over [`MutationEvent`](crate::models::MutationEvent)s
//! deciding whether a write needs an entitlement recompute, plus the
//! pro-rata anchor rule applied when it does.

mod anchor;
mod decision;

pub use anchor::{anchor, effective_employment};
pub use decision::{Decision, RecalcRequest, SkipReason, evaluate};

//! HTTP API module for the holiday ledger.
//!
//! This module exposes identity derivation, staff and shift writes, forced
//! recalculation and entitlement lookup over JSON.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{IdentifyRequest, IdentifyResponse, RecalculateRequest, TermsRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;

//! Application state for the holiday ledger API.

use std::sync::Arc;

use crate::store::SqliteStore;

/// Shared application state.
///
/// Holds the record store every handler writes through.
#[derive(Clone)]
pub struct AppState {
    store: Arc<SqliteStore>,
}

impl AppState {
    /// Creates a new application state around an open store.
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Returns a shared handle to the store.
    pub fn store(&self) -> Arc<SqliteStore> {
        Arc::clone(&self.store)
    }
}

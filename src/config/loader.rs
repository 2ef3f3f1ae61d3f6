//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading ledger
//! configuration from YAML files.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::calculation::AccrualRates;
use crate::error::{EngineError, EngineResult};
use crate::identity::IdentityNamespace;
use crate::models::AccrualYearResolver;

use super::types::{AccrualConfig, IdentityConfig, LedgerConfig, StoreConfig};

/// Loads and provides access to ledger configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory and
/// validates them before anything is built from them.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── identity.yaml   # Namespace version and uuid
/// ├── accrual.yaml    # Accrual-year rule and statutory rates
/// └── store.yaml      # SQLite busy timeout and retry limit
/// ```
///
/// # Example
///
/// ```no_run
/// use holiday_ledger::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Namespace v{}", loader.namespace().version());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: LedgerConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/default")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - Any value is out of range
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let identity = Self::load_yaml::<IdentityConfig>(&path.join("identity.yaml"))?;
        let namespace = identity.to_namespace()?;

        let accrual = Self::load_yaml::<AccrualConfig>(&path.join("accrual.yaml"))?;
        accrual.accrual_year.validate()?;
        accrual.rates.validate()?;

        let store = Self::load_yaml::<StoreConfig>(&path.join("store.yaml"))?;
        store.validate()?;

        Ok(Self {
            config: LedgerConfig::new(namespace, accrual, store),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying ledger configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns the identity namespace.
    pub fn namespace(&self) -> IdentityNamespace {
        self.config.namespace()
    }

    /// Returns the statutory rates.
    pub fn rates(&self) -> &AccrualRates {
        self.config.rates()
    }

    /// Builds the accrual-year resolver.
    pub fn resolver(&self) -> Arc<dyn AccrualYearResolver> {
        self.config.accrual().accrual_year.resolver()
    }
}

//! Configuration types for the holiday ledger.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::calculation::AccrualRates;
use crate::error::{EngineError, EngineResult};
use crate::identity::IdentityNamespace;
use crate::models::{AccrualYear, AccrualYearResolver, AnniversaryYear, FixedYear};

/// The identity namespace file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Namespace version, starting at 1.
    pub version: u32,
    /// Namespace uuid every identifier is derived under.
    pub namespace: Uuid,
}

impl IdentityConfig {
    /// Validates and converts to an [`IdentityNamespace`].
    pub fn to_namespace(&self) -> EngineResult<IdentityNamespace> {
        IdentityNamespace::new(self.version, self.namespace)
    }
}

/// How the active accrual year is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AccrualYearConfig {
    /// Every year starts on the same month and day.
    Anniversary {
        /// Month the year starts in (1-12).
        start_month: u32,
        /// Day of month the year starts on.
        start_day: u32,
    },
    /// A single pinned year.
    Fixed {
        /// First day of the year.
        start: NaiveDate,
        /// Last day of the year.
        end: NaiveDate,
    },
}

impl AccrualYearConfig {
    /// Rejects impossible dates and fixed years that do not span twelve
    /// months, since the statutory base is always pro-rated over one.
    pub fn validate(&self) -> EngineResult<()> {
        match *self {
            Self::Anniversary {
                start_month,
                start_day,
            } => {
                // 2000 is a leap year, so 29 February passes.
                if NaiveDate::from_ymd_opt(2000, start_month, start_day).is_none() {
                    return Err(EngineError::InvalidConfig {
                        field: "accrual_year".to_string(),
                        message: format!("{start_month}/{start_day} is not a calendar day"),
                    });
                }
            }
            Self::Fixed { start, end } => {
                if end < start {
                    return Err(EngineError::InvalidConfig {
                        field: "accrual_year.end".to_string(),
                        message: format!("{end} is before {start}"),
                    });
                }
                let expected = AccrualYear::starting(start).end;
                if end != expected {
                    return Err(EngineError::InvalidConfig {
                        field: "accrual_year.end".to_string(),
                        message: format!("a year starting {start} must end on {expected}, not {end}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Builds the resolver described by this configuration.
    pub fn resolver(&self) -> Arc<dyn AccrualYearResolver> {
        match *self {
            Self::Anniversary {
                start_month,
                start_day,
            } => Arc::new(AnniversaryYear {
                start_month,
                start_day,
            }),
            Self::Fixed { start, end } => Arc::new(FixedYear(AccrualYear::new(start, end))),
        }
    }
}

impl Default for AccrualYearConfig {
    /// The UK tax year.
    fn default() -> Self {
        Self::Anniversary {
            start_month: 4,
            start_day: 6,
        }
    }
}

/// The accrual file structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AccrualConfig {
    /// How the active accrual year is determined.
    #[serde(default)]
    pub accrual_year: AccrualYearConfig,
    /// Statutory rates.
    #[serde(default)]
    pub rates: AccrualRates,
}

/// The record store file structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// How long SQLite waits on a locked database before reporting busy.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Attempts made before a conflicting transaction is abandoned.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_max_conflict_retries() -> u32 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

impl StoreConfig {
    /// Rejects a retry limit of zero.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_conflict_retries == 0 {
            return Err(EngineError::InvalidConfig {
                field: "store.max_conflict_retries".to_string(),
                message: "at least one attempt is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Complete ledger configuration.
///
/// This struct aggregates all configuration loaded from the various
/// YAML files in a configuration directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    namespace: IdentityNamespace,
    accrual: AccrualConfig,
    store: StoreConfig,
}

impl LedgerConfig {
    /// Creates a LedgerConfig from its component parts.
    pub fn new(namespace: IdentityNamespace, accrual: AccrualConfig, store: StoreConfig) -> Self {
        Self {
            namespace,
            accrual,
            store,
        }
    }

    /// Returns the identity namespace.
    pub fn namespace(&self) -> IdentityNamespace {
        self.namespace
    }

    /// Returns the accrual configuration.
    pub fn accrual(&self) -> &AccrualConfig {
        &self.accrual
    }

    /// Returns the statutory rates.
    pub fn rates(&self) -> &AccrualRates {
        &self.accrual.rates
    }

    /// Returns the store configuration.
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Returns a copy with a different accrual-year rule.
    pub fn with_accrual_year(mut self, accrual_year: AccrualYearConfig) -> Self {
        self.accrual.accrual_year = accrual_year;
        self
    }

    /// Returns a copy with a different identity namespace.
    pub fn with_namespace(mut self, namespace: IdentityNamespace) -> Self {
        self.namespace = namespace;
        self
    }
}

//! Versioned identity namespaces and the guarded migration between them.
//!
//! Every identifier in the ledger is derived under exactly one namespace.
//! Swapping the namespace changes every identifier at once, so a running
//! deployment never does it implicitly: the store refuses to open under a
//! namespace other than the one it was created with, and the only way across
//! is an explicit [`NamespaceMigration`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// The namespace uuid shipped with the first release.
pub const DEFAULT_NAMESPACE_UUID: Uuid = Uuid::from_u128(0x5f0c_8e2a_7d41_4b6e_9a3c_1e2d_4f6a_8b0c);

/// A versioned identity namespace.
///
/// # Example
///
/// ```
/// use holiday_ledger::identity::IdentityNamespace;
///
/// let namespace = IdentityNamespace::default();
/// assert_eq!(namespace.version(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityNamespace {
    version: u32,
    uuid: Uuid,
}

impl IdentityNamespace {
    /// The built-in namespace, version 1.
    pub const V1: Self = Self {
        version: 1,
        uuid: DEFAULT_NAMESPACE_UUID,
    };

    /// Creates a namespace, rejecting version 0 and the nil uuid.
    pub fn new(version: u32, uuid: Uuid) -> EngineResult<Self> {
        if version == 0 {
            return Err(EngineError::InvalidConfig {
                field: "identity.version".to_string(),
                message: "namespace versions start at 1".to_string(),
            });
        }
        if uuid.is_nil() {
            return Err(EngineError::InvalidConfig {
                field: "identity.namespace".to_string(),
                message: "the nil uuid cannot be used as a namespace".to_string(),
            });
        }
        Ok(Self { version, uuid })
    }

    /// Returns the namespace version.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the namespace uuid.
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl Default for IdentityNamespace {
    fn default() -> Self {
        Self::V1
    }
}

/// A validated plan to re-key a store from one namespace to another.
///
/// Plans can only move forward: the target must carry a different uuid and
/// a strictly higher version than the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceMigration {
    from: IdentityNamespace,
    to: IdentityNamespace,
}

impl NamespaceMigration {
    /// Validates a migration from `from` to `to`.
    ///
    /// # Example
    ///
    /// ```
    /// use holiday_ledger::identity::{IdentityNamespace, NamespaceMigration};
    /// use uuid::Uuid;
    ///
    /// let next = IdentityNamespace::new(2, Uuid::from_u128(42)).unwrap();
    /// assert!(NamespaceMigration::plan(IdentityNamespace::V1, next).is_ok());
    /// assert!(NamespaceMigration::plan(next, IdentityNamespace::V1).is_err());
    /// ```
    pub fn plan(from: IdentityNamespace, to: IdentityNamespace) -> EngineResult<Self> {
        if from.uuid == to.uuid {
            return Err(EngineError::InvalidNamespaceMigration {
                message: "source and target namespaces share a uuid".to_string(),
            });
        }
        if to.version <= from.version {
            return Err(EngineError::InvalidNamespaceMigration {
                message: format!(
                    "target version {} must be greater than source version {}",
                    to.version, from.version
                ),
            });
        }
        Ok(Self { from, to })
    }

    /// The namespace the store currently uses.
    pub const fn from(&self) -> IdentityNamespace {
        self.from
    }

    /// The namespace the store will use afterwards.
    pub const fn to(&self) -> IdentityNamespace {
        self.to
    }
}

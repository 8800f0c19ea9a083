//! # LDUtils
//!
//! Convenience operations for reconciling LaunchDarkly feature flags and
//! custom roles against a desired state.
//!
//! ## Overview
//!
//! The ldutils crate handles:
//! - **Roles**: Get, create, diff-based update, upsert, and bulk upsert from files
//! - **Flags**: Get, toggle, patch, migrate state between environments, restore from backup
//! - **Facade**: [`LaunchDarklyUtils`] wires both to one shared API client
//!
//! ## Architecture
//!
//! ```text
//! LaunchDarklyUtils
//!   ├── flags: FlagReconciler ──┐
//!   └── roles: RoleReconciler ──┼──▶ Arc<dyn LaunchDarklyApi>
//!                 │             │
//!                 └─ compute_delta (read → diff → PATCH)
//! ```
//!
//! Bulk operations are ordered: each item's request is sent only after the
//! previous item's response, and the first failure stops the sequence. The
//! one exception is loading a folder of role files, where the files are
//! processed concurrently (each file still in order).
//!
//! ## Errors
//!
//! API failures come back as [`OperationError`] values carrying the API
//! operation name, a message and a documentation link.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ldutils::LaunchDarklyUtils;
//! use ldutils_api::{PolicyStatement, RoleDefinition};
//!
//! async fn example() -> ldutils::Result<()> {
//!     let ld = LaunchDarklyUtils::from_env()?;
//!
//!     // Copy the test environment's state to production
//!     ld.flags
//!         .migrate("sample-project", "sort.order", "test", "production")
//!         .await?;
//!
//!     // Make sure a role exists with exactly this policy
//!     let role = RoleDefinition::new("sample-role", "sample role")
//!         .with_description("Allow access to production")
//!         .with_statement(PolicyStatement::allow(["proj/*:env/production"], ["*"]));
//!     let outcome = ld.roles.upsert(&role).await?;
//!     println!("created: {}", outcome.is_created());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod files;
pub mod flags;
pub mod roles;

use ldutils_api::{ApiConfig, HttpApiClient, LaunchDarklyApi};
use std::path::Path;
use std::sync::Arc;

// Re-export main types
pub use error::{Error, OperationError, Result};
pub use files::{FileSource, LocalFiles};
pub use flags::{FlagReconciler, RestoreChange};
pub use roles::{FileUpsertReport, RoleReconciler, UpsertMode, UpsertOutcome};

/// Flag and role operations over one API client.
#[derive(Clone)]
pub struct LaunchDarklyUtils {
    /// Feature flag operations.
    pub flags: FlagReconciler,

    /// Custom role operations.
    pub roles: RoleReconciler,
}

impl LaunchDarklyUtils {
    /// Create the facade over an existing client.
    pub fn new(api: Arc<dyn LaunchDarklyApi>) -> Self {
        Self {
            flags: FlagReconciler::new(Arc::clone(&api)),
            roles: RoleReconciler::new(api),
        }
    }

    /// Create the facade with an HTTP client built from `config`.
    pub fn from_config(config: ApiConfig) -> Result<Self> {
        let client = HttpApiClient::new(config).map_err(Error::Client)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Create the facade with an HTTP client configured from the environment.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    /// See [`ApiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::from_config(ApiConfig::from_env())
    }

    /// Create the facade with an HTTP client configured from a `.env` file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = ApiConfig::from_env_file(path).map_err(|e| Error::Client(e.into()))?;
        Self::from_config(config)
    }

    /// Read role files and flag backups from `files`.
    pub fn with_file_source(self, files: Arc<dyn FileSource>) -> Self {
        Self {
            flags: self.flags.with_file_source(Arc::clone(&files)),
            roles: self.roles.with_file_source(files),
        }
    }

    /// Set how role upserts treat lookup failures.
    pub fn with_upsert_mode(self, mode: UpsertMode) -> Self {
        Self {
            roles: self.roles.with_upsert_mode(mode),
            ..self
        }
    }
}

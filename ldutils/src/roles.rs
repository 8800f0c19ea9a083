//! Custom role reconciliation.
//!
//! Reads, creates and updates custom roles, and upserts them in bulk from
//! definitions or definition files.
//!
//! ## Upsert
//!
//! ```text
//! GET /roles/{key} ── found ──────────────▶ diff + PATCH  ─▶ Updated
//!                  └─ not found / error ──▶ POST          ─▶ Created
//! ```
//!
//! In [`UpsertMode::Lenient`] (the default) any lookup failure takes the
//! create branch, so a transient failure surfaces as a failed create.
//! [`UpsertMode::Strict`] only creates on `NotFound` and returns other lookup
//! failures unchanged.
//!
//! ## Bulk
//!
//! [`RoleReconciler::bulk_upsert`] upserts one role at a time in input order
//! and stops at the first failure. File sets run one such chain per file,
//! concurrently; see [`RoleReconciler::bulk_upsert_files`].

use futures::future::join_all;
use ldutils_api::{
    ApiResponse, CustomRole, CustomRoleList, ErrorKind, LaunchDarklyApi, RoleDefinition,
};
use ldutils_patch::compute_delta;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{docs, parse_body, OperationError, Result};
use crate::files::{load_json, FileSource, LocalFiles};

/// How `upsert` treats a failed lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpsertMode {
    /// Create on any lookup failure.
    #[default]
    Lenient,
    /// Create only when the lookup reports `NotFound`.
    Strict,
}

/// Result of upserting one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "role", rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// The role did not exist and was created.
    Created(CustomRole),
    /// The role existed and was patched.
    Updated(CustomRole),
}

impl UpsertOutcome {
    /// Get the role returned by the server.
    pub fn role(&self) -> &CustomRole {
        match self {
            UpsertOutcome::Created(role) | UpsertOutcome::Updated(role) => role,
        }
    }

    /// Take the role returned by the server.
    pub fn into_role(self) -> CustomRole {
        match self {
            UpsertOutcome::Created(role) | UpsertOutcome::Updated(role) => role,
        }
    }

    /// Check whether the role was created.
    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}

/// Result of upserting the roles of one file.
#[derive(Debug)]
pub struct FileUpsertReport {
    /// Definition file.
    pub path: PathBuf,
    /// Outcomes in file order, or the first failure.
    pub result: Result<Vec<UpsertOutcome>>,
}

/// Custom role operations.
#[derive(Clone)]
pub struct RoleReconciler {
    /// API client shared with the other reconcilers.
    api: Arc<dyn LaunchDarklyApi>,

    /// Where definition files are read from.
    files: Arc<dyn FileSource>,

    /// Lookup failure handling for `upsert`.
    mode: UpsertMode,
}

impl RoleReconciler {
    /// Create a reconciler reading files from the local file system.
    pub fn new(api: Arc<dyn LaunchDarklyApi>) -> Self {
        Self {
            api,
            files: Arc::new(LocalFiles),
            mode: UpsertMode::default(),
        }
    }

    /// Read definition files from another source.
    pub fn with_file_source(mut self, files: Arc<dyn FileSource>) -> Self {
        self.files = files;
        self
    }

    /// Set how `upsert` treats lookup failures.
    pub fn with_upsert_mode(mut self, mode: UpsertMode) -> Self {
        self.mode = mode;
        self
    }

    /// Get the upsert mode.
    pub fn upsert_mode(&self) -> UpsertMode {
        self.mode
    }

    /// List all custom roles.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<CustomRoleList> {
        let response = self
            .api
            .get_custom_roles()
            .await
            .map_err(|e| OperationError::from_api("getCustomRoles", docs::LIST_CUSTOM_ROLES, e))?;
        parse_body(&response, "getCustomRoles", docs::LIST_CUSTOM_ROLES)
    }

    /// Get a custom role by key.
    ///
    /// A missing role is an error with kind `NotFound`.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<CustomRole> {
        let response = self.fetch(key).await?;
        parse_body(&response, "getCustomRole", docs::LIST_CUSTOM_ROLES)
    }

    /// Get a custom role by its server-assigned `_id`.
    ///
    /// Fails unless exactly one listed role carries the id.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<CustomRole> {
        let roles = self.list().await?;
        let mut matches = roles.items.iter().filter(|role| role.id == id);

        match (matches.next(), matches.next()) {
            (Some(role), None) => self.get(&role.key).await,
            _ => Err(OperationError::new(
                "getCustomRoles",
                docs::LIST_CUSTOM_ROLES,
                ErrorKind::Ambiguous,
                format!("role not found for _id {}", id),
            )
            .into()),
        }
    }

    /// Create a custom role.
    ///
    /// The key is not checked beforehand; an existing key fails with the
    /// API's conflict error.
    #[instrument(skip(self, role), fields(custom_role_key = %role.key))]
    pub async fn create(&self, role: &RoleDefinition) -> Result<CustomRole> {
        let response = self
            .api
            .post_custom_role(role)
            .await
            .map_err(|e| OperationError::from_api("postCustomRole", docs::CREATE_CUSTOM_ROLE, e))?;
        parse_body(&response, "postCustomRole", docs::CREATE_CUSTOM_ROLE)
    }

    /// Update a custom role to match `role`.
    ///
    /// Fetches the current role and patches the delta between the full server
    /// document and `role`. Server-managed members such as `_id` and `_links`
    /// are absent from `role`, so the delta carries `remove` operations for them.
    #[instrument(skip(self, role), fields(custom_role_key = %role.key))]
    pub async fn update(&self, role: &RoleDefinition) -> Result<CustomRole> {
        let current = self.fetch(&role.key).await?;
        self.patch_to(current, role).await
    }

    /// Create the role if it is absent, update it otherwise.
    #[instrument(skip(self, role), fields(custom_role_key = %role.key))]
    pub async fn upsert(&self, role: &RoleDefinition) -> Result<UpsertOutcome> {
        match self.fetch(&role.key).await {
            Ok(current) => {
                debug!("Role '{}' found, updating", role.key);
                self.patch_to(current, role).await.map(UpsertOutcome::Updated)
            }
            Err(err) => {
                match (err.kind(), self.mode) {
                    (ErrorKind::NotFound, _) => {
                        debug!("Role '{}' not found, creating", role.key);
                    }
                    (_, UpsertMode::Lenient) => {
                        warn!(
                            error = %err,
                            "Lookup of role '{}' failed, creating",
                            role.key
                        );
                    }
                    (_, UpsertMode::Strict) => return Err(err),
                }
                self.create(role).await.map(UpsertOutcome::Created)
            }
        }
    }

    /// Upsert roles one at a time, in order.
    ///
    /// Stops at the first failure and returns it; later roles are not sent.
    #[instrument(skip(self, roles), fields(count = roles.len()))]
    pub async fn bulk_upsert(&self, roles: &[RoleDefinition]) -> Result<Vec<UpsertOutcome>> {
        let mut outcomes = Vec::with_capacity(roles.len());
        for (index, role) in roles.iter().enumerate() {
            let outcome = self.upsert(role).await.map_err(|e| {
                warn!(index, custom_role_key = %role.key, error = %e, "Bulk upsert stopped");
                e
            })?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Upsert the roles of a JSON file holding an array of definitions.
    #[instrument(skip(self))]
    pub async fn bulk_upsert_file(&self, path: &Path) -> Result<Vec<UpsertOutcome>> {
        let roles: Vec<RoleDefinition> = load_json(self.files.as_ref(), path)?;
        debug!("Bulk upserting {} roles from {}", roles.len(), path.display());
        self.bulk_upsert(&roles).await
    }

    /// Upsert the roles of several files.
    ///
    /// Each file is a sequential chain; the chains run concurrently, so
    /// requests from different files interleave in no fixed order. A failing
    /// file does not stop the others. Reports are returned in `paths` order.
    pub async fn bulk_upsert_files(&self, paths: &[PathBuf]) -> Vec<FileUpsertReport> {
        let uploads = paths.iter().map(|path| async move {
            FileUpsertReport {
                path: path.clone(),
                result: self.bulk_upsert_file(path).await,
            }
        });
        join_all(uploads).await
    }

    /// Upsert the roles of every `*.json` file directly inside `dir`.
    #[instrument(skip(self))]
    pub async fn bulk_upsert_folder(&self, dir: &Path) -> Result<Vec<FileUpsertReport>> {
        let paths = self.files.list_json_files(dir)?;
        info!("Found {} role files in {}", paths.len(), dir.display());
        Ok(self.bulk_upsert_files(&paths).await)
    }

    async fn fetch(&self, key: &str) -> Result<ApiResponse> {
        self.api
            .get_custom_role(key)
            .await
            .map_err(|e| OperationError::from_api("getCustomRole", docs::LIST_CUSTOM_ROLES, e).into())
    }

    async fn patch_to(&self, current: ApiResponse, role: &RoleDefinition) -> Result<CustomRole> {
        let desired = serde_json::to_value(role)?;
        let delta = compute_delta(&current.body, &desired);
        debug!(
            "customRoleDiff for '{}' {}",
            role.key,
            serde_json::to_string(&delta).unwrap_or_default()
        );

        let response = self
            .api
            .patch_custom_role(&role.key, &delta)
            .await
            .map_err(|e| OperationError::from_api("patchCustomRole", docs::UPDATE_CUSTOM_ROLE, e))?;
        parse_body(&response, "patchCustomRole", docs::UPDATE_CUSTOM_ROLE)
    }
}

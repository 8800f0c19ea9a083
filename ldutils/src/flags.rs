//! Feature flag reconciliation.
//!
//! Reads flags and their per-environment `on` state, toggles environments,
//! copies state between environments and restores state from a backup.
//! Operations over several flag keys run one key at a time, in list order,
//! and stop at the first failure.

use ldutils_api::{
    FeatureFlag, FeatureFlagList, FlagReference, LaunchDarklyApi, PatchOperation,
};
use ldutils_patch::{apply_patch, escape_token};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{docs, parse_body, Error, OperationError, Result};
use crate::files::{load_json, FileSource, LocalFiles};

/// Split a comma-delimited flag key list, trimming blanks.
///
/// # Example
///
/// ```
/// use ldutils::flags::parse_flag_keys;
///
/// assert_eq!(parse_flag_keys("sort.order, sort.order2,"), vec!["sort.order", "sort.order2"]);
/// ```
pub fn parse_flag_keys(flag_keys: &str) -> Vec<&str> {
    flag_keys
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .collect()
}

/// Build the patch that sets an environment's `on` state.
pub fn toggle_patch(environment_key: &str, value: bool) -> Vec<PatchOperation> {
    vec![PatchOperation::replace(
        format!("/environments/{}/on", escape_token(environment_key)),
        Value::Bool(value),
    )]
}

/// Apply `patch` to a local copy of `flag`, without calling the API.
pub fn preview_patch(flag: &FeatureFlag, patch: &[PatchOperation]) -> Result<FeatureFlag> {
    let mut document = serde_json::to_value(flag)?;
    apply_patch(&mut document, patch)?;
    Ok(serde_json::from_value(document)?)
}

/// One flag handled by [`FlagReconciler::restore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreChange {
    /// Restored flag.
    pub flag: FlagReference,
    /// Environment key.
    pub environment: String,
    /// State before the restore.
    pub current: bool,
    /// State recorded in the backup.
    pub restored: bool,
    /// Whether the patch was sent (false on a dry run).
    pub applied: bool,
    /// Flag after the restore: the API's response, or on a dry run the
    /// current flag with the patch applied locally.
    pub result: FeatureFlag,
}

impl RestoreChange {
    /// Check whether the restore changes the flag's state.
    pub fn changes_state(&self) -> bool {
        self.current != self.restored
    }
}

/// Backup file contents: a saved flag listing, or a bare array of flags.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagBackup {
    Flags(Vec<FeatureFlag>),
    List(FeatureFlagList),
}

impl FlagBackup {
    fn into_flags(self) -> Vec<FeatureFlag> {
        match self {
            FlagBackup::Flags(flags) => flags,
            FlagBackup::List(list) => list.items,
        }
    }
}

/// Feature flag operations.
#[derive(Clone)]
pub struct FlagReconciler {
    /// API client shared with the other reconcilers.
    api: Arc<dyn LaunchDarklyApi>,

    /// Where backups are read from.
    files: Arc<dyn FileSource>,
}

impl FlagReconciler {
    /// Create a reconciler reading backups from the local file system.
    pub fn new(api: Arc<dyn LaunchDarklyApi>) -> Self {
        Self {
            api,
            files: Arc::new(LocalFiles),
        }
    }

    /// Read backups from another source.
    pub fn with_file_source(mut self, files: Arc<dyn FileSource>) -> Self {
        self.files = files;
        self
    }

    /// List the flags of a project.
    #[instrument(skip(self))]
    pub async fn list(&self, project_key: &str) -> Result<FeatureFlagList> {
        let response = self
            .api
            .get_feature_flags(project_key)
            .await
            .map_err(|e| OperationError::from_api("getFeatureFlags", docs::LIST_FEATURE_FLAGS, e))?;
        parse_body(&response, "getFeatureFlags", docs::LIST_FEATURE_FLAGS)
    }

    /// Get a flag, optionally scoped to one environment.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        environment_key: Option<&str>,
    ) -> Result<FeatureFlag> {
        let response = self
            .api
            .get_feature_flag(project_key, feature_flag_key, environment_key)
            .await
            .map_err(|e| OperationError::from_api("getFeatureFlag", docs::GET_FEATURE_FLAG, e))?;
        parse_body(&response, "getFeatureFlag", docs::GET_FEATURE_FLAG)
    }

    /// Get a flag's `on` state in an environment.
    pub async fn get_state(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        environment_key: &str,
    ) -> Result<bool> {
        let flag = self
            .get(project_key, feature_flag_key, Some(environment_key))
            .await?;
        flag.is_on(environment_key)
            .ok_or_else(|| Error::MissingEnvironment {
                flag: FlagReference::new(project_key, feature_flag_key),
                environment: environment_key.to_string(),
            })
    }

    /// Set a flag's `on` state in an environment.
    #[instrument(skip(self))]
    pub async fn toggle(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        environment_key: &str,
        value: bool,
    ) -> Result<FeatureFlag> {
        self.update(
            project_key,
            feature_flag_key,
            &toggle_patch(environment_key, value),
        )
        .await
    }

    /// Send a caller-built patch as is.
    #[instrument(skip(self, patch), fields(operations = patch.len()))]
    pub async fn update(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        patch: &[PatchOperation],
    ) -> Result<FeatureFlag> {
        let response = self
            .api
            .patch_feature_flag(project_key, feature_flag_key, patch)
            .await
            .map_err(|e| {
                OperationError::from_api("patchFeatureFlag", docs::UPDATE_FEATURE_FLAG, e)
            })?;
        parse_body(&response, "patchFeatureFlag", docs::UPDATE_FEATURE_FLAG)
    }

    /// Copy a flag's `on` state from one environment to another.
    ///
    /// A read followed by a write; if the write fails the target environment
    /// is left as it was.
    #[instrument(skip(self))]
    pub async fn migrate(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        from_environment_key: &str,
        to_environment_key: &str,
    ) -> Result<FeatureFlag> {
        let value = self
            .get_state(project_key, feature_flag_key, from_environment_key)
            .await?;
        debug!(
            "Migrating '{}' from {} to {} (on: {})",
            feature_flag_key, from_environment_key, to_environment_key, value
        );
        self.toggle(project_key, feature_flag_key, to_environment_key, value)
            .await
    }

    /// Migrate each flag of a comma-delimited key list, in order.
    ///
    /// Stops at the first failure and returns it.
    #[instrument(skip(self))]
    pub async fn bulk_migrate(
        &self,
        project_key: &str,
        feature_flag_keys: &str,
        from_environment_key: &str,
        to_environment_key: &str,
    ) -> Result<Vec<FeatureFlag>> {
        let keys = parse_flag_keys(feature_flag_keys);
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let flag = self
                .migrate(project_key, key, from_environment_key, to_environment_key)
                .await?;
            results.push(flag);
        }
        Ok(results)
    }

    /// Restore flags' `on` state in one environment from a backup file.
    ///
    /// The backup is a saved flag listing (`{"items": [...]}`) or a bare array
    /// of flags. Every listed key must appear in the backup with state for
    /// `environment_key`. With `dry_run` the current flag is read and the
    /// patch previewed locally, but nothing is sent.
    #[instrument(skip(self))]
    pub async fn restore(
        &self,
        project_key: &str,
        feature_flag_keys: &str,
        environment_key: &str,
        backup_path: &Path,
        dry_run: bool,
    ) -> Result<Vec<RestoreChange>> {
        let backup: FlagBackup = load_json(self.files.as_ref(), backup_path)?;
        let flags = backup.into_flags();

        let keys = parse_flag_keys(feature_flag_keys);
        let mut changes = Vec::with_capacity(keys.len());
        for key in keys {
            let flag = FlagReference::new(project_key, key);

            let recorded = flags
                .iter()
                .find(|f| f.key == key)
                .ok_or_else(|| Error::MissingFromBackup {
                    flag_key: key.to_string(),
                    path: backup_path.to_path_buf(),
                })?;
            let restored = recorded
                .is_on(environment_key)
                .ok_or_else(|| Error::MissingEnvironment {
                    flag: flag.clone(),
                    environment: environment_key.to_string(),
                })?;

            let current_flag = self.get(project_key, key, Some(environment_key)).await?;
            let current = current_flag
                .is_on(environment_key)
                .ok_or_else(|| Error::MissingEnvironment {
                    flag: flag.clone(),
                    environment: environment_key.to_string(),
                })?;

            let patch = toggle_patch(environment_key, restored);
            let result = if dry_run {
                info!(
                    "Dry run: would set {} in {} from {} to {}",
                    flag, environment_key, current, restored
                );
                preview_patch(&current_flag, &patch)?
            } else {
                self.update(project_key, key, &patch).await?
            };

            changes.push(RestoreChange {
                flag,
                environment: environment_key.to_string(),
                current,
                restored,
                applied: !dry_run,
                result,
            });
        }
        Ok(changes)
    }
}

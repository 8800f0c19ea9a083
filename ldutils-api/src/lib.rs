//! # LDUtils API
//!
//! Typed access to the LaunchDarkly v2 REST API for feature flags and
//! custom roles.
//!
//! ## Overview
//!
//! The ldutils-api crate handles:
//! - **Contract**: [`LaunchDarklyApi`], one async method per resource operation
//! - **Transport**: [`HttpApiClient`], the reqwest implementation of the contract
//! - **Payloads**: Role definitions, policy statements, flags and their environments
//! - **Errors**: HTTP statuses mapped to [`ApiError`] variants and an [`ErrorKind`]
//! - **Configuration**: [`ApiConfig`], loaded from the environment
//!
//! ## Endpoints
//!
//! | Method | Path |
//! |--------|------|
//! | `get_feature_flags` | `GET /flags/{projectKey}` |
//! | `get_feature_flag` | `GET /flags/{projectKey}/{featureFlagKey}?env=` |
//! | `patch_feature_flag` | `PATCH /flags/{projectKey}/{featureFlagKey}` |
//! | `get_custom_roles` | `GET /roles` |
//! | `get_custom_role` | `GET /roles/{customRoleKey}` |
//! | `post_custom_role` | `POST /roles` |
//! | `patch_custom_role` | `PATCH /roles/{customRoleKey}` |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ldutils_api::{ApiConfig, HttpApiClient, LaunchDarklyApi};
//! use ldutils_api::types::FeatureFlag;
//!
//! async fn example() -> ldutils_api::ApiResult<()> {
//!     let client = HttpApiClient::new(ApiConfig::from_env())?;
//!
//!     let response = client
//!         .get_feature_flag("sample-project", "sort.order", Some("test"))
//!         .await?;
//!     let flag: FeatureFlag = response.parse()?;
//!     println!("on in test: {:?}", flag.is_on("test"));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

// Re-export main types
pub use client::{ApiResponse, LaunchDarklyApi};
pub use config::{ApiConfig, ConfigError, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use http::HttpApiClient;
pub use types::{
    CustomRole, CustomRoleList, Effect, FeatureFlag, FeatureFlagList, FlagEnvironment,
    FlagReference, PolicyStatement, RoleDefinition,
};

// Patch operations are part of the client contract
pub use ldutils_patch::PatchOperation;

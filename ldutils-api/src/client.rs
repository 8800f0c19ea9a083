//! API client contract.
//!
//! [`LaunchDarklyApi`] exposes one method per resource operation used by the
//! reconcilers. The reconcilers only ever see this trait, so tests can inject
//! an in-memory implementation and production code uses [`HttpApiClient`].
//!
//! [`HttpApiClient`]: crate::http::HttpApiClient

use async_trait::async_trait;
use ldutils_patch::PatchOperation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::types::RoleDefinition;

/// A successful API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,

    /// Parsed JSON body (`null` when the body was empty).
    pub body: Value,
}

impl ApiResponse {
    /// Create a response.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Create a `200 OK` response.
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// Deserialize the body into a typed object.
    pub fn parse<T: DeserializeOwned>(&self) -> ApiResult<T> {
        T::deserialize(&self.body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Take the body.
    pub fn into_body(self) -> Value {
        self.body
    }
}

/// LaunchDarkly REST operations.
///
/// Implementations must be safe to share between concurrently running
/// reconciliations.
#[async_trait]
pub trait LaunchDarklyApi: Send + Sync {
    /// `GET /flags/{projectKey}`
    async fn get_feature_flags(&self, project_key: &str) -> ApiResult<ApiResponse>;

    /// `GET /flags/{projectKey}/{featureFlagKey}[?env={environmentKey}]`
    async fn get_feature_flag(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        environment_key: Option<&str>,
    ) -> ApiResult<ApiResponse>;

    /// `PATCH /flags/{projectKey}/{featureFlagKey}`
    async fn patch_feature_flag(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        patch: &[PatchOperation],
    ) -> ApiResult<ApiResponse>;

    /// `GET /roles`
    async fn get_custom_roles(&self) -> ApiResult<ApiResponse>;

    /// `GET /roles/{customRoleKey}`
    async fn get_custom_role(&self, custom_role_key: &str) -> ApiResult<ApiResponse>;

    /// `POST /roles`
    async fn post_custom_role(&self, role: &RoleDefinition) -> ApiResult<ApiResponse>;

    /// `PATCH /roles/{customRoleKey}`
    async fn patch_custom_role(
        &self,
        custom_role_key: &str,
        patch: &[PatchOperation],
    ) -> ApiResult<ApiResponse>;
}

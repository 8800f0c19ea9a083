//! LaunchDarkly HTTP client.
//!
//! reqwest-backed implementation of [`LaunchDarklyApi`] against the v2 REST
//! API. Authenticates with the raw access token in the `Authorization`
//! header.

use async_trait::async_trait;
use ldutils_patch::PatchOperation;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::client::{ApiResponse, LaunchDarklyApi};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::RoleDefinition;

/// LaunchDarkly REST client.
#[derive(Clone)]
pub struct HttpApiClient {
    /// HTTP client instance.
    client: Client,

    /// Endpoint and credentials.
    config: ApiConfig,
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl HttpApiClient {
    /// Create a new client.
    ///
    /// Fails when the configuration has no token or the HTTP client cannot
    /// be built.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        config.validate()?;

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self { client, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Start a request to the endpoint made of `segments`, each percent-encoded.
    fn request(&self, method: Method, segments: &[&str]) -> ApiResult<RequestBuilder> {
        let url = self.config.endpoint(segments)?;
        let mut request = self.client.request(method, url);

        if let Some(ref api_token) = self.config.api_token {
            request = request.header("Authorization", api_token);
        }

        Ok(request)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<ApiResponse> {
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Map the status and parse the JSON body.
    async fn handle_response(&self, response: reqwest::Response) -> ApiResult<ApiResponse> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&text);
            warn!("LaunchDarkly API error ({}): {}", status.as_u16(), message);
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))?
        };

        Ok(ApiResponse::new(status.as_u16(), body))
    }
}

/// Extract the `message` member of an error body, falling back to the raw text.
fn error_message(text: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(text).ok();
    let message = parsed.as_ref().and_then(|body| {
        body.get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
    });
    match message {
        Some(message) => message.to_string(),
        None if text.trim().is_empty() => "Unknown error".to_string(),
        None => text.to_string(),
    }
}

#[async_trait]
impl LaunchDarklyApi for HttpApiClient {
    #[instrument(skip(self))]
    async fn get_feature_flags(&self, project_key: &str) -> ApiResult<ApiResponse> {
        debug!("Listing feature flags for project {}", project_key);
        let request = self.request(Method::GET, &["flags", project_key])?;
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn get_feature_flag(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        environment_key: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        debug!("Fetching feature flag {}/{}", project_key, feature_flag_key);
        let mut request =
            self.request(Method::GET, &["flags", project_key, feature_flag_key])?;
        if let Some(env) = environment_key {
            request = request.query(&[("env", env)]);
        }
        self.send(request).await
    }

    #[instrument(skip(self, patch), fields(operations = patch.len()))]
    async fn patch_feature_flag(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        patch: &[PatchOperation],
    ) -> ApiResult<ApiResponse> {
        debug!("Patching feature flag {}/{}", project_key, feature_flag_key);
        let request = self
            .request(Method::PATCH, &["flags", project_key, feature_flag_key])?
            .json(patch);
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn get_custom_roles(&self) -> ApiResult<ApiResponse> {
        debug!("Listing custom roles");
        let request = self.request(Method::GET, &["roles"])?;
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn get_custom_role(&self, custom_role_key: &str) -> ApiResult<ApiResponse> {
        debug!("Fetching custom role {}", custom_role_key);
        let request = self.request(Method::GET, &["roles", custom_role_key])?;
        self.send(request).await
    }

    #[instrument(skip(self, role), fields(custom_role_key = %role.key))]
    async fn post_custom_role(&self, role: &RoleDefinition) -> ApiResult<ApiResponse> {
        debug!("Creating custom role {}", role.key);
        let request = self.request(Method::POST, &["roles"])?.json(role);
        self.send(request).await
    }

    #[instrument(skip(self, patch), fields(operations = patch.len()))]
    async fn patch_custom_role(
        &self,
        custom_role_key: &str,
        patch: &[PatchOperation],
    ) -> ApiResult<ApiResponse> {
        debug!("Patching custom role {}", custom_role_key);
        let request = self
            .request(Method::PATCH, &["roles", custom_role_key])?
            .json(patch);
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_token() {
        let result = HttpApiClient::new(ApiConfig::default());
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_client_creation() {
        let client = HttpApiClient::new(ApiConfig::with_token("MOCK")).unwrap();
        assert_eq!(client.config().api_token.as_deref(), Some("MOCK"));
        assert!(!format!("{:?}", client).contains("MOCK"));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"message":"Unknown role"}"#), "Unknown role");
        assert_eq!(error_message(r#"{"error":"Not Found"}"#), "Not Found");
        assert_eq!(error_message("bad gateway"), "bad gateway");
        assert_eq!(error_message(""), "Unknown error");
    }
}

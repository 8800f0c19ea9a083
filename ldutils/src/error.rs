//! Error types for reconciliation operations
//!
//! Every failure coming back from the API is wrapped in an
//! [`OperationError`] tagged with the API operation name and a link to its
//! documentation. Its serialized form is `{api, message, docs}`.

use ldutils_api::{ApiError, ApiResponse, ErrorKind, FlagReference};
use ldutils_patch::PatchError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Documentation links per API operation.
pub mod docs {
    /// List or get custom roles.
    pub const LIST_CUSTOM_ROLES: &str = "https://apidocs.launchdarkly.com/docs/list-custom-roles";
    /// Create a custom role.
    pub const CREATE_CUSTOM_ROLE: &str = "https://apidocs.launchdarkly.com/docs/create-custom-role";
    /// Update a custom role.
    pub const UPDATE_CUSTOM_ROLE: &str = "https://apidocs.launchdarkly.com/docs/update-custom-role";
    /// List feature flags.
    pub const LIST_FEATURE_FLAGS: &str = "https://apidocs.launchdarkly.com/docs/list-feature-flags";
    /// Get a feature flag.
    pub const GET_FEATURE_FLAG: &str = "https://apidocs.launchdarkly.com/docs/get-feature-flag";
    /// Update a feature flag.
    pub const UPDATE_FEATURE_FLAG: &str = "https://apidocs.launchdarkly.com/docs/update-feature-flag";
}

/// A failed API operation.
///
/// # Example
///
/// ```
/// use ldutils::error::{docs, OperationError};
/// use ldutils_api::ApiError;
///
/// let err = OperationError::from_api(
///     "getCustomRole",
///     docs::LIST_CUSTOM_ROLES,
///     ApiError::NotFound("Unknown role".to_string()),
/// );
/// assert_eq!(err.api, "getCustomRole");
/// assert_eq!(
///     serde_json::to_value(&err).unwrap(),
///     serde_json::json!({
///         "api": "getCustomRole",
///         "message": "Not found: Unknown role",
///         "docs": "https://apidocs.launchdarkly.com/docs/list-custom-roles"
///     })
/// );
/// ```
#[derive(Debug, Error, Serialize)]
#[error("{api} failed: {message} (see {docs})")]
pub struct OperationError {
    /// API operation name (e.g. `getCustomRole`).
    pub api: String,

    /// Human-readable failure message.
    pub message: String,

    /// Documentation link for the operation.
    pub docs: String,

    /// Failure classification.
    #[serde(skip)]
    pub kind: ErrorKind,

    /// Underlying API error, when there is one.
    #[serde(skip)]
    #[source]
    pub source: Option<ApiError>,
}

impl OperationError {
    /// Wrap an API error.
    pub fn from_api(api: &str, docs: &str, source: ApiError) -> Self {
        Self {
            api: api.to_string(),
            message: source.to_string(),
            docs: docs.to_string(),
            kind: source.kind(),
            source: Some(source),
        }
    }

    /// Create an error with no underlying API error.
    pub fn new(api: &str, docs: &str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            api: api.to_string(),
            message: message.into(),
            docs: docs.to_string(),
            kind,
            source: None,
        }
    }
}

/// Reconciliation error types.
#[derive(Debug, Error)]
pub enum Error {
    /// An API operation failed
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// The API client could not be created
    #[error("Client setup failed: {0}")]
    Client(ApiError),

    /// A file could not be read or a folder listed
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File or folder path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file did not hold the expected JSON
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A patch could not be applied to a local copy of a document
    #[error("Patch preview failed: {0}")]
    Patch(#[from] PatchError),

    /// A desired state could not be encoded as JSON
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A flag does not carry state for the requested environment
    #[error("Flag {flag} has no state for environment '{environment}'")]
    MissingEnvironment {
        /// Flag.
        flag: FlagReference,
        /// Environment key.
        environment: String,
    },

    /// A flag is absent from a backup
    #[error("Flag '{flag_key}' is not present in backup {}", .path.display())]
    MissingFromBackup {
        /// Flag key.
        flag_key: String,
        /// Backup path.
        path: PathBuf,
    },
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Operation(e) => e.kind,
            Error::Client(e) => e.kind(),
            Error::MissingEnvironment { .. } | Error::MissingFromBackup { .. } => {
                ErrorKind::NotFound
            }
            Error::Patch(_) => ErrorKind::Validation,
            Error::Io { .. } | Error::Parse { .. } | Error::Serialization(_) => ErrorKind::Other,
        }
    }

    /// Get the wrapped API operation failure, if this is one.
    pub fn as_operation(&self) -> Option<&OperationError> {
        match self {
            Error::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Parse a response body, tagging a failure with the operation.
pub(crate) fn parse_body<T: DeserializeOwned>(
    response: &ApiResponse,
    api: &str,
    docs: &str,
) -> Result<T> {
    response
        .parse()
        .map_err(|e| OperationError::from_api(api, docs, e).into())
}

//! # Patch Operations
//!
//! A single structural edit of a JSON document, addressed by a JSON pointer.
//! Serialized in the RFC 6902 shape the LaunchDarkly API accepts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON patch operation.
///
/// Operations are applied in sequence; a patch is an ordered `Vec` of these,
/// never a set.
///
/// # Example
///
/// ```
/// use ldutils_patch::PatchOperation;
/// use serde_json::json;
///
/// let op = PatchOperation::replace("/environments/test/on", json!(true));
/// assert_eq!(
///     serde_json::to_value(&op).unwrap(),
///     json!({"op": "replace", "path": "/environments/test/on", "value": true})
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    /// Insert a member or array element.
    Add {
        /// Target pointer.
        path: String,
        /// Value to insert.
        value: Value,
    },

    /// Overwrite an existing value.
    Replace {
        /// Target pointer.
        path: String,
        /// Replacement value.
        value: Value,
    },

    /// Delete a member or array element.
    Remove {
        /// Target pointer.
        path: String,
    },
}

impl PatchOperation {
    /// Create an `add` operation.
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self::Add {
            path: path.into(),
            value,
        }
    }

    /// Create a `replace` operation.
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self::Replace {
            path: path.into(),
            value,
        }
    }

    /// Create a `remove` operation.
    pub fn remove(path: impl Into<String>) -> Self {
        Self::Remove { path: path.into() }
    }

    /// Get the operation name as it appears on the wire.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Replace { .. } => "replace",
            Self::Remove { .. } => "remove",
        }
    }

    /// Get the target pointer.
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Replace { path, .. } | Self::Remove { path } => path,
        }
    }

    /// Get the value carried by the operation, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Add { value, .. } | Self::Replace { value, .. } => Some(value),
            Self::Remove { .. } => None,
        }
    }
}

/// Escape a single pointer token (`~` becomes `~0`, `/` becomes `~1`).
pub fn escape_token(token: &str) -> String {
    if !token.contains(['~', '/']) {
        return token.to_string();
    }
    token.replace('~', "~0").replace('/', "~1")
}

/// Reverse [`escape_token`].
pub fn unescape_token(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remove_has_no_value_on_wire() {
        let op = PatchOperation::remove("/_links");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "remove", "path": "/_links"})
        );
    }

    #[test]
    fn test_deserialize_from_wire() {
        let op: PatchOperation =
            serde_json::from_value(json!({"op": "add", "path": "/tags/0", "value": "beta"}))
                .unwrap();
        assert_eq!(op, PatchOperation::add("/tags/0", json!("beta")));
        assert_eq!(op.op(), "add");
        assert_eq!(op.path(), "/tags/0");
        assert_eq!(op.value(), Some(&json!("beta")));
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let result: Result<PatchOperation, _> =
            serde_json::from_value(json!({"op": "move", "from": "/a", "path": "/b"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_escape_token() {
        assert_eq!(escape_token("plain"), "plain");
        assert_eq!(escape_token("proj/*"), "proj~1*");
        assert_eq!(escape_token("a~b/c"), "a~0b~1c");
    }

    #[test]
    fn test_unescape_token() {
        assert_eq!(unescape_token("proj~1*"), "proj/*");
        assert_eq!(unescape_token("a~0b~1c"), "a~b/c");
        // "~01" is an escaped "~" followed by "1", not a slash
        assert_eq!(unescape_token("~01"), "~1");
    }
}

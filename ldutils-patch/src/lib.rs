//! # LDUtils Patch
//!
//! Structural JSON patch support for reconciling LaunchDarkly resources.
//!
//! ## Overview
//!
//! The ldutils-patch crate handles:
//! - **Operations**: `add` / `replace` / `remove` patch operations with RFC 6901 paths
//! - **Delta**: Computing the ordered operations that turn one document into another
//! - **Apply**: Replaying operations onto a document (previews and verification)
//!
//! ## Architecture
//!
//! ```text
//! compute_delta(current, desired) -> [PatchOperation]
//! apply_patch(current, [PatchOperation]) -> desired
//!
//! Examples:
//!   {"op": "replace", "path": "/environments/production/on", "value": true}
//!   {"op": "remove",  "path": "/_links"}
//! ```
//!
//! The delta is positional: arrays are compared index by index, with no move
//! detection. Object members are visited in the insertion order of the current
//! document, so the workspace enables `serde_json/preserve_order`.
//!
//! ## Usage
//!
//! ```rust
//! use ldutils_patch::{apply_patch, compute_delta, PatchOperation};
//! use serde_json::json;
//!
//! let current = json!({"_id": "abc", "name": "old"});
//! let desired = json!({"name": "new"});
//!
//! let delta = compute_delta(&current, &desired);
//! assert_eq!(
//!     delta,
//!     vec![
//!         PatchOperation::replace("/name", json!("new")),
//!         PatchOperation::remove("/_id"),
//!     ]
//! );
//!
//! let mut doc = current.clone();
//! apply_patch(&mut doc, &delta).unwrap();
//! assert_eq!(doc, desired);
//! ```

pub mod apply;
pub mod diff;
pub mod operation;

// Re-export main types for convenience
pub use apply::{apply_patch, PatchError};
pub use diff::compute_delta;
pub use operation::{escape_token, unescape_token, PatchOperation};

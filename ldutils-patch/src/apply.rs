//! # Apply
//!
//! Replays patch operations onto a document in order. Supports the
//! `add` / `replace` / `remove` subset of RFC 6902 that [`compute_delta`]
//! emits.
//!
//! [`compute_delta`]: crate::diff::compute_delta

use serde_json::Value;
use thiserror::Error;

use crate::operation::{unescape_token, PatchOperation};

/// Patch application errors.
#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    /// Pointer is not empty and does not start with `/`.
    #[error("Invalid pointer: {0}")]
    InvalidPointer(String),

    /// A segment of the pointer does not resolve.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Array index is not a number or is out of bounds.
    #[error("Invalid array index '{index}' in {path}")]
    InvalidIndex {
        /// Full pointer of the operation.
        path: String,
        /// Offending token.
        index: String,
    },

    /// Parent of the target is a scalar.
    #[error("Cannot address into a scalar at {0}")]
    NotAContainer(String),
}

/// Apply `ops` to `doc` in sequence.
///
/// On error the document may hold the result of the operations before the
/// failing one.
pub fn apply_patch(doc: &mut Value, ops: &[PatchOperation]) -> Result<(), PatchError> {
    for op in ops {
        apply_operation(doc, op)?;
    }
    Ok(())
}

fn apply_operation(doc: &mut Value, op: &PatchOperation) -> Result<(), PatchError> {
    let path = op.path();
    let tokens = parse_pointer(path)?;

    let Some((last, parents)) = tokens.split_last() else {
        // Empty pointer addresses the whole document
        return match op {
            PatchOperation::Add { value, .. } | PatchOperation::Replace { value, .. } => {
                *doc = value.clone();
                Ok(())
            }
            PatchOperation::Remove { .. } => {
                *doc = Value::Null;
                Ok(())
            }
        };
    };

    let parent = resolve_mut(doc, parents, path)?;

    match (op, parent) {
        (PatchOperation::Add { value, .. }, Value::Object(map)) => {
            map.insert(last.clone(), value.clone());
        }
        (PatchOperation::Add { value, .. }, Value::Array(items)) => {
            let index = if last == "-" {
                items.len()
            } else {
                parse_index(last, items.len() + 1, path)?
            };
            items.insert(index, value.clone());
        }
        (PatchOperation::Replace { value, .. }, Value::Object(map)) => {
            let slot = map
                .get_mut(last)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            *slot = value.clone();
        }
        (PatchOperation::Replace { value, .. }, Value::Array(items)) => {
            let index = parse_index(last, items.len(), path)?;
            items[index] = value.clone();
        }
        (PatchOperation::Remove { .. }, Value::Object(map)) => {
            map.shift_remove(last)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
        }
        (PatchOperation::Remove { .. }, Value::Array(items)) => {
            let index = parse_index(last, items.len(), path)?;
            items.remove(index);
        }
        _ => return Err(PatchError::NotAContainer(path.to_string())),
    }

    Ok(())
}

fn parse_pointer(path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
    Ok(rest.split('/').map(unescape_token).collect())
}

fn resolve_mut<'a>(
    doc: &'a mut Value,
    tokens: &[String],
    path: &str,
) -> Result<&'a mut Value, PatchError> {
    let mut current = doc;
    for token in tokens {
        current = match current {
            Value::Object(map) => map
                .get_mut(token)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?,
            Value::Array(items) => {
                let index = parse_index(token, items.len(), path)?;
                &mut items[index]
            }
            _ => return Err(PatchError::NotAContainer(path.to_string())),
        };
    }
    Ok(current)
}

/// Parse an array index token, requiring `index < bound`.
fn parse_index(token: &str, bound: usize, path: &str) -> Result<usize, PatchError> {
    let invalid = || PatchError::InvalidIndex {
        path: path.to_string(),
        index: token.to_string(),
    };
    // Leading zeros are not valid indices
    if token.len() > 1 && token.starts_with('0') {
        return Err(invalid());
    }
    let index: usize = token.parse().map_err(|_| invalid())?;
    if index >= bound {
        return Err(invalid());
    }
    Ok(index)
}

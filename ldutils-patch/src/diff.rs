//! # Delta
//!
//! Computes the ordered patch that transforms a current document into a
//! desired one.
//!
//! Rules:
//! - Members of `current` are visited in reverse insertion order. A member
//!   missing from `desired` yields `remove`; a differing scalar, or a change of
//!   container kind, yields `replace`; two objects or two arrays recurse.
//! - Members of `desired` missing from `current` then yield `add`, in
//!   `desired` order.
//! - Arrays are compared by index. Surplus indices are removed highest first,
//!   so the sequence stays valid when replayed in order.

use serde_json::{Map, Value};

use crate::operation::{escape_token, PatchOperation};

/// Compute the patch from `current` to `desired`.
///
/// Returns an empty vector when the documents are structurally equal.
///
/// # Example
///
/// ```
/// use ldutils_patch::{compute_delta, PatchOperation};
/// use serde_json::json;
///
/// let current = json!({"policy": [{"effect": "deny"}]});
/// let desired = json!({"policy": [{"effect": "allow"}]});
///
/// assert_eq!(
///     compute_delta(&current, &desired),
///     vec![PatchOperation::replace("/policy/0/effect", json!("allow"))]
/// );
/// assert!(compute_delta(&current, &current).is_empty());
/// ```
pub fn compute_delta(current: &Value, desired: &Value) -> Vec<PatchOperation> {
    let mut ops = Vec::new();
    diff_member(current, desired, String::new(), &mut ops);
    ops
}

fn diff_objects(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    path: &str,
    ops: &mut Vec<PatchOperation>,
) {
    for (key, old_value) in old.iter().rev() {
        let member = format!("{}/{}", path, escape_token(key));
        match new.get(key) {
            Some(new_value) => diff_member(old_value, new_value, member, ops),
            None => ops.push(PatchOperation::remove(member)),
        }
    }

    for (key, new_value) in new {
        if !old.contains_key(key) {
            ops.push(PatchOperation::add(
                format!("{}/{}", path, escape_token(key)),
                new_value.clone(),
            ));
        }
    }
}

fn diff_arrays(old: &[Value], new: &[Value], path: &str, ops: &mut Vec<PatchOperation>) {
    for (index, old_value) in old.iter().enumerate().rev() {
        let member = format!("{}/{}", path, index);
        match new.get(index) {
            Some(new_value) => diff_member(old_value, new_value, member, ops),
            None => ops.push(PatchOperation::remove(member)),
        }
    }

    for (index, new_value) in new.iter().enumerate().skip(old.len()) {
        ops.push(PatchOperation::add(
            format!("{}/{}", path, index),
            new_value.clone(),
        ));
    }
}

fn diff_member(old: &Value, new: &Value, path: String, ops: &mut Vec<PatchOperation>) {
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => diff_objects(old, new, &path, ops),
        (Value::Array(old), Value::Array(new)) => diff_arrays(old, new, &path, ops),
        _ if old != new => ops.push(PatchOperation::replace(path, new.clone())),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_equal_documents_produce_no_ops() {
        let doc = json!({"key": "a", "policy": [{"actions": ["*"]}]});
        assert!(compute_delta(&doc, &doc).is_empty());
        assert!(compute_delta(&json!(null), &json!(null)).is_empty());
    }

    #[test]
    fn test_removes_members_missing_from_desired() {
        let current = json!({"_links": {"self": "/roles/a"}, "key": "a", "_id": "1"});
        let desired = json!({"key": "a"});
        assert_eq!(
            compute_delta(&current, &desired),
            vec![
                PatchOperation::remove("/_id"),
                PatchOperation::remove("/_links"),
            ]
        );
    }

    #[test]
    fn test_adds_follow_desired_order() {
        let current = json!({"key": "a"});
        let desired = json!({"name": "A", "key": "a", "description": "d"});
        assert_eq!(
            compute_delta(&current, &desired),
            vec![
                PatchOperation::add("/name", json!("A")),
                PatchOperation::add("/description", json!("d")),
            ]
        );
    }

    #[test]
    fn test_array_elements_replaced_positionally() {
        let current = json!({"resources": ["a", "b", "c"]});
        let desired = json!({"resources": ["c", "b", "a"]});
        assert_eq!(
            compute_delta(&current, &desired),
            vec![
                PatchOperation::replace("/resources/2", json!("a")),
                PatchOperation::replace("/resources/0", json!("c")),
            ]
        );
    }

    #[test]
    fn test_shrinking_array_removes_from_the_end() {
        let current = json!(["a", "b", "c"]);
        let desired = json!(["x"]);
        assert_eq!(
            compute_delta(&current, &desired),
            vec![
                PatchOperation::remove("/2"),
                PatchOperation::remove("/1"),
                PatchOperation::replace("/0", json!("x")),
            ]
        );
    }

    #[test]
    fn test_growing_array_appends() {
        let current = json!({"actions": ["read"]});
        let desired = json!({"actions": ["read", "write", "delete"]});
        assert_eq!(
            compute_delta(&current, &desired),
            vec![
                PatchOperation::add("/actions/1", json!("write")),
                PatchOperation::add("/actions/2", json!("delete")),
            ]
        );
    }

    #[test]
    fn test_container_kind_change_replaces_member() {
        let current = json!({"value": {"nested": true}});
        let desired = json!({"value": [true]});
        assert_eq!(
            compute_delta(&current, &desired),
            vec![PatchOperation::replace("/value", json!([true]))]
        );

        let current = json!({"value": null});
        let desired = json!({"value": {"on": false}});
        assert_eq!(
            compute_delta(&current, &desired),
            vec![PatchOperation::replace("/value", json!({"on": false}))]
        );
    }

    #[test]
    fn test_root_kind_change_replaces_document() {
        assert_eq!(
            compute_delta(&json!({"a": 1}), &json!([1])),
            vec![PatchOperation::replace("", json!([1]))]
        );
        assert_eq!(
            compute_delta(&json!("old"), &json!("new")),
            vec![PatchOperation::replace("", json!("new"))]
        );
    }

    #[test]
    fn test_member_names_are_escaped() {
        let current = json!({"proj/*": {"a~b": 1}});
        let desired = json!({"proj/*": {"a~b": 2}});
        assert_eq!(
            compute_delta(&current, &desired),
            vec![PatchOperation::replace("/proj~1*/a~0b", json!(2))]
        );
    }

    #[test]
    fn test_role_update_delta() {
        let current = json!({
            "_links": {"self": {"href": "/api/v2/roles/example-role"}},
            "name": "Example role",
            "key": "example-role",
            "description": "Example custom role",
            "_id": "5a593f890z875421af55d96e",
            "policy": [{
                "resources": ["proj/*:env/test"],
                "actions": ["*"],
                "effect": "deny"
            }]
        });
        let desired = json!({
            "name": "sample role",
            "key": "sample-role",
            "description": "Allow access to production",
            "policy": [{
                "resources": ["proj/*:env/production"],
                "actions": ["*"],
                "effect": "allow"
            }]
        });

        assert_eq!(
            compute_delta(&current, &desired),
            vec![
                PatchOperation::replace("/policy/0/effect", json!("allow")),
                PatchOperation::replace("/policy/0/resources/0", json!("proj/*:env/production")),
                PatchOperation::remove("/_id"),
                PatchOperation::replace("/description", json!("Allow access to production")),
                PatchOperation::replace("/key", json!("sample-role")),
                PatchOperation::replace("/name", json!("sample role")),
                PatchOperation::remove("/_links"),
            ]
        );
    }
}

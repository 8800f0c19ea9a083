//! Shared test support: an in-memory LaunchDarkly API that records calls.
//!
//! Roles and flags live in maps; patches are applied with
//! `ldutils_patch::apply_patch`, so a successful update leaves the stored
//! document equal to the desired one. Failures can be injected per call.

#![allow(dead_code)]

use async_trait::async_trait;
use ldutils::{FileSource, Result};
use ldutils_api::{ApiError, ApiResponse, ApiResult, LaunchDarklyApi, PatchOperation, RoleDefinition};
use ldutils_patch::apply_patch;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetFlags {
        project: String,
    },
    GetFlag {
        project: String,
        flag: String,
        env: Option<String>,
    },
    PatchFlag {
        project: String,
        flag: String,
        patch: Vec<PatchOperation>,
    },
    GetRoles,
    GetRole {
        key: String,
    },
    PostRole {
        role: RoleDefinition,
    },
    PatchRole {
        key: String,
        patch: Vec<PatchOperation>,
    },
}

type Matcher = Box<dyn Fn(&Call) -> bool + Send + Sync>;

/// In-memory API.
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    roles: Mutex<BTreeMap<String, Value>>,
    flags: Mutex<BTreeMap<(String, String), Value>>,
    failures: Mutex<Vec<(Matcher, u16)>>,
    next_id: Mutex<u32>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a role document as the server would return it.
    pub fn with_role(self, role: Value) -> Self {
        let key = role["key"].as_str().expect("role key").to_string();
        self.roles.lock().unwrap().insert(key, role);
        self
    }

    /// Store a flag document.
    pub fn with_flag(self, project: &str, flag: Value) -> Self {
        let key = flag["key"].as_str().expect("flag key").to_string();
        self.flags
            .lock()
            .unwrap()
            .insert((project.to_string(), key), flag);
        self
    }

    /// Fail every call matching `matcher` with `status`.
    pub fn fail_when(self, matcher: impl Fn(&Call) -> bool + Send + Sync + 'static, status: u16) -> Self {
        self.failures
            .lock()
            .unwrap()
            .push((Box::new(matcher), status));
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Stored role document.
    pub fn role(&self, key: &str) -> Option<Value> {
        self.roles.lock().unwrap().get(key).cloned()
    }

    /// Stored flag document.
    pub fn flag(&self, project: &str, key: &str) -> Option<Value> {
        self.flags
            .lock()
            .unwrap()
            .get(&(project.to_string(), key.to_string()))
            .cloned()
    }

    fn record(&self, call: Call) -> ApiResult<()> {
        let failure = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(matcher, _)| matcher(&call))
            .map(|(_, status)| *status);
        self.calls.lock().unwrap().push(call);
        match failure {
            Some(status) => Err(ApiError::from_status(status, "injected failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LaunchDarklyApi for FakeApi {
    async fn get_feature_flags(&self, project_key: &str) -> ApiResult<ApiResponse> {
        self.record(Call::GetFlags {
            project: project_key.to_string(),
        })?;
        let items: Vec<Value> = self
            .flags
            .lock()
            .unwrap()
            .iter()
            .filter(|((project, _), _)| project == project_key)
            .map(|(_, flag)| flag.clone())
            .collect();
        Ok(ApiResponse::ok(json!({ "items": items })))
    }

    async fn get_feature_flag(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        environment_key: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        self.record(Call::GetFlag {
            project: project_key.to_string(),
            flag: feature_flag_key.to_string(),
            env: environment_key.map(str::to_string),
        })?;
        self.flag(project_key, feature_flag_key)
            .map(ApiResponse::ok)
            .ok_or_else(|| ApiError::from_status(404, "Unknown flag"))
    }

    async fn patch_feature_flag(
        &self,
        project_key: &str,
        feature_flag_key: &str,
        patch: &[PatchOperation],
    ) -> ApiResult<ApiResponse> {
        self.record(Call::PatchFlag {
            project: project_key.to_string(),
            flag: feature_flag_key.to_string(),
            patch: patch.to_vec(),
        })?;
        let mut flags = self.flags.lock().unwrap();
        let flag = flags
            .get_mut(&(project_key.to_string(), feature_flag_key.to_string()))
            .ok_or_else(|| ApiError::from_status(404, "Unknown flag"))?;
        apply_patch(flag, patch).map_err(|e| ApiError::from_status(400, e.to_string()))?;
        Ok(ApiResponse::ok(flag.clone()))
    }

    async fn get_custom_roles(&self) -> ApiResult<ApiResponse> {
        self.record(Call::GetRoles)?;
        let items: Vec<Value> = self.roles.lock().unwrap().values().cloned().collect();
        Ok(ApiResponse::ok(json!({ "items": items })))
    }

    async fn get_custom_role(&self, custom_role_key: &str) -> ApiResult<ApiResponse> {
        self.record(Call::GetRole {
            key: custom_role_key.to_string(),
        })?;
        self.role(custom_role_key)
            .map(ApiResponse::ok)
            .ok_or_else(|| ApiError::from_status(404, "Unknown role"))
    }

    async fn post_custom_role(&self, role: &RoleDefinition) -> ApiResult<ApiResponse> {
        self.record(Call::PostRole { role: role.clone() })?;
        let mut roles = self.roles.lock().unwrap();
        if roles.contains_key(&role.key) {
            return Err(ApiError::from_status(409, "Key already exists"));
        }

        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            format!("role-{}", *next_id)
        };
        let mut stored = json!({
            "_links": {"self": {"href": format!("/api/v2/roles/{}", role.key)}},
            "_id": id,
        });
        if let (Some(stored), Value::Object(fields)) =
            (stored.as_object_mut(), serde_json::to_value(role).unwrap())
        {
            stored.extend(fields);
        }
        roles.insert(role.key.clone(), stored.clone());
        Ok(ApiResponse::new(201, stored))
    }

    async fn patch_custom_role(
        &self,
        custom_role_key: &str,
        patch: &[PatchOperation],
    ) -> ApiResult<ApiResponse> {
        self.record(Call::PatchRole {
            key: custom_role_key.to_string(),
            patch: patch.to_vec(),
        })?;
        let mut roles = self.roles.lock().unwrap();
        let role = roles
            .get_mut(custom_role_key)
            .ok_or_else(|| ApiError::from_status(404, "Unknown role"))?;
        apply_patch(role, patch).map_err(|e| ApiError::from_status(400, e.to_string()))?;
        Ok(ApiResponse::ok(role.clone()))
    }
}

/// Files held in memory.
#[derive(Default)]
pub struct MemoryFiles {
    files: HashMap<PathBuf, String>,
}

impl MemoryFiles {
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl FileSource for MemoryFiles {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ldutils::Error::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
    }

    fn list_json_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }
}

/// The server copy of `example-role`, members in the order the API returns them.
pub fn example_role() -> Value {
    json!({
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
    })
}

/// A boolean flag with `test` on and `production` off.
pub fn sort_order_flag(key: &str, test_on: bool, production_on: bool) -> Value {
    json!({
        "key": key,
        "name": "Sort order",
        "kind": "boolean",
        "environments": {
            "test": {"on": test_on, "version": 1},
            "production": {"on": production_on, "version": 1}
        }
    })
}

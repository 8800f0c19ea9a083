//! LaunchDarkly payload types.
//!
//! Typed views of the custom role and feature flag documents. Server
//! representations keep every member they do not model in an `extra` map so
//! that nothing is lost when a response is passed back to the caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Effect of a policy statement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Grant the listed actions.
    Allow,
    /// Deny the listed actions.
    Deny,
}

impl Effect {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

/// A resource/action/effect rule inside a custom role.
///
/// # Example
///
/// ```
/// use ldutils_api::types::{Effect, PolicyStatement};
///
/// let statement = PolicyStatement::allow(["proj/*:env/production"], ["*"]);
/// assert_eq!(statement.effect, Effect::Allow);
/// assert_eq!(
///     serde_json::to_string(&statement).unwrap(),
///     r#"{"resources":["proj/*:env/production"],"actions":["*"],"effect":"allow"}"#
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyStatement {
    /// Resource specifiers the statement matches, in order.
    pub resources: Vec<String>,
    /// Actions the statement covers, in order.
    pub actions: Vec<String>,
    /// Whether matching actions are allowed or denied.
    pub effect: Effect,
}

impl PolicyStatement {
    /// Create a statement.
    pub fn new<R, A>(resources: R, actions: A, effect: Effect) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            actions: actions.into_iter().map(Into::into).collect(),
            effect,
        }
    }

    /// Create an `allow` statement.
    pub fn allow<R, A>(resources: R, actions: A) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self::new(resources, actions, Effect::Allow)
    }

    /// Create a `deny` statement.
    pub fn deny<R, A>(resources: R, actions: A) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self::new(resources, actions, Effect::Deny)
    }
}

/// Desired state of a custom role.
///
/// Field order is the serialization order, which the delta against the
/// server document depends on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Display name.
    pub name: String,

    /// Unique, immutable role key.
    pub key: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Policy statements, in order.
    ///
    /// `None` omits the member, so updating an existing role removes its
    /// policy with a single operation. `Some(vec![])` keeps an empty policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Vec<PolicyStatement>>,
}

impl RoleDefinition {
    /// Create a role definition without a policy.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            description: None,
            policy: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a policy statement.
    pub fn with_statement(mut self, statement: PolicyStatement) -> Self {
        self.policy.get_or_insert_with(Vec::new).push(statement);
        self
    }

    /// Replace the policy.
    pub fn with_policy(mut self, policy: Vec<PolicyStatement>) -> Self {
        self.policy = Some(policy);
        self
    }
}

/// A custom role as the server returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomRole {
    /// Server-assigned identifier.
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Hypermedia links.
    #[serde(rename = "_links", default, skip_serializing_if = "Map::is_empty")]
    pub links: Map<String, Value>,

    /// Role key.
    pub key: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Policy statements.
    #[serde(default)]
    pub policy: Vec<PolicyStatement>,

    /// Members not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomRole {
    /// Get the caller-controlled part of the role.
    pub fn definition(&self) -> RoleDefinition {
        RoleDefinition {
            name: self.name.clone(),
            key: self.key.clone(),
            description: self.description.clone(),
            policy: Some(self.policy.clone()),
        }
    }
}

/// Response of the role listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomRoleList {
    /// Roles.
    #[serde(default)]
    pub items: Vec<CustomRole>,

    /// Members not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identifies a flag within a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct FlagReference {
    /// Project key.
    pub project_key: String,
    /// Feature flag key.
    pub feature_flag_key: String,
}

impl FlagReference {
    /// Create a flag reference.
    pub fn new(project_key: impl Into<String>, feature_flag_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            feature_flag_key: feature_flag_key.into(),
        }
    }
}

impl std::fmt::Display for FlagReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project_key, self.feature_flag_key)
    }
}

/// Per-environment state of a flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlagEnvironment {
    /// Whether targeting is on.
    pub on: bool,

    /// Members not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A feature flag as the server returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureFlag {
    /// Flag key.
    pub key: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// State per environment key.
    #[serde(default)]
    pub environments: BTreeMap<String, FlagEnvironment>,

    /// Members not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureFlag {
    /// Get the `on` state for an environment, if the flag carries it.
    pub fn is_on(&self, environment_key: &str) -> Option<bool> {
        self.environments.get(environment_key).map(|env| env.on)
    }
}

/// Response of the flag listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureFlagList {
    /// Flags.
    #[serde(default)]
    pub items: Vec<FeatureFlag>,

    /// Members not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureFlagList {
    /// Find a flag by key.
    pub fn find(&self, flag_key: &str) -> Option<&FeatureFlag> {
        self.items.iter().find(|flag| flag.key == flag_key)
    }
}

//! IAM policy model: statements, policies, identities, and ARN addressing.
//!
//! Statements keep actions, resources, and condition entries in insertion
//! order so that rendering a policy twice yields byte-identical JSON.

pub mod addons;
pub mod scoped;

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

pub use addons::PolicyKind;

/// IAM policy language version emitted in every document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Condition operator (the outer key of a `Condition` block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConditionOperator {
    StringEquals,
    StringLike,
    ArnLike,
    Bool,
    Null,
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringEquals => write!(f, "StringEquals"),
            Self::StringLike => write!(f, "StringLike"),
            Self::ArnLike => write!(f, "ArnLike"),
            Self::Bool => write!(f, "Bool"),
            Self::Null => write!(f, "Null"),
        }
    }
}

/// Expected value(s) for a condition context key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ConditionValue {
    One(String),
    Many(Vec<String>),
}

impl ConditionValue {
    /// All values as a slice-like list.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(v) => vec![v.as_str()],
            Self::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(v: &str) -> Self {
        Self::One(v.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(v: String) -> Self {
        Self::One(v)
    }
}

impl From<Vec<&str>> for ConditionValue {
    fn from(vs: Vec<&str>) -> Self {
        Self::Many(vs.into_iter().map(str::to_string).collect())
    }
}

/// Condition block: operator → (context key → expected value).
pub type Conditions = IndexMap<ConditionOperator, IndexMap<String, ConditionValue>>;

/// Principal of a resource/trust policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Principal {
    Service(String),
    Federated(String),
    #[serde(rename = "AWS")]
    Aws(String),
}

/// One access-control rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    pub effect: Effect,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,

    #[serde(rename = "Action")]
    pub actions: Vec<String>,

    #[serde(rename = "Resource", skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    #[serde(rename = "Condition", skip_serializing_if = "IndexMap::is_empty")]
    pub conditions: Conditions,
}

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl Statement {
    /// An Allow statement over the given actions and resource patterns.
    pub fn allow<A, R, S, T>(actions: A, resources: R) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            sid: None,
            effect: Effect::Allow,
            principal: None,
            actions: strings(actions),
            resources: strings(resources),
            conditions: IndexMap::new(),
        }
    }

    /// A Deny statement over the given actions and resource patterns.
    pub fn deny<A, R, S, T>(actions: A, resources: R) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            effect: Effect::Deny,
            ..Self::allow(actions, resources)
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Add `operator { key: value }` to the condition block.
    pub fn with_condition(
        mut self,
        operator: ConditionOperator,
        key: impl Into<String>,
        value: impl Into<ConditionValue>,
    ) -> Self {
        self.conditions
            .entry(operator)
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Action names with the service prefix stripped (`ec2:CreateVolume` → `CreateVolume`).
    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .map(|a| a.split_once(':').map_or(a.as_str(), |(_, verb)| verb))
    }

    /// True when every action is a Describe/List/Get call.
    pub fn is_read_only(&self) -> bool {
        !self.actions.is_empty()
            && self.verbs().all(|v| {
                v.starts_with("Describe") || v.starts_with("List") || v.starts_with("Get")
            })
    }

    /// Every condition context key, across operators.
    pub fn condition_keys(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .values()
            .flat_map(|entries| entries.keys().map(String::as_str))
    }

    /// Look up the expected value for `operator { key }`.
    pub fn condition(&self, operator: ConditionOperator, key: &str) -> Option<&ConditionValue> {
        self.conditions.get(&operator).and_then(|m| m.get(key))
    }
}

/// A principal that policies authorize, addressed by name.
///
/// In a synthesized stack the name is the tree path of the IAM role node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub managed_policy_arns: Vec<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            managed_policy_arns: Vec::new(),
        }
    }

    pub fn with_managed_policy(mut self, arn: impl Into<String>) -> Self {
        self.managed_policy_arns.push(arn.into());
        self
    }
}

/// A named, ordered set of statements bound to one or more identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub name: String,
    pub statements: Vec<Statement>,
    pub identities: Vec<String>,
}

impl Policy {
    /// Build a policy bound to `identity`. Exact duplicate statements are
    /// dropped, keeping the first occurrence.
    pub fn new(name: impl Into<String>, identity: &Identity, statements: Vec<Statement>) -> Self {
        let mut unique: Vec<Statement> = Vec::with_capacity(statements.len());
        for s in statements {
            if !unique.contains(&s) {
                unique.push(s);
            }
        }
        Self {
            name: name.into(),
            statements: unique,
            identities: vec![identity.name.clone()],
        }
    }

    /// The IAM JSON document for this policy.
    pub fn document(&self) -> PolicyDocument<'_> {
        PolicyDocument {
            version: POLICY_VERSION,
            statement: &self.statements,
        }
    }
}

/// Serializable view of a policy (`{"Version": ..., "Statement": [...]}`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument<'a> {
    pub version: &'static str,
    pub statement: &'a [Statement],
}

impl PolicyDocument<'_> {
    pub fn to_value(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Addressing information for ARNs: partition, region, account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContext {
    pub partition: String,
    pub region: String,
    pub account: String,
}

impl DeployContext {
    pub fn new(
        partition: impl Into<String>,
        region: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.into(),
            region: region.into(),
            account: account.into(),
        }
    }

    /// Context in the commercial `aws` partition.
    pub fn aws(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self::new("aws", region, account)
    }

    /// `arn:{partition}:{service}:{region}:{account}:{resource}`
    pub fn arn(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:{}:{}:{}:{}:{}",
            self.partition, service, self.region, self.account, resource
        )
    }

    /// Global-service ARN (no region), e.g. IAM.
    pub fn global_arn(&self, service: &str, resource: &str) -> String {
        format!("arn:{}:{}::{}:{}", self.partition, service, self.account, resource)
    }

    /// ARN of an AWS-managed IAM policy.
    pub fn managed_policy_arn(&self, name: &str) -> String {
        format!("arn:{}:iam::aws:policy/{}", self.partition, name)
    }
}

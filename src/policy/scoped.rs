//! Shared statement shapes for add-on policies.
//!
//! Every add-on policy is built from the same three shapes:
//! - broad read: list/describe calls on `*`, no conditions
//! - tag-scoped create: the *request* must carry the cluster tag
//! - tag-scoped mutate: the *existing resource* must carry the cluster tag

use super::{ConditionOperator, Statement};

/// Tag key prefix checked against the tags sent with a request.
pub const REQUEST_TAG: &str = "aws:RequestTag/";

/// Tag key prefix checked against the tags already on a resource.
pub const RESOURCE_TAG: &str = "aws:ResourceTag/";

/// The cluster ownership tag, `eks<separator>cluster-name`.
///
/// `:` is the default. Services that split tag strings on `:` (the EFS CSI
/// driver) need `/` instead.
pub fn cluster_tag(separator: char) -> String {
    format!("eks{}cluster-name", separator)
}

/// Read-only statement: resources `*`, no conditions.
pub fn read_only<A, S>(actions: A) -> Statement
where
    A: IntoIterator<Item = S>,
    S: Into<String>,
{
    Statement::allow(actions, ["*"])
}

/// Create statement scoped by `aws:RequestTag/<tag> == value`.
pub fn create_with_request_tag<A, S, R, T>(
    actions: A,
    tag: &str,
    value: &str,
    resources: R,
) -> Statement
where
    A: IntoIterator<Item = S>,
    S: Into<String>,
    R: IntoIterator<Item = T>,
    T: Into<String>,
{
    Statement::allow(actions, resources).with_condition(
        ConditionOperator::StringEquals,
        format!("{}{}", REQUEST_TAG, tag),
        value,
    )
}

/// Update/delete statement scoped by `aws:ResourceTag/<tag> == value`.
pub fn mutate_with_resource_tag<A, S, R, T>(
    actions: A,
    tag: &str,
    value: &str,
    resources: R,
) -> Statement
where
    A: IntoIterator<Item = S>,
    S: Into<String>,
    R: IntoIterator<Item = T>,
    T: Into<String>,
{
    Statement::allow(actions, resources).with_condition(
        ConditionOperator::StringEquals,
        format!("{}{}", RESOURCE_TAG, tag),
        value,
    )
}

/// Data-only description of an add-on's access needs.
///
/// `statements` emits the read / create / mutate triad, skipping any part
/// with no actions.
#[derive(Debug, Clone, Default)]
pub struct ScopedAccess {
    pub read: Vec<String>,
    pub create: Vec<String>,
    pub mutate: Vec<String>,
    pub tag: String,
    pub resources: Vec<String>,
}

impl ScopedAccess {
    /// Access scoped by `tag`, on resource patterns `*` unless overridden.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            resources: vec!["*".to_string()],
            ..Self::default()
        }
    }

    pub fn read<I: IntoIterator<Item = S>, S: Into<String>>(mut self, actions: I) -> Self {
        self.read.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn create<I: IntoIterator<Item = S>, S: Into<String>>(mut self, actions: I) -> Self {
        self.create.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn mutate<I: IntoIterator<Item = S>, S: Into<String>>(mut self, actions: I) -> Self {
        self.mutate.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn on<I: IntoIterator<Item = S>, S: Into<String>>(mut self, resources: I) -> Self {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Emit the triad for `cluster_name`.
    pub fn statements(&self, cluster_name: &str) -> Vec<Statement> {
        let mut out = Vec::with_capacity(3);
        if !self.read.is_empty() {
            out.push(read_only(self.read.iter().cloned()));
        }
        if !self.create.is_empty() {
            out.push(create_with_request_tag(
                self.create.iter().cloned(),
                &self.tag,
                cluster_name,
                self.resources.iter().cloned(),
            ));
        }
        if !self.mutate.is_empty() {
            out.push(mutate_with_resource_tag(
                self.mutate.iter().cloned(),
                &self.tag,
                cluster_name,
                self.resources.iter().cloned(),
            ));
        }
        out
    }
}

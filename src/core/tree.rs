//! Resource tree: composite nodes over CloudFormation primitives.
//!
//! A node is either a `Leaf` wrapping exactly one primitive resource or a
//! `Composite` grouping child nodes. The distinction is fixed when the node
//! is built. A node's path is the `/`-joined ids from the root.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Property key marking a `Ref` to another node, resolved at synthesis.
pub const REF_TOKEN: &str = "eksforge::Ref";

/// Property key marking a `Fn::GetAtt` on another node, resolved at synthesis.
pub const GET_ATT_TOKEN: &str = "eksforge::GetAtt";

/// Property key marking a value rendered as a JSON string at synthesis.
pub const JSON_TOKEN: &str = "eksforge::Json";

/// One CloudFormation resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// CloudFormation type, e.g. `AWS::IAM::Role`
    pub resource_type: String,

    /// Resource properties (may contain node tokens)
    pub properties: Value,

    /// Name of the condition gating this resource, if any
    pub condition: Option<String>,
}

impl Primitive {
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            condition: None,
        }
    }
}

/// Leaf or composite.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf(Primitive),
    Composite(Vec<Node>),
}

/// A node of the resource tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Local id, unique among siblings
    pub id: String,

    /// Absolute paths of nodes that must be created first
    pub depends_on: Vec<String>,

    pub kind: NodeKind,
}

impl Node {
    pub fn leaf(id: impl Into<String>, primitive: Primitive) -> Self {
        Self {
            id: id.into(),
            depends_on: Vec::new(),
            kind: NodeKind::Leaf(primitive),
        }
    }

    pub fn composite(id: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            id: id.into(),
            depends_on: Vec::new(),
            kind: NodeKind::Composite(children),
        }
    }

    /// Add a dependency on the node at `path`.
    pub fn depends_on(mut self, path: impl Into<String>) -> Self {
        self.depends_on.push(path.into());
        self
    }

    /// Append a child. No-op on a leaf returns the leaf unchanged.
    pub fn with_child(mut self, child: Node) -> Self {
        if let NodeKind::Composite(ref mut children) = self.kind {
            children.push(child);
        }
        self
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn primitive(&self) -> Option<&Primitive> {
        match &self.kind {
            NodeKind::Leaf(p) => Some(p),
            NodeKind::Composite(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Composite(children) => children,
        }
    }

    /// Every leaf below (or at) this node, with its absolute path.
    ///
    /// `prefix` is the path of this node's parent ("" for the root).
    pub fn leaves<'a>(&'a self, prefix: &str) -> Vec<LeafRef<'a>> {
        let mut out = Vec::new();
        self.collect_leaves(prefix, &[], &mut out);
        out
    }

    fn collect_leaves<'a>(
        &'a self,
        prefix: &str,
        inherited: &[&'a str],
        out: &mut Vec<LeafRef<'a>>,
    ) {
        let path = join_path(prefix, &self.id);
        let mut deps: Vec<&'a str> = inherited.to_vec();
        deps.extend(self.depends_on.iter().map(String::as_str));
        match &self.kind {
            NodeKind::Leaf(primitive) => out.push(LeafRef {
                path,
                primitive,
                depends_on: deps,
            }),
            NodeKind::Composite(children) => {
                for child in children {
                    child.collect_leaves(&path, &deps, out);
                }
            }
        }
    }

    /// Count of leaves below (or at) this node.
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(_) => 1,
            NodeKind::Composite(children) => children.iter().map(Node::leaf_count).sum(),
        }
    }
}

/// A leaf found by `Node::leaves`.
#[derive(Debug, Clone)]
pub struct LeafRef<'a> {
    pub path: String,
    pub primitive: &'a Primitive,
    /// Own and inherited dependency paths
    pub depends_on: Vec<&'a str>,
}

/// `prefix/id`, or `id` when the prefix is empty.
pub fn join_path(prefix: &str, id: &str) -> String {
    if prefix.is_empty() {
        id.to_string()
    } else {
        format!("{}/{}", prefix, id)
    }
}

/// True when `path` is `ancestor` or lies below it.
pub fn is_under(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}

/// Token resolving to `{"Ref": <logical id of path>}`.
pub fn reference(path: &str) -> Value {
    json!({ REF_TOKEN: path })
}

/// Token resolving to `{"Fn::GetAtt": [<logical id of path>, attribute]}`.
pub fn get_att(path: &str, attribute: &str) -> Value {
    json!({ GET_ATT_TOKEN: [path, attribute] })
}

/// Token rendering `value` as compact JSON text. Node tokens inside it are
/// spliced in with `Fn::Join`.
pub fn json_string(value: Value) -> Value {
    json!({ JSON_TOKEN: value })
}

/// Reference to a template parameter.
pub fn param_ref(name: &str) -> Value {
    json!({ "Ref": name })
}

// ============================================================================
// Parameters and conditions
// ============================================================================

/// A template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "Type")]
    pub param_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub allowed_values: Vec<String>,
}

impl Parameter {
    /// An unrestricted parameter of CloudFormation type `param_type`.
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            default: Some(default.into()),
            description: Some(description.into()),
            allowed_values: Vec::new(),
        }
    }

    /// A `"true"`/`"false"` feature flag.
    pub fn flag(name: impl Into<String>, default: bool, description: impl Into<String>) -> Self {
        Self {
            allowed_values: vec!["true".to_string(), "false".to_string()],
            ..Self::new(name, "String", default.to_string(), description)
        }
    }

    /// Check `value` against the allowed values (any value when unrestricted).
    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values.is_empty() || self.allowed_values.iter().any(|v| v == value)
    }
}

/// A deploy-time boolean gate: `parameter == equals`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub name: String,
    pub parameter: String,
    pub equals: String,
}

impl Condition {
    pub fn equals(
        name: impl Into<String>,
        parameter: impl Into<String>,
        equals: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter: parameter.into(),
            equals: equals.into(),
        }
    }

    /// Condition that holds when the flag parameter is `"true"`.
    pub fn flag_enabled(name: impl Into<String>, parameter: &Parameter) -> Self {
        Self::equals(name, parameter.name.clone(), "true")
    }

    /// CloudFormation expression, `{"Fn::Equals": [{"Ref": p}, v]}`.
    pub fn expression(&self) -> Value {
        json!({ "Fn::Equals": [param_ref(&self.parameter), self.equals] })
    }

    /// Evaluate against a resolved parameter value.
    pub fn holds(&self, value: &str) -> bool {
        value == self.equals
    }
}

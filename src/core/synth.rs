//! Synthesis: resource tree to CloudFormation template.
//!
//! Leaves are emitted in tree order. Each leaf's logical id derives from its
//! path. Node tokens in properties become `Ref`/`Fn::GetAtt` on logical ids,
//! and `depends_on` paths (own and inherited) expand to every leaf below the
//! named node. JSON tokens become JSON text, joined around any intrinsics
//! they contain.

use super::logical_id::{hash_string, logical_id};
use super::tree::{
    is_under, Condition, Node, Parameter, GET_ATT_TOKEN, JSON_TOKEN, REF_TOKEN,
};
use crate::error::{Error, Result};
use crate::stack::Stack;
use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Metadata key recording the tree path of each resource.
pub const PATH_METADATA: &str = "eksforge:path";

/// A synthesized CloudFormation template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Parameters", skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,

    #[serde(
        rename = "Conditions",
        skip_serializing_if = "IndexMap::is_empty",
        serialize_with = "serialize_conditions"
    )]
    pub conditions: IndexMap<String, Condition>,

    #[serde(rename = "Resources")]
    pub resources: IndexMap<String, TemplateResource>,
}

/// One entry of the template's `Resources` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    pub properties: Value,

    pub metadata: Value,
}

impl TemplateResource {
    /// Tree path recorded in metadata.
    pub fn path(&self) -> Option<&str> {
        self.metadata.get(PATH_METADATA).and_then(Value::as_str)
    }
}

fn serialize_conditions<S: Serializer>(
    conditions: &IndexMap<String, Condition>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let expressions: IndexMap<&str, Value> = conditions
        .iter()
        .map(|(name, c)| (name.as_str(), c.expression()))
        .collect();
    expressions.serialize(serializer)
}

impl Template {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// BLAKE3 of the compact JSON rendering. Returns `"blake3:{hex}"`.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(hash_string(&serde_json::to_string(self)?))
    }

    /// Resources gated by `condition`.
    pub fn resources_with_condition<'a>(
        &'a self,
        condition: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a TemplateResource)> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.condition.as_deref() == Some(condition))
    }
}

/// Synthesize `stack` into a template.
pub fn synthesize(stack: &Stack) -> Result<Template> {
    let leaves: Vec<_> = stack.nodes.iter().flat_map(|n| n.leaves("")).collect();

    // Assign ids up front so references may point forward.
    let mut ids: HashMap<&str, String> = HashMap::with_capacity(leaves.len());
    let mut taken: IndexSet<String> = IndexSet::with_capacity(leaves.len());
    for leaf in &leaves {
        let id = logical_id(&leaf.path);
        if !taken.insert(id.clone()) {
            return Err(Error::DuplicateLogicalId {
                logical_id: id,
                path: leaf.path.clone(),
            });
        }
        ids.insert(leaf.path.as_str(), id);
    }

    let mut node_paths: IndexSet<String> = IndexSet::new();
    for node in &stack.nodes {
        collect_paths(node, "", &mut node_paths);
    }

    let mut resources = IndexMap::with_capacity(leaves.len());
    for leaf in &leaves {
        let id = &ids[leaf.path.as_str()];

        if let Some(ref condition) = leaf.primitive.condition {
            if !stack.conditions.contains_key(condition) {
                return Err(Error::UnknownCondition {
                    path: leaf.path.clone(),
                    condition: condition.clone(),
                });
            }
        }

        let mut depends_on: Vec<String> = Vec::new();
        for dep in &leaf.depends_on {
            if !node_paths.contains(*dep) {
                return Err(Error::UnknownDependency {
                    path: leaf.path.clone(),
                    dependency: dep.to_string(),
                });
            }
            for other in &leaves {
                if other.path != leaf.path && is_under(&other.path, dep) {
                    let other_id = &ids[other.path.as_str()];
                    if !depends_on.contains(other_id) {
                        depends_on.push(other_id.clone());
                    }
                }
            }
        }

        let properties = resolve_tokens(&leaf.primitive.properties, &leaf.path, &ids)?;
        log::debug!("synth {} -> {}", leaf.path, id);

        resources.insert(
            id.clone(),
            TemplateResource {
                resource_type: leaf.primitive.resource_type.clone(),
                condition: leaf.primitive.condition.clone(),
                depends_on,
                properties,
                metadata: json!({ PATH_METADATA: leaf.path }),
            },
        );
    }

    Ok(Template {
        format_version: TEMPLATE_FORMAT_VERSION.to_string(),
        description: stack.description.clone(),
        parameters: stack.parameters.clone(),
        conditions: stack.conditions.clone(),
        resources,
    })
}

fn collect_paths(node: &Node, prefix: &str, out: &mut IndexSet<String>) {
    let path = super::tree::join_path(prefix, &node.id);
    for child in node.children() {
        collect_paths(child, &path, out);
    }
    out.insert(path);
}

/// Replace node tokens in `value` with intrinsic functions on logical ids.
fn resolve_tokens(value: &Value, owner: &str, ids: &HashMap<&str, String>) -> Result<Value> {
    let lookup = |target: &str| {
        ids.get(target).cloned().ok_or_else(|| Error::UnknownReference {
            path: owner.to_string(),
            target: target.to_string(),
        })
    };

    match value {
        Value::Object(map) if map.len() == 1 => {
            if let Some(Value::String(target)) = map.get(REF_TOKEN) {
                return Ok(json!({ "Ref": lookup(target)? }));
            }
            if let Some(Value::Array(parts)) = map.get(GET_ATT_TOKEN) {
                if let [Value::String(target), Value::String(attribute)] = parts.as_slice() {
                    return Ok(json!({ "Fn::GetAtt": [lookup(target)?, attribute] }));
                }
            }
            if let Some(inner) = map.get(JSON_TOKEN) {
                return render_json_text(inner, owner, ids);
            }
            resolve_object(map, owner, ids)
        }
        Value::Object(map) => resolve_object(map, owner, ids),
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_tokens(item, owner, ids))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn resolve_object(
    map: &Map<String, Value>,
    owner: &str,
    ids: &HashMap<&str, String>,
) -> Result<Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, v) in map {
        out.insert(key.clone(), resolve_tokens(v, owner, ids)?);
    }
    Ok(Value::Object(out))
}

/// Keys of the single-key objects spliced into JSON text as string values.
const INTRINSIC_KEYS: [&str; 4] = [REF_TOKEN, GET_ATT_TOKEN, "Ref", "Fn::GetAtt"];

/// Render `value` as compact JSON text.
///
/// Without intrinsics the result is a plain string. Otherwise it is
/// `{"Fn::Join": ["", parts]}` with each intrinsic quoted as a string value.
fn render_json_text(value: &Value, owner: &str, ids: &HashMap<&str, String>) -> Result<Value> {
    let mut text = JoinedText::default();
    write_json(value, owner, ids, &mut text)?;
    Ok(text.finish())
}

#[derive(Default)]
struct JoinedText {
    parts: Vec<Value>,
    pending: String,
}

impl JoinedText {
    fn push_str(&mut self, s: &str) {
        self.pending.push_str(s);
    }

    fn push_intrinsic(&mut self, intrinsic: Value) {
        if !self.pending.is_empty() {
            self.parts.push(Value::String(std::mem::take(&mut self.pending)));
        }
        self.parts.push(intrinsic);
    }

    fn finish(mut self) -> Value {
        if self.parts.is_empty() {
            return Value::String(self.pending);
        }
        if !self.pending.is_empty() {
            self.parts.push(Value::String(self.pending));
        }
        json!({ "Fn::Join": ["", self.parts] })
    }
}

fn write_json(
    value: &Value,
    owner: &str,
    ids: &HashMap<&str, String>,
    out: &mut JoinedText,
) -> Result<()> {
    match value {
        Value::Object(map)
            if map.len() == 1 && map.keys().all(|k| INTRINSIC_KEYS.contains(&k.as_str())) =>
        {
            out.push_str("\"");
            out.push_intrinsic(resolve_tokens(value, owner, ids)?);
            out.push_str("\"");
        }
        Value::Object(map) => {
            out.push_str("{");
            for (i, (key, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(",");
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push_str(":");
                write_json(v, owner, ids, out)?;
            }
            out.push_str("}");
        }
        Value::Array(items) => {
            out.push_str("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",");
                }
                write_json(item, owner, ids, out)?;
            }
            out.push_str("]");
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

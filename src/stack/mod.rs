//! Stack assembly: the EKS baseline add-ons and the cluster-side resources,
//! each as a resource tree.

pub mod baseline;
pub mod cluster;
pub mod constructs;
pub mod manifest;

use crate::core::tree::{Condition, Node, Parameter};
use indexmap::IndexMap;

/// A stack before synthesis: parameters, conditions, and top-level nodes.
///
/// Top-level node paths are their ids; the stack name is not part of any
/// path.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    pub name: String,
    pub description: String,
    pub parameters: IndexMap<String, Parameter>,
    pub conditions: IndexMap<String, Condition>,
    pub nodes: Vec<Node>,
}

impl Stack {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: IndexMap::new(),
            conditions: IndexMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Declare a parameter. Re-declaring a name replaces it.
    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.insert(parameter.name.clone(), parameter);
    }

    /// Declare a condition. Re-declaring a name replaces it.
    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.insert(condition.name.clone(), condition);
    }

    pub fn add(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().map(Node::leaf_count).sum()
    }
}

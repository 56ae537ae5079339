//! Conditional resource annotation.
//!
//! Gates a whole subtree on one condition by attaching it to every primitive
//! leaf. Composite nodes carry no condition of their own; CloudFormation only
//! knows about the primitives.

use super::tree::{join_path, Condition, Node, NodeKind};
use crate::error::{Error, Result};

/// What to do when a leaf already carries a different condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnConflict {
    /// Refuse and report the leaf.
    #[default]
    Fail,
    /// Replace the existing condition.
    Overwrite,
}

/// Attach `condition` to every leaf of `node`, returning the annotated tree.
///
/// `prefix` is the path of `node`'s parent and is only used for error
/// reporting. Re-applying the condition a leaf already has is a no-op.
pub fn annotate(
    node: Node,
    condition: &Condition,
    on_conflict: OnConflict,
    prefix: &str,
) -> Result<Node> {
    let path = join_path(prefix, &node.id);
    let Node {
        id,
        depends_on,
        kind,
    } = node;

    let kind = match kind {
        NodeKind::Leaf(mut primitive) => {
            match primitive.condition.as_deref() {
                Some(existing) if existing != condition.name && on_conflict == OnConflict::Fail => {
                    return Err(Error::ConditionConflict {
                        path,
                        existing: existing.to_string(),
                        requested: condition.name.clone(),
                    });
                }
                _ => {}
            }
            log::debug!("condition {} -> {}", condition.name, path);
            primitive.condition = Some(condition.name.clone());
            NodeKind::Leaf(primitive)
        }
        NodeKind::Composite(children) => NodeKind::Composite(
            children
                .into_iter()
                .map(|child| annotate(child, condition, on_conflict, &path))
                .collect::<Result<Vec<_>>>()?,
        ),
    };

    Ok(Node {
        id,
        depends_on,
        kind,
    })
}

/// Names of the conditions found on leaves below `node`, by leaf path.
pub fn conditions_by_path(node: &Node, prefix: &str) -> Vec<(String, Option<String>)> {
    node.leaves(prefix)
        .into_iter()
        .map(|leaf| (leaf.path, leaf.primitive.condition.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::Primitive;
    use proptest::prelude::*;
    use serde_json::json;

    fn leaf(id: &str) -> Node {
        Node::leaf(id, Primitive::new("AWS::SNS::Topic", json!({})))
    }

    fn cond(name: &str) -> Condition {
        Condition::equals(name, "flag", "true")
    }

    #[test]
    fn test_every_leaf_annotated() {
        // root -> A -> [L1, B -> [L2]]
        let root = Node::composite(
            "Root",
            vec![Node::composite(
                "A",
                vec![leaf("L1"), Node::composite("B", vec![leaf("L2")])],
            )],
        );
        let out = annotate(root, &cond("C"), OnConflict::Fail, "").unwrap();
        let found = conditions_by_path(&out, "");
        assert_eq!(
            found,
            vec![
                ("Root/A/L1".to_string(), Some("C".to_string())),
                ("Root/A/B/L2".to_string(), Some("C".to_string())),
            ]
        );
    }

    #[test]
    fn test_leaf_root() {
        let out = annotate(leaf("Only"), &cond("C"), OnConflict::Fail, "").unwrap();
        assert_eq!(out.primitive().unwrap().condition.as_deref(), Some("C"));
    }

    #[test]
    fn test_empty_composite_is_noop() {
        let empty = Node::composite("Empty", vec![]);
        let out = annotate(empty.clone(), &cond("C"), OnConflict::Fail, "").unwrap();
        assert_eq!(out, empty);
    }

    #[test]
    fn test_structure_and_dependencies_preserved() {
        let root = Node::composite("Root", vec![leaf("L1").depends_on("Root/X")])
            .depends_on("Other");
        let out = annotate(root, &cond("C"), OnConflict::Fail, "").unwrap();
        assert_eq!(out.depends_on, vec!["Other"]);
        assert_eq!(out.children()[0].depends_on, vec!["Root/X"]);
        assert_eq!(out.children()[0].id, "L1");
    }

    #[test]
    fn test_same_condition_twice_is_idempotent() {
        let once = annotate(leaf("L"), &cond("C"), OnConflict::Fail, "").unwrap();
        let twice = annotate(once.clone(), &cond("C"), OnConflict::Fail, "").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_conflicting_condition_fails() {
        let root = Node::composite("Root", vec![leaf("L")]);
        let once = annotate(root, &cond("A"), OnConflict::Fail, "Stack").unwrap();
        let err = annotate(once, &cond("B"), OnConflict::Fail, "Stack").unwrap_err();
        match err {
            Error::ConditionConflict {
                path,
                existing,
                requested,
            } => {
                assert_eq!(path, "Stack/Root/L");
                assert_eq!(existing, "A");
                assert_eq!(requested, "B");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_conflicting_condition_overwrite() {
        let once = annotate(leaf("L"), &cond("A"), OnConflict::Fail, "").unwrap();
        let out = annotate(once, &cond("B"), OnConflict::Overwrite, "").unwrap();
        assert_eq!(out.primitive().unwrap().condition.as_deref(), Some("B"));
    }

    fn arb_tree() -> impl Strategy<Value = Node> {
        let leaf_strategy = "[A-Z][a-z]{0,4}".prop_map(|id| leaf(&id));
        leaf_strategy.prop_recursive(4, 32, 5, |inner| {
            ("[A-Z][a-z]{0,4}", prop::collection::vec(inner, 0..5))
                .prop_map(|(id, children)| Node::composite(id, children))
        })
    }

    proptest! {
        #[test]
        fn prop_all_leaves_carry_condition(tree in arb_tree()) {
            let before = tree.leaf_count();
            let out = annotate(tree, &cond("Gate"), OnConflict::Fail, "").unwrap();
            prop_assert_eq!(out.leaf_count(), before);
            for leaf in out.leaves("") {
                prop_assert_eq!(leaf.primitive.condition.as_deref(), Some("Gate"));
            }
        }
    }
}

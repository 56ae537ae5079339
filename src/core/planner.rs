//! Plan generation: evaluate template conditions for a set of parameter values.

use super::resolver::creation_order;
use super::synth::Template;
use super::types::*;
use crate::error::{Error, Result};
use indexmap::IndexMap;

/// Plan `template` for parameter `overrides`; parameters not overridden take
/// their defaults.
pub fn plan(template: &Template, overrides: &IndexMap<String, String>) -> Result<DeploymentPlan> {
    let parameters = resolve_parameters(template, overrides)?;

    let mut conditions = IndexMap::with_capacity(template.conditions.len());
    for (name, condition) in &template.conditions {
        let value = parameters
            .get(&condition.parameter)
            .ok_or_else(|| Error::UnknownParameter(condition.parameter.clone()))?;
        conditions.insert(name.clone(), condition.holds(value));
    }

    let order = creation_order(template)?;
    let mut changes = Vec::with_capacity(order.len());
    let mut to_provision = 0u32;
    let mut to_skip = 0u32;

    for logical_id in order {
        let Some(resource) = template.resources.get(&logical_id) else {
            continue;
        };
        let enabled = resource
            .condition
            .as_ref()
            .map_or(true, |c| conditions.get(c).copied().unwrap_or(false));
        let action = if enabled {
            to_provision += 1;
            PlanAction::Provision
        } else {
            to_skip += 1;
            PlanAction::Skip
        };
        changes.push(PlannedResource {
            path: resource.path().unwrap_or(&logical_id).to_string(),
            logical_id,
            resource_type: resource.resource_type.clone(),
            condition: resource.condition.clone(),
            action,
        });
    }

    let hazards = skipped_dependencies(template, &changes);

    Ok(DeploymentPlan {
        parameters,
        conditions,
        changes,
        hazards,
        to_provision,
        to_skip,
    })
}

/// Defaults merged with overrides, checked against allowed values.
fn resolve_parameters(
    template: &Template,
    overrides: &IndexMap<String, String>,
) -> Result<IndexMap<String, String>> {
    for name in overrides.keys() {
        if !template.parameters.contains_key(name) {
            return Err(Error::UnknownParameter(name.clone()));
        }
    }

    let mut values = IndexMap::with_capacity(template.parameters.len());
    for (name, parameter) in &template.parameters {
        let value = match overrides.get(name).or(parameter.default.as_ref()) {
            Some(v) => v.clone(),
            None => {
                return Err(Error::InvalidArgument(format!(
                    "parameter '{}' has no default; pass --param {}=<value>",
                    name, name
                )))
            }
        };
        if !parameter.allows(&value) {
            return Err(Error::InvalidParameterValue {
                name: name.clone(),
                value,
                allowed: parameter.allowed_values.clone(),
            });
        }
        values.insert(name.clone(), value);
    }
    Ok(values)
}

/// Provisioned resources depending on skipped ones, as `(dependent,
/// dependency)` logical ids. Each would fail at deploy time.
fn skipped_dependencies(template: &Template, changes: &[PlannedResource]) -> Vec<(String, String)> {
    let mut hazards = Vec::new();
    let skipped: Vec<&str> = changes
        .iter()
        .filter(|c| c.action == PlanAction::Skip)
        .map(|c| c.logical_id.as_str())
        .collect();
    for change in changes.iter().filter(|c| c.action == PlanAction::Provision) {
        let Some(resource) = template.resources.get(&change.logical_id) else {
            continue;
        };
        for dep in &resource.depends_on {
            if skipped.contains(&dep.as_str()) {
                log::warn!(
                    "{} is provisioned but depends on skipped {}",
                    change.path,
                    dep
                );
                hazards.push((change.logical_id.clone(), dep.clone()));
            }
        }
    }
    hazards
}

/// Parse `name=value` pairs from the command line.
pub fn parse_overrides<S: AsRef<str>>(pairs: &[S]) -> Result<IndexMap<String, String>> {
    let mut out = IndexMap::with_capacity(pairs.len());
    for pair in pairs {
        let pair = pair.as_ref();
        let (name, value) = pair
            .split_once('=')
            .filter(|(n, _)| !n.is_empty())
            .ok_or_else(|| Error::InvalidArgument(format!("expected name=value, got '{}'", pair)))?;
        out.insert(name.to_string(), value.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotate::{annotate, OnConflict};
    use crate::core::logical_id::logical_id;
    use crate::core::synth::synthesize;
    use crate::core::tree::{Condition, Node, Parameter, Primitive};
    use crate::stack::Stack;
    use serde_json::json;

    fn topic() -> Primitive {
        Primitive::new("AWS::SNS::Topic", json!({}))
    }

    /// `Always` plus two gated groups: `On` (default true) and `Off` (default false).
    fn template() -> Template {
        let mut stack = Stack::new("s", "d");
        let on = Parameter::flag("on", true, "on");
        let off = Parameter::flag("off", false, "off");
        let on_cond = Condition::flag_enabled("OnCondition", &on);
        let off_cond = Condition::flag_enabled("OffCondition", &off);
        stack.add_parameter(on);
        stack.add_parameter(off);
        stack.add(Node::leaf("Always", topic()));
        stack.add(
            annotate(
                Node::composite("On", vec![Node::leaf("A", topic()), Node::leaf("B", topic())]),
                &on_cond,
                OnConflict::Fail,
                "",
            )
            .unwrap(),
        );
        stack.add(
            annotate(
                Node::composite("Off", vec![Node::leaf("C", topic())]),
                &off_cond,
                OnConflict::Fail,
                "",
            )
            .unwrap(),
        );
        stack.add_condition(on_cond);
        stack.add_condition(off_cond);
        synthesize(&stack).unwrap()
    }

    /// `On/A` depends on the default-off `Off` group.
    fn cross_condition_template() -> Template {
        let mut stack = Stack::new("s", "d");
        let on = Parameter::flag("on", true, "on");
        let off = Parameter::flag("off", false, "off");
        let on_cond = Condition::flag_enabled("OnCondition", &on);
        let off_cond = Condition::flag_enabled("OffCondition", &off);
        stack.add_parameter(on);
        stack.add_parameter(off);
        let gated = |id: &str, child: Node, cond: &Condition| {
            annotate(Node::composite(id, vec![child]), cond, OnConflict::Fail, "").unwrap()
        };
        stack.add(gated("On", Node::leaf("A", topic()).depends_on("Off"), &on_cond));
        stack.add(gated("Off", Node::leaf("C", topic()), &off_cond));
        stack.add_condition(on_cond);
        stack.add_condition(off_cond);
        synthesize(&stack).unwrap()
    }

    fn action_of(plan: &DeploymentPlan, path: &str) -> PlanAction {
        plan.changes.iter().find(|c| c.path == path).unwrap().action
    }

    #[test]
    fn test_plan_defaults() {
        let plan = plan(&template(), &IndexMap::new()).unwrap();
        assert_eq!(plan.to_provision, 3);
        assert_eq!(plan.to_skip, 1);
        assert_eq!(action_of(&plan, "Always"), PlanAction::Provision);
        assert_eq!(action_of(&plan, "On/A"), PlanAction::Provision);
        assert_eq!(action_of(&plan, "Off/C"), PlanAction::Skip);
        assert!(plan.conditions["OnCondition"]);
        assert!(!plan.conditions["OffCondition"]);
    }

    #[test]
    fn test_plan_overrides_flip_groups() {
        let overrides = parse_overrides(&["on=false", "off=true"]).unwrap();
        let plan = plan(&template(), &overrides).unwrap();
        assert_eq!(action_of(&plan, "On/A"), PlanAction::Skip);
        assert_eq!(action_of(&plan, "On/B"), PlanAction::Skip);
        assert_eq!(action_of(&plan, "Off/C"), PlanAction::Provision);
        assert_eq!(plan.parameters["on"], "false");
    }

    #[test]
    fn test_plan_unknown_parameter() {
        let overrides = parse_overrides(&["ghost=true"]).unwrap();
        assert!(matches!(
            plan(&template(), &overrides),
            Err(Error::UnknownParameter(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_plan_disallowed_value() {
        let overrides = parse_overrides(&["on=yes"]).unwrap();
        assert!(matches!(
            plan(&template(), &overrides),
            Err(Error::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn test_no_hazards_within_one_group() {
        let plan = plan(&template(), &IndexMap::new()).unwrap();
        assert!(plan.hazards.is_empty());
    }

    #[test]
    fn test_cross_condition_dependency_is_a_hazard() {
        let template = cross_condition_template();
        let plan = plan(&template, &IndexMap::new()).unwrap();
        assert_eq!(action_of(&plan, "On/A"), PlanAction::Provision);
        assert_eq!(action_of(&plan, "Off/C"), PlanAction::Skip);
        assert_eq!(plan.hazards, vec![(logical_id("On/A"), logical_id("Off/C"))]);

        let overrides = parse_overrides(&["off=true"]).unwrap();
        assert!(plan_for(&template, &overrides).hazards.is_empty());
        let overrides = parse_overrides(&["on=false"]).unwrap();
        assert!(plan_for(&template, &overrides).hazards.is_empty());
    }

    #[test]
    fn test_parameter_without_default() {
        let mut stack = Stack::new("s", "d");
        stack.add_parameter(Parameter {
            default: None,
            ..Parameter::new("nodegroupMax", "Number", "0", "max")
        });
        stack.add(Node::leaf("Always", topic()));
        let template = synthesize(&stack).unwrap();

        let err = plan(&template, &IndexMap::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref msg) if msg.contains("nodegroupMax")));

        let overrides = parse_overrides(&["nodegroupMax=4"]).unwrap();
        assert_eq!(plan_for(&template, &overrides).parameters["nodegroupMax"], "4");
    }

    fn plan_for(template: &Template, overrides: &IndexMap<String, String>) -> DeploymentPlan {
        plan(template, overrides).unwrap()
    }

    #[test]
    fn test_plan_follows_creation_order() {
        let plan = plan(&template(), &IndexMap::new()).unwrap();
        let ids: Vec<&str> = plan.changes.iter().map(|c| c.logical_id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        // no DependsOn edges: pure alphabetical
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_parse_overrides_rejects_malformed() {
        assert!(parse_overrides(&["novalue"]).is_err());
        assert!(parse_overrides(&["=x"]).is_err());
        let ok = parse_overrides(&["a=b=c"]).unwrap();
        assert_eq!(ok["a"], "b=c");
    }
}

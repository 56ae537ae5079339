//! Creation order for a synthesized template.
//!
//! Builds a DAG from `DependsOn` edges and computes topological order using
//! Kahn's algorithm with deterministic (alphabetical) tie-breaking.

use super::synth::Template;
use crate::error::{Error, Result};
use std::collections::{HashMap, VecDeque};

/// Logical ids of `template`'s resources in an order that satisfies every
/// `DependsOn` edge.
pub fn creation_order(template: &Template) -> Result<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(template.resources.len());
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::with_capacity(template.resources.len());

    for id in template.resources.keys() {
        in_degree.insert(id, 0);
        adjacency.insert(id, Vec::new());
    }

    for (id, resource) in &template.resources {
        for dep in &resource.depends_on {
            let Some(dependents) = adjacency.get_mut(dep.as_str()) else {
                return Err(Error::UnknownDependency {
                    path: id.clone(),
                    dependency: dep.clone(),
                });
            };
            dependents.push(id);
            *in_degree.entry(id).or_default() += 1;
        }
    }

    // Kahn's algorithm with sorted tie-breaking
    let mut zero_degree: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| *id)
        .collect();
    zero_degree.sort_unstable();
    let mut queue: VecDeque<&str> = zero_degree.into();

    let mut order = Vec::with_capacity(template.resources.len());
    while let Some(current) = queue.pop_front() {
        order.push(current.to_string());

        let mut next_ready: Vec<&str> = Vec::new();
        for &dependent in adjacency.get(current).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    next_ready.push(dependent);
                }
            }
        }
        next_ready.sort_unstable();
        queue.extend(next_ready);
    }

    if order.len() != template.resources.len() {
        let mut cycle_members: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, d)| *d > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        cycle_members.sort();
        return Err(Error::DependencyCycle(cycle_members));
    }

    Ok(order)
}

//! Core logic: resource trees, annotation, synthesis, ordering, planning.

pub mod annotate;
pub mod logical_id;
pub mod parser;
pub mod planner;
pub mod resolver;
pub mod synth;
pub mod tree;
pub mod types;

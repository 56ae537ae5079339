//! eksforge: EKS baseline add-ons and cluster-side resources as code.
//!
//! Composite resource trees gated by deploy-time conditions, tag-scoped
//! least-privilege IAM policies, and deterministic CloudFormation synthesis.

pub mod cli;
pub mod core;
pub mod error;
pub mod policy;
pub mod stack;

pub use error::{Error, Result};

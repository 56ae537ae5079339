//! Config schema and plan types.
//!
//! `eksforge.yaml` describes an existing EKS cluster, which baseline add-ons
//! the baseline stack deploys by default, and what the cluster stack adds
//! next to the cluster. All config types derive `JsonSchema` so
//! `eksforge schema` can publish the format.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Top-level eksforge.yaml
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EksforgeConfig {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Human-readable name of this baseline
    pub name: String,

    /// Optional template description
    #[serde(default)]
    pub description: Option<String>,

    /// Prefix for the stack name (`<prefix>EKSK8sBaseline`)
    #[serde(default)]
    pub stack_prefix: String,

    /// Account, region, and partition to address ARNs in
    #[serde(default)]
    pub env: Environment,

    /// The cluster the add-ons are installed into
    pub cluster: ClusterConfig,

    /// Default for each add-on's deploy parameter
    #[serde(default)]
    pub addons: AddonToggles,

    /// Helm chart versions, keyed by chart version key
    #[serde(default)]
    pub helm_versions: IndexMap<String, String>,

    /// Kubernetes manifest files applied by some add-ons
    #[serde(default)]
    pub manifests: ManifestPaths,

    /// Managed EKS add-on versions, keyed by add-on version key
    #[serde(default)]
    pub addon_versions: IndexMap<String, String>,

    /// Managed worker nodegroup of the cluster stack
    #[serde(default)]
    pub nodegroup: Option<NodegroupConfig>,
}

/// Suffix appended to `stack_prefix` to name the baseline stack.
pub const STACK_SUFFIX: &str = "EKSK8sBaseline";

/// Suffix appended to `stack_prefix` to name the cluster stack.
pub const CLUSTER_STACK_SUFFIX: &str = "EKSCluster";

impl EksforgeConfig {
    pub fn stack_name(&self) -> String {
        format!("{}{}", self.stack_prefix, STACK_SUFFIX)
    }

    pub fn cluster_stack_name(&self) -> String {
        format!("{}{}", self.stack_prefix, CLUSTER_STACK_SUFFIX)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Deployment environment. Unset fields fall back to the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Environment {
    /// 12-digit AWS account id (falls back to CDK_DEFAULT_ACCOUNT)
    #[serde(default)]
    pub account: Option<String>,

    /// AWS region (falls back to CDK_DEFAULT_REGION)
    #[serde(default)]
    pub region: Option<String>,

    /// ARN partition
    #[serde(default = "default_partition")]
    pub partition: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            account: None,
            region: None,
            partition: default_partition(),
        }
    }
}

fn default_partition() -> String {
    "aws".to_string()
}

// ============================================================================
// Cluster
// ============================================================================

/// Existing cluster the baseline targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// EKS cluster name
    #[serde(default = "default_cluster_name")]
    pub name: String,

    /// VPC the cluster runs in
    pub vpc_id: String,

    /// OIDC issuer host and path, without `https://`
    pub oidc_issuer: String,

    /// ARN of the function backing Kubernetes custom resources
    pub kubectl_service_token: String,

    /// Role assumed by that function to reach the cluster
    pub kubectl_role_arn: String,

    /// ARN of the provider backing the control-plane logging resource
    #[serde(default)]
    pub logging_service_token: Option<String>,
}

fn default_cluster_name() -> String {
    "myekscluster".to_string()
}

// ============================================================================
// Add-ons
// ============================================================================

/// Per add-on override of the parameter default. Unset keeps the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddonToggles {
    #[serde(default)]
    pub cluster_autoscaler: Option<bool>,
    #[serde(default)]
    pub fluent_bit: Option<bool>,
    #[serde(default)]
    pub alb_driver: Option<bool>,
    #[serde(default)]
    pub ebs_driver: Option<bool>,
    #[serde(default)]
    pub efs_driver: Option<bool>,
    #[serde(default)]
    pub secrets_driver: Option<bool>,
    #[serde(default)]
    pub network_policy_engine: Option<bool>,
    #[serde(default)]
    pub container_insights: Option<bool>,
    #[serde(default)]
    pub metric_server: Option<bool>,
}

/// Keys accepted in `helm_versions`, one per Helm-installed add-on.
pub const HELM_VERSION_KEYS: [&str; 6] = [
    "cluster-autoscaler-helm-version",
    "aws-load-balancer-controller-helm-version",
    "aws-ebs-csi-driver-helm-version",
    "aws-efs-csi-driver-helm-version",
    "secrets-store-csi-helm-version",
    "aws-calico-helm-version",
];

/// Keys accepted in `addon_versions`, one per managed EKS add-on.
pub const EKS_ADDON_VERSION_KEYS: [&str; 3] = [
    "eks-addon-vpc-cni-version",
    "eks-addon-kube-proxy-version",
    "eks-addon-coredns-version",
];

/// Worker nodegroup placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NodegroupConfig {
    /// Subnets the worker nodes launch into
    pub subnet_ids: Vec<String>,
}

/// Manifest files. Relative paths resolve against the manifests directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ManifestPaths {
    /// Fluent Bit daemonset and parser configuration
    #[serde(default)]
    pub fluent_bit: Option<PathBuf>,

    /// AWS Secrets and Configuration Provider
    #[serde(default)]
    pub aws_secrets: Option<PathBuf>,

    /// ADOT collector for Container Insights
    #[serde(default)]
    pub container_insights: Option<PathBuf>,

    /// Kubernetes metrics server
    #[serde(default)]
    pub metric_server: Option<PathBuf>,
}

// ============================================================================
// Plan
// ============================================================================

/// What a deployment would do with one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Provision,
    Skip,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provision => write!(f, "PROVISION"),
            Self::Skip => write!(f, "SKIP"),
        }
    }
}

/// A single planned resource.
#[derive(Debug, Clone)]
pub struct PlannedResource {
    /// Logical id in the template
    pub logical_id: String,

    /// Tree path
    pub path: String,

    /// CloudFormation type
    pub resource_type: String,

    /// Gating condition, if any
    pub condition: Option<String>,

    pub action: PlanAction,
}

/// Full deployment plan for a template and parameter values.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    /// Resolved value of every parameter
    pub parameters: IndexMap<String, String>,

    /// Outcome of every condition
    pub conditions: IndexMap<String, bool>,

    /// Resources in creation order
    pub changes: Vec<PlannedResource>,

    /// Provisioned resources that depend on skipped ones, as
    /// `(dependent, dependency)` logical ids
    pub hazards: Vec<(String, String)>,

    /// Summary counts
    pub to_provision: u32,
    pub to_skip: u32,
}

//! The EKS baseline stack.
//!
//! One composite subtree per add-on, gated by a `"true"`/`"false"`
//! parameter so each add-on can be switched on or off at deploy time
//! without re-synthesizing.

use super::constructs::{
    helm_chart, kubernetes_manifest, namespace, policy_resource, service_account, ClusterRef,
    HelmChart,
};
use super::manifest::Manifests;
use super::Stack;
use crate::core::annotate::{annotate, OnConflict};
use crate::core::tree::{join_path, Condition, Node, Parameter};
use crate::core::types::{AddonToggles, EksforgeConfig};
use crate::error::Result;
use crate::policy::{DeployContext, PolicyKind};
use serde_json::{json, Value};
use std::fmt;

/// A baseline add-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addon {
    ClusterAutoscaler,
    FluentBit,
    AlbIngress,
    EbsCsi,
    EfsCsi,
    SecretsCsi,
    NetworkPolicyEngine,
    ContainerInsights,
    MetricServer,
}

impl Addon {
    pub const ALL: [Addon; 9] = [
        Self::ClusterAutoscaler,
        Self::FluentBit,
        Self::AlbIngress,
        Self::EbsCsi,
        Self::EfsCsi,
        Self::SecretsCsi,
        Self::NetworkPolicyEngine,
        Self::ContainerInsights,
        Self::MetricServer,
    ];

    /// Id of the add-on's subtree.
    pub fn node_id(self) -> &'static str {
        match self {
            Self::ClusterAutoscaler => "ClusterAutoscaler",
            Self::FluentBit => "FluentBit",
            Self::AlbIngress => "AlbIngressController",
            Self::EbsCsi => "EbsCsiDriver",
            Self::EfsCsi => "EfsCsiDriver",
            Self::SecretsCsi => "SecretsStoreCsiDriver",
            Self::NetworkPolicyEngine => "CalicoPolicyEngine",
            Self::ContainerInsights => "ContainerInsights",
            Self::MetricServer => "MetricServer",
        }
    }

    /// Deploy parameter name.
    pub fn parameter(self) -> &'static str {
        match self {
            Self::ClusterAutoscaler => "clusterAutoscaler",
            Self::FluentBit => "fluentBit",
            Self::AlbIngress => "albDriver",
            Self::EbsCsi => "ebsDriver",
            Self::EfsCsi => "efsDriver",
            Self::SecretsCsi => "secretsDriver",
            Self::NetworkPolicyEngine => "networkPolicyEngine",
            Self::ContainerInsights => "containerInsights",
            Self::MetricServer => "metricServer",
        }
    }

    /// Condition gating the subtree.
    pub fn condition(self) -> &'static str {
        match self {
            Self::ClusterAutoscaler => "clusterAutoscalerDriverCondition",
            Self::FluentBit => "fluentBitDriverCondition",
            Self::AlbIngress => "albDriverCondition",
            Self::EbsCsi => "ebsDriverCondition",
            Self::EfsCsi => "efsDriverCondition",
            Self::SecretsCsi => "secretsDriverCondition",
            Self::NetworkPolicyEngine => "networkPolicyEngineDriverCondition",
            Self::ContainerInsights => "containerInsightsDriverCondition",
            Self::MetricServer => "metricServerDriverCondition",
        }
    }

    /// Built-in parameter default.
    pub fn default_enabled(self) -> bool {
        matches!(
            self,
            Self::ClusterAutoscaler | Self::FluentBit | Self::AlbIngress | Self::MetricServer
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ClusterAutoscaler => "Deploy Cluster Autoscaler",
            Self::FluentBit => "Deploy FluentBit Log Collection Driver",
            Self::AlbIngress => "Deploy Application Load Balancer Ingress",
            Self::EbsCsi => "Deploy EBS CSI Driver",
            Self::EfsCsi => "Deploy EFS CSI Driver",
            Self::SecretsCsi => "Deploy AWS Secrets CSI Driver",
            Self::NetworkPolicyEngine => "Deploy Calico Network Policy Engine Driver",
            Self::ContainerInsights => "Deploy Container Insights",
            Self::MetricServer => "Deploy Metric Server",
        }
    }

    /// Config override of the default, if any.
    pub fn toggle(self, toggles: &AddonToggles) -> Option<bool> {
        match self {
            Self::ClusterAutoscaler => toggles.cluster_autoscaler,
            Self::FluentBit => toggles.fluent_bit,
            Self::AlbIngress => toggles.alb_driver,
            Self::EbsCsi => toggles.ebs_driver,
            Self::EfsCsi => toggles.efs_driver,
            Self::SecretsCsi => toggles.secrets_driver,
            Self::NetworkPolicyEngine => toggles.network_policy_engine,
            Self::ContainerInsights => toggles.container_insights,
            Self::MetricServer => toggles.metric_server,
        }
    }
}

impl fmt::Display for Addon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parameter())
    }
}

const EKS_CHARTS: &str = "https://aws.github.io/eks-charts";
const KUBE_SYSTEM: &str = "kube-system";
const CLOUDWATCH_AGENT_POLICY: &str = "CloudWatchAgentServerPolicy";

/// Everything an add-on builder reads.
struct BuildInput<'a> {
    config: &'a EksforgeConfig,
    cluster: &'a ClusterRef,
    manifests: &'a Manifests,
}

impl BuildInput<'_> {
    fn helm_version(&self, key: &str) -> Option<&String> {
        self.config.helm_versions.get(key)
    }

    fn ctx(&self) -> &DeployContext {
        &self.cluster.ctx
    }
}

/// Assemble the baseline stack.
pub fn build(
    config: &EksforgeConfig,
    ctx: DeployContext,
    manifests: &Manifests,
) -> Result<Stack> {
    let cluster = ClusterRef::from_config(config, ctx);
    let description = config
        .description
        .clone()
        .unwrap_or_else(|| format!("EKS baseline add-ons for cluster {}", cluster.name));
    let mut stack = Stack::new(config.stack_name(), description);
    let input = BuildInput {
        config,
        cluster: &cluster,
        manifests,
    };

    for addon in Addon::ALL {
        let enabled = addon.toggle(&config.addons).unwrap_or(addon.default_enabled());
        let parameter = Parameter::flag(addon.parameter(), enabled, addon.description());
        let condition = Condition::flag_enabled(addon.condition(), &parameter);

        let subtree = build_addon(addon, &input)?;
        log::debug!(
            "{}: {} resource(s), default {}",
            addon,
            subtree.leaf_count(),
            enabled
        );
        stack.add(annotate(subtree, &condition, OnConflict::Fail, "")?);
        stack.add_parameter(parameter);
        stack.add_condition(condition);
    }

    log::info!(
        "assembled {} with {} resource(s)",
        stack.name,
        stack.leaf_count()
    );
    Ok(stack)
}

fn build_addon(addon: Addon, input: &BuildInput<'_>) -> Result<Node> {
    let id = addon.node_id();
    match addon {
        Addon::ClusterAutoscaler => cluster_autoscaler(id, input),
        Addon::FluentBit => fluent_bit(id, input),
        Addon::AlbIngress => alb_ingress(id, input),
        Addon::EbsCsi => ebs_csi(id, input),
        Addon::EfsCsi => efs_csi(id, input),
        Addon::SecretsCsi => secrets_csi(id, input),
        Addon::NetworkPolicyEngine => Ok(calico(id, input)),
        Addon::ContainerInsights => container_insights(id, input),
        Addon::MetricServer => Ok(metric_server(id, input)),
    }
}

/// `{create: false, name}` block pointing a chart at a pre-created account.
fn existing_service_account(name: &str) -> Value {
    json!({ "create": false, "name": name })
}

/// Documents of a manifest file, or `None` when there is nothing to apply.
fn file_documents<'a>(id: &str, what: &str, docs: &'a Option<Vec<Value>>) -> Option<&'a [Value]> {
    match docs.as_deref() {
        None => {
            log::warn!("{}: no {} manifest configured", id, what);
            None
        }
        Some([]) => {
            log::warn!("{}: {} manifest has no documents left to apply", id, what);
            None
        }
        Some(docs) => Some(docs),
    }
}

fn cluster_autoscaler(id: &str, input: &BuildInput<'_>) -> Result<Node> {
    let cluster = input.cluster;
    let sa = service_account(
        id,
        "ServiceAccount",
        "cluster-autoscaler-sa",
        KUBE_SYSTEM,
        cluster,
        &[],
    )?;
    let policy = PolicyKind::ClusterAutoscaler.build(input.ctx(), &cluster.name, &sa.identity);
    let chart = HelmChart::new(
        "cluster-autoscaler",
        "cluster-autoscaler",
        "https://kubernetes.github.io/autoscaler",
        KUBE_SYSTEM,
    )
    .version(input.helm_version("cluster-autoscaler-helm-version"))
    .values(json!({
        "cloudProvider": "aws",
        "awsRegion": cluster.ctx.region,
        "autoDiscovery": { "clusterName": cluster.name },
        "rbac": { "serviceAccount": existing_service_account(&sa.name) },
        "extraArgs": {
            "skip-nodes-with-system-pods": false,
            "skip-nodes-with-local-storage": false,
            "balance-similar-node-groups": true,
            "scale-down-unneeded-time": "300s",
            "scale-down-delay-after-add": "300s",
        },
    }));

    Ok(Node::composite(
        id,
        vec![
            sa.node,
            policy_resource("Policy", &policy)?,
            helm_chart("Chart", cluster, &chart),
        ],
    ))
}

fn fluent_bit(id: &str, input: &BuildInput<'_>) -> Result<Node> {
    let cluster = input.cluster;
    let ns = "amazon-cloudwatch";
    let ns_path = join_path(id, "Namespace");
    let sa = service_account(id, "ServiceAccount", "fluent-bit", ns, cluster, &[])?;
    let policy = PolicyKind::FluentBit.build(input.ctx(), &cluster.name, &sa.identity);
    let sa_path = join_path(id, &sa.node.id);

    let cluster_info = kubernetes_manifest(
        "ClusterInfo",
        cluster,
        vec![json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "fluent-bit-cluster-info",
                "namespace": ns,
                "labels": { "name": "fluent-bit-cluster-info" },
            },
            "data": {
                "cluster.name": cluster.name,
                "http.port": "2020",
                "http.server": "On",
                "logs.region": cluster.ctx.region,
                "read.head": "Off",
                "read.tail": "On",
            },
        })],
    )
    .depends_on(ns_path.clone());
    let info_path = join_path(id, &cluster_info.id);

    let mut children = vec![
        namespace("Namespace", cluster, ns),
        sa.node.depends_on(ns_path),
        policy_resource("Policy", &policy)?,
        cluster_info,
    ];
    if let Some(docs) = file_documents(id, "fluent bit", &input.manifests.fluent_bit) {
        children.push(
            kubernetes_manifest("Setup", cluster, docs.to_vec())
                .depends_on(sa_path)
                .depends_on(info_path),
        );
    }
    Ok(Node::composite(id, children))
}

fn alb_ingress(id: &str, input: &BuildInput<'_>) -> Result<Node> {
    let cluster = input.cluster;
    let ns = "alb-ingress-controller";
    let sa = service_account(
        id,
        "ServiceAccount",
        "alb-ingress-controller-sa",
        ns,
        cluster,
        &[],
    )?;
    let policy = PolicyKind::AlbIngress.build(input.ctx(), &cluster.name, &sa.identity);
    let sa_path = join_path(id, &sa.node.id);
    let chart = HelmChart::new(
        "aws-load-balancer-controller",
        "aws-load-balancer-controller",
        EKS_CHARTS,
        ns,
    )
    .create_namespace()
    .version(input.helm_version("aws-load-balancer-controller-helm-version"))
    .values(json!({
        "clusterName": cluster.name,
        "defaultTags": { "eks:cluster-name": cluster.name },
        "region": cluster.ctx.region,
        "vpcId": cluster.vpc_id,
        "serviceAccount": existing_service_account(&sa.name),
    }));

    Ok(Node::composite(
        id,
        vec![
            namespace("Namespace", cluster, ns),
            sa.node.depends_on(join_path(id, "Namespace")),
            policy_resource("Policy", &policy)?,
            helm_chart("Chart", cluster, &chart).depends_on(sa_path),
        ],
    ))
}

fn ebs_csi(id: &str, input: &BuildInput<'_>) -> Result<Node> {
    let cluster = input.cluster;
    let sa = service_account(
        id,
        "ServiceAccount",
        "ebs-csi-controller-sa",
        KUBE_SYSTEM,
        cluster,
        &[],
    )?;
    let policy = PolicyKind::EbsCsi.build(input.ctx(), &cluster.name, &sa.identity);
    let sa_path = join_path(id, &sa.node.id);
    let chart = HelmChart::new(
        "aws-ebs-csi-driver",
        "aws-ebs-csi-driver",
        "https://kubernetes-sigs.github.io/aws-ebs-csi-driver",
        KUBE_SYSTEM,
    )
    .create_namespace()
    .version(input.helm_version("aws-ebs-csi-driver-helm-version"))
    .values(json!({
        "controller": {
            "serviceAccount": existing_service_account(&sa.name),
            "extraVolumeTags": { "eks:cluster-name": cluster.name },
        },
    }));

    Ok(Node::composite(
        id,
        vec![
            sa.node,
            policy_resource("Policy", &policy)?,
            helm_chart("Chart", cluster, &chart).depends_on(sa_path),
        ],
    ))
}

fn efs_csi(id: &str, input: &BuildInput<'_>) -> Result<Node> {
    let cluster = input.cluster;
    let sa = service_account(
        id,
        "ServiceAccount",
        "efs-csi-controller-sa",
        KUBE_SYSTEM,
        cluster,
        &[],
    )?;
    let policy = PolicyKind::EfsCsi.build(input.ctx(), &cluster.name, &sa.identity);
    let sa_path = join_path(id, &sa.node.id);
    // The driver splits tag strings on ':', so the cluster tag uses '/'.
    let chart = HelmChart::new(
        "aws-efs-csi-driver",
        "aws-efs-csi-driver",
        "https://kubernetes-sigs.github.io/aws-efs-csi-driver",
        KUBE_SYSTEM,
    )
    .create_namespace()
    .version(input.helm_version("aws-efs-csi-driver-helm-version"))
    .values(json!({
        "controller": {
            "logLevel": 10,
            "serviceAccount": existing_service_account(&sa.name),
            "tags": { "eks/cluster-name": cluster.name },
        },
    }));

    Ok(Node::composite(
        id,
        vec![
            sa.node,
            policy_resource("Policy", &policy)?,
            helm_chart("Chart", cluster, &chart).depends_on(sa_path),
        ],
    ))
}

fn secrets_csi(id: &str, input: &BuildInput<'_>) -> Result<Node> {
    let cluster = input.cluster;
    let sa = service_account(
        id,
        "ServiceAccount",
        "csi-secrets-store-provider-aws",
        KUBE_SYSTEM,
        cluster,
        &[],
    )?;
    let chart = HelmChart::new(
        "secrets-store-csi-driver",
        "csi-secrets-store",
        "https://raw.githubusercontent.com/kubernetes-sigs/secrets-store-csi-driver/master/charts",
        KUBE_SYSTEM,
    )
    .create_namespace()
    .version(input.helm_version("secrets-store-csi-helm-version"))
    .values(json!({ "grpcSupportedProviders": "aws" }));

    let mut children = vec![sa.node, helm_chart("Chart", cluster, &chart)];
    if let Some(docs) = file_documents(id, "secrets provider", &input.manifests.aws_secrets) {
        children.push(
            kubernetes_manifest("Provider", cluster, docs.to_vec())
                .depends_on(join_path(id, "Chart")),
        );
    }
    Ok(Node::composite(id, children))
}

fn calico(id: &str, input: &BuildInput<'_>) -> Node {
    let chart = HelmChart::new("aws-calico", "aws-calico", EKS_CHARTS, KUBE_SYSTEM)
        .create_namespace()
        .version(input.helm_version("aws-calico-helm-version"))
        .values(json!({
            "calico": {
                "node": {
                    "logseverity": "Debug",
                    "resources": { "limits": { "memory": "256Mi", "cpu": "500m" } },
                },
            },
        }));
    Node::composite(id, vec![helm_chart("Chart", input.cluster, &chart)])
}

fn container_insights(id: &str, input: &BuildInput<'_>) -> Result<Node> {
    let cluster = input.cluster;
    let ns = "aws-otel-eks";
    let managed = [input.ctx().managed_policy_arn(CLOUDWATCH_AGENT_POLICY)];
    let sa = service_account(id, "ServiceAccount", "aws-otel-sa", ns, cluster, &managed)?;
    let sa_path = join_path(id, &sa.node.id);

    let mut children = vec![
        namespace("Namespace", cluster, ns),
        sa.node.depends_on(join_path(id, "Namespace")),
    ];
    let collector = &input.manifests.container_insights;
    if let Some(docs) = file_documents(id, "collector", collector) {
        children.push(kubernetes_manifest("Deploy", cluster, docs.to_vec()).depends_on(sa_path));
    }
    Ok(Node::composite(id, children))
}

fn metric_server(id: &str, input: &BuildInput<'_>) -> Node {
    match file_documents(id, "metrics server", &input.manifests.metric_server) {
        Some(docs) => Node::composite(
            id,
            vec![kubernetes_manifest("Manifest", input.cluster, docs.to_vec())],
        ),
        None => Node::composite(id, Vec::new()),
    }
}

//! Per-add-on least-privilege policies.
//!
//! Each builder takes the deployment context, the cluster name, and the
//! identity the policy is bound to, and returns the same statements every
//! time for the same inputs.

use super::scoped::{
    cluster_tag, create_with_request_tag, mutate_with_resource_tag, read_only, ScopedAccess,
};
use super::{ConditionOperator, DeployContext, Identity, Policy, Statement};
use std::fmt;

/// Fluent Bit may only write to `/aws/containerinsights/<cluster>/` log groups.
pub fn fluent_bit_policy(ctx: &DeployContext, cluster_name: &str, identity: &Identity) -> Policy {
    let log_group = format!("log-group:/aws/containerinsights/{}/*", cluster_name);
    let statement = Statement::allow(
        [
            "logs:CreateLogStream",
            "logs:CreateLogGroup",
            "logs:DescribeLogStreams",
            "logs:PutLogEvents",
        ],
        [
            ctx.arn("logs", &log_group),
            ctx.arn("logs", &format!("{}:log-stream:*", log_group)),
        ],
    );
    Policy::new("fluentBitSaRolePolicy", identity, vec![statement])
}

/// Cluster Autoscaler: describe anything, scale only groups tagged for this cluster.
pub fn cluster_autoscaler_policy(
    _ctx: &DeployContext,
    cluster_name: &str,
    identity: &Identity,
) -> Policy {
    let describe = read_only([
        "autoscaling:DescribeAutoScalingGroups",
        "autoscaling:DescribeAutoScalingInstances",
        "autoscaling:DescribeLaunchConfigurations",
        "autoscaling:DescribeTags",
        "ec2:DescribeLaunchTemplateVersions",
    ]);
    // The autoscaler's discovery tags, not the eks:cluster-name tag.
    let write = Statement::allow(
        [
            "autoscaling:SetDesiredCapacity",
            "autoscaling:TerminateInstanceInAutoScalingGroup",
            "autoscaling:UpdateAutoScalingGroup",
        ],
        ["*"],
    )
    .with_condition(
        ConditionOperator::StringEquals,
        "autoscaling:ResourceTag/k8s.io/cluster-autoscaler/enabled",
        "true",
    )
    .with_condition(
        ConditionOperator::StringEquals,
        format!("autoscaling:ResourceTag/kubernetes.io/cluster/{}", cluster_name),
        "owned",
    );
    Policy::new("clusterAutoscalerPolicy", identity, vec![write, describe])
}

/// EFS CSI driver: describe file systems, manage access points tagged for this cluster.
///
/// The driver splits tag strings on `:`, so the cluster tag uses `/`.
pub fn efs_csi_policy(_ctx: &DeployContext, cluster_name: &str, identity: &Identity) -> Policy {
    let access = ScopedAccess::new(cluster_tag('/'))
        .read([
            "elasticfilesystem:DescribeFileSystems",
            "elasticfilesystem:DescribeMountTargets",
        ])
        .create(["elasticfilesystem:CreateAccessPoint"])
        .mutate(["elasticfilesystem:DeleteAccessPoint"]);
    Policy::new("efsPolicy", identity, access.statements(cluster_name))
}

/// EBS CSI driver: volumes and snapshots created with, and managed through, the cluster tag.
pub fn ebs_csi_policy(ctx: &DeployContext, cluster_name: &str, identity: &Identity) -> Policy {
    let tag = cluster_tag(':');
    let volumes = ctx.arn("ec2", "volume/*");
    let snapshots = ctx.arn("ec2", "snapshot/*");
    let instances = ctx.arn("ec2", "instance/*");

    // Some describe calls (DescribeAvailabilityZones) have no resource type.
    let read = read_only([
        "ec2:DescribeAvailabilityZones",
        "ec2:DescribeInstances",
        "ec2:DescribeSnapshots",
        "ec2:DescribeTags",
        "ec2:DescribeVolumes",
        "ec2:DescribeVolumesModifications",
    ]);
    let create_tags = Statement::allow(["ec2:CreateTags"], [volumes.clone(), snapshots.clone()])
        .with_condition(
            ConditionOperator::StringEquals,
            "ec2:CreateAction",
            vec!["CreateVolume", "CreateSnapshot"],
        );
    let delete_tags = mutate_with_resource_tag(
        ["ec2:DeleteTags"],
        &tag,
        cluster_name,
        [volumes.clone(), snapshots],
    );
    let create_volume = create_with_request_tag(["ec2:CreateVolume"], &tag, cluster_name, ["*"]);
    let delete_volume = mutate_with_resource_tag(
        [
            "ec2:DeleteVolume",
            "ec2:DetachVolume",
            "ec2:AttachVolume",
            "ec2:ModifyVolume",
        ],
        &tag,
        cluster_name,
        ["*"],
    );
    let modify_volume = mutate_with_resource_tag(
        ["ec2:AttachVolume", "ec2:DetachVolume", "ec2:ModifyVolume"],
        &tag,
        cluster_name,
        [instances, volumes],
    );
    let create_snapshot =
        create_with_request_tag(["ec2:CreateSnapshot"], &tag, cluster_name, ["*"]);
    let delete_snapshot =
        mutate_with_resource_tag(["ec2:DeleteSnapshot"], &tag, cluster_name, ["*"]);

    Policy::new(
        "ebsDriverPolicy",
        identity,
        vec![
            read,
            create_tags,
            delete_tags,
            create_volume,
            delete_volume,
            modify_volume,
            create_snapshot,
            delete_snapshot,
        ],
    )
}

const ELBV2_CLUSTER_TAG: &str = "elbv2.k8s.aws/cluster";

/// AWS Load Balancer Controller.
///
/// Covers the full controller feature set (WAF, Shield, Cognito, ACM).
/// Security groups and load balancers created by the controller carry the
/// `elbv2.k8s.aws/cluster` tag; deletes are scoped by the cluster tag.
pub fn alb_ingress_policy(_ctx: &DeployContext, cluster_name: &str, identity: &Identity) -> Policy {
    let tag = cluster_tag(':');
    let request_elbv2 = format!("aws:RequestTag/{}", ELBV2_CLUSTER_TAG);
    let resource_elbv2 = format!("aws:ResourceTag/{}", ELBV2_CLUSTER_TAG);
    let security_groups = "arn:aws:ec2:*:*:security-group/*";

    let service_linked_role = Statement::allow(["iam:CreateServiceLinkedRole"], ["*"])
        .with_condition(
            ConditionOperator::StringEquals,
            "iam:AWSServiceName",
            "elasticloadbalancing.amazonaws.com",
        );
    let read = read_only([
        "ec2:DescribeAccountAttributes",
        "ec2:DescribeAddresses",
        "ec2:DescribeAvailabilityZones",
        "ec2:DescribeInternetGateways",
        "ec2:DescribeVpcs",
        "ec2:DescribeSubnets",
        "ec2:DescribeSecurityGroups",
        "ec2:DescribeInstances",
        "ec2:DescribeNetworkInterfaces",
        "ec2:DescribeTags",
        "ec2:GetCoipPoolUsage",
        "ec2:DescribeCoipPools",
        "elasticloadbalancing:DescribeLoadBalancers",
        "elasticloadbalancing:DescribeLoadBalancerAttributes",
        "elasticloadbalancing:DescribeListeners",
        "elasticloadbalancing:DescribeListenerCertificates",
        "elasticloadbalancing:DescribeSSLPolicies",
        "elasticloadbalancing:DescribeRules",
        "elasticloadbalancing:DescribeTargetGroups",
        "elasticloadbalancing:DescribeTargetGroupAttributes",
        "elasticloadbalancing:DescribeTargetHealth",
        "elasticloadbalancing:DescribeTags",
    ]);
    let read_addons = Statement::allow(
        [
            "cognito-idp:DescribeUserPoolClient",
            "acm:ListCertificates",
            "acm:DescribeCertificate",
            "iam:ListServerCertificates",
            "iam:GetServerCertificate",
            "waf-regional:GetWebACL",
            "waf-regional:GetWebACLForResource",
            "waf-regional:AssociateWebACL",
            "waf-regional:DisassociateWebACL",
            "wafv2:GetWebACL",
            "wafv2:GetWebACLForResource",
            "wafv2:AssociateWebACL",
            "wafv2:DisassociateWebACL",
            "shield:GetSubscriptionState",
            "shield:DescribeProtection",
            "shield:CreateProtection",
            "shield:DeleteProtection",
        ],
        ["*"],
    );
    // Ingress rules on security groups created outside the controller.
    let write_sg = Statement::allow(
        [
            "ec2:AuthorizeSecurityGroupIngress",
            "ec2:RevokeSecurityGroupIngress",
        ],
        ["*"],
    );
    let create_sg = Statement::allow(["ec2:CreateSecurityGroup"], ["*"]);
    let create_tags = Statement::allow(["ec2:CreateTags"], [security_groups])
        .with_condition(
            ConditionOperator::StringEquals,
            "ec2:CreateAction",
            "CreateSecurityGroup",
        )
        .with_condition(ConditionOperator::Null, request_elbv2.clone(), "false");
    let create_delete_tags =
        Statement::allow(["ec2:CreateTags", "ec2:DeleteTags"], [security_groups])
            .with_condition(ConditionOperator::Null, request_elbv2.clone(), "true")
            .with_condition(ConditionOperator::Null, resource_elbv2.clone(), "false");
    let write_sg_ingress = Statement::allow(
        [
            "ec2:AuthorizeSecurityGroupIngress",
            "ec2:RevokeSecurityGroupIngress",
            "ec2:DeleteSecurityGroup",
        ],
        ["*"],
    )
    .with_condition(ConditionOperator::Null, resource_elbv2.clone(), "false");
    let create_load_balancer = create_with_request_tag(
        [
            "elasticloadbalancing:CreateLoadBalancer",
            "elasticloadbalancing:CreateTargetGroup",
        ],
        &tag,
        cluster_name,
        ["*"],
    );
    let load_balancer_tags = Statement::allow(
        [
            "elasticloadbalancing:AddTags",
            "elasticloadbalancing:RemoveTags",
        ],
        [
            "arn:aws:elasticloadbalancing:*:*:targetgroup/*/*",
            "arn:aws:elasticloadbalancing:*:*:loadbalancer/net/*/*",
            "arn:aws:elasticloadbalancing:*:*:loadbalancer/app/*/*",
        ],
    )
    .with_condition(ConditionOperator::Null, request_elbv2, "true")
    .with_condition(ConditionOperator::Null, resource_elbv2.clone(), "false");
    // TODO: scope listener and rule management by tag once the controller
    // tags listeners (kubernetes-sigs/aws-load-balancer-controller#1966).
    let listeners = Statement::allow(
        [
            "elasticloadbalancing:CreateListener",
            "elasticloadbalancing:DeleteListener",
            "elasticloadbalancing:CreateRule",
            "elasticloadbalancing:DeleteRule",
        ],
        ["*"],
    );
    let listener_tags = Statement::allow(
        [
            "elasticloadbalancing:AddTags",
            "elasticloadbalancing:RemoveTags",
        ],
        [
            "arn:aws:elasticloadbalancing:*:*:listener/net/*/*/*",
            "arn:aws:elasticloadbalancing:*:*:listener/app/*/*/*",
            "arn:aws:elasticloadbalancing:*:*:listener-rule/net/*/*/*",
            "arn:aws:elasticloadbalancing:*:*:listener-rule/app/*/*/*",
        ],
    );
    let modify_load_balancer = Statement::allow(
        [
            "elasticloadbalancing:ModifyLoadBalancerAttributes",
            "elasticloadbalancing:SetIpAddressType",
            "elasticloadbalancing:SetSecurityGroups",
            "elasticloadbalancing:SetSubnets",
            "elasticloadbalancing:ModifyTargetGroup",
            "elasticloadbalancing:ModifyTargetGroupAttributes",
        ],
        ["*"],
    )
    .with_condition(ConditionOperator::Null, resource_elbv2, "false");
    let delete_load_balancer = mutate_with_resource_tag(
        [
            "elasticloadbalancing:DeleteTargetGroup",
            "elasticloadbalancing:DeleteLoadBalancer",
        ],
        &tag,
        cluster_name,
        ["*"],
    );
    let register_targets = Statement::allow(
        [
            "elasticloadbalancing:RegisterTargets",
            "elasticloadbalancing:DeregisterTargets",
        ],
        ["arn:aws:elasticloadbalancing:*:*:targetgroup/*/*"],
    );
    let listener_certs = Statement::allow(
        [
            "elasticloadbalancing:SetWebAcl",
            "elasticloadbalancing:ModifyListener",
            "elasticloadbalancing:AddListenerCertificates",
            "elasticloadbalancing:RemoveListenerCertificates",
            "elasticloadbalancing:ModifyRule",
        ],
        ["*"],
    );

    Policy::new(
        "albIngressPolicy",
        identity,
        vec![
            modify_load_balancer.clone(),
            read,
            write_sg,
            create_sg,
            read_addons,
            create_tags,
            create_delete_tags,
            write_sg_ingress,
            create_load_balancer,
            load_balancer_tags,
            listeners,
            listener_tags,
            register_targets,
            modify_load_balancer,
            listener_certs,
            delete_load_balancer,
            service_linked_role,
        ],
    )
}

/// Read-only EKS access for the bastion host role.
pub fn bastion_host_policy(
    _ctx: &DeployContext,
    _cluster_name: &str,
    identity: &Identity,
) -> Policy {
    let statement = Statement::allow(
        [
            "eks:DescribeNodegroup",
            "eks:ListNodegroups",
            "eks:DescribeCluster",
            "eks:ListClusters",
            "eks:AccessKubernetesApi",
            "eks:ListUpdates",
            "eks:ListFargateProfiles",
        ],
        ["*"],
    )
    .with_sid("EKSReadonly");
    Policy::new("bastionHostManagedPolicy", identity, vec![statement])
}

/// Control-plane logging handler: update and describe this cluster only.
pub fn eks_logging_policy(
    ctx: &DeployContext,
    cluster_name: &str,
    identity: &Identity,
) -> Policy {
    let cluster_arn = ctx.arn("eks", &format!("cluster/{}", cluster_name));
    let statement = Statement::allow(
        ["eks:UpdateClusterConfig", "eks:DescribeCluster"],
        [cluster_arn.clone(), format!("{}/update-config", cluster_arn)],
    );
    Policy::new("eksLoggingCustomResourcePolicy", identity, vec![statement])
}

/// Every policy builder, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum PolicyKind {
    FluentBit,
    ClusterAutoscaler,
    EfsCsi,
    EbsCsi,
    AlbIngress,
    BastionHost,
    EksLogging,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 7] = [
        Self::FluentBit,
        Self::ClusterAutoscaler,
        Self::EfsCsi,
        Self::EbsCsi,
        Self::AlbIngress,
        Self::BastionHost,
        Self::EksLogging,
    ];

    /// Build this kind's policy.
    pub fn build(self, ctx: &DeployContext, cluster_name: &str, identity: &Identity) -> Policy {
        match self {
            Self::FluentBit => fluent_bit_policy(ctx, cluster_name, identity),
            Self::ClusterAutoscaler => cluster_autoscaler_policy(ctx, cluster_name, identity),
            Self::EfsCsi => efs_csi_policy(ctx, cluster_name, identity),
            Self::EbsCsi => ebs_csi_policy(ctx, cluster_name, identity),
            Self::AlbIngress => alb_ingress_policy(ctx, cluster_name, identity),
            Self::BastionHost => bastion_host_policy(ctx, cluster_name, identity),
            Self::EksLogging => eks_logging_policy(ctx, cluster_name, identity),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FluentBit => write!(f, "fluent-bit"),
            Self::ClusterAutoscaler => write!(f, "cluster-autoscaler"),
            Self::EfsCsi => write!(f, "efs-csi"),
            Self::EbsCsi => write!(f, "ebs-csi"),
            Self::AlbIngress => write!(f, "alb-ingress"),
            Self::BastionHost => write!(f, "bastion-host"),
            Self::EksLogging => write!(f, "eks-logging"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::scoped::{REQUEST_TAG, RESOURCE_TAG};
    use crate::policy::ConditionValue;

    fn ctx() -> DeployContext {
        DeployContext::aws("us-east-1", "123456789012")
    }

    fn role() -> Identity {
        Identity::new("Baseline/Role")
    }

    fn all_policies(cluster: &str) -> Vec<(PolicyKind, Policy)> {
        PolicyKind::ALL
            .iter()
            .map(|k| (*k, k.build(&ctx(), cluster, &role())))
            .collect()
    }

    fn is_tagging(verb: &str) -> bool {
        verb == "CreateTags" || verb == "DeleteTags"
    }

    #[test]
    fn test_ebs_policy_is_deterministic() {
        let a = ebs_csi_policy(&ctx(), "my-cluster", &role());
        let b = ebs_csi_policy(&ctx(), "my-cluster", &role());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.document()).unwrap(),
            serde_json::to_string(&b.document()).unwrap()
        );
    }

    #[test]
    fn test_every_builder_is_deterministic() {
        let first = all_policies("c1");
        let second = all_policies("c1");
        assert_eq!(first, second);
    }

    #[test]
    fn test_policies_bound_to_identity() {
        for (kind, policy) in all_policies("c1") {
            assert_eq!(policy.identities, vec!["Baseline/Role"], "{}", kind);
            assert!(!policy.statements.is_empty(), "{}", kind);
        }
    }

    #[test]
    fn test_create_and_mutate_tag_scoping() {
        for policy in [
            ebs_csi_policy(&ctx(), "c1", &role()),
            efs_csi_policy(&ctx(), "c1", &role()),
        ] {
            for s in policy.statements.iter().filter(|s| !s.conditions.is_empty()) {
                let verbs: Vec<&str> = s.verbs().filter(|v| !is_tagging(v)).collect();
                if verbs.is_empty() {
                    continue;
                }
                if verbs.iter().all(|v| v.starts_with("Create")) {
                    assert!(
                        s.condition_keys().any(|k| k.starts_with(REQUEST_TAG)),
                        "{}: {:?} not request-tag scoped",
                        policy.name,
                        s.actions
                    );
                }
                if verbs
                    .iter()
                    .any(|v| v.starts_with("Delete") || v.starts_with("Modify"))
                {
                    assert!(
                        s.condition_keys().any(|k| k.starts_with(RESOURCE_TAG)),
                        "{}: {:?} not resource-tag scoped",
                        policy.name,
                        s.actions
                    );
                }
            }
        }
    }

    #[test]
    fn test_mutating_volume_actions_never_unconditioned() {
        let policy = ebs_csi_policy(&ctx(), "c1", &role());
        for s in &policy.statements {
            let mutating = s.verbs().any(|v| {
                matches!(
                    v,
                    "CreateVolume" | "DeleteVolume" | "CreateSnapshot" | "DeleteSnapshot"
                )
            });
            if mutating {
                assert!(!s.conditions.is_empty(), "{:?}", s.actions);
            }
        }
    }

    #[test]
    fn test_cluster_name_embedded_exactly() {
        let cluster = "prod-east";
        for (kind, policy) in all_policies(cluster) {
            for s in &policy.statements {
                for entries in s.conditions.values() {
                    for (key, value) in entries {
                        let embeds = key.ends_with("cluster-name")
                            || key.ends_with(&format!("cluster/{}", cluster));
                        if key.ends_with("cluster-name") {
                            let expected = ConditionValue::One(cluster.to_string());
                            assert_eq!(value, &expected, "{}", kind);
                        }
                        if embeds && key.contains("kubernetes.io/cluster/") {
                            assert!(key.ends_with("/prod-east"), "{}: {}", kind, key);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_efs_uses_slash_separator() {
        let policy = efs_csi_policy(&ctx(), "prod-east", &role());
        let keys: Vec<&str> = policy
            .statements
            .iter()
            .flat_map(|s| s.condition_keys())
            .collect();
        assert_eq!(
            keys,
            vec![
                "aws:RequestTag/eks/cluster-name",
                "aws:ResourceTag/eks/cluster-name"
            ]
        );
        assert!(keys.iter().all(|k| !k.contains("eks:")));
    }

    #[test]
    fn test_read_only_statements_unconditioned_and_broad() {
        for (kind, policy) in all_policies("c1") {
            for s in policy.statements.iter().filter(|s| s.is_read_only()) {
                assert!(s.conditions.is_empty(), "{}: {:?}", kind, s.actions);
                assert_eq!(s.resources, vec!["*"], "{}: {:?}", kind, s.actions);
            }
        }
    }

    #[test]
    fn test_fluent_bit_log_groups() {
        let policy = fluent_bit_policy(&ctx(), "prod-east", &role());
        assert_eq!(policy.statements.len(), 1);
        assert_eq!(
            policy.statements[0].resources,
            vec![
                "arn:aws:logs:us-east-1:123456789012:log-group:/aws/containerinsights/prod-east/*",
                "arn:aws:logs:us-east-1:123456789012:log-group:/aws/containerinsights/prod-east/*:log-stream:*",
            ]
        );
    }

    #[test]
    fn test_cluster_autoscaler_write_scoped_by_discovery_tags() {
        let policy = cluster_autoscaler_policy(&ctx(), "prod-east", &role());
        assert_eq!(policy.statements.len(), 2);
        let write = &policy.statements[0];
        assert_eq!(
            write
                .condition(
                    ConditionOperator::StringEquals,
                    "autoscaling:ResourceTag/kubernetes.io/cluster/prod-east"
                )
                .unwrap()
                .values(),
            vec!["owned"]
        );
        assert_eq!(
            write
                .condition(
                    ConditionOperator::StringEquals,
                    "autoscaling:ResourceTag/k8s.io/cluster-autoscaler/enabled"
                )
                .unwrap()
                .values(),
            vec!["true"]
        );
        assert!(policy.statements[1].is_read_only());
    }

    #[test]
    fn test_ebs_statement_layout() {
        let policy = ebs_csi_policy(&ctx(), "c1", &role());
        assert_eq!(policy.name, "ebsDriverPolicy");
        assert_eq!(policy.statements.len(), 8);
        let create_tags = &policy.statements[1];
        assert_eq!(
            create_tags.resources,
            vec![
                "arn:aws:ec2:us-east-1:123456789012:volume/*",
                "arn:aws:ec2:us-east-1:123456789012:snapshot/*"
            ]
        );
        assert!(create_tags
            .condition(ConditionOperator::StringEquals, "ec2:CreateAction")
            .is_some());
    }

    #[test]
    fn test_alb_duplicate_statement_collapsed() {
        let policy = alb_ingress_policy(&ctx(), "c1", &role());
        assert_eq!(policy.statements.len(), 16);
        assert_eq!(
            policy.statements[0].actions[0],
            "elasticloadbalancing:ModifyLoadBalancerAttributes"
        );
        let last = policy.statements.last().unwrap();
        assert_eq!(last.actions, vec!["iam:CreateServiceLinkedRole"]);
    }

    #[test]
    fn test_alb_null_conditions() {
        let policy = alb_ingress_policy(&ctx(), "c1", &role());
        let tag_mgmt = policy
            .statements
            .iter()
            .find(|s| s.actions == vec!["ec2:CreateTags", "ec2:DeleteTags"])
            .unwrap();
        assert_eq!(
            tag_mgmt
                .condition(ConditionOperator::Null, "aws:RequestTag/elbv2.k8s.aws/cluster")
                .unwrap()
                .values(),
            vec!["true"]
        );
        assert_eq!(
            tag_mgmt
                .condition(ConditionOperator::Null, "aws:ResourceTag/elbv2.k8s.aws/cluster")
                .unwrap()
                .values(),
            vec!["false"]
        );
    }

    #[test]
    fn test_bastion_sid() {
        let policy = bastion_host_policy(&ctx(), "c1", &role());
        assert_eq!(policy.statements[0].sid.as_deref(), Some("EKSReadonly"));
    }

    #[test]
    fn test_eks_logging_scoped_to_cluster_arn() {
        let policy = eks_logging_policy(&ctx(), "prod-east", &role());
        assert_eq!(
            policy.statements[0].resources,
            vec![
                "arn:aws:eks:us-east-1:123456789012:cluster/prod-east",
                "arn:aws:eks:us-east-1:123456789012:cluster/prod-east/update-config"
            ]
        );
    }

    #[test]
    fn test_policy_kind_display() {
        assert_eq!(PolicyKind::EbsCsi.to_string(), "ebs-csi");
        assert_eq!(PolicyKind::AlbIngress.to_string(), "alb-ingress");
    }
}

//! The EKS cluster stack: the IAM, managed add-ons and worker nodegroup
//! that sit next to an existing cluster.
//!
//! The control plane itself is not created here. Every resource targets
//! the cluster named in the config, the same way the baseline stack does.

use super::constructs::{
    iam_role, irsa_trust_statement, managed_policy_resource, policy_resource,
    service_trust_statement, ClusterRef,
};
use super::Stack;
use crate::core::tree::{get_att, join_path, param_ref, reference, Node, Parameter, Primitive};
use crate::core::types::{EksforgeConfig, NodegroupConfig};
use crate::error::Result;
use crate::policy::{DeployContext, Identity, PolicyKind};
use serde_json::{json, Value};
use std::fmt;

pub const EKS_ADDON_TYPE: &str = "AWS::EKS::Addon";
pub const INSTANCE_PROFILE_TYPE: &str = "AWS::IAM::InstanceProfile";
pub const LAUNCH_TEMPLATE_TYPE: &str = "AWS::EC2::LaunchTemplate";
pub const NODEGROUP_TYPE: &str = "AWS::EKS::Nodegroup";
pub const LOGGING_RESOURCE_TYPE: &str = "Custom::EksLogging";

pub const K8S_VERSION_PARAMETER: &str = "k8sVersion";
pub const LOGGING_OPTS_PARAMETER: &str = "eksLoggingOpts";

const DEFAULT_K8S_VERSION: &str = "1.21";
const DEFAULT_LOGGING_OPTS: &str = "api,audit,authenticator,controllerManager,scheduler";
const NODEGROUP_NAME: &str = "ng-1";
const USER_DATA_BOUNDARY: &str = "==MYBOUNDARY==";

/// An EKS-managed add-on, installed through `AWS::EKS::Addon`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedAddon {
    VpcCni,
    KubeProxy,
    CoreDns,
}

impl ManagedAddon {
    pub const ALL: [ManagedAddon; 3] = [Self::VpcCni, Self::KubeProxy, Self::CoreDns];

    pub fn node_id(self) -> &'static str {
        match self {
            Self::VpcCni => "VpcCni",
            Self::KubeProxy => "KubeProxy",
            Self::CoreDns => "CoreDns",
        }
    }

    /// Add-on name as EKS knows it.
    pub fn addon_name(self) -> &'static str {
        match self {
            Self::VpcCni => "vpc-cni",
            Self::KubeProxy => "kube-proxy",
            Self::CoreDns => "coredns",
        }
    }

    /// `addon_versions` key pinning this add-on.
    pub fn version_key(self) -> &'static str {
        match self {
            Self::VpcCni => "eks-addon-vpc-cni-version",
            Self::KubeProxy => "eks-addon-kube-proxy-version",
            Self::CoreDns => "eks-addon-coredns-version",
        }
    }
}

impl fmt::Display for ManagedAddon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addon_name())
    }
}

/// Assemble the cluster stack.
pub fn build(config: &EksforgeConfig, ctx: DeployContext) -> Result<Stack> {
    let cluster = ClusterRef::from_config(config, ctx);
    let mut stack = Stack::new(
        config.cluster_stack_name(),
        format!("EKS cluster resources for cluster {}", cluster.name),
    );
    stack.add_parameter(Parameter::new(
        K8S_VERSION_PARAMETER,
        "String",
        DEFAULT_K8S_VERSION,
        "K8s Version",
    ));
    stack.add_parameter(Parameter::new(
        LOGGING_OPTS_PARAMETER,
        "CommaDelimitedList",
        DEFAULT_LOGGING_OPTS,
        "EKS control plane log types, comma separated",
    ));

    stack.add(bastion_host(&cluster)?);
    stack.add(eks_logging(
        &cluster,
        config.cluster.logging_service_token.as_deref(),
    )?);
    for addon in ManagedAddon::ALL {
        let version = config.addon_versions.get(addon.version_key());
        let node = managed_addon(addon, &cluster, version.map(String::as_str))?;
        log::debug!("{}: version {}", addon, version.map_or("default", String::as_str));
        stack.add(node);
    }

    match &config.nodegroup {
        Some(nodegroup) => {
            for parameter in nodegroup_parameters() {
                stack.add_parameter(parameter);
            }
            stack.add(worker_nodegroup(&cluster, Some(nodegroup))?);
        }
        None => {
            log::info!("no nodegroup subnets configured, only the node role is emitted");
            stack.add(worker_nodegroup(&cluster, None)?);
        }
    }

    log::info!(
        "assembled {} with {} resource(s)",
        stack.name,
        stack.leaf_count()
    );
    Ok(stack)
}

/// Bastion host role, its read-only EKS policy, and an instance profile.
fn bastion_host(cluster: &ClusterRef) -> Result<Node> {
    let id = "BastionHost";
    let role_path = join_path(id, "Role");
    let mut role = iam_role(
        service_trust_statement("ec2.amazonaws.com"),
        &[cluster.ctx.managed_policy_arn("AmazonSSMManagedInstanceCore")],
    )?;
    role.properties["RoleName"] = json!(format!("{}-bastion-host", cluster.name));

    let identity = Identity::new(&role_path);
    let policy = PolicyKind::BastionHost.build(&cluster.ctx, &cluster.name, &identity);
    let profile = Primitive::new(
        INSTANCE_PROFILE_TYPE,
        json!({ "Roles": [reference(&role_path)] }),
    );

    Ok(Node::composite(
        id,
        vec![
            Node::leaf("Role", role),
            managed_policy_resource("Policy", &policy)?,
            Node::leaf("InstanceProfile", profile),
        ],
    ))
}

/// Role for the control-plane logging handler, its policy, and the
/// custom resource applying `eksLoggingOpts` when a handler is deployed.
fn eks_logging(cluster: &ClusterRef, service_token: Option<&str>) -> Result<Node> {
    let id = "EksLogging";
    let role_path = join_path(id, "Role");
    let role = iam_role(
        service_trust_statement("lambda.amazonaws.com"),
        &[cluster
            .ctx
            .managed_policy_arn("service-role/AWSLambdaBasicExecutionRole")],
    )?;
    let identity = Identity::new(&role_path);
    let policy = PolicyKind::EksLogging.build(&cluster.ctx, &cluster.name, &identity);

    let mut node = Node::composite(
        id,
        vec![
            Node::leaf("Role", role),
            policy_resource("Policy", &policy)?,
        ],
    );
    match service_token {
        Some(token) => {
            let resource = Primitive::new(
                LOGGING_RESOURCE_TYPE,
                json!({
                    "ServiceToken": token,
                    "eksCluster": cluster.name,
                    "loggingOpts": param_ref(LOGGING_OPTS_PARAMETER),
                }),
            );
            node = node.with_child(
                Node::leaf("Resource", resource).depends_on(join_path(id, "Policy")),
            );
        }
        None => log::warn!(
            "no logging_service_token configured, {} is not applied",
            LOGGING_OPTS_PARAMETER
        ),
    }
    Ok(node)
}

/// `AWS::EKS::Addon`, plus the IRSA role vpc-cni runs under.
fn managed_addon(addon: ManagedAddon, cluster: &ClusterRef, version: Option<&str>) -> Result<Node> {
    let id = addon.node_id();
    let mut props = json!({
        "AddonName": addon.addon_name(),
        "ClusterName": cluster.name,
        "ResolveConflicts": "OVERWRITE",
    });
    if let Some(version) = version {
        props["AddonVersion"] = json!(version);
    }

    let mut children = Vec::new();
    if addon == ManagedAddon::VpcCni {
        let role_path = join_path(id, "Role");
        let role = iam_role(
            irsa_trust_statement(cluster, "kube-system", "aws-node"),
            &[cluster.ctx.managed_policy_arn("AmazonEKS_CNI_Policy")],
        )?;
        props["ServiceAccountRoleArn"] = get_att(&role_path, "Arn");
        children.push(Node::leaf("Role", role));
    }
    children.push(Node::leaf("Addon", Primitive::new(EKS_ADDON_TYPE, props)));
    Ok(Node::composite(id, children))
}

/// Deploy-time sizing of the nodegroup.
fn nodegroup_parameters() -> Vec<Parameter> {
    vec![
        Parameter::new("nodegroupMax", "Number", "10", "Max number of EKS worker nodes"),
        Parameter::new("nodegroupCount", "Number", "2", "Desired number of EKS worker nodes"),
        Parameter::new("nodegroupMin", "Number", "2", "Min number of EKS worker nodes"),
        Parameter::new(
            "nodegroupInstanceType",
            "String",
            "t3.medium",
            "Instance type of the EKS worker nodes",
        ),
        Parameter::new(
            "nodeAMIVersion",
            "String",
            "1.21.2-20210722",
            "AMI release version of the EKS worker nodes",
        ),
    ]
}

/// Worker node role, and the managed nodegroup when subnets are known.
fn worker_nodegroup(cluster: &ClusterRef, nodegroup: Option<&NodegroupConfig>) -> Result<Node> {
    let id = "Nodegroup";
    let role = iam_role(
        service_trust_statement("ec2.amazonaws.com"),
        &[
            cluster.ctx.managed_policy_arn("AmazonEKSWorkerNodePolicy"),
            cluster.ctx.managed_policy_arn("AmazonEC2ContainerRegistryReadOnly"),
            cluster.ctx.managed_policy_arn("AmazonSSMManagedInstanceCore"),
        ],
    )?;
    let mut node = Node::composite(id, vec![Node::leaf("Role", role)]);
    let Some(nodegroup) = nodegroup else {
        return Ok(node);
    };

    let worker_name = format!("{}-WorkerNodes", cluster.name);
    let template_path = join_path(id, "LaunchTemplate");
    let template = Primitive::new(
        LAUNCH_TEMPLATE_TYPE,
        json!({
            "LaunchTemplateName": format!("{}-{}", NODEGROUP_NAME, cluster.name),
            "LaunchTemplateData": {
                "InstanceType": param_ref("nodegroupInstanceType"),
                "UserData": { "Fn::Base64": node_user_data(&cluster.ctx.region) },
                "BlockDeviceMappings": [{
                    "DeviceName": "/dev/xvda",
                    "Ebs": { "Encrypted": true, "VolumeType": "gp3" },
                }],
                "MetadataOptions": { "HttpTokens": "optional", "HttpPutResponseHopLimit": 2 },
                "TagSpecifications": [{
                    "ResourceType": "instance",
                    "Tags": [{ "Key": "Name", "Value": worker_name }],
                }],
            },
        }),
    );
    let group = Primitive::new(
        NODEGROUP_TYPE,
        json!({
            "ClusterName": cluster.name,
            "NodegroupName": NODEGROUP_NAME,
            "NodeRole": get_att(&join_path(id, "Role"), "Arn"),
            "Subnets": nodegroup.subnet_ids,
            "ScalingConfig": {
                "MaxSize": param_ref("nodegroupMax"),
                "DesiredSize": param_ref("nodegroupCount"),
                "MinSize": param_ref("nodegroupMin"),
            },
            "ReleaseVersion": param_ref("nodeAMIVersion"),
            "Version": param_ref(K8S_VERSION_PARAMETER),
            "LaunchTemplate": {
                "Id": reference(&template_path),
                "Version": get_att(&template_path, "LatestVersionNumber"),
            },
            "Tags": { "Name": worker_name },
        }),
    );

    node = node
        .with_child(Node::leaf("LaunchTemplate", template))
        .with_child(Node::leaf("Group", group).depends_on(ManagedAddon::VpcCni.node_id()));
    Ok(node)
}

/// MIME multipart user data installing the SSM agent on worker nodes.
fn node_user_data(region: &str) -> Value {
    json!(format!(
        "Content-Type: multipart/mixed; boundary=\"{b}\"\nMIME-Version: 1.0\n\n\
         --{b}\nContent-Type: text/x-shellscript; charset=\"us-ascii\"\n\n\
         #!/bin/bash\nsudo yum install -y \
         https://s3.{r}.amazonaws.com/amazon-ssm-{r}/latest/linux_amd64/amazon-ssm-agent.rpm\n\n\
         --{b}--\n",
        b = USER_DATA_BOUNDARY,
        r = region
    ))
}

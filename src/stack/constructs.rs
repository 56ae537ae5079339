//! Composite constructs over CloudFormation primitives.
//!
//! Kubernetes objects and Helm releases are custom resources served by the
//! cluster's kubectl provider function. The provider reads `Manifest` and
//! `Values` as JSON text and always assumes `RoleArn`.

use crate::core::tree::{get_att, join_path, json_string, reference, Node, Primitive};
use crate::core::types::EksforgeConfig;
use crate::error::Result;
use crate::policy::{
    ConditionOperator, DeployContext, Identity, Policy, PolicyDocument, Principal, Statement,
    POLICY_VERSION,
};
use serde_json::{json, Map, Value};

pub const ROLE_TYPE: &str = "AWS::IAM::Role";
pub const POLICY_TYPE: &str = "AWS::IAM::Policy";
pub const MANAGED_POLICY_TYPE: &str = "AWS::IAM::ManagedPolicy";
pub const MANIFEST_TYPE: &str = "Custom::AWSCDK-EKS-KubernetesResource";
pub const HELM_CHART_TYPE: &str = "Custom::AWSCDK-EKS-HelmChart";

/// Annotation binding a Kubernetes service account to an IAM role.
pub const ROLE_ARN_ANNOTATION: &str = "eks.amazonaws.com/role-arn";

/// The cluster the constructs install into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRef {
    pub name: String,
    pub vpc_id: String,
    pub oidc_issuer: String,
    pub service_token: String,
    pub kubectl_role_arn: String,
    pub ctx: DeployContext,
}

impl ClusterRef {
    pub fn from_config(config: &EksforgeConfig, ctx: DeployContext) -> Self {
        let cluster = &config.cluster;
        Self {
            name: cluster.name.clone(),
            vpc_id: cluster.vpc_id.clone(),
            oidc_issuer: cluster.oidc_issuer.clone(),
            service_token: cluster.kubectl_service_token.clone(),
            kubectl_role_arn: cluster.kubectl_role_arn.clone(),
            ctx,
        }
    }

    /// ARN of the cluster's IAM OIDC identity provider.
    pub fn oidc_provider_arn(&self) -> String {
        self.ctx
            .global_arn("iam", &format!("oidc-provider/{}", self.oidc_issuer))
    }

    /// Properties every kubectl-backed custom resource carries.
    fn provider_properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("ServiceToken".into(), json!(self.service_token));
        props.insert("ClusterName".into(), json!(self.name));
        props.insert("RoleArn".into(), json!(self.kubectl_role_arn));
        props
    }
}

/// Trust policy letting one Kubernetes service account assume a role
/// through the cluster's OIDC provider.
pub fn irsa_trust_statement(cluster: &ClusterRef, namespace: &str, name: &str) -> Statement {
    Statement::allow(["sts:AssumeRoleWithWebIdentity"], Vec::<String>::new())
        .with_principal(Principal::Federated(cluster.oidc_provider_arn()))
        .with_condition(
            ConditionOperator::StringEquals,
            format!("{}:aud", cluster.oidc_issuer),
            "sts.amazonaws.com",
        )
        .with_condition(
            ConditionOperator::StringEquals,
            format!("{}:sub", cluster.oidc_issuer),
            format!("system:serviceaccount:{}:{}", namespace, name),
        )
}

/// Trust policy letting an AWS service assume a role.
pub fn service_trust_statement(service: &str) -> Statement {
    Statement::allow(["sts:AssumeRole"], Vec::<String>::new())
        .with_principal(Principal::Service(service.to_string()))
}

/// `AWS::IAM::Role` assumable under `trust`, with AWS-managed policies attached.
pub fn iam_role(trust: Statement, managed_policy_arns: &[String]) -> Result<Primitive> {
    let trust = [trust];
    let mut props = json!({
        "AssumeRolePolicyDocument": PolicyDocument {
            version: POLICY_VERSION,
            statement: &trust,
        }
        .to_value()?,
    });
    if !managed_policy_arns.is_empty() {
        props["ManagedPolicyArns"] = json!(managed_policy_arns);
    }
    Ok(Primitive::new(ROLE_TYPE, props))
}

/// A service account construct and the identity of its role.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceAccount {
    pub node: Node,
    pub identity: Identity,
    pub name: String,
    pub namespace: String,
}

/// IAM role plus the Kubernetes ServiceAccount annotated with its ARN.
///
/// `scope` is the path of the node the construct will be added under.
pub fn service_account(
    scope: &str,
    id: &str,
    name: &str,
    namespace: &str,
    cluster: &ClusterRef,
    managed_policy_arns: &[String],
) -> Result<ServiceAccount> {
    let path = join_path(scope, id);
    let role_path = join_path(&path, "Role");
    let role = iam_role(
        irsa_trust_statement(cluster, namespace, name),
        managed_policy_arns,
    )?;

    let manifest = json!({
        "apiVersion": "v1",
        "kind": "ServiceAccount",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": { "app.kubernetes.io/name": name },
            "annotations": { ROLE_ARN_ANNOTATION: get_att(&role_path, "Arn") },
        },
    });

    let node = Node::composite(
        id,
        vec![
            Node::leaf("Role", role),
            kubernetes_manifest("ManifestResource", cluster, vec![manifest]),
        ],
    );

    let mut identity = Identity::new(role_path);
    for arn in managed_policy_arns {
        identity = identity.with_managed_policy(arn.clone());
    }

    Ok(ServiceAccount {
        node,
        identity,
        name: name.to_string(),
        namespace: namespace.to_string(),
    })
}

/// Apply `docs` to the cluster.
pub fn kubernetes_manifest(id: &str, cluster: &ClusterRef, docs: Vec<Value>) -> Node {
    let mut props = cluster.provider_properties();
    props.insert("Manifest".into(), json_string(Value::Array(docs)));
    Node::leaf(id, Primitive::new(MANIFEST_TYPE, Value::Object(props)))
}

/// A labelled Namespace.
pub fn namespace(id: &str, cluster: &ClusterRef, name: &str) -> Node {
    kubernetes_manifest(
        id,
        cluster,
        vec![json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": name, "labels": { "name": name } },
        })],
    )
}

/// A Helm release.
#[derive(Debug, Clone, PartialEq)]
pub struct HelmChart {
    pub chart: String,
    pub release: String,
    pub repository: String,
    pub namespace: String,
    pub version: Option<String>,
    pub values: Value,
    pub wait: bool,
    pub create_namespace: bool,
}

impl HelmChart {
    pub fn new(chart: &str, release: &str, repository: &str, namespace: &str) -> Self {
        Self {
            chart: chart.to_string(),
            release: release.to_string(),
            repository: repository.to_string(),
            namespace: namespace.to_string(),
            version: None,
            values: json!({}),
            wait: true,
            create_namespace: false,
        }
    }

    pub fn version(mut self, version: Option<&String>) -> Self {
        self.version = version.cloned();
        self
    }

    pub fn values(mut self, values: Value) -> Self {
        self.values = values;
        self
    }

    pub fn create_namespace(mut self) -> Self {
        self.create_namespace = true;
        self
    }
}

pub fn helm_chart(id: &str, cluster: &ClusterRef, chart: &HelmChart) -> Node {
    let mut props = cluster.provider_properties();
    props.insert("Release".into(), json!(chart.release));
    props.insert("Chart".into(), json!(chart.chart));
    if let Some(ref version) = chart.version {
        props.insert("Version".into(), json!(version));
    }
    props.insert("Wait".into(), json!(chart.wait));
    props.insert("Values".into(), json_string(chart.values.clone()));
    props.insert("Namespace".into(), json!(chart.namespace));
    props.insert("Repository".into(), json!(chart.repository));
    if chart.create_namespace {
        props.insert("CreateNamespace".into(), json!(true));
    }
    Node::leaf(id, Primitive::new(HELM_CHART_TYPE, Value::Object(props)))
}

/// Inline IAM policy attached to the roles of its bound identities.
pub fn policy_resource(id: &str, policy: &Policy) -> Result<Node> {
    Ok(Node::leaf(
        id,
        Primitive::new(
            POLICY_TYPE,
            json!({
                "PolicyName": policy.name,
                "PolicyDocument": policy.document().to_value()?,
                "Roles": policy_roles(policy),
            }),
        ),
    ))
}

/// Customer-managed IAM policy attached to the roles of its bound identities.
pub fn managed_policy_resource(id: &str, policy: &Policy) -> Result<Node> {
    Ok(Node::leaf(
        id,
        Primitive::new(
            MANAGED_POLICY_TYPE,
            json!({
                "Description": policy.name,
                "PolicyDocument": policy.document().to_value()?,
                "Roles": policy_roles(policy),
            }),
        ),
    ))
}

fn policy_roles(policy: &Policy) -> Vec<Value> {
    policy.identities.iter().map(|i| reference(i)).collect()
}

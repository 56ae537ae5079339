//! YAML parsing, validation, and environment resolution.
//!
//! Parses eksforge.yaml and validates structural constraints:
//! - Version must be "1.0"
//! - Cluster name must be a valid EKS cluster name
//! - OIDC issuer is a bare host/path
//! - Account ids are 12 digits
//! - Helm and EKS add-on version keys are known

use super::types::*;
use crate::error::{Error, Result};
use crate::policy::DeployContext;
use regex::Regex;
use std::path::Path;

/// Env var consulted when `env.account` is unset.
pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";

/// Env var consulted when `env.region` is unset.
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

const CLUSTER_NAME_PATTERN: &str = r"^[0-9A-Za-z][A-Za-z0-9\-_]*$";
const CLUSTER_NAME_MAX: usize = 100;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse an eksforge.yaml file from disk.
pub fn parse_config_file(path: &Path) -> Result<EksforgeConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_config(&content)
}

/// Parse an eksforge.yaml from a string.
pub fn parse_config(yaml: &str) -> Result<EksforgeConfig> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &EksforgeConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ValidationError { message });

    if config.version != "1.0" {
        fail(format!("version must be \"1.0\", got \"{}\"", config.version));
    }

    if config.name.trim().is_empty() {
        fail("name must not be empty".to_string());
    }

    let cluster = &config.cluster;
    match Regex::new(CLUSTER_NAME_PATTERN) {
        Ok(re) if !re.is_match(&cluster.name) => fail(format!(
            "cluster name '{}' must start with a letter or digit and contain only letters, digits, '-' and '_'",
            cluster.name
        )),
        Ok(_) => {}
        Err(e) => fail(format!("cluster name pattern: {}", e)),
    }
    if cluster.name.len() > CLUSTER_NAME_MAX {
        fail(format!(
            "cluster name is {} characters, at most {} allowed",
            cluster.name.len(),
            CLUSTER_NAME_MAX
        ));
    }

    if cluster.vpc_id.trim().is_empty() {
        fail("cluster.vpc_id must not be empty".to_string());
    }
    if cluster.oidc_issuer.trim().is_empty() {
        fail("cluster.oidc_issuer must not be empty".to_string());
    } else if cluster.oidc_issuer.contains("://") {
        fail(format!(
            "cluster.oidc_issuer '{}' must not include a scheme",
            cluster.oidc_issuer
        ));
    }
    if cluster.kubectl_service_token.trim().is_empty() {
        fail("cluster.kubectl_service_token must not be empty".to_string());
    }
    if cluster.kubectl_role_arn.trim().is_empty() {
        fail("cluster.kubectl_role_arn must not be empty".to_string());
    }
    if let Some(ref token) = cluster.logging_service_token {
        if token.trim().is_empty() {
            fail("cluster.logging_service_token must not be empty when set".to_string());
        }
    }

    if let Some(ref account) = config.env.account {
        if !is_account_id(account) {
            fail(format!("env.account '{}' must be 12 digits", account));
        }
    }
    if config.env.partition.trim().is_empty() {
        fail("env.partition must not be empty".to_string());
    }

    for (key, version) in &config.helm_versions {
        if !HELM_VERSION_KEYS.contains(&key.as_str()) {
            fail(format!(
                "unknown helm version key '{}' (expected one of: {})",
                key,
                HELM_VERSION_KEYS.join(", ")
            ));
        }
        if version.trim().is_empty() {
            fail(format!("helm version '{}' must not be empty", key));
        }
    }

    for (key, version) in &config.addon_versions {
        if !EKS_ADDON_VERSION_KEYS.contains(&key.as_str()) {
            fail(format!(
                "unknown add-on version key '{}' (expected one of: {})",
                key,
                EKS_ADDON_VERSION_KEYS.join(", ")
            ));
        }
        if version.trim().is_empty() {
            fail(format!("add-on version '{}' must not be empty", key));
        }
    }

    if let Some(ref nodegroup) = config.nodegroup {
        if nodegroup.subnet_ids.is_empty() {
            fail("nodegroup.subnet_ids must list at least one subnet".to_string());
        }
    }

    errors
}

fn is_account_id(s: &str) -> bool {
    s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve account, region, and partition, consulting `lookup` for unset
/// config fields.
pub fn resolve_context<F>(config: &EksforgeConfig, lookup: F) -> Result<DeployContext>
where
    F: Fn(&str) -> Option<String>,
{
    let account = match config.env.account.clone() {
        Some(a) => a,
        None => lookup(ACCOUNT_ENV)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::MissingEnvironment(format!("account ({})", ACCOUNT_ENV)))?,
    };
    let region = match config.env.region.clone() {
        Some(r) => r,
        None => lookup(REGION_ENV)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| Error::MissingEnvironment(format!("region ({})", REGION_ENV)))?,
    };
    Ok(DeployContext::new(
        config.env.partition.clone(),
        region,
        account,
    ))
}

/// Process environment lookup for `resolve_context`.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
version: "1.0"
name: test
env:
  account: "123456789012"
  region: us-east-1
cluster:
  name: demo-cluster
  vpc_id: vpc-0abc
  oidc_issuer: oidc.eks.us-east-1.amazonaws.com/id/EXAMPLE
  kubectl_service_token: arn:aws:lambda:us-east-1:123456789012:function:kubectl
  kubectl_role_arn: arn:aws:iam::123456789012:role/kubectl-provider
helm_versions:
  cluster-autoscaler-helm-version: 9.10.7
"#;

    fn messages(config: &EksforgeConfig) -> Vec<String> {
        validate_config(config).into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_parse_valid() {
        let config = parse_config(VALID).unwrap();
        assert_eq!(config.name, "test");
        assert!(messages(&config).is_empty(), "unexpected errors: {:?}", messages(&config));
    }

    #[test]
    fn test_bad_version() {
        let mut config = parse_config(VALID).unwrap();
        config.version = "2.0".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("version")));
    }

    #[test]
    fn test_cluster_name_rules() {
        let mut config = parse_config(VALID).unwrap();
        config.cluster.name = "-leading-dash".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("cluster name")));

        config.cluster.name = "a".repeat(101);
        assert!(messages(&config).iter().any(|m| m.contains("at most 100")));

        config.cluster.name = "ok_Name-1".to_string();
        assert!(messages(&config).is_empty());
    }

    #[test]
    fn test_oidc_issuer_scheme_rejected() {
        let mut config = parse_config(VALID).unwrap();
        config.cluster.oidc_issuer = "https://oidc.eks.us-east-1.amazonaws.com/id/X".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("scheme")));
    }

    #[test]
    fn test_account_must_be_twelve_digits() {
        let mut config = parse_config(VALID).unwrap();
        config.env.account = Some("12345".to_string());
        assert!(messages(&config).iter().any(|m| m.contains("12 digits")));
    }

    #[test]
    fn test_unknown_helm_key() {
        let mut config = parse_config(VALID).unwrap();
        config
            .helm_versions
            .insert("istio-helm-version".to_string(), "1.0".to_string());
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("unknown helm version key 'istio-helm-version'")));
    }

    #[test]
    fn test_kubectl_role_arn_must_not_be_empty() {
        let mut config = parse_config(VALID).unwrap();
        config.cluster.kubectl_role_arn = " ".to_string();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("cluster.kubectl_role_arn")));
    }

    #[test]
    fn test_addon_version_keys() {
        let mut config = parse_config(VALID).unwrap();
        config
            .addon_versions
            .insert("eks-addon-coredns-version".to_string(), "v1.8.4-eksbuild.1".to_string());
        assert!(messages(&config).is_empty());
        config
            .addon_versions
            .insert("eks-addon-istio-version".to_string(), "1".to_string());
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("unknown add-on version key 'eks-addon-istio-version'")));
    }

    #[test]
    fn test_nodegroup_needs_subnets() {
        let mut config = parse_config(VALID).unwrap();
        config.nodegroup = Some(NodegroupConfig::default());
        assert!(messages(&config).iter().any(|m| m.contains("nodegroup.subnet_ids")));
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = parse_config(VALID).unwrap();
        config.version = "0.9".to_string();
        config.name = String::new();
        config.cluster.kubectl_service_token = String::new();
        assert_eq!(validate_config(&config).len(), 3);
    }

    #[test]
    fn test_resolve_context_prefers_config() {
        let config = parse_config(VALID).unwrap();
        let ctx = resolve_context(&config, |_| Some("999999999999".to_string())).unwrap();
        assert_eq!(ctx.account, "123456789012");
        assert_eq!(ctx.region, "us-east-1");
        assert_eq!(ctx.partition, "aws");
    }

    #[test]
    fn test_resolve_context_env_fallback() {
        let mut config = parse_config(VALID).unwrap();
        config.env.account = None;
        config.env.region = None;
        let ctx = resolve_context(&config, |name| match name {
            ACCOUNT_ENV => Some("210987654321".to_string()),
            REGION_ENV => Some("eu-west-1".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(ctx.account, "210987654321");
        assert_eq!(ctx.region, "eu-west-1");
    }

    #[test]
    fn test_resolve_context_missing() {
        let mut config = parse_config(VALID).unwrap();
        config.env.region = None;
        let err = resolve_context(&config, |_| None).unwrap_err();
        assert!(matches!(err, Error::MissingEnvironment(_)));
        assert!(err.to_string().contains(REGION_ENV));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eksforge.yaml");
        std::fs::write(&path, VALID).unwrap();
        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.cluster.name, "demo-cluster");
    }

    #[test]
    fn test_parse_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_config_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(matches!(
            parse_config("not: [valid: yaml: {{"),
            Err(Error::Yaml(_))
        ));
    }
}

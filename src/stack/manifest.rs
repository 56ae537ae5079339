//! Kubernetes manifest loading.

use crate::core::types::ManifestPaths;
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Kinds the stack creates itself so the service account can carry its role.
const STACK_OWNED_KINDS: [&str; 2] = ["Namespace", "ServiceAccount"];

/// Parse every document of a multi-document YAML string. Empty documents
/// are dropped.
pub fn parse_manifest(yaml: &str) -> Result<Vec<Value>> {
    let mut docs = Vec::new();
    for document in serde_yaml_ng::Deserializer::from_str(yaml) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            docs.push(value);
        }
    }
    Ok(docs)
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let docs = parse_manifest(&content)?;
    log::debug!("loaded {} document(s) from {}", docs.len(), path.display());
    Ok(docs)
}

/// Drop `Namespace` and `ServiceAccount` documents.
pub fn clean_manifest(docs: Vec<Value>) -> Vec<Value> {
    docs.into_iter()
        .filter(|doc| {
            let kind = doc.get("kind").and_then(Value::as_str).unwrap_or_default();
            !STACK_OWNED_KINDS.contains(&kind)
        })
        .collect()
}

/// Manifest documents for the add-ons that apply files.
///
/// `None` means the file was not configured. `Some` with no documents means
/// the file was configured but left nothing to apply after cleaning. Either
/// way the add-on is synthesized without its file-backed resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifests {
    pub fluent_bit: Option<Vec<Value>>,
    pub aws_secrets: Option<Vec<Value>>,
    pub container_insights: Option<Vec<Value>>,
    pub metric_server: Option<Vec<Value>>,
}

impl Manifests {
    /// Load the configured files, resolving relative paths against `base`.
    ///
    /// Every file except the metrics server is cleaned.
    pub fn load(paths: &ManifestPaths, base: &Path) -> Result<Self> {
        let read = |p: &Option<PathBuf>| -> Result<Option<Vec<Value>>> {
            p.as_ref().map(|p| load_manifest(&base.join(p))).transpose()
        };
        Ok(Self {
            fluent_bit: read(&paths.fluent_bit)?.map(clean_manifest),
            aws_secrets: read(&paths.aws_secrets)?.map(clean_manifest),
            container_insights: read(&paths.container_insights)?.map(clean_manifest),
            metric_server: read(&paths.metric_server)?,
        })
    }
}

//! Resource graph nodes and deterministic naming.
//!
//! A [`ResourceNode`] is an untyped Kubernetes manifest: api version, kind,
//! metadata, and an optional spec (or data, for Secrets). A [`ResourceGraph`]
//! holds nodes in dependency order. Node equality is structural, so
//! translating the same input twice yields equal graphs - the idempotence the
//! resolver relies on.
//!
//! All derived resource names are deterministic functions of the cluster name
//! and the node's role, which is what makes re-creation checks possible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Identity of a resource in the store, keyed by (namespace, name) within an
/// api version and kind
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// API version (e.g., "infrastructure.cluster.x-k8s.io/v1beta1")
    pub api_version: String,
    /// Kind of resource (e.g., "AzureCluster")
    pub kind: String,
    /// Namespace the resource lives in
    pub namespace: String,
    /// Resource name
    pub name: String,
}

impl ResourceKey {
    /// Create a new resource key
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Metadata for a resource node
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Name of the resource
    pub name: String,
    /// Namespace of the resource
    pub namespace: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// An untyped Kubernetes resource manifest produced by translation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    /// API version (e.g., "cluster.x-k8s.io/v1beta1")
    pub api_version: String,
    /// Kind of resource (e.g., "MachineSet")
    pub kind: String,
    /// Resource metadata
    pub metadata: NodeMetadata,
    /// Resource spec (untyped) - used for most resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
    /// String data - used for Secrets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_data: Option<Value>,
    /// Immutability marker - used for Secrets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable: Option<bool>,
}

impl ResourceNode {
    /// Create a new resource node
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata: NodeMetadata {
                name: name.into(),
                namespace: namespace.into(),
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
            },
            spec: None,
            string_data: None,
            immutable: None,
        }
    }

    /// Set the spec for this node
    pub fn with_spec(mut self, spec: Value) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Set string data for this node (Secrets)
    pub fn with_string_data(mut self, data: Value) -> Self {
        self.string_data = Some(data);
        self
    }

    /// Mark this node immutable (Secrets)
    pub fn immutable(mut self) -> Self {
        self.immutable = Some(true);
        self
    }

    /// Add labels to the node
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.metadata.labels = labels;
        self
    }

    /// Add an annotation to the node
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    /// The key this node occupies in the store
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(
            &self.api_version,
            &self.kind,
            &self.metadata.namespace,
            &self.metadata.name,
        )
    }

    /// Serialize the node into the JSON object the store applies
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| Error::serialization(e.to_string()))
    }
}

/// A set of resource nodes in dependency order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceGraph {
    nodes: Vec<ResourceNode>,
}

impl ResourceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node; creation order follows insertion order
    pub fn push(&mut self, node: ResourceNode) {
        self.nodes.push(node);
    }

    /// Nodes in dependency order
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// Number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// =============================================================================
// Deterministic resource naming
// =============================================================================

/// Name of the per-cluster credentials secret
pub fn credentials_secret_name(cluster: &str) -> String {
    format!("{cluster}-cluster-credential")
}

/// Name of the cluster identity; shares the cluster's own name
pub fn identity_name(cluster: &str) -> String {
    cluster.to_string()
}

/// Name of the infrastructure cluster; shares the cluster's own name
pub fn infra_cluster_name(cluster: &str) -> String {
    cluster.to_string()
}

/// Name of the machine template for the default worker role
pub fn machine_template_name(cluster: &str) -> String {
    format!("{cluster}-machine-template")
}

/// Name of the machine set for the default worker role
pub fn machine_set_name(cluster: &str) -> String {
    format!("{cluster}-machineset")
}

/// Standard labels stamped on every translated resource
pub fn cluster_labels(cluster: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(crate::CLUSTER_NAME_LABEL.to_string(), cluster.to_string());
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_is_kind_namespace_name() {
        let key = ResourceKey::new("v1", "Secret", "capi", "cred");
        assert_eq!(key.to_string(), "Secret capi/cred");
    }

    #[test]
    fn node_key_round_trips_metadata() {
        let node = ResourceNode::new("v1", "Secret", "cred", "capi");
        let key = node.key();
        assert_eq!(key.kind, "Secret");
        assert_eq!(key.namespace, "capi");
        assert_eq!(key.name, "cred");
    }

    #[test]
    fn names_are_deterministic_functions_of_cluster() {
        assert_eq!(credentials_secret_name("prod"), "prod-cluster-credential");
        assert_eq!(machine_template_name("prod"), "prod-machine-template");
        assert_eq!(machine_set_name("prod"), "prod-machineset");
        assert_eq!(infra_cluster_name("prod"), "prod");
        assert_eq!(identity_name("prod"), "prod");
    }

    #[test]
    fn to_json_omits_absent_sections() {
        let node = ResourceNode::new("v1", "Secret", "cred", "capi")
            .with_string_data(serde_json::json!({"clientSecret": "s"}))
            .immutable();
        let json = node.to_json().unwrap();
        assert_eq!(json["stringData"]["clientSecret"], "s");
        assert_eq!(json["immutable"], true);
        assert!(json.get("spec").is_none());
    }

    #[test]
    fn structural_equality_holds_for_identical_nodes() {
        let build = || {
            ResourceNode::new("v1", "Secret", "cred", "capi")
                .with_labels(cluster_labels("prod"))
                .with_annotation("a", "b")
        };
        assert_eq!(build(), build());
    }
}

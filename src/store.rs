//! Resource store abstraction and kube-backed implementation.
//!
//! The trait keeps the rest of the bridge independent of the wire client:
//! tests mock it, production uses [`KubeStore`] over `Api<DynamicObject>`.
//! "Already exists" and "not found" are folded into typed outcomes rather
//! than errors, which is what makes the resolver's create-or-adopt policy and
//! the cleanup pass read cleanly.

use std::collections::BTreeMap;

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::discovery::ApiResource;
use kube::Client;
use serde_json::Value;

#[cfg(test)]
use mockall::automock;

use crate::graph::{ResourceKey, ResourceNode};
use crate::{Error, Result};

/// Result of a create call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The store accepted the resource
    Created,
    /// The resource was already present; callers adopt it
    AlreadyExists,
}

/// Result of a delete call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The store accepted the deletion
    Deleted,
    /// The resource was already gone
    NotFound,
}

/// Observed state of a live resource
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSnapshot {
    /// Key the resource was observed under
    pub key: ResourceKey,
    /// Annotations on the observed resource
    pub annotations: BTreeMap<String, String>,
    /// Remaining object content (spec, status, ...)
    pub data: Value,
}

impl ResourceSnapshot {
    /// Look up an annotation value
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Read a boolean field from the resource status
    pub fn status_bool(&self, field: &str) -> bool {
        self.data
            .get("status")
            .and_then(|s| s.get(field))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Read an integer field from the resource status
    pub fn status_i64(&self, field: &str) -> Option<i64> {
        self.data
            .get("status")
            .and_then(|s| s.get(field))
            .and_then(Value::as_i64)
    }

    /// Resolve a JSON pointer into the object content
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.data.pointer(pointer)
    }
}

/// Trait abstracting the live resource store.
///
/// All calls are blocking from the caller's perspective and carry the store's
/// own timeouts; the store's concurrency control is opaque to the bridge.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a resource by key; `None` means not found
    async fn get(&self, key: &ResourceKey) -> Result<Option<ResourceSnapshot>>;

    /// Create a resource, distinguishing "already exists" from failure
    async fn create(&self, node: &ResourceNode) -> Result<CreateOutcome>;

    /// Delete a resource by key, distinguishing "not found" from failure
    async fn delete(&self, key: &ResourceKey) -> Result<DeleteOutcome>;

    /// List resources of a kind in a namespace, optionally label-filtered
    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        label_selector: Option<String>,
    ) -> Result<Vec<ResourceSnapshot>>;
}

/// Kube-backed resource store using `DynamicObject` for untyped resources
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Create a new store over the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, api_version: &str, kind: &str, namespace: &str) -> Api<DynamicObject> {
        let ar = api_resource(api_version, kind);
        Api::namespaced_with(self.client.clone(), namespace, &ar)
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<ResourceSnapshot>> {
        let api = self.api(&key.api_version, &key.kind, &key.namespace);
        match api.get(&key.name).await {
            Ok(obj) => Ok(Some(snapshot(&key.api_version, &key.kind, obj))),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, node: &ResourceNode) -> Result<CreateOutcome> {
        let obj: DynamicObject = serde_json::from_value(node.to_json()?)
            .map_err(|e| Error::serialization(e.to_string()))?;

        let api = self.api(&node.api_version, &node.kind, &node.metadata.namespace);
        match api.create(&PostParams::default(), &obj).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &ResourceKey) -> Result<DeleteOutcome> {
        let api = self.api(&key.api_version, &key.kind, &key.namespace);
        match api.delete(&key.name, &DeleteParams::default()).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        label_selector: Option<String>,
    ) -> Result<Vec<ResourceSnapshot>> {
        let api = self.api(api_version, kind, namespace);

        let mut params = ListParams::default();
        if let Some(selector) = label_selector.as_deref() {
            params = params.labels(selector);
        }

        let objects = api.list(&params).await?;
        Ok(objects
            .items
            .into_iter()
            .map(|obj| snapshot(api_version, kind, obj))
            .collect())
    }
}

fn snapshot(api_version: &str, kind: &str, obj: DynamicObject) -> ResourceSnapshot {
    let name = obj.metadata.name.clone().unwrap_or_default();
    let namespace = obj.metadata.namespace.clone().unwrap_or_default();
    let annotations = obj
        .metadata
        .annotations
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect();

    ResourceSnapshot {
        key: ResourceKey::new(api_version, kind, namespace, name),
        annotations,
        data: obj.data,
    }
}

/// Build an `ApiResource` from a known apiVersion and kind.
///
/// The version is used exactly as given; translated nodes always carry an
/// explicit apiVersion, so no discovery round-trip is needed.
pub fn api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: pluralize_kind(kind),
    }
}

/// Parse apiVersion into (group, version); core resources have an empty group
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Known resource pluralizations for the kinds the bridge touches
const KIND_PLURALS: &[(&str, &str)] = &[
    ("cluster", "clusters"),
    ("machine", "machines"),
    ("machineset", "machinesets"),
    ("azurecluster", "azureclusters"),
    ("azureclusteridentity", "azureclusteridentities"),
    ("azuremachine", "azuremachines"),
    ("azuremachinetemplate", "azuremachinetemplates"),
];

/// Pluralize a resource kind, falling back to simple rules for unknown kinds
pub fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();

    for (singular, plural) in KIND_PLURALS {
        if *singular == lower {
            return (*plural).to_string();
        }
    }

    if lower.ends_with('s') || lower.ends_with("ch") || lower.ends_with("sh") {
        format!("{}es", lower)
    } else if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") {
        format!("{}ies", &lower[..lower.len() - 1])
    } else {
        format!("{}s", lower)
    }
}

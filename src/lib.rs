//! capi-bridge - translates legacy Machine API provider specs into Cluster API
//! resource graphs and drives them to convergence.
//!
//! The bridge takes the opaque Azure provider spec embedded in a legacy
//! MachineSet, decodes it, derives the CAPI resources the cluster needs
//! (credentials Secret, AzureClusterIdentity, AzureCluster,
//! AzureMachineTemplate, MachineSet), creates them in dependency order with an
//! idempotent create-or-adopt policy, and polls each resource until its
//! readiness predicate holds or a deadline elapses.
//!
//! # Modules
//!
//! - [`spec`] - Typed legacy provider spec and payload decoding
//! - [`credentials`] - Azure credential material from secret mappings
//! - [`graph`] - Resource graph nodes and deterministic naming
//! - [`translate`] - Provider spec to resource graph translation
//! - [`store`] - Resource store abstraction and kube-backed implementation
//! - [`resolver`] - Ordered create-or-adopt application of a graph
//! - [`wait`] - Cancellable convergence polling with readiness predicates
//! - [`cleanup`] - Best-effort reverse-order teardown
//! - [`source`] - Provider spec payload retrieval from legacy machine sets
//! - [`error`] - Error types for the bridge

pub mod cleanup;
pub mod credentials;
pub mod error;
pub mod graph;
pub mod resolver;
pub mod source;
pub mod spec;
pub mod store;
pub mod translate;
pub mod wait;

mod yaml;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================
// Centralized so call sites and test fixtures stay consistent.

/// Default namespace where CAPI resources are managed
pub const DEFAULT_CAPI_NAMESPACE: &str = "openshift-cluster-api";

/// Default namespace where legacy Machine API resources live
pub const DEFAULT_MAPI_NAMESPACE: &str = "openshift-machine-api";

/// Name of the bootstrap credentials secret holding Azure service principal material
pub const BOOTSTRAP_CREDENTIALS_SECRET: &str = "capz-manager-bootstrap-credentials";

/// CAPI core API version (Cluster, MachineSet, Machine)
pub const CAPI_API_VERSION: &str = "cluster.x-k8s.io/v1beta1";

/// Azure infrastructure provider API version (AzureCluster, AzureMachineTemplate)
pub const AZURE_INFRASTRUCTURE_API_VERSION: &str = "infrastructure.cluster.x-k8s.io/v1beta1";

/// Legacy Machine API version (MachineSet carrying the embedded provider spec)
pub const MAPI_API_VERSION: &str = "machine.openshift.io/v1beta1";

/// Annotation marking an infrastructure cluster as externally managed
pub const MANAGED_BY_ANNOTATION: &str = "cluster.x-k8s.io/managed-by";

/// Value this bridge sets on the managed-by annotation
pub const MANAGED_BY_ANNOTATION_VALUE: &str = "infracluster-controller";

/// Label associating a resource with its owning cluster
pub const CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";

/// Label associating a machine with its owning machine set
pub const MACHINE_SET_NAME_LABEL: &str = "cluster.x-k8s.io/set-name";

/// Azure cloud environment targeted by translated clusters
pub const AZURE_ENVIRONMENT_PUBLIC: &str = "AzurePublicCloud";

/// Bootstrap data secret referenced by translated machine sets
pub const WORKER_USER_DATA_SECRET: &str = "worker-user-data";

/// Per-scenario configuration for the bridge.
///
/// Constructed once per migration flow and passed into each component
/// explicitly; there is no global state.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Name of the cluster being bridged; all derived resource names hang off it
    pub cluster_name: String,
    /// Namespace for CAPI resources
    pub capi_namespace: String,
    /// Namespace for legacy Machine API resources
    pub mapi_namespace: String,
    /// Name of the bootstrap credentials secret in the CAPI namespace
    pub bootstrap_credentials_secret: String,
}

impl BridgeConfig {
    /// Create a config for the given cluster with default namespaces
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            capi_namespace: DEFAULT_CAPI_NAMESPACE.to_string(),
            mapi_namespace: DEFAULT_MAPI_NAMESPACE.to_string(),
            bootstrap_credentials_secret: BOOTSTRAP_CREDENTIALS_SECRET.to_string(),
        }
    }

    /// Override the CAPI namespace
    pub fn with_capi_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.capi_namespace = namespace.into();
        self
    }

    /// Override the Machine API namespace
    pub fn with_mapi_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.mapi_namespace = namespace.into();
        self
    }
}

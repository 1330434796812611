//! Provider spec to resource graph translation.
//!
//! Maps a validated [`AzureProviderSpec`] plus externally supplied credentials
//! into the CAPI resource graph: credentials Secret, AzureClusterIdentity,
//! AzureCluster, and AzureMachineTemplate. Translation is pure and
//! deterministic - the same input always yields a structurally equal graph,
//! and every required field is checked before any node is built, so a failed
//! translation never leaves a partial graph behind.

use serde_json::json;

use crate::credentials::AzureCredentials;
use crate::graph::{
    cluster_labels, credentials_secret_name, identity_name, infra_cluster_name,
    machine_set_name, machine_template_name, ResourceGraph, ResourceNode,
};
use crate::spec::AzureProviderSpec;
use crate::{
    BridgeConfig, Result, AZURE_ENVIRONMENT_PUBLIC, AZURE_INFRASTRUCTURE_API_VERSION,
    CAPI_API_VERSION, MACHINE_SET_NAME_LABEL, MANAGED_BY_ANNOTATION, MANAGED_BY_ANNOTATION_VALUE,
    WORKER_USER_DATA_SECRET,
};

/// Translates legacy provider specs into CAPI resource graphs
#[derive(Clone, Debug)]
pub struct Translator {
    config: BridgeConfig,
}

impl Translator {
    /// Create a translator for the given scenario config
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Translate a provider spec and credentials into a resource graph.
    ///
    /// Validates the spec and credentials up front; the graph is only built
    /// once both pass. Nodes are ordered Secret, AzureClusterIdentity,
    /// AzureCluster, AzureMachineTemplate - the order the resolver creates
    /// them in.
    pub fn translate(
        &self,
        spec: &AzureProviderSpec,
        creds: &AzureCredentials,
    ) -> Result<ResourceGraph> {
        spec.validate()?;
        creds.validate()?;

        let mut graph = ResourceGraph::new();
        graph.push(self.credentials_secret(creds));
        graph.push(self.cluster_identity(creds));
        graph.push(self.infra_cluster(spec));
        graph.push(self.machine_template(spec, creds));
        Ok(graph)
    }

    /// Build the machine set referencing the translated machine template.
    ///
    /// Kept separate from [`translate`](Self::translate) because the machine
    /// set is created only after the infrastructure cluster converges.
    pub fn machine_set(&self, replicas: i32) -> ResourceNode {
        let cluster = &self.config.cluster_name;
        let name = machine_set_name(cluster);

        let mut machine_labels = cluster_labels(cluster);
        machine_labels.insert(MACHINE_SET_NAME_LABEL.to_string(), name.clone());

        let spec = json!({
            "clusterName": cluster,
            "replicas": replicas,
            "selector": {
                "matchLabels": &machine_labels
            },
            "template": {
                "metadata": {
                    "labels": &machine_labels
                },
                "spec": {
                    "clusterName": cluster,
                    "bootstrap": {
                        "dataSecretName": WORKER_USER_DATA_SECRET
                    },
                    "infrastructureRef": {
                        "apiVersion": AZURE_INFRASTRUCTURE_API_VERSION,
                        "kind": "AzureMachineTemplate",
                        "name": machine_template_name(cluster)
                    }
                }
            }
        });

        ResourceNode::new(CAPI_API_VERSION, "MachineSet", name, &self.config.capi_namespace)
            .with_labels(cluster_labels(cluster))
            .with_spec(spec)
    }

    /// Credentials secret holding the service principal client secret
    fn credentials_secret(&self, creds: &AzureCredentials) -> ResourceNode {
        ResourceNode::new(
            "v1",
            "Secret",
            credentials_secret_name(&self.config.cluster_name),
            &self.config.capi_namespace,
        )
        .with_string_data(json!({ "clientSecret": creds.client_secret }))
        .immutable()
    }

    /// Cluster identity binding the service principal to the CAPI namespace
    fn cluster_identity(&self, creds: &AzureCredentials) -> ResourceNode {
        let cluster = &self.config.cluster_name;
        let namespace = &self.config.capi_namespace;

        let spec = json!({
            "type": "ServicePrincipal",
            "allowedNamespaces": {
                "list": [namespace]
            },
            "clientID": creds.client_id,
            "tenantID": creds.tenant_id,
            "clientSecret": {
                "name": credentials_secret_name(cluster),
                "namespace": namespace
            }
        });

        ResourceNode::new(
            AZURE_INFRASTRUCTURE_API_VERSION,
            "AzureClusterIdentity",
            identity_name(cluster),
            namespace,
        )
        .with_labels(cluster_labels(cluster))
        .with_spec(spec)
    }

    /// Infrastructure cluster, marked externally managed so the provider's
    /// own controllers leave it alone
    fn infra_cluster(&self, spec: &AzureProviderSpec) -> ResourceNode {
        let cluster = &self.config.cluster_name;
        let namespace = &self.config.capi_namespace;

        let node_spec = json!({
            "location": spec.location,
            "azureEnvironment": AZURE_ENVIRONMENT_PUBLIC,
            "identityRef": {
                "name": identity_name(cluster),
                "namespace": namespace,
                "kind": "AzureClusterIdentity"
            },
            "resourceGroup": spec.resource_group,
            "networkSpec": {
                "nodeOutboundLB": {
                    "name": cluster,
                    "backendPool": {
                        "name": cluster
                    }
                },
                "vnet": {
                    "name": spec.vnet,
                    "resourceGroup": spec.network_resource_group
                }
            }
        });

        ResourceNode::new(
            AZURE_INFRASTRUCTURE_API_VERSION,
            "AzureCluster",
            infra_cluster_name(cluster),
            namespace,
        )
        .with_labels(cluster_labels(cluster))
        .with_annotation(MANAGED_BY_ANNOTATION, MANAGED_BY_ANNOTATION_VALUE)
        .with_spec(node_spec)
    }

    /// Machine template for the default worker role
    fn machine_template(&self, spec: &AzureProviderSpec, creds: &AzureCredentials) -> ResourceNode {
        let cluster = &self.config.cluster_name;

        let template_spec = json!({
            "identity": "UserAssigned",
            "userAssignedIdentities": [
                {
                    "providerID": user_assigned_identity_id(
                        &creds.subscription_id,
                        &spec.resource_group,
                        &spec.managed_identity,
                    )
                }
            ],
            "networkInterfaces": [
                {
                    "privateIPConfigs": 1,
                    "subnetName": spec.subnet,
                    "acceleratedNetworking": spec.accelerated_networking
                }
            ],
            "image": {
                "id": image_resource_id(&creds.subscription_id, &spec.image.resource_id)
            },
            "osDisk": {
                "diskSizeGB": spec.os_disk.disk_size_gb,
                "managedDisk": {
                    "storageAccountType": spec.os_disk.managed_disk.storage_account_type
                },
                "cachingType": spec.os_disk.caching_type,
                "osType": spec.os_disk.os_type
            },
            "disableExtensionOperations": true,
            "sshPublicKey": spec.ssh_public_key,
            "vmSize": spec.vm_size
        });

        ResourceNode::new(
            AZURE_INFRASTRUCTURE_API_VERSION,
            "AzureMachineTemplate",
            machine_template_name(cluster),
            &self.config.capi_namespace,
        )
        .with_labels(cluster_labels(cluster))
        .with_spec(json!({ "template": { "spec": template_spec } }))
    }
}

/// Absolutize a subscription-relative image resource id
fn image_resource_id(subscription_id: &str, resource_id: &str) -> String {
    format!("/subscriptions/{subscription_id}{resource_id}")
}

/// Provider id of a user-assigned managed identity
fn user_assigned_identity_id(
    subscription_id: &str,
    resource_group: &str,
    identity: &str,
) -> String {
    format!(
        "azure:///subscriptions/{subscription_id}/resourcegroups/{resource_group}/providers/Microsoft.ManagedIdentity/userAssignedIdentities/{identity}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ImageReference, ManagedDiskParams, OsDisk};

    fn test_spec() -> AzureProviderSpec {
        AzureProviderSpec {
            location: "centralus".to_string(),
            resource_group: "bridge-rg".to_string(),
            network_resource_group: "bridge-net-rg".to_string(),
            vnet: "bridge-vnet".to_string(),
            subnet: "sub1".to_string(),
            managed_identity: "bridge-identity".to_string(),
            accelerated_networking: true,
            image: ImageReference {
                resource_id: "/resourceGroups/bridge-rg/providers/Microsoft.Compute/images/img1"
                    .to_string(),
            },
            os_disk: OsDisk {
                os_type: "Linux".to_string(),
                disk_size_gb: 128,
                caching_type: "ReadOnly".to_string(),
                managed_disk: ManagedDiskParams {
                    storage_account_type: "Premium_LRS".to_string(),
                },
            },
            vm_size: "Standard_D2s_v3".to_string(),
            ssh_public_key: "c3NoLXJzYSB0ZXN0".to_string(),
        }
    }

    fn test_creds() -> AzureCredentials {
        AzureCredentials {
            client_id: "client".to_string(),
            tenant_id: "tenant".to_string(),
            subscription_id: "sub-1234".to_string(),
            client_secret: "hunter2".to_string(),
        }
    }

    fn translator() -> Translator {
        Translator::new(BridgeConfig::new("test-cluster"))
    }

    #[test]
    fn graph_nodes_follow_dependency_order() {
        let graph = translator().translate(&test_spec(), &test_creds()).unwrap();
        let kinds: Vec<_> = graph.nodes().iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["Secret", "AzureClusterIdentity", "AzureCluster", "AzureMachineTemplate"]
        );
    }

    #[test]
    fn translation_is_deterministic() {
        let translator = translator();
        let first = translator.translate(&test_spec(), &test_creds()).unwrap();
        let second = translator.translate(&test_spec(), &test_creds()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn machine_template_maps_disk_and_size() {
        let graph = translator().translate(&test_spec(), &test_creds()).unwrap();
        let template = graph
            .nodes()
            .iter()
            .find(|n| n.kind == "AzureMachineTemplate")
            .expect("machine template node");

        let spec = &template.spec.as_ref().expect("spec")["template"]["spec"];
        assert_eq!(spec["osDisk"]["diskSizeGB"], 128);
        assert_eq!(spec["osDisk"]["managedDisk"]["storageAccountType"], "Premium_LRS");
        assert_eq!(spec["osDisk"]["cachingType"], "ReadOnly");
        assert_eq!(spec["osDisk"]["osType"], "Linux");
        assert_eq!(spec["vmSize"], "Standard_D2s_v3");
        assert_eq!(spec["disableExtensionOperations"], true);
        assert_eq!(spec["networkInterfaces"][0]["subnetName"], "sub1");
        assert_eq!(spec["networkInterfaces"][0]["acceleratedNetworking"], true);
        assert_eq!(spec["networkInterfaces"][0]["privateIPConfigs"], 1);
    }

    #[test]
    fn image_id_is_prefixed_with_subscription() {
        let graph = translator().translate(&test_spec(), &test_creds()).unwrap();
        let template = graph
            .nodes()
            .iter()
            .find(|n| n.kind == "AzureMachineTemplate")
            .expect("machine template node");

        let image = &template.spec.as_ref().expect("spec")["template"]["spec"]["image"]["id"];
        assert_eq!(
            image,
            "/subscriptions/sub-1234/resourceGroups/bridge-rg/providers/Microsoft.Compute/images/img1"
        );
    }

    #[test]
    fn identity_provider_id_names_the_managed_identity() {
        let graph = translator().translate(&test_spec(), &test_creds()).unwrap();
        let template = graph
            .nodes()
            .iter()
            .find(|n| n.kind == "AzureMachineTemplate")
            .expect("machine template node");

        let provider_id = template.spec.as_ref().expect("spec")["template"]["spec"]
            ["userAssignedIdentities"][0]["providerID"]
            .as_str()
            .expect("providerID");
        assert_eq!(
            provider_id,
            "azure:///subscriptions/sub-1234/resourcegroups/bridge-rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/bridge-identity"
        );
    }

    #[test]
    fn cluster_references_identity_and_identity_references_secret() {
        let graph = translator().translate(&test_spec(), &test_creds()).unwrap();

        let identity = graph
            .nodes()
            .iter()
            .find(|n| n.kind == "AzureClusterIdentity")
            .expect("identity node");
        let secret_ref = &identity.spec.as_ref().expect("spec")["clientSecret"];
        assert_eq!(secret_ref["name"], "test-cluster-cluster-credential");

        let cluster = graph
            .nodes()
            .iter()
            .find(|n| n.kind == "AzureCluster")
            .expect("cluster node");
        let identity_ref = &cluster.spec.as_ref().expect("spec")["identityRef"];
        assert_eq!(identity_ref["name"], "test-cluster");
        assert_eq!(identity_ref["kind"], "AzureClusterIdentity");
    }

    #[test]
    fn infra_cluster_carries_managed_by_annotation_and_network() {
        let graph = translator().translate(&test_spec(), &test_creds()).unwrap();
        let cluster = graph
            .nodes()
            .iter()
            .find(|n| n.kind == "AzureCluster")
            .expect("cluster node");

        assert_eq!(
            cluster.metadata.annotations.get(MANAGED_BY_ANNOTATION),
            Some(&MANAGED_BY_ANNOTATION_VALUE.to_string())
        );

        let spec = cluster.spec.as_ref().expect("spec");
        assert_eq!(spec["location"], "centralus");
        assert_eq!(spec["azureEnvironment"], "AzurePublicCloud");
        assert_eq!(spec["resourceGroup"], "bridge-rg");
        assert_eq!(spec["networkSpec"]["vnet"]["name"], "bridge-vnet");
        assert_eq!(spec["networkSpec"]["vnet"]["resourceGroup"], "bridge-net-rg");
        assert_eq!(spec["networkSpec"]["nodeOutboundLB"]["name"], "test-cluster");
    }

    #[test]
    fn secret_is_immutable_and_holds_client_secret() {
        let graph = translator().translate(&test_spec(), &test_creds()).unwrap();
        let secret = graph
            .nodes()
            .iter()
            .find(|n| n.kind == "Secret")
            .expect("secret node");

        assert_eq!(secret.immutable, Some(true));
        assert_eq!(
            secret.string_data.as_ref().expect("string data")["clientSecret"],
            "hunter2"
        );
    }

    #[test]
    fn missing_vm_size_fails_before_any_node_is_built() {
        let mut spec = test_spec();
        spec.vm_size.clear();

        let err = translator().translate(&spec, &test_creds()).unwrap_err();
        assert_eq!(err.field(), Some("vmSize"));
    }

    #[test]
    fn empty_credential_fails_translation() {
        let mut creds = test_creds();
        creds.subscription_id.clear();

        let err = translator().translate(&test_spec(), &creds).unwrap_err();
        assert!(err.to_string().contains("azure_subscription_id"));
    }

    #[test]
    fn machine_set_references_template_and_bootstrap_secret() {
        let node = translator().machine_set(1);
        assert_eq!(node.kind, "MachineSet");
        assert_eq!(node.metadata.name, "test-cluster-machineset");

        let spec = node.spec.as_ref().expect("spec");
        assert_eq!(spec["replicas"], 1);
        assert_eq!(spec["clusterName"], "test-cluster");
        assert_eq!(
            spec["template"]["spec"]["infrastructureRef"]["name"],
            "test-cluster-machine-template"
        );
        assert_eq!(
            spec["template"]["spec"]["bootstrap"]["dataSecretName"],
            "worker-user-data"
        );
        assert_eq!(
            spec["selector"]["matchLabels"][crate::CLUSTER_NAME_LABEL],
            "test-cluster"
        );
        assert_eq!(
            spec["selector"]["matchLabels"][MACHINE_SET_NAME_LABEL],
            "test-cluster-machineset"
        );
    }
}

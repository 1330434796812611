//! Typed legacy provider spec and payload decoding.
//!
//! The legacy Machine API embeds an opaque provider spec payload in each
//! machine set. [`decode_provider_spec`] turns that payload (YAML or JSON)
//! into a typed [`AzureProviderSpec`]; [`AzureProviderSpec::validate`] then
//! checks the fields translation depends on, naming the first offending field.
//! Decoding is a pure transform with no store access.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{yaml, Error, Result};

/// Type marker discriminating Azure provider spec payloads
pub const PROVIDER_SPEC_KIND: &str = "AzureMachineProviderSpec";

/// Reference to the VM image a machine boots from
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Azure resource id of the image, relative to the subscription
    #[serde(default, rename = "resourceID")]
    pub resource_id: String,
}

/// Managed disk parameters for the OS disk
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskParams {
    /// Storage account type (e.g., "Premium_LRS")
    #[serde(default)]
    pub storage_account_type: String,
}

/// OS disk configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    /// Operating system type (e.g., "Linux")
    #[serde(default)]
    pub os_type: String,
    /// Disk size in GiB
    #[serde(default, rename = "diskSizeGB")]
    pub disk_size_gb: i32,
    /// Host caching mode (e.g., "ReadOnly")
    #[serde(default)]
    pub caching_type: String,
    /// Managed disk parameters
    #[serde(default)]
    pub managed_disk: ManagedDiskParams,
}

/// Legacy Machine API provider spec for Azure machines.
///
/// Decoded once from the embedded payload and treated as immutable afterwards.
/// Unknown fields are tolerated; the legacy object carries more than the
/// bridge maps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureProviderSpec {
    /// Azure region the machines run in
    #[serde(default)]
    pub location: String,
    /// Resource group holding the cluster's compute resources
    #[serde(default)]
    pub resource_group: String,
    /// Resource group holding the cluster's network resources
    #[serde(default)]
    pub network_resource_group: String,
    /// Virtual network name
    #[serde(default)]
    pub vnet: String,
    /// Subnet machines attach to
    #[serde(default)]
    pub subnet: String,
    /// User-assigned managed identity name
    #[serde(default)]
    pub managed_identity: String,
    /// Whether NICs use accelerated networking
    #[serde(default)]
    pub accelerated_networking: bool,
    /// Boot image reference
    #[serde(default)]
    pub image: ImageReference,
    /// OS disk configuration
    #[serde(default)]
    pub os_disk: OsDisk,
    /// Azure VM size (e.g., "Standard_D2s_v3")
    #[serde(default)]
    pub vm_size: String,
    /// SSH public key installed on machines
    #[serde(default)]
    pub ssh_public_key: String,
}

impl AzureProviderSpec {
    /// Check that every field translation depends on is present.
    ///
    /// Fails on the first missing field so callers never build a partial
    /// resource graph from an under-specified input.
    pub fn validate(&self) -> Result<()> {
        if self.subnet.is_empty() {
            return Err(Error::validation("subnet", "must not be empty"));
        }
        if self.image.resource_id.is_empty() {
            return Err(Error::validation("image.resourceID", "must not be empty"));
        }
        if self.os_disk.managed_disk.storage_account_type.is_empty() {
            return Err(Error::validation(
                "osDisk.managedDisk.storageAccountType",
                "must not be empty",
            ));
        }
        if self.os_disk.disk_size_gb <= 0 {
            return Err(Error::validation("osDisk.diskSizeGB", "must be positive"));
        }
        if self.os_disk.os_type.is_empty() {
            return Err(Error::validation("osDisk.osType", "must not be empty"));
        }
        if self.vm_size.is_empty() {
            return Err(Error::validation("vmSize", "must not be empty"));
        }
        Ok(())
    }
}

/// Decode a raw provider spec payload (YAML or JSON) into a typed spec.
///
/// Rejects empty payloads and payloads without the [`PROVIDER_SPEC_KIND`]
/// type marker. Field-level validation is separate; see
/// [`AzureProviderSpec::validate`].
pub fn decode_provider_spec(raw: &str) -> Result<AzureProviderSpec> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::decode("empty provider spec payload"));
    }

    let value = if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(|e| Error::decode(e.to_string()))?
    } else {
        yaml::parse_yaml(trimmed)?
    };

    decode_provider_spec_value(&value)
}

/// Decode an already-parsed provider spec value into a typed spec.
///
/// Used when the payload arrives pre-parsed, e.g. extracted from a machine
/// set's embedded provider config.
pub fn decode_provider_spec_value(value: &Value) -> Result<AzureProviderSpec> {
    let kind = value
        .get("kind")
        .and_then(|k| k.as_str())
        .ok_or_else(|| Error::decode_field("kind", "payload missing type marker"))?;

    if kind != PROVIDER_SPEC_KIND {
        return Err(Error::decode_field(
            "kind",
            format!("expected {PROVIDER_SPEC_KIND}, got {kind}"),
        ));
    }

    serde_json::from_value(value.clone()).map_err(|e| Error::decode(e.to_string()))
}

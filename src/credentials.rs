//! Azure credential material for translated clusters.
//!
//! Credentials come from a bootstrap secret keyed by well-known names. A
//! missing or empty key is a credential error naming the key, surfaced before
//! any resource is built.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};

use crate::{Error, Result};

/// Well-known secret key for the service principal client id
pub const CLIENT_ID_KEY: &str = "azure_client_id";
/// Well-known secret key for the tenant id
pub const TENANT_ID_KEY: &str = "azure_tenant_id";
/// Well-known secret key for the subscription id
pub const SUBSCRIPTION_ID_KEY: &str = "azure_subscription_id";
/// Well-known secret key for the service principal client secret
pub const CLIENT_SECRET_KEY: &str = "azure_client_secret";

/// Azure service principal credentials for the CAPZ provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AzureCredentials {
    /// Service principal client id
    pub client_id: String,
    /// Azure AD tenant id
    pub tenant_id: String,
    /// Subscription id, used to absolutize image and identity resource ids
    pub subscription_id: String,
    /// Service principal client secret
    pub client_secret: String,
}

impl AzureCredentials {
    /// Build credentials from a secret's data mapping.
    ///
    /// Keys are the well-known `azure_*` names; each must be present and
    /// decode as UTF-8.
    pub fn from_mapping(data: &BTreeMap<String, Vec<u8>>) -> Result<Self> {
        Ok(Self {
            client_id: required_key(data, CLIENT_ID_KEY)?,
            tenant_id: required_key(data, TENANT_ID_KEY)?,
            subscription_id: required_key(data, SUBSCRIPTION_ID_KEY)?,
            client_secret: required_key(data, CLIENT_SECRET_KEY)?,
        })
    }

    /// Check that no credential field is empty
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::credential(CLIENT_ID_KEY, "must not be empty"));
        }
        if self.tenant_id.is_empty() {
            return Err(Error::credential(TENANT_ID_KEY, "must not be empty"));
        }
        if self.subscription_id.is_empty() {
            return Err(Error::credential(SUBSCRIPTION_ID_KEY, "must not be empty"));
        }
        if self.client_secret.is_empty() {
            return Err(Error::credential(CLIENT_SECRET_KEY, "must not be empty"));
        }
        Ok(())
    }
}

fn required_key(data: &BTreeMap<String, Vec<u8>>, key: &str) -> Result<String> {
    let bytes = data
        .get(key)
        .ok_or_else(|| Error::credential(key, "key absent from secret"))?;
    String::from_utf8(bytes.clone()).map_err(|_| Error::credential(key, "value is not UTF-8"))
}

/// Fetch Azure credentials from a secret in the given namespace.
///
/// Reads the secret with the typed API so the server's base64 encoding is
/// already undone, then extracts the well-known keys.
pub async fn fetch_azure_credentials(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<AzureCredentials> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let secret = secrets.get(name).await?;

    let data: BTreeMap<String, Vec<u8>> = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.0))
        .collect();

    AzureCredentials::from_mapping(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> BTreeMap<String, Vec<u8>> {
        BTreeMap::from([
            (CLIENT_ID_KEY.to_string(), b"client".to_vec()),
            (TENANT_ID_KEY.to_string(), b"tenant".to_vec()),
            (SUBSCRIPTION_ID_KEY.to_string(), b"sub-1234".to_vec()),
            (CLIENT_SECRET_KEY.to_string(), b"hunter2".to_vec()),
        ])
    }

    #[test]
    fn builds_from_complete_mapping() {
        let creds = AzureCredentials::from_mapping(&mapping()).unwrap();
        assert_eq!(creds.subscription_id, "sub-1234");
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn missing_key_is_named() {
        let mut data = mapping();
        data.remove(SUBSCRIPTION_ID_KEY);
        let err = AzureCredentials::from_mapping(&data).unwrap_err();
        assert!(err.to_string().contains(SUBSCRIPTION_ID_KEY));
        assert!(!err.is_retryable());
    }

    #[test]
    fn empty_value_fails_validation() {
        let mut creds = AzureCredentials::from_mapping(&mapping()).unwrap();
        creds.tenant_id.clear();
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains(TENANT_ID_KEY));
    }

    #[test]
    fn non_utf8_value_is_rejected() {
        let mut data = mapping();
        data.insert(CLIENT_SECRET_KEY.to_string(), vec![0xff, 0xfe]);
        let err = AzureCredentials::from_mapping(&data).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}

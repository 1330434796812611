//! Provider spec payload retrieval from legacy machine sets.
//!
//! The legacy Machine API embeds each machine's provider config inside the
//! machine set object. The bridge reads the first machine set in the legacy
//! namespace and decodes its embedded payload; an empty namespace means there
//! is nothing to migrate and is a hard error.

use tracing::debug;

use crate::spec::{decode_provider_spec_value, AzureProviderSpec};
use crate::store::ResourceStore;
use crate::{Error, Result, MAPI_API_VERSION};

/// JSON pointer to the embedded provider spec inside a machine set
const PROVIDER_SPEC_POINTER: &str = "/spec/template/spec/providerSpec/value";

/// Fetch and decode the provider spec embedded in the first legacy machine set
pub async fn fetch_provider_spec<S>(store: &S, mapi_namespace: &str) -> Result<AzureProviderSpec>
where
    S: ResourceStore + ?Sized,
{
    let machine_sets = store
        .list(MAPI_API_VERSION, "MachineSet", mapi_namespace, None)
        .await?;

    let first = machine_sets.first().ok_or_else(|| {
        Error::decode(format!("no machine sets found in {mapi_namespace}"))
    })?;

    let payload = first.pointer(PROVIDER_SPEC_POINTER).ok_or_else(|| {
        Error::decode_field(
            "providerSpec.value",
            "machine set has no embedded provider spec",
        )
    })?;

    debug!(machine_set = %first.key, "decoding embedded provider spec");
    decode_provider_spec_value(payload)
}

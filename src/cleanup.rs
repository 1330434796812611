//! Best-effort reverse-order teardown.
//!
//! Deletes created resources in strictly reverse creation order, continuing
//! past "not found" and past genuine failures alike. Failures other than
//! absence are collected and surfaced once as an aggregate error after the
//! full pass, so a single stuck resource never blocks the rest of the
//! teardown.

use tracing::{debug, info, warn};

use crate::error::CleanupFailure;
use crate::graph::ResourceKey;
use crate::store::{DeleteOutcome, ResourceStore};
use crate::{Error, Result};

/// Delete the given resources in reverse order.
///
/// `keys` is the creation-ordered list returned by the resolver; deletion
/// walks it back to front so dependents go before their dependencies.
pub async fn cleanup<S>(store: &S, keys: &[ResourceKey]) -> Result<()>
where
    S: ResourceStore + ?Sized,
{
    let mut failures = Vec::new();

    for key in keys.iter().rev() {
        match store.delete(key).await {
            Ok(DeleteOutcome::Deleted) => {
                info!(resource = %key, "deleted resource");
            }
            Ok(DeleteOutcome::NotFound) => {
                debug!(resource = %key, "resource already gone");
            }
            Err(e) => {
                warn!(resource = %key, error = %e, "deletion failed, continuing teardown");
                failures.push(CleanupFailure {
                    resource: key.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Cleanup { failures })
    }
}

//! Ordered create-or-adopt application of a resource graph.
//!
//! Each node is checked for existence by key before creation: a present
//! resource is adopted, not an error, so a second pass over the same graph
//! succeeds without issuing any creates. A create that fails for any reason
//! other than already-exists is fatal and aborts the remaining sequence - no
//! dependent resource is attempted after a genuine failure.

use tracing::{debug, info};

use crate::graph::{ResourceGraph, ResourceKey};
use crate::store::{CreateOutcome, ResourceStore};
use crate::{Error, Result};

/// Applies a resource graph against a live store in dependency order
pub struct Resolver<'a, S: ResourceStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ResourceStore + ?Sized> Resolver<'a, S> {
    /// Create a resolver over the given store
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create or adopt every node in the graph, in order.
    ///
    /// Returns the keys of all satisfied nodes in creation order; callers
    /// hand this list to the cleanup orchestrator for reverse teardown.
    pub async fn apply(&self, graph: &ResourceGraph) -> Result<Vec<ResourceKey>> {
        let mut satisfied = Vec::with_capacity(graph.len());

        for node in graph.nodes() {
            let key = node.key();

            if self.store.get(&key).await?.is_some() {
                debug!(resource = %key, "resource already present, adopting");
                satisfied.push(key);
                continue;
            }

            match self.store.create(node).await {
                Ok(CreateOutcome::Created) => {
                    info!(resource = %key, "created resource");
                }
                Ok(CreateOutcome::AlreadyExists) => {
                    // Appeared between the existence check and the create
                    debug!(resource = %key, "resource appeared concurrently, adopting");
                }
                Err(e) => {
                    return Err(Error::creation(&node.kind, &node.metadata.name, &e));
                }
            }

            satisfied.push(key);
        }

        Ok(satisfied)
    }
}

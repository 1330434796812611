//! Cancellable convergence polling with readiness predicates.
//!
//! [`wait_for`] polls a resource at a fixed interval until a predicate holds
//! or a deadline elapses, returning a tagged [`WaitOutcome`] instead of
//! looping forever. A poll that hits a transient retrieval error counts as
//! "not ready yet" and is retried; a non-transient error fails the wait
//! immediately. The interval/deadline pair is caller-supplied so call sites
//! can pick short or long profiles. Dropping the returned future cancels the
//! wait; no polling loop outlives its caller.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::graph::ResourceKey;
use crate::store::{ResourceSnapshot, ResourceStore};
use crate::{Error, Result, MANAGED_BY_ANNOTATION};

/// Interval/deadline pair governing one convergence wait
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitConfig {
    /// Time between polling attempts
    pub interval: Duration,
    /// Total time before the wait reports [`WaitOutcome::TimedOut`]
    pub deadline: Duration,
}

/// Default polling interval shared by the wait profiles
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

impl WaitConfig {
    /// Create a config with explicit interval and deadline
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }

    /// Short profile (5 minutes) for resources that converge quickly
    pub fn short() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, Duration::from_secs(300))
    }

    /// Medium profile (10 minutes) for machine set scale-up
    pub fn medium() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, Duration::from_secs(600))
    }

    /// Long profile (30 minutes) for full infrastructure provisioning
    pub fn long() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, Duration::from_secs(1800))
    }
}

/// Terminal result of a convergence wait
#[derive(Clone, Debug, PartialEq)]
pub enum WaitOutcome {
    /// The readiness predicate held; carries the observed snapshot
    Ready(ResourceSnapshot),
    /// The resource is gone (deletion waits)
    Absent,
    /// The deadline elapsed before the predicate held
    TimedOut,
}

impl WaitOutcome {
    /// Whether the wait ended in the desired state
    pub fn succeeded(&self) -> bool {
        !matches!(self, WaitOutcome::TimedOut)
    }

    /// Unwrap the ready snapshot, mapping a timeout to [`Error::Timeout`]
    pub fn into_ready(self, what: impl Into<String>, config: &WaitConfig) -> Result<ResourceSnapshot> {
        match self {
            WaitOutcome::Ready(snapshot) => Ok(snapshot),
            WaitOutcome::Absent | WaitOutcome::TimedOut => {
                Err(Error::timeout(what, config.deadline))
            }
        }
    }
}

/// Poll a resource until the readiness predicate holds or the deadline elapses.
///
/// A missing resource counts as "not ready yet" - creation may still be
/// propagating. The deadline is checked before each poll, so a wait can
/// overshoot it by at most one interval.
pub async fn wait_for<S, P>(
    store: &S,
    key: &ResourceKey,
    config: &WaitConfig,
    predicate: P,
) -> Result<WaitOutcome>
where
    S: ResourceStore + ?Sized,
    P: Fn(&ResourceSnapshot) -> bool,
{
    let start = Instant::now();

    loop {
        if start.elapsed() >= config.deadline {
            debug!(resource = %key, waited = ?start.elapsed(), "convergence deadline elapsed");
            return Ok(WaitOutcome::TimedOut);
        }

        match store.get(key).await {
            Ok(Some(snapshot)) if predicate(&snapshot) => {
                debug!(resource = %key, "readiness predicate holds");
                return Ok(WaitOutcome::Ready(snapshot));
            }
            Ok(Some(_)) => {
                trace!(resource = %key, "not ready yet");
            }
            Ok(None) => {
                trace!(resource = %key, "resource not found yet");
            }
            Err(e) if e.is_retryable() => {
                debug!(resource = %key, error = %e, "transient retrieval error, retrying");
            }
            Err(e) => return Err(e),
        }

        sleep(config.interval).await;
    }
}

/// Poll until a resource is gone or the deadline elapses.
///
/// Used after teardown to confirm deletion actually completed.
pub async fn wait_for_deleted<S>(
    store: &S,
    key: &ResourceKey,
    config: &WaitConfig,
) -> Result<WaitOutcome>
where
    S: ResourceStore + ?Sized,
{
    let start = Instant::now();

    loop {
        if start.elapsed() >= config.deadline {
            debug!(resource = %key, waited = ?start.elapsed(), "deletion deadline elapsed");
            return Ok(WaitOutcome::TimedOut);
        }

        match store.get(key).await {
            Ok(None) => {
                debug!(resource = %key, "resource is gone");
                return Ok(WaitOutcome::Absent);
            }
            Ok(Some(_)) => {
                trace!(resource = %key, "resource still present");
            }
            Err(e) if e.is_retryable() => {
                debug!(resource = %key, error = %e, "transient retrieval error, retrying");
            }
            Err(e) => return Err(e),
        }

        sleep(config.interval).await;
    }
}

// =============================================================================
// Readiness predicates
// =============================================================================

/// Infrastructure cluster readiness: the externally-managed marker must be
/// present and the status must report ready.
///
/// The marker check matters because the status can flip ready before the
/// managing controller has stamped the resource, and adopting an unmarked
/// cluster would hand it back to the provider's own controllers.
pub fn cluster_ready(snapshot: &ResourceSnapshot) -> bool {
    snapshot.annotation(MANAGED_BY_ANNOTATION).is_some() && snapshot.status_bool("ready")
}

/// Machine set readiness for the desired replica count: total, ready, and
/// available replicas must all have converged.
pub fn machine_set_ready(desired: i64) -> impl Fn(&ResourceSnapshot) -> bool {
    move |snapshot| {
        snapshot.status_i64("replicas") == Some(desired)
            && snapshot.status_i64("readyReplicas") == Some(desired)
            && snapshot.status_i64("availableReplicas") == Some(desired)
    }
}

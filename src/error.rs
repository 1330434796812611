//! Error types for the bridge
//!
//! Errors are structured with fields to aid debugging in production. Each
//! variant carries the context a caller needs to act on it: the offending
//! field, the missing credential key, the resource that failed to create.

use std::time::Duration;

use thiserror::Error;

/// A single failed deletion recorded during teardown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    /// Display form of the resource key that failed to delete
    pub resource: String,
    /// Description of what went wrong
    pub message: String,
}

impl std::fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.resource, self.message)
    }
}

/// Main error type for bridge operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Malformed provider spec payload
    #[error("decode error: {message}")]
    Decode {
        /// Description of what's malformed
        message: String,
        /// The malformed field, when one can be named
        field: Option<String>,
    },

    /// A required provider spec field is missing or invalid
    #[error("validation error for field {field}: {message}")]
    Validation {
        /// The invalid field path (e.g., "vmSize")
        field: String,
        /// Description of what's invalid
        message: String,
    },

    /// A required credential key is absent or empty
    #[error("credential error for key {key}: {message}")]
    Credential {
        /// The well-known secret key (e.g., "azure_client_id")
        key: String,
        /// Description of what's missing
        message: String,
    },

    /// The store rejected a create for a reason other than already-exists
    #[error("creation error for {kind} {name}: {message}")]
    Creation {
        /// Kind of the resource that failed to create
        kind: String,
        /// Name of the resource that failed to create
        name: String,
        /// Description of what failed
        message: String,
        /// Whether the underlying store error was transient
        retryable: bool,
    },

    /// Generic resource store failure
    #[error("store error: {message}")]
    Store {
        /// Description of what failed
        message: String,
        /// Whether this error is transient
        retryable: bool,
    },

    /// A convergence predicate never held within its deadline
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout {
        /// What was being waited on
        what: String,
        /// How long the waiter polled before giving up
        waited: Duration,
    },

    /// Aggregate of non-"not found" deletion failures from a teardown pass
    #[error("cleanup failed for {} resource(s)", .failures.len())]
    Cleanup {
        /// One entry per resource whose deletion genuinely failed
        failures: Vec<CleanupFailure>,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a decode error with the given message
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a decode error naming the malformed field
    pub fn decode_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a validation error naming the offending field
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create a credential error naming the missing key
    pub fn credential(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Credential {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create a creation error for the given resource, inheriting the
    /// underlying error's retryability
    pub fn creation(kind: impl Into<String>, name: impl Into<String>, source: &Error) -> Self {
        Self::Creation {
            kind: kind.into(),
            name: name.into(),
            message: source.to_string(),
            retryable: source.is_retryable(),
        }
    }

    /// Create a transient store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
            retryable: true,
        }
    }

    /// Create a non-retryable store error (e.g., malformed response)
    pub fn store_permanent(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
            retryable: false,
        }
    }

    /// Create a timeout error
    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            waited,
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Check if this error is transient.
    ///
    /// Decode, validation, credential, and serialization errors require a
    /// config fix and never retry. Store errors carry their own retryability.
    /// Kubernetes errors retry unless the API rejected the request outright.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => {
                // Retry on transient K8s errors (connection, timeout).
                // Don't retry on 4xx errors (validation, not found, conflict).
                !matches!(
                    source,
                    kube::Error::Api(ae) if (400..500).contains(&ae.code)
                )
            }
            Error::Decode { .. } => false,
            Error::Validation { .. } => false,
            Error::Credential { .. } => false,
            Error::Creation { retryable, .. } => *retryable,
            Error::Store { retryable, .. } => *retryable,
            Error::Timeout { .. } => true,
            Error::Cleanup { .. } => true,
            Error::Serialization { .. } => false,
        }
    }

    /// Get the offending field if this error names one
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Decode { field, .. } => field.as_deref(),
            Error::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

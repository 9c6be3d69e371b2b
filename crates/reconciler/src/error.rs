//! Reconciler error types.

use cloud_provider::ProviderError;
use cluster_types::{NameError, ResourceKind};
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a whole reconciliation
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The static resource graph is inconsistent. Indicates a programming defect.
    #[error("Invalid resource graph: {0}")]
    Configuration(String),

    /// A lookup used for planning failed
    #[error("Failed to retrieve {kind} [{name}] for cluster [{cluster}]: {source}")]
    Inspection {
        kind: ResourceKind,
        name: String,
        cluster: String,
        source: ProviderError,
    },

    /// Invalid cluster name
    #[error(transparent)]
    InvalidName(#[from] NameError),

    /// The network for new instances could not be resolved
    #[error("Failed to resolve network: {0}")]
    Network(#[source] ProviderError),
}

/// Why a single plan action failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Rejected by the control plane; not retried
    #[error("{0}")]
    Permanent(String),

    /// Still failing transiently after the last allowed attempt
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// A previous deletion did not finish in time
    #[error("timed out after {waited:?} waiting for the previous deletion to finish")]
    Timeout { waited: Duration },

    /// Creation parameters were not supplied
    #[error("missing parameter: {0}")]
    MissingParameter(String),
}

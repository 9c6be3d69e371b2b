//! Cluster resource types
//!
//! Shared definitions for the resources that make up a managed cluster:
//! the fixed set of resource kinds, their observed lifecycle, and the
//! deterministic names derived from a cluster name.

pub mod kind;
pub mod naming;
pub mod state;

pub use kind::*;
pub use naming::*;
pub use state::*;

/// Tag written on every resource this tool creates. Its presence marks the
/// resource as managed; the value is the RFC 3339 creation time.
pub const PROVENANCE_TAG: &str = "clusterctl_created_timestamp";

/// Tag carrying the owning cluster name.
pub const CLUSTER_TAG: &str = "clusterctl_cluster";

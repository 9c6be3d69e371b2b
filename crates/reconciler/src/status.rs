//! Status reporting
//!
//! Read-only projection of inspected state for display.

use crate::inspector::ClusterState;
use cloud_provider::Network;
use cluster_types::{Lifecycle, ResourceDetails, ResourceKind};
use serde::Serialize;

/// Displayed state of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    /// Resource kind
    pub kind: ResourceKind,
    /// Resource name
    pub name: String,
    /// Classified lifecycle
    pub lifecycle: Lifecycle,
    /// Present in any form
    pub exists: bool,
    /// Carries the provenance marker
    pub managed: bool,
    /// Kind-specific details for display
    #[serde(skip_serializing_if = "is_none")]
    pub details: ResourceDetails,
}

/// Snapshot of one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterStatus {
    /// Cluster name
    pub cluster: String,
    /// Default network, when it could be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    /// One entry per kind
    pub resources: Vec<ResourceStatus>,
}

impl ClusterStatus {
    /// Status of `kind`
    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceStatus> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Number of resources that currently exist
    pub fn present_count(&self) -> usize {
        self.resources.iter().filter(|r| r.exists).count()
    }

    /// Attach the resolved network
    #[must_use]
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }
}

fn is_none(details: &ResourceDetails) -> bool {
    *details == ResourceDetails::None
}

/// Project inspected state into a status snapshot, one entry per kind
pub fn report(state: &ClusterState) -> ClusterStatus {
    let resources = state
        .iter()
        .map(|resource| ResourceStatus {
            kind: resource.kind,
            name: resource.name.clone(),
            lifecycle: resource.lifecycle,
            exists: resource.exists(),
            managed: resource.is_managed(),
            details: if resource.exists() {
                resource.details.clone()
            } else {
                ResourceDetails::None
            },
        })
        .collect();

    ClusterStatus {
        cluster: state.cluster().to_string(),
        network: None,
        resources,
    }
}

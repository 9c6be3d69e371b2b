//! Observed resource state

use crate::kind::ResourceKind;
use crate::PROVENANCE_TAG;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle of a resource as reported by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Not found (or only a deleted tombstone remains)
    Absent,
    /// Present and reported ready
    Active,
    /// Present without an explicit ready status; treated as usable
    Pending,
    /// Deletion in progress
    Terminating,
}

/// Kind-specific attributes reported alongside a resource.
///
/// Only used for display; planning never looks at these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(missing_docs, reason = "fields mirror the control plane API")]
pub enum ResourceDetails {
    /// Nothing beyond name and status
    #[default]
    None,
    /// Instance counts
    ScalingGroup {
        current_instances: u32,
        desired_capacity: u32,
        min_size: u32,
        max_size: u32,
    },
    /// Workload counts
    ComputeCluster {
        active_services: u32,
        running_tasks: u32,
        pending_tasks: u32,
        container_instances: u32,
    },
    /// Launch settings
    LaunchTemplate {
        instance_profile: String,
        instance_type: String,
        image_id: String,
        key_name: String,
        security_groups: Vec<String>,
    },
}

/// State of one resource kind for a cluster, freshly inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource kind
    pub kind: ResourceKind,
    /// Resource name
    pub name: String,
    /// Classified lifecycle
    pub lifecycle: Lifecycle,
    /// Empty when the resource is absent
    pub tags: BTreeMap<String, String>,
    /// Kind-specific details for display
    pub details: ResourceDetails,
}

impl ResourceState {
    /// State for a resource that was not found
    #[must_use]
    pub fn absent(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            lifecycle: Lifecycle::Absent,
            tags: BTreeMap::new(),
            details: ResourceDetails::None,
        }
    }

    /// Whether the resource is present in any form, terminating included
    #[must_use]
    pub fn exists(&self) -> bool {
        self.lifecycle != Lifecycle::Absent
    }

    /// Whether the resource carries the provenance marker
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.tags.contains_key(PROVENANCE_TAG)
    }
}

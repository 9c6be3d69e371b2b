//! State inspection
//!
//! Reads the current state of every resource kind from the control plane.
//! Nothing is cached: each reconciliation starts from a fresh inspection.
//! Read failures are not retried here; they abort the reconciliation.

use crate::error::ReconcileError;
use cloud_provider::{ProviderError, ResourceProvider};
use cluster_types::{ClusterNames, Lifecycle, ResourceKind, ResourceState};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Inspected state of all resource kinds of one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterState {
    cluster: String,
    states: BTreeMap<ResourceKind, ResourceState>,
}

impl ClusterState {
    /// State of `cluster` from already inspected resources
    pub fn new(cluster: impl Into<String>, states: impl IntoIterator<Item = ResourceState>) -> Self {
        Self {
            cluster: cluster.into(),
            states: states.into_iter().map(|s| (s.kind, s)).collect(),
        }
    }

    /// Cluster name
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// State of `kind`, if it was inspected
    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceState> {
        self.states.get(&kind)
    }

    /// Lifecycle of `kind`; kinds that were never inspected count as absent
    #[must_use]
    pub fn lifecycle(&self, kind: ResourceKind) -> Lifecycle {
        self.states.get(&kind).map_or(Lifecycle::Absent, |s| s.lifecycle)
    }

    /// Inspected states in kind order
    pub fn iter(&self) -> impl Iterator<Item = &ResourceState> {
        self.states.values()
    }
}

/// Map a raw control plane status to a lifecycle.
///
/// Scaling groups only report a status while they are being deleted, so any
/// status at all means terminating. For every other kind the status is
/// matched case-insensitively; a missing or unknown status means the resource
/// exists and is usable.
#[must_use]
pub fn classify(kind: ResourceKind, status: Option<&str>) -> Lifecycle {
    let status = status.map(str::trim).filter(|s| !s.is_empty());

    if kind == ResourceKind::ScalingGroup {
        return match status {
            None => Lifecycle::Pending,
            Some(_) => Lifecycle::Terminating,
        };
    }

    let Some(status) = status else {
        return Lifecycle::Pending;
    };
    match status.to_ascii_lowercase().as_str() {
        "active" | "available" | "ready" | "inservice" => Lifecycle::Active,
        "deleting" | "terminating" | "deprovisioning" | "delete in progress" => Lifecycle::Terminating,
        "inactive" | "deleted" => Lifecycle::Absent,
        _ => Lifecycle::Pending,
    }
}

/// Reads resource state from the control plane
pub struct StateInspector {
    provider: Arc<dyn ResourceProvider>,
}

impl std::fmt::Debug for StateInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateInspector").finish_non_exhaustive()
    }
}

impl StateInspector {
    /// Inspector reading through `provider`
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Inspect every resource kind of the cluster named by `names`
    pub async fn inspect(&self, names: &ClusterNames) -> Result<ClusterState, ReconcileError> {
        info!("Inspecting resources of cluster [{}]", names.cluster());

        let mut states = Vec::with_capacity(ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            let name = names.name_for(kind);
            let state = self.inspect_one(kind, &name).await.map_err(|source| ReconcileError::Inspection {
                kind,
                name: name.clone(),
                cluster: names.cluster().to_string(),
                source,
            })?;
            debug!("{} [{}]: {:?}", kind, name, state.lifecycle);
            states.push(state);
        }

        Ok(ClusterState::new(names.cluster(), states))
    }

    async fn inspect_one(&self, kind: ResourceKind, name: &str) -> Result<ResourceState, ProviderError> {
        let Some(observed) = self.provider.get_by_name(kind, name).await? else {
            return Ok(ResourceState::absent(kind, name));
        };

        let lifecycle = classify(kind, observed.status.as_deref());
        if lifecycle == Lifecycle::Absent {
            return Ok(ResourceState::absent(kind, name));
        }

        let tags = match self.provider.list_tags(kind, name).await {
            Ok(tags) => tags,
            // Deleted between the two reads
            Err(ProviderError::NotFound(_)) => return Ok(ResourceState::absent(kind, name)),
            Err(e) => return Err(e),
        };

        Ok(ResourceState {
            kind,
            name: name.to_string(),
            lifecycle,
            tags,
            details: observed.details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_provider::MockProvider;
    use cluster_types::PROVENANCE_TAG;

    #[test]
    fn test_classify_scaling_group() {
        assert_eq!(classify(ResourceKind::ScalingGroup, None), Lifecycle::Pending);
        assert_eq!(classify(ResourceKind::ScalingGroup, Some("  ")), Lifecycle::Pending);
        assert_eq!(
            classify(ResourceKind::ScalingGroup, Some("Delete in progress")),
            Lifecycle::Terminating
        );
    }

    #[test]
    fn test_classify_other_kinds() {
        assert_eq!(classify(ResourceKind::ComputeCluster, Some("ACTIVE")), Lifecycle::Active);
        assert_eq!(classify(ResourceKind::ComputeCluster, Some("INACTIVE")), Lifecycle::Absent);
        assert_eq!(
            classify(ResourceKind::ComputeCluster, Some("DEPROVISIONING")),
            Lifecycle::Terminating
        );
        assert_eq!(classify(ResourceKind::ComputeCluster, Some("PROVISIONING")), Lifecycle::Pending);
        assert_eq!(classify(ResourceKind::ServiceRole, None), Lifecycle::Pending);
        assert_eq!(classify(ResourceKind::InstanceSecurityGroup, Some("available")), Lifecycle::Active);
    }

    #[tokio::test]
    async fn test_inspect_empty_cluster() {
        let mock = MockProvider::new();
        let inspector = StateInspector::new(Arc::new(mock));
        let names = ClusterNames::new("demo").unwrap();

        let state = inspector.inspect(&names).await.unwrap();
        assert_eq!(state.cluster(), "demo");
        for kind in ResourceKind::ALL {
            let resource = state.get(kind).unwrap();
            assert_eq!(resource.lifecycle, Lifecycle::Absent);
            assert_eq!(resource.name, names.name_for(kind));
        }
    }

    #[tokio::test]
    async fn test_inspect_reads_tags_of_present_resources() {
        let mock = MockProvider::new();
        let names = ClusterNames::new("demo").unwrap();
        mock.insert_managed(
            ResourceKind::ComputeCluster,
            &names.name_for(ResourceKind::ComputeCluster),
            Some("ACTIVE"),
        );
        mock.insert(
            ResourceKind::InstanceSecurityGroup,
            &names.name_for(ResourceKind::InstanceSecurityGroup),
            None,
            BTreeMap::new(),
        );

        let state = StateInspector::new(Arc::new(mock)).inspect(&names).await.unwrap();
        let cluster = state.get(ResourceKind::ComputeCluster).unwrap();
        assert_eq!(cluster.lifecycle, Lifecycle::Active);
        assert!(cluster.tags.contains_key(PROVENANCE_TAG));

        let group = state.get(ResourceKind::InstanceSecurityGroup).unwrap();
        assert_eq!(group.lifecycle, Lifecycle::Pending);
        assert!(!group.is_managed());
    }

    #[tokio::test]
    async fn test_inactive_cluster_is_absent() {
        let mock = MockProvider::new();
        let names = ClusterNames::new("demo").unwrap();
        mock.insert_managed(ResourceKind::ComputeCluster, "clusterctl-demo", Some("INACTIVE"));

        let state = StateInspector::new(Arc::new(mock)).inspect(&names).await.unwrap();
        assert_eq!(state.lifecycle(ResourceKind::ComputeCluster), Lifecycle::Absent);
        assert!(state.get(ResourceKind::ComputeCluster).unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_names_kind_and_cluster() {
        let mock = MockProvider::new();
        mock.fail_reads(ResourceKind::LaunchTemplate, "access denied");
        let names = ClusterNames::new("demo").unwrap();

        let err = StateInspector::new(Arc::new(mock)).inspect(&names).await.unwrap_err();
        match &err {
            ReconcileError::Inspection { kind, name, cluster, .. } => {
                assert_eq!(*kind, ResourceKind::LaunchTemplate);
                assert_eq!(name, "clusterctl-demo-lt");
                assert_eq!(cluster, "demo");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("access denied"));
    }
}

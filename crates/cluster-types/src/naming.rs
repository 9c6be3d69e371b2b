//! Deterministic resource names
//!
//! Every resource of a cluster is found again purely by name, so names are
//! derived from the cluster name and nothing else. An operator may supply an
//! existing resource instead (currently the instance profile); such a kind is
//! referenced by its given name but never created or deleted.

use crate::kind::ResourceKind;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

const NAME_PREFIX: &str = "clusterctl-";
const MAX_CLUSTER_NAME_LEN: usize = 32;

/// Cluster name validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("cluster name is empty")]
    Empty,

    #[error("cluster name [{0}] is longer than 32 characters")]
    TooLong(String),

    #[error("cluster name [{0}] may only contain letters, digits, '-' and '_'")]
    InvalidCharacter(String),
}

/// Names of all resources belonging to one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterNames {
    cluster: String,
    overrides: BTreeMap<ResourceKind, String>,
}

impl ClusterNames {
    /// Validate a cluster name and derive resource names from it.
    ///
    /// Leading and trailing whitespace is ignored.
    pub fn new(cluster: &str) -> Result<Self, NameError> {
        let cluster = cluster.trim();
        if cluster.is_empty() {
            return Err(NameError::Empty);
        }
        if cluster.len() > MAX_CLUSTER_NAME_LEN {
            return Err(NameError::TooLong(cluster.to_string()));
        }
        if !cluster
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(NameError::InvalidCharacter(cluster.to_string()));
        }

        Ok(Self {
            cluster: cluster.to_string(),
            overrides: BTreeMap::new(),
        })
    }

    /// Use an operator-supplied instance profile instead of a managed one
    #[must_use]
    pub fn with_instance_profile(mut self, name: impl Into<String>) -> Self {
        self.overrides.insert(ResourceKind::InstanceProfile, name.into());
        self
    }

    /// Validated cluster name
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Name of the resource of `kind`
    #[must_use]
    pub fn name_for(&self, kind: ResourceKind) -> String {
        if let Some(name) = self.overrides.get(&kind) {
            return name.clone();
        }
        let suffix = match kind {
            ResourceKind::ComputeCluster => "",
            ResourceKind::ServiceRole => "-ecs-service-role",
            ResourceKind::InstanceProfile => "-instance-profile",
            ResourceKind::InstanceSecurityGroup => "-instance-sg",
            ResourceKind::LaunchTemplate => "-lt",
            ResourceKind::ScalingGroup => "-asg",
        };
        format!("{}{}{}", NAME_PREFIX, self.cluster, suffix)
    }

    /// Kinds supplied by the operator rather than managed by this tool
    pub fn referenced_kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.overrides.keys().copied()
    }

    /// Whether `kind` is supplied by the operator
    #[must_use]
    pub fn is_referenced(&self, kind: ResourceKind) -> bool {
        self.overrides.contains_key(&kind)
    }
}

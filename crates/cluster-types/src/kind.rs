//! Resource kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the infrastructure primitives a cluster is built from.
///
/// The set is closed: a cluster always consists of exactly these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Role the container service assumes on behalf of the cluster
    ServiceRole,
    /// Role attached to cluster instances
    InstanceProfile,
    /// Firewall rules for cluster instances
    InstanceSecurityGroup,
    /// Instance blueprint used by the scaling group
    LaunchTemplate,
    /// Elastic group of instances
    ScalingGroup,
    /// The logical container cluster
    ComputeCluster,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::ServiceRole,
        ResourceKind::InstanceProfile,
        ResourceKind::InstanceSecurityGroup,
        ResourceKind::LaunchTemplate,
        ResourceKind::ScalingGroup,
        ResourceKind::ComputeCluster,
    ];

    /// Human readable label used in console output and error messages
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::ServiceRole => "Service Role",
            ResourceKind::InstanceProfile => "Instance Profile",
            ResourceKind::InstanceSecurityGroup => "Instance Security Group",
            ResourceKind::LaunchTemplate => "Launch Template",
            ResourceKind::ScalingGroup => "Scaling Group",
            ResourceKind::ComputeCluster => "Compute Cluster",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//! Resource descriptor set
//!
//! The static dependency graph between resource kinds. Edges point from a
//! dependency to its dependent, so a topological order is a valid creation
//! order and its reverse a valid deletion order.

use crate::error::ReconcileError;
use crate::plan::Operation;
use cluster_types::ResourceKind;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

/// A resource kind and the kinds that must exist before it can be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Resource kind
    pub kind: ResourceKind,
    /// Direct dependencies only
    pub depends_on: &'static [ResourceKind],
}

/// The cluster topology.
///
/// The security group also needs the cluster network, which is an external
/// input rather than a managed resource.
pub const DESCRIPTORS: [ResourceDescriptor; 6] = [
    ResourceDescriptor {
        kind: ResourceKind::InstanceProfile,
        depends_on: &[],
    },
    ResourceDescriptor {
        kind: ResourceKind::InstanceSecurityGroup,
        depends_on: &[],
    },
    ResourceDescriptor {
        kind: ResourceKind::LaunchTemplate,
        depends_on: &[ResourceKind::InstanceProfile, ResourceKind::InstanceSecurityGroup],
    },
    ResourceDescriptor {
        kind: ResourceKind::ScalingGroup,
        depends_on: &[ResourceKind::LaunchTemplate],
    },
    ResourceDescriptor {
        kind: ResourceKind::ComputeCluster,
        depends_on: &[],
    },
    ResourceDescriptor {
        kind: ResourceKind::ServiceRole,
        depends_on: &[],
    },
];

/// Validated dependency graph over resource kinds
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    graph: DiGraphMap<ResourceKind, ()>,
    creation_order: Vec<ResourceKind>,
}

impl ResourceGraph {
    /// Build the graph for the fixed cluster topology
    pub fn new() -> Result<Self, ReconcileError> {
        Self::from_descriptors(&DESCRIPTORS)
    }

    /// Build and validate a graph from descriptors.
    ///
    /// Fails with [`ReconcileError::Configuration`] when a kind is declared
    /// twice, depends on an undeclared kind, or the dependencies form a cycle.
    pub fn from_descriptors(descriptors: &[ResourceDescriptor]) -> Result<Self, ReconcileError> {
        let mut graph = DiGraphMap::new();
        for descriptor in descriptors {
            if graph.contains_node(descriptor.kind) {
                return Err(ReconcileError::Configuration(format!(
                    "{} is declared more than once",
                    descriptor.kind
                )));
            }
            graph.add_node(descriptor.kind);
        }

        for descriptor in descriptors {
            for dependency in descriptor.depends_on {
                if !graph.contains_node(*dependency) {
                    return Err(ReconcileError::Configuration(format!(
                        "{} depends on undeclared kind {}",
                        descriptor.kind, dependency
                    )));
                }
                graph.add_edge(*dependency, descriptor.kind, ());
            }
        }

        let creation_order = toposort(&graph, None).map_err(|cycle| {
            ReconcileError::Configuration(format!("dependency cycle through {}", cycle.node_id()))
        })?;
        debug!("Resource creation order: {:?}", creation_order);

        Ok(Self { graph, creation_order })
    }

    /// Kinds ordered for `operation`: dependencies first when creating,
    /// dependents first when deleting.
    #[must_use]
    pub fn topological_order(&self, operation: Operation) -> Vec<ResourceKind> {
        match operation {
            Operation::Create => self.creation_order.clone(),
            Operation::Delete => self.creation_order.iter().rev().copied().collect(),
        }
    }

    /// Whether `kind` depends on `dependency`, directly or transitively
    #[must_use]
    pub fn depends_on(&self, kind: ResourceKind, dependency: ResourceKind) -> bool {
        kind != dependency
            && self.graph.contains_node(kind)
            && self.graph.contains_node(dependency)
            && has_path_connecting(&self.graph, dependency, kind, None)
    }
}

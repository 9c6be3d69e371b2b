//! Plan building
//!
//! Diffs the inspected state against the requested operation and produces
//! the ordered list of actions the executor runs.

use crate::graph::ResourceGraph;
use crate::inspector::ClusterState;
use cluster_types::{Lifecycle, ResourceKind};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Requested lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Bring every missing resource into existence
    Create,
    /// Remove every resource clusterctl created
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    /// Resource kind
    pub kind: ResourceKind,
    /// Deterministic resource name
    pub name: String,
    /// Create or delete
    pub operation: Operation,
    /// Wait for a previous deletion of this resource to finish first
    pub pre_wait: bool,
}

/// Ordered actions for one reconciliation. Holds at most one action per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    operation: Operation,
    actions: Vec<Action>,
}

impl Plan {
    #[cfg(test)]
    pub(crate) fn from_actions(operation: Operation, actions: Vec<Action>) -> Self {
        Self { operation, actions }
    }

    /// Operation every action of the plan performs
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Actions in execution order
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Number of planned actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Position of the action for `kind`, if planned
    pub fn position(&self, kind: ResourceKind) -> Option<usize> {
        self.actions.iter().position(|a| a.kind == kind)
    }
}

/// Builds plans against a resource graph
#[derive(Debug)]
pub struct PlanBuilder<'a> {
    graph: &'a ResourceGraph,
    referenced: BTreeSet<ResourceKind>,
}

impl<'a> PlanBuilder<'a> {
    /// Builder ordering actions along `graph`
    pub fn new(graph: &'a ResourceGraph) -> Self {
        Self {
            graph,
            referenced: BTreeSet::new(),
        }
    }

    /// Kinds supplied by the operator. They are never created or deleted.
    #[must_use]
    pub fn referencing(mut self, kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        self.referenced.extend(kinds);
        self
    }

    /// Build the plan for `operation` from freshly inspected `state`
    pub fn build(&self, operation: Operation, state: &ClusterState) -> Plan {
        let mut actions = Vec::new();

        for kind in self.graph.topological_order(operation) {
            let Some(resource) = state.get(kind) else {
                continue;
            };
            if self.referenced.contains(&kind) {
                debug!("{} [{}] is supplied by the operator", kind, resource.name);
                continue;
            }

            let pre_wait = match operation {
                Operation::Create => match resource.lifecycle {
                    Lifecycle::Absent => false,
                    // A resource being deleted blocks recreation until it is gone
                    Lifecycle::Terminating => {
                        info!("{} [{}] is being deleted; will recreate once it is gone", kind, resource.name);
                        true
                    }
                    Lifecycle::Active | Lifecycle::Pending => continue,
                },
                Operation::Delete => {
                    if !resource.exists() {
                        continue;
                    }
                    if !resource.is_managed() {
                        info!(
                            "{} [{}] was not created by clusterctl; leaving it in place",
                            kind, resource.name
                        );
                        continue;
                    }
                    resource.lifecycle == Lifecycle::Terminating
                }
            };

            actions.push(Action {
                kind,
                name: resource.name.clone(),
                operation,
                pre_wait,
            });
        }

        debug!("Planned {} {} action(s)", actions.len(), operation);
        Plan { operation, actions }
    }
}

/// Build a plan with no operator-supplied kinds
pub fn build_plan(graph: &ResourceGraph, operation: Operation, state: &ClusterState) -> Plan {
    PlanBuilder::new(graph).build(operation, state)
}

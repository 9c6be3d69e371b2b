//! Reconciler facade
//!
//! Wires inspection, planning and execution around one provider so each
//! command only supplies an operation and a policy.

use crate::blueprint::ClusterBlueprint;
use crate::error::ReconcileError;
use crate::executor::{ExecutionPolicy, ExecutionReport, Executor};
use crate::graph::ResourceGraph;
use crate::inspector::{ClusterState, StateInspector};
use crate::plan::{Operation, Plan, PlanBuilder};
use crate::retry::{RetryPolicy, WaitPolicy};
use crate::status::{report, ClusterStatus};
use cloud_provider::{Network, ResourceProvider};
use cluster_types::ClusterNames;
use std::sync::Arc;
use tracing::{info, warn};

/// Retry and wait tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Applied to every write
    pub retry: RetryPolicy,
    /// Applied to pre-waits and background teardown
    pub wait: WaitPolicy,
}

/// Outcome of one reconciliation. `report` is `None` when the plan was empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The plan that was built
    pub plan: Plan,
    /// `None` when the plan was empty
    pub report: Option<ExecutionReport>,
}

impl Reconciliation {
    /// Whether the cluster already matched the operation
    pub fn nothing_to_do(&self) -> bool {
        self.plan.is_empty()
    }

    /// Whether any action failed
    pub fn has_failures(&self) -> bool {
        self.report.as_ref().is_some_and(ExecutionReport::has_failures)
    }
}

/// Inspects, plans and executes lifecycle operations against one provider
pub struct ClusterReconciler {
    provider: Arc<dyn ResourceProvider>,
    graph: ResourceGraph,
    config: ReconcilerConfig,
}

impl std::fmt::Debug for ClusterReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterReconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClusterReconciler {
    /// Reconciler for the fixed cluster topology
    pub fn new(provider: Arc<dyn ResourceProvider>, config: ReconcilerConfig) -> Result<Self, ReconcileError> {
        Ok(Self {
            provider,
            graph: ResourceGraph::new()?,
            config,
        })
    }

    /// Read the current state of every resource of the cluster
    pub async fn inspect(&self, names: &ClusterNames) -> Result<ClusterState, ReconcileError> {
        StateInspector::new(self.provider.clone()).inspect(names).await
    }

    /// Plan `operation`, leaving operator-supplied kinds alone
    pub fn plan(&self, operation: Operation, names: &ClusterNames, state: &ClusterState) -> Plan {
        PlanBuilder::new(&self.graph)
            .referencing(names.referenced_kinds())
            .build(operation, state)
    }

    /// Run `plan`. `blueprint` is required when the plan creates anything.
    pub async fn execute(
        &self,
        plan: &Plan,
        blueprint: Option<ClusterBlueprint>,
        policy: &ExecutionPolicy<'_>,
    ) -> ExecutionReport {
        let mut executor = Executor::new(
            self.provider.clone(),
            self.graph.clone(),
            self.config.retry,
            self.config.wait,
        );
        if let Some(blueprint) = blueprint {
            executor = executor.with_blueprint(blueprint);
        }
        executor.execute(plan, policy).await
    }

    /// Inspect, plan and execute `operation` for the cluster.
    ///
    /// Create requires a blueprint. The executor is not invoked for an empty plan.
    pub async fn reconcile(
        &self,
        operation: Operation,
        names: &ClusterNames,
        blueprint: Option<ClusterBlueprint>,
        policy: &ExecutionPolicy<'_>,
    ) -> Result<Reconciliation, ReconcileError> {
        let state = self.inspect(names).await?;
        let plan = self.plan(operation, names, &state);

        if plan.is_empty() {
            info!("Cluster [{}]: nothing to {}", names.cluster(), operation);
            return Ok(Reconciliation { plan, report: None });
        }

        let report = self.execute(&plan, blueprint, policy).await;
        Ok(Reconciliation {
            plan,
            report: Some(report),
        })
    }

    /// Status snapshot, including the default network when it can be resolved
    pub async fn status(&self, names: &ClusterNames) -> Result<ClusterStatus, ReconcileError> {
        let state = self.inspect(names).await?;
        let status = report(&state);
        match self.provider.network(None).await {
            Ok(network) => Ok(status.with_network(network)),
            Err(e) => {
                warn!("Failed to resolve network: {}", e);
                Ok(status)
            }
        }
    }

    /// Resolve `vpc_id`, or the default network
    pub async fn resolve_network(&self, vpc_id: Option<&str>) -> Result<Network, ReconcileError> {
        self.provider.network(vpc_id).await.map_err(ReconcileError::Network)
    }
}

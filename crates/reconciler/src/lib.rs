//! Cluster Resource Reconciler
//!
//! Provisions and tears down a cluster as one unit. A reconciliation runs
//! in four steps:
//!
//! 1. [`StateInspector`] looks up every resource kind by its deterministic name.
//! 2. [`PlanBuilder`] diffs the inspected state against the requested operation
//!    and orders the resulting actions along the [`ResourceGraph`].
//! 3. The caller may ask for confirmation.
//! 4. [`Executor`] runs the plan one action at a time, retrying transient
//!    failures and applying the continue-or-abort policy to permanent ones.
//!
//! [`report`] projects inspected state into a [`ClusterStatus`] for display.
//! [`ClusterReconciler`] wires the steps together around one provider.

pub mod blueprint;
pub mod error;
pub mod executor;
pub mod graph;
pub mod inspector;
pub mod plan;
pub mod reconciler;
pub mod retry;
pub mod status;

pub use blueprint::{ClusterBlueprint, ClusterSettings};
pub use error::{ActionError, ReconcileError};
pub use executor::{
    ActionOutcome, ActionReport, AutoConfirm, Confirm, ExecutionPolicy, ExecutionReport, Executor, ReportStatus,
};
pub use graph::{ResourceDescriptor, ResourceGraph, DESCRIPTORS};
pub use inspector::{classify, ClusterState, StateInspector};
pub use plan::{build_plan, Action, Operation, Plan, PlanBuilder};
pub use reconciler::{ClusterReconciler, Reconciliation, ReconcilerConfig};
pub use retry::{retry_transient, RetryPolicy, WaitPolicy};
pub use status::{report, ClusterStatus, ResourceStatus};

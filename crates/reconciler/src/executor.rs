//! Plan execution
//!
//! Runs a plan one action at a time in plan order. Each write goes through
//! the retry policy. A permanent failure either aborts the rest of the plan
//! or, when continuing on error, skips only the actions that depend on the
//! failed kind.

use crate::blueprint::ClusterBlueprint;
use crate::error::ActionError;
use crate::graph::ResourceGraph;
use crate::inspector::classify;
use crate::plan::{Action, Operation, Plan};
use crate::retry::{retry_transient, RetryPolicy, WaitPolicy};
use cloud_provider::{ProviderError, ResourceProvider};
use cluster_types::{Lifecycle, ResourceKind};
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Asks the operator whether a plan may run
pub trait Confirm {
    /// `true` lets the plan run
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms every plan without asking
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// How a plan is run
#[derive(Clone, Copy)]
pub struct ExecutionPolicy<'a> {
    /// Keep going past a failed action, skipping only its dependents
    pub continue_on_error: bool,
    /// Asked once before the first write
    pub confirm: &'a dyn Confirm,
    /// Shown a non-empty plan before confirmation is asked for
    pub show_plan: Option<&'a dyn Fn(&Plan)>,
}

impl fmt::Debug for ExecutionPolicy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPolicy")
            .field("continue_on_error", &self.continue_on_error)
            .field("show_plan", &self.show_plan.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> ExecutionPolicy<'a> {
    /// Policy asking `confirm` before anything is written
    pub fn new(continue_on_error: bool, confirm: &'a dyn Confirm) -> Self {
        Self {
            continue_on_error,
            confirm,
            show_plan: None,
        }
    }

    /// Fail fast and never ask for confirmation
    pub fn unattended() -> ExecutionPolicy<'static> {
        ExecutionPolicy {
            continue_on_error: false,
            confirm: &AutoConfirm,
            show_plan: None,
        }
    }

    /// Set whether execution continues past a failed action
    #[must_use]
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Show non-empty plans with `show` before confirmation
    #[must_use]
    pub fn showing_plan(mut self, show: &'a dyn Fn(&Plan)) -> Self {
        self.show_plan = Some(show);
        self
    }
}

/// Result of one planned action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The resource reached the requested state
    Succeeded,
    Failed(ActionError),
    /// Not attempted because the given kind, a dependency, failed
    Skipped(ResourceKind),
    /// Not attempted because execution stopped early
    Aborted,
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Succeeded => f.write_str("succeeded"),
            ActionOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            ActionOutcome::Skipped(cause) => write!(f, "skipped ({} failed)", cause),
            ActionOutcome::Aborted => f.write_str("aborted"),
        }
    }
}

/// A planned action and what became of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    /// The planned action
    pub action: Action,
    /// What happened to it
    pub outcome: ActionOutcome,
}

/// How an execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// Every action was attempted, skipped, or aborted by policy
    Completed,
    /// Confirmation was declined; nothing was written
    UserAborted,
}

/// Per-action outcome of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// How execution ended
    pub status: ReportStatus,
    /// One entry per planned action, in plan order
    pub entries: Vec<ActionReport>,
}

impl ExecutionReport {
    /// Whether any action failed
    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.outcome, ActionOutcome::Failed(_)))
    }

    /// Whether confirmation was declined
    pub fn user_aborted(&self) -> bool {
        self.status == ReportStatus::UserAborted
    }

    /// Outcome of the action for `kind`, if it was planned
    pub fn outcome(&self, kind: ResourceKind) -> Option<&ActionOutcome> {
        self.entries
            .iter()
            .find(|e| e.action.kind == kind)
            .map(|e| &e.outcome)
    }

    /// Failed actions with their reasons, in plan order
    pub fn failures(&self) -> impl Iterator<Item = (&Action, &ActionError)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            ActionOutcome::Failed(reason) => Some((&e.action, reason)),
            _ => None,
        })
    }
}

/// Kinds the control plane keeps tearing down after accepting the delete.
/// Their dependencies stay in use until they are gone.
fn deleted_in_background(kind: ResourceKind) -> bool {
    kind == ResourceKind::ScalingGroup
}

/// Runs plans against a provider
pub struct Executor {
    provider: Arc<dyn ResourceProvider>,
    graph: ResourceGraph,
    retry: RetryPolicy,
    wait: WaitPolicy,
    blueprint: Option<ClusterBlueprint>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("retry", &self.retry)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Executor without creation parameters; see [`Executor::with_blueprint`]
    pub fn new(provider: Arc<dyn ResourceProvider>, graph: ResourceGraph, retry: RetryPolicy, wait: WaitPolicy) -> Self {
        Self {
            provider,
            graph,
            retry,
            wait,
            blueprint: None,
        }
    }

    /// Parameters for create actions. Without one every create fails.
    #[must_use]
    pub fn with_blueprint(mut self, blueprint: ClusterBlueprint) -> Self {
        self.blueprint = Some(blueprint);
        self
    }

    /// Run `plan` under `policy`.
    ///
    /// An empty plan completes immediately without asking for confirmation.
    pub async fn execute(&self, plan: &Plan, policy: &ExecutionPolicy<'_>) -> ExecutionReport {
        if plan.is_empty() {
            debug!("Nothing to do");
            return ExecutionReport {
                status: ReportStatus::Completed,
                entries: Vec::new(),
            };
        }

        if let Some(show) = policy.show_plan {
            show(plan);
        }

        let prompt = match plan.operation() {
            Operation::Create => "Do you want to create these resources?",
            Operation::Delete => "Do you want to delete these resources?",
        };
        if !policy.confirm.confirm(prompt) {
            info!("Confirmation declined; no changes made");
            return ExecutionReport {
                status: ReportStatus::UserAborted,
                entries: plan
                    .actions()
                    .iter()
                    .map(|action| ActionReport {
                        action: action.clone(),
                        outcome: ActionOutcome::Aborted,
                    })
                    .collect(),
            };
        }

        let mut entries = Vec::with_capacity(plan.len());
        let mut failed: Vec<ResourceKind> = Vec::new();
        let mut aborted = false;

        for action in plan.actions() {
            let outcome = if aborted {
                ActionOutcome::Aborted
            } else if let Some(cause) = failed.iter().copied().find(|f| self.graph.depends_on(action.kind, *f)) {
                warn!("Skipping {} {} [{}]: {} failed", action.operation, action.kind, action.name, cause);
                ActionOutcome::Skipped(cause)
            } else {
                match self.run(action).await {
                    Ok(()) => {
                        info!("{} {} [{}]: done", action.operation, action.kind, action.name);
                        ActionOutcome::Succeeded
                    }
                    Err(reason) => {
                        error!(
                            "Failed to {} {} [{}]: {}",
                            action.operation, action.kind, action.name, reason
                        );
                        failed.push(action.kind);
                        if !policy.continue_on_error {
                            aborted = true;
                        }
                        ActionOutcome::Failed(reason)
                    }
                }
            };

            entries.push(ActionReport {
                action: action.clone(),
                outcome,
            });
        }

        ExecutionReport {
            status: ReportStatus::Completed,
            entries,
        }
    }

    async fn run(&self, action: &Action) -> Result<(), ActionError> {
        if action.pre_wait {
            self.wait_until_absent(action).await?;
            if action.operation == Operation::Delete {
                info!("{} [{}] is already gone", action.kind, action.name);
                return Ok(());
            }
        }

        let provider = self.provider.as_ref();
        let kind = action.kind;
        let name = action.name.as_str();
        let operation_name = format!("{} {} [{}]", action.operation, kind, name);

        match action.operation {
            Operation::Create => {
                let blueprint = self
                    .blueprint
                    .as_ref()
                    .ok_or_else(|| ActionError::MissingParameter("cluster settings".to_string()))?;
                let request = blueprint.request_for(kind)?;
                let request = &request;
                info!("Creating {} [{}]...", kind, name);

                retry_transient(&self.retry, &operation_name, move || async move {
                    match provider.create(kind, name, request).await {
                        Err(ProviderError::AlreadyExists(_)) => {
                            debug!("{} [{}] already exists", kind, name);
                            Ok(())
                        }
                        other => other,
                    }
                })
                .await
            }
            Operation::Delete => {
                info!("Deleting {} [{}]...", kind, name);

                retry_transient(&self.retry, &operation_name, move || async move {
                    match provider.delete(kind, name).await {
                        Err(ProviderError::NotFound(_)) => {
                            debug!("{} [{}] is already gone", kind, name);
                            Ok(())
                        }
                        other => other,
                    }
                })
                .await?;

                if deleted_in_background(kind) {
                    self.wait_until_absent(action).await?;
                }
                Ok(())
            }
        }
    }

    /// Poll until the resource is absent, bounded by the wait policy.
    ///
    /// Read errors while polling are logged and polling continues.
    async fn wait_until_absent(&self, action: &Action) -> Result<(), ActionError> {
        let started = Instant::now();
        info!("Waiting for {} [{}] to finish deleting...", action.kind, action.name);

        loop {
            match self.provider.get_by_name(action.kind, &action.name).await {
                Ok(None) => return Ok(()),
                Ok(Some(observed)) => {
                    if classify(action.kind, observed.status.as_deref()) == Lifecycle::Absent {
                        return Ok(());
                    }
                    debug!("{} [{}] still present", action.kind, action.name);
                }
                Err(e) => warn!("Failed to poll {} [{}]: {}", action.kind, action.name, e),
            }

            let waited = started.elapsed();
            if waited >= self.wait.timeout {
                return Err(ActionError::Timeout { waited });
            }
            tokio::time::sleep(self.wait.interval).await;
        }
    }
}

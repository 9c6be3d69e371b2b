//! Console interaction
//!
//! Everything the operator reads goes to stdout through here. Diagnostics go
//! through tracing.

use cluster_types::{Lifecycle, ResourceDetails, ResourceKind};
use reconciler::{ActionOutcome, ClusterStatus, Confirm, ExecutionReport, Operation, Plan, ResourceStatus};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

/// Asks on stdin; anything but "y" or "yes" declines
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N]: ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// List of planned actions shown before confirmation
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();
    let heading = match plan.operation() {
        Operation::Create => "Resources to create:",
        Operation::Delete => "Resources to delete:",
    };
    let _ = writeln!(out, "{}", heading);
    for action in plan.actions() {
        let wait = if action.pre_wait {
            " (after its previous deletion finishes)"
        } else {
            ""
        };
        let _ = writeln!(out, "  {:<24} {}{}", action.kind.label(), action.name, wait);
    }
    out
}

/// Per-action result lines, failures with their cause
pub fn render_report(report: &ExecutionReport) -> String {
    let mut out = String::new();
    if report.user_aborted() {
        let _ = writeln!(out, "Aborted; no changes were made.");
        return out;
    }
    for entry in &report.entries {
        let mark = match entry.outcome {
            ActionOutcome::Succeeded => "ok",
            ActionOutcome::Failed(_) => "FAILED",
            ActionOutcome::Skipped(_) => "skipped",
            ActionOutcome::Aborted => "aborted",
        };
        let _ = writeln!(out, "  [{:<7}] {} [{}]", mark, entry.action.kind.label(), entry.action.name);
        match &entry.outcome {
            ActionOutcome::Failed(reason) => {
                let _ = writeln!(out, "            {}", reason);
            }
            ActionOutcome::Skipped(cause) => {
                let _ = writeln!(out, "            {} failed", cause.label());
            }
            ActionOutcome::Succeeded | ActionOutcome::Aborted => {}
        }
    }
    out
}

fn marker(resource: &ResourceStatus) -> &'static str {
    if !resource.exists {
        " (not found)"
    } else if resource.lifecycle == Lifecycle::Terminating {
        " (deleting)"
    } else if !resource.managed {
        " (unmanaged)"
    } else {
        ""
    }
}

fn line(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {:<22}{}", label, value);
}

fn resource_line(out: &mut String, status: &ClusterStatus, kind: ResourceKind) {
    if let Some(resource) = status.get(kind) {
        line(out, kind.label(), format_args!("{}{}", resource.name, marker(resource)));
    }
}

/// Text rendering of a status snapshot
pub fn render_status(status: &ClusterStatus, region: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Cluster");
    line(&mut out, "Name", &status.cluster);

    let _ = writeln!(out, "Network");
    line(&mut out, "Region", region);
    if let Some(network) = &status.network {
        line(&mut out, "VPC", &network.vpc_id);
        line(&mut out, "Subnets", network.subnet_ids.join(" "));
    }

    let _ = writeln!(out, "Auto Scaling");
    resource_line(&mut out, status, ResourceKind::LaunchTemplate);
    resource_line(&mut out, status, ResourceKind::ScalingGroup);
    if let Some(ResourceDetails::ScalingGroup {
        current_instances,
        desired_capacity,
        min_size,
        max_size,
    }) = status.get(ResourceKind::ScalingGroup).map(|r| &r.details)
    {
        line(
            &mut out,
            "Instances",
            format_args!(
                "{} current / {} desired / {} min / {} max",
                current_instances, desired_capacity, min_size, max_size
            ),
        );
    }

    let _ = writeln!(out, "Compute");
    resource_line(&mut out, status, ResourceKind::ComputeCluster);
    resource_line(&mut out, status, ResourceKind::ServiceRole);
    if let Some(ResourceDetails::ComputeCluster {
        active_services,
        running_tasks,
        pending_tasks,
        container_instances,
    }) = status.get(ResourceKind::ComputeCluster).map(|r| &r.details)
    {
        line(&mut out, "Services", active_services);
        line(
            &mut out,
            "Tasks",
            format_args!("{} running / {} pending", running_tasks, pending_tasks),
        );
        line(&mut out, "Container Instances", container_instances);
    }

    let _ = writeln!(out, "Container Instances");
    resource_line(&mut out, status, ResourceKind::InstanceProfile);
    resource_line(&mut out, status, ResourceKind::InstanceSecurityGroup);
    if let Some(ResourceDetails::LaunchTemplate {
        instance_profile,
        instance_type,
        image_id,
        key_name,
        security_groups,
    }) = status.get(ResourceKind::LaunchTemplate).map(|r| &r.details)
    {
        line(&mut out, "Profile", instance_profile);
        line(&mut out, "Type", instance_type);
        line(&mut out, "Image", image_id);
        line(&mut out, "Key Pair", key_name);
        line(&mut out, "Security Groups", security_groups.join(" "));
    }

    out
}

//! `clusterctl create`

use super::{completion_of, Completion};
use crate::args::CreateArgs;
use crate::console::{render_plan, render_report};
use anyhow::{Context, Result};
use cluster_types::ClusterNames;
use reconciler::{
    AutoConfirm, ClusterBlueprint, ClusterReconciler, ClusterSettings, Confirm, ExecutionPolicy, Operation, Plan,
};
use tracing::info;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub async fn run(reconciler: &ClusterReconciler, args: &CreateArgs, confirm: &dyn Confirm) -> Result<Completion> {
    let mut names = ClusterNames::new(&args.cluster)?;
    if let Some(profile) = non_blank(args.instance_profile.as_deref()) {
        names = names.with_instance_profile(profile);
    }

    let network = reconciler
        .resolve_network(non_blank(args.vpc.as_deref()))
        .await
        .context("Failed to resolve the cluster network")?;
    info!("Using VPC [{}]", network.vpc_id);

    let blueprint = ClusterBlueprint::new(
        names.clone(),
        ClusterSettings {
            instance_type: args.instance_type.trim().to_string(),
            initial_capacity: args.initial_capacity,
            key_pair: Some(args.key_pair.clone()),
            image_id: Some(args.image_id.clone()),
            network: Some(network),
            ssh_cidr: args.ssh_cidr.clone(),
        },
    );
    let confirm: &dyn Confirm = if args.force { &AutoConfirm } else { confirm };
    let show_plan = |plan: &Plan| print!("{}", render_plan(plan));
    let policy = ExecutionPolicy::new(false, confirm).showing_plan(&show_plan);

    println!("Determining resources to create...");
    let outcome = reconciler
        .reconcile(Operation::Create, &names, Some(blueprint), &policy)
        .await?;
    let Some(report) = outcome.report else {
        println!("Looks like everything is already up and running.");
        return Ok(Completion::NothingToDo);
    };
    print!("{}", render_report(&report));

    let completion = completion_of(&report);
    if completion == Completion::Done {
        println!("Cluster [{}] is ready.", args.cluster.trim());
    }
    Ok(completion)
}

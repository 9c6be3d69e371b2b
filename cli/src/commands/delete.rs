//! `clusterctl delete`

use super::{completion_of, Completion};
use crate::args::DeleteArgs;
use crate::console::{render_plan, render_report};
use anyhow::Result;
use cluster_types::ClusterNames;
use reconciler::{AutoConfirm, ClusterReconciler, Confirm, ExecutionPolicy, Operation, Plan};

pub async fn run(reconciler: &ClusterReconciler, args: &DeleteArgs, confirm: &dyn Confirm) -> Result<Completion> {
    let names = ClusterNames::new(&args.cluster)?;

    let confirm: &dyn Confirm = if args.force { &AutoConfirm } else { confirm };
    let show_plan = |plan: &Plan| print!("{}", render_plan(plan));
    let policy = ExecutionPolicy::new(args.continue_on_error, confirm).showing_plan(&show_plan);

    println!("Identifying resources to delete...");
    let outcome = reconciler.reconcile(Operation::Delete, &names, None, &policy).await?;
    let Some(report) = outcome.report else {
        println!("Looks like everything's already cleaned up.");
        return Ok(Completion::NothingToDo);
    };
    print!("{}", render_report(&report));

    Ok(completion_of(&report))
}

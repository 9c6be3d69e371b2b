//! End-to-end reconciliation scenarios against the in-memory provider

use cloud_provider::{MockOperation, MockProvider, ProviderError};
use cluster_types::{ClusterNames, ResourceKind, PROVENANCE_TAG};
use reconciler::{
    ActionError, ActionOutcome, ClusterBlueprint, ClusterReconciler, ClusterSettings, ExecutionPolicy, Operation,
    ReconcileError, ReconcilerConfig, RetryPolicy, WaitPolicy,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> ReconcilerConfig {
    ReconcilerConfig {
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
        wait: WaitPolicy::new(Duration::from_millis(1), Duration::from_millis(30)),
    }
}

fn setup() -> (MockProvider, ClusterReconciler, ClusterNames) {
    let mock = MockProvider::new();
    let reconciler = ClusterReconciler::new(Arc::new(mock.clone()), fast_config()).unwrap();
    (mock, reconciler, ClusterNames::new("demo").unwrap())
}

async fn blueprint(reconciler: &ClusterReconciler, names: &ClusterNames) -> ClusterBlueprint {
    let network = reconciler.resolve_network(None).await.unwrap();
    ClusterBlueprint::new(
        names.clone(),
        ClusterSettings {
            key_pair: Some("ops-key".to_string()),
            image_id: Some("ami-0123".to_string()),
            network: Some(network),
            ..ClusterSettings::default()
        },
    )
}

fn seed_managed_cluster(mock: &MockProvider, names: &ClusterNames) {
    for kind in ResourceKind::ALL {
        let status = match kind {
            ResourceKind::ComputeCluster => Some("ACTIVE"),
            _ => None,
        };
        mock.insert_managed(kind, &names.name_for(kind), status);
    }
}

#[tokio::test]
async fn create_on_empty_cluster_creates_everything_in_dependency_order() {
    let (mock, reconciler, names) = setup();
    let blueprint = blueprint(&reconciler, &names).await;

    let outcome = reconciler
        .reconcile(Operation::Create, &names, Some(blueprint), &ExecutionPolicy::unattended())
        .await
        .unwrap();

    let plan = &outcome.plan;
    assert_eq!(plan.len(), 6);
    let lt = plan.position(ResourceKind::LaunchTemplate).unwrap();
    assert!(plan.position(ResourceKind::InstanceProfile).unwrap() < lt);
    assert!(plan.position(ResourceKind::InstanceSecurityGroup).unwrap() < lt);
    assert!(lt < plan.position(ResourceKind::ScalingGroup).unwrap());

    let report = outcome.report.unwrap();
    assert!(report.entries.iter().all(|e| e.outcome == ActionOutcome::Succeeded));
    assert!(!report.has_failures());

    let created: Vec<_> = mock.calls().into_iter().map(|c| c.kind).collect();
    let expected: Vec<_> = plan.actions().iter().map(|a| a.kind).collect();
    assert_eq!(created, expected);
    for kind in ResourceKind::ALL {
        let tags = mock.tags_of(kind, &names.name_for(kind)).unwrap();
        assert!(tags.contains_key(PROVENANCE_TAG), "{kind} lacks provenance");
    }
}

#[tokio::test]
async fn second_create_is_nothing_to_do() {
    let (mock, reconciler, names) = setup();

    let first = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::unattended(),
        )
        .await
        .unwrap();
    assert!(!first.has_failures());
    let writes = mock.calls().len();

    let asked = std::cell::Cell::new(false);
    let confirm = |_: &str| {
        asked.set(true);
        true
    };
    let second = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::new(false, &confirm),
        )
        .await
        .unwrap();

    assert!(second.nothing_to_do());
    assert!(second.report.is_none());
    assert!(!asked.get());
    assert_eq!(mock.calls().len(), writes);
}

#[tokio::test]
async fn create_against_present_cluster_issues_no_writes() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);

    let outcome = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::unattended(),
        )
        .await
        .unwrap();

    assert!(outcome.nothing_to_do());
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn terminating_scaling_group_is_waited_out_then_recreated() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);
    let asg = names.name_for(ResourceKind::ScalingGroup);
    mock.insert_managed(ResourceKind::ScalingGroup, &asg, Some("Delete in progress"));
    // Seen by inspection and two polls, gone on the third poll
    mock.vanish_after(ResourceKind::ScalingGroup, &asg, 3);

    let outcome = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::unattended(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.plan.len(), 1);
    assert!(outcome.plan.actions()[0].pre_wait);
    let report = outcome.report.unwrap();
    assert_eq!(report.outcome(ResourceKind::ScalingGroup), Some(&ActionOutcome::Succeeded));
    assert_eq!(mock.calls().len(), 1);
    assert!(mock.contains(ResourceKind::ScalingGroup, &asg));
}

#[tokio::test]
async fn terminating_scaling_group_that_never_goes_away_times_out() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);
    let asg = names.name_for(ResourceKind::ScalingGroup);
    mock.insert_managed(ResourceKind::ScalingGroup, &asg, Some("Delete in progress"));

    let outcome = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::unattended(),
        )
        .await
        .unwrap();

    assert!(outcome.has_failures());
    let report = outcome.report.unwrap();
    assert!(matches!(
        report.outcome(ResourceKind::ScalingGroup),
        Some(ActionOutcome::Failed(ActionError::Timeout { .. }))
    ));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn terminating_compute_cluster_is_waited_out_then_recreated() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);
    let cluster = names.name_for(ResourceKind::ComputeCluster);
    mock.insert_managed(ResourceKind::ComputeCluster, &cluster, Some("DEPROVISIONING"));
    mock.vanish_after(ResourceKind::ComputeCluster, &cluster, 3);

    let outcome = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::unattended(),
        )
        .await
        .unwrap();

    assert!(!outcome.nothing_to_do());
    assert_eq!(outcome.plan.len(), 1);
    assert_eq!(outcome.plan.actions()[0].kind, ResourceKind::ComputeCluster);
    assert!(outcome.plan.actions()[0].pre_wait);
    let report = outcome.report.unwrap();
    assert_eq!(report.outcome(ResourceKind::ComputeCluster), Some(&ActionOutcome::Succeeded));
    assert_eq!(mock.calls().len(), 1);
    assert!(mock.contains(ResourceKind::ComputeCluster, &cluster));
}

#[tokio::test]
async fn scaling_group_teardown_finishes_before_launch_template_is_deleted() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);
    mock.delete_in_background(ResourceKind::ScalingGroup, 5);
    mock.block_delete_while_present(ResourceKind::LaunchTemplate, ResourceKind::ScalingGroup);

    let outcome = reconciler
        .reconcile(Operation::Delete, &names, None, &ExecutionPolicy::unattended())
        .await
        .unwrap();

    assert!(!outcome.has_failures());
    let report = outcome.report.unwrap();
    assert!(report.entries.iter().all(|e| e.outcome == ActionOutcome::Succeeded));
    let template_deletes = mock
        .calls()
        .iter()
        .filter(|c| c.kind == ResourceKind::LaunchTemplate)
        .count();
    assert_eq!(template_deletes, 1);
    for kind in ResourceKind::ALL {
        assert!(!mock.contains(kind, &names.name_for(kind)), "{kind} left behind");
    }
}

#[tokio::test]
async fn delete_continues_past_independent_failure() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);
    mock.fail_next(
        ResourceKind::LaunchTemplate,
        MockOperation::Delete,
        ProviderError::Permanent("template is locked".into()),
    );

    let policy = ExecutionPolicy::unattended().continue_on_error(true);
    let outcome = reconciler
        .reconcile(Operation::Delete, &names, None, &policy)
        .await
        .unwrap();

    let plan = &outcome.plan;
    assert_eq!(plan.len(), 6);
    assert!(plan.position(ResourceKind::ScalingGroup).unwrap() < plan.position(ResourceKind::LaunchTemplate).unwrap());

    let report = outcome.report.unwrap();
    assert!(report.has_failures());
    assert_eq!(
        report.outcome(ResourceKind::LaunchTemplate),
        Some(&ActionOutcome::Failed(ActionError::Permanent("template is locked".into())))
    );
    for kind in [
        ResourceKind::ScalingGroup,
        ResourceKind::InstanceProfile,
        ResourceKind::InstanceSecurityGroup,
        ResourceKind::ComputeCluster,
        ResourceKind::ServiceRole,
    ] {
        assert_eq!(report.outcome(kind), Some(&ActionOutcome::Succeeded), "{kind}");
    }
    assert!(mock.contains(ResourceKind::LaunchTemplate, &names.name_for(ResourceKind::LaunchTemplate)));
}

#[tokio::test]
async fn delete_fails_fast_by_default() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);
    mock.fail_next(
        ResourceKind::LaunchTemplate,
        MockOperation::Delete,
        ProviderError::Permanent("template is locked".into()),
    );

    let outcome = reconciler
        .reconcile(Operation::Delete, &names, None, &ExecutionPolicy::unattended())
        .await
        .unwrap();

    let k = outcome.plan.position(ResourceKind::LaunchTemplate).unwrap();
    let report = outcome.report.unwrap();
    for (i, entry) in report.entries.iter().enumerate() {
        match i.cmp(&k) {
            std::cmp::Ordering::Less => assert_eq!(entry.outcome, ActionOutcome::Succeeded),
            std::cmp::Ordering::Equal => assert!(matches!(entry.outcome, ActionOutcome::Failed(_))),
            std::cmp::Ordering::Greater => assert_eq!(entry.outcome, ActionOutcome::Aborted),
        }
    }
    assert_eq!(mock.calls().len(), k + 1);
}

#[tokio::test]
async fn create_skips_dependents_of_failed_kind() {
    let (mock, reconciler, names) = setup();
    mock.fail_next(
        ResourceKind::InstanceProfile,
        MockOperation::Create,
        ProviderError::Permanent("LimitExceeded: too many roles".into()),
    );

    let policy = ExecutionPolicy::unattended().continue_on_error(true);
    let outcome = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &policy,
        )
        .await
        .unwrap();

    let report = outcome.report.unwrap();
    assert!(matches!(
        report.outcome(ResourceKind::InstanceProfile),
        Some(ActionOutcome::Failed(_))
    ));
    assert_eq!(
        report.outcome(ResourceKind::LaunchTemplate),
        Some(&ActionOutcome::Skipped(ResourceKind::InstanceProfile))
    );
    assert_eq!(
        report.outcome(ResourceKind::ScalingGroup),
        Some(&ActionOutcome::Skipped(ResourceKind::InstanceProfile))
    );
    for kind in [
        ResourceKind::InstanceSecurityGroup,
        ResourceKind::ComputeCluster,
        ResourceKind::ServiceRole,
    ] {
        assert_eq!(report.outcome(kind), Some(&ActionOutcome::Succeeded), "{kind}");
    }
    assert!(!mock
        .calls()
        .iter()
        .any(|c| c.kind == ResourceKind::LaunchTemplate || c.kind == ResourceKind::ScalingGroup));
}

#[tokio::test]
async fn transient_failures_exhaust_retries() {
    let (mock, reconciler, names) = setup();
    for _ in 0..3 {
        mock.fail_next(
            ResourceKind::ComputeCluster,
            MockOperation::Create,
            ProviderError::Transient("Throttling".into()),
        );
    }

    let outcome = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::unattended().continue_on_error(true),
        )
        .await
        .unwrap();

    let report = outcome.report.unwrap();
    assert!(matches!(
        report.outcome(ResourceKind::ComputeCluster),
        Some(ActionOutcome::Failed(ActionError::RetriesExhausted { attempts: 3, .. }))
    ));
    let cluster_calls = mock
        .calls()
        .iter()
        .filter(|c| c.kind == ResourceKind::ComputeCluster)
        .count();
    assert_eq!(cluster_calls, 3);
}

#[tokio::test]
async fn unmanaged_resources_are_never_deleted() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);
    let sg = names.name_for(ResourceKind::InstanceSecurityGroup);
    mock.insert(
        ResourceKind::InstanceSecurityGroup,
        &sg,
        None,
        BTreeMap::from([("owner".to_string(), "ops".to_string())]),
    );

    let outcome = reconciler
        .reconcile(Operation::Delete, &names, None, &ExecutionPolicy::unattended())
        .await
        .unwrap();

    assert!(outcome.plan.position(ResourceKind::InstanceSecurityGroup).is_none());
    assert_eq!(outcome.plan.len(), 5);
    assert!(!outcome.has_failures());
    assert!(mock.contains(ResourceKind::InstanceSecurityGroup, &sg));
    assert!(!mock.contains(ResourceKind::LaunchTemplate, &names.name_for(ResourceKind::LaunchTemplate)));
}

#[tokio::test]
async fn operator_supplied_instance_profile_is_referenced_only() {
    let (mock, reconciler, _) = setup();
    let names = ClusterNames::new("demo").unwrap().with_instance_profile("ops-profile");
    mock.insert(ResourceKind::InstanceProfile, "ops-profile", None, BTreeMap::new());

    let created = reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::unattended(),
        )
        .await
        .unwrap();
    assert!(created.plan.position(ResourceKind::InstanceProfile).is_none());
    assert!(!created.has_failures());

    let deleted = reconciler
        .reconcile(Operation::Delete, &names, None, &ExecutionPolicy::unattended())
        .await
        .unwrap();
    assert!(deleted.plan.position(ResourceKind::InstanceProfile).is_none());
    assert!(mock.contains(ResourceKind::InstanceProfile, "ops-profile"));
}

#[tokio::test]
async fn operator_supplied_profile_from_another_cluster_survives_delete() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);
    let names = names.with_instance_profile("shared-profile");
    // Created by clusterctl for a different cluster
    mock.insert_managed(ResourceKind::InstanceProfile, "shared-profile", None);

    let deleted = reconciler
        .reconcile(Operation::Delete, &names, None, &ExecutionPolicy::unattended())
        .await
        .unwrap();

    assert!(!deleted.has_failures());
    assert!(deleted.plan.position(ResourceKind::InstanceProfile).is_none());
    assert!(mock.contains(ResourceKind::InstanceProfile, "shared-profile"));
}

#[tokio::test]
async fn inspection_failure_aborts_before_planning() {
    let (mock, reconciler, names) = setup();
    mock.fail_reads(ResourceKind::ScalingGroup, "access denied");

    let err = reconciler
        .reconcile(Operation::Delete, &names, None, &ExecutionPolicy::unattended())
        .await
        .unwrap_err();

    match err {
        ReconcileError::Inspection { kind, cluster, .. } => {
            assert_eq!(kind, ResourceKind::ScalingGroup);
            assert_eq!(cluster, "demo");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn declined_confirmation_has_no_side_effects() {
    let (mock, reconciler, names) = setup();
    seed_managed_cluster(&mock, &names);

    let decline = |_: &str| false;
    let outcome = reconciler
        .reconcile(Operation::Delete, &names, None, &ExecutionPolicy::new(false, &decline))
        .await
        .unwrap();

    let report = outcome.report.unwrap();
    assert!(report.user_aborted());
    assert!(!report.has_failures());
    assert!(report.entries.iter().all(|e| e.outcome == ActionOutcome::Aborted));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn create_then_delete_leaves_nothing_behind() {
    let (mock, reconciler, names) = setup();
    reconciler
        .reconcile(
            Operation::Create,
            &names,
            Some(blueprint(&reconciler, &names).await),
            &ExecutionPolicy::unattended(),
        )
        .await
        .unwrap();

    let deleted = reconciler
        .reconcile(Operation::Delete, &names, None, &ExecutionPolicy::unattended())
        .await
        .unwrap();
    assert_eq!(deleted.plan.len(), 6);
    assert!(!deleted.has_failures());

    let status = reconciler.status(&names).await.unwrap();
    assert_eq!(status.present_count(), 0);
    for kind in ResourceKind::ALL {
        assert!(!mock.contains(kind, &names.name_for(kind)));
    }
}

//! `clusterctl status`

use super::Completion;
use crate::args::{OutputFormat, StatusArgs};
use crate::console::render_status;
use anyhow::{Context, Result};
use cluster_types::ClusterNames;
use reconciler::ClusterReconciler;

pub async fn run(reconciler: &ClusterReconciler, args: &StatusArgs, region: &str) -> Result<Completion> {
    let names = ClusterNames::new(&args.cluster)?;
    let status = reconciler.status(&names).await?;

    match args.output {
        OutputFormat::Text => print!("{}", render_status(&status, region)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&status).context("Failed to serialize cluster status")?;
            println!("{}", json);
        }
    }
    Ok(Completion::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_provider::MockProvider;
    use cluster_types::ResourceKind;
    use reconciler::ReconcilerConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_status_is_read_only() {
        let mock = MockProvider::new();
        mock.insert_managed(ResourceKind::ComputeCluster, "clusterctl-demo", Some("ACTIVE"));
        let reconciler = ClusterReconciler::new(Arc::new(mock.clone()), ReconcilerConfig::default()).unwrap();

        for output in [OutputFormat::Text, OutputFormat::Json] {
            let args = StatusArgs {
                cluster: "demo".to_string(),
                output,
            };
            assert_eq!(run(&reconciler, &args, "us-east-1").await.unwrap(), Completion::Done);
        }
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_status_read_failure_is_an_error() {
        let mock = MockProvider::new();
        mock.fail_reads(ResourceKind::ServiceRole, "access denied");
        let reconciler = ClusterReconciler::new(Arc::new(mock), ReconcilerConfig::default()).unwrap();
        let args = StatusArgs {
            cluster: "demo".to_string(),
            output: OutputFormat::Text,
        };

        let err = run(&reconciler, &args, "us-east-1").await.unwrap_err();
        assert!(err.to_string().contains("Service Role"));
    }
}

//! Runtime configuration built from arguments and environment

use crate::args::GlobalArgs;
use anyhow::{bail, Context, Result};
use cloud_provider::HttpProvider;
use reconciler::{ReconcilerConfig, RetryPolicy, WaitPolicy};
use std::time::Duration;
use tracing::info;

/// Retry and wait tuning from the global options
pub fn reconciler_config(args: &GlobalArgs) -> ReconcilerConfig {
    ReconcilerConfig {
        retry: RetryPolicy::new(args.retry_attempts, Duration::from_secs(args.retry_delay_secs)),
        wait: WaitPolicy::new(
            Duration::from_secs(args.wait_interval_secs),
            Duration::from_secs(args.wait_timeout_secs),
        ),
    }
}

/// Control plane client from the global options
pub fn provider(args: &GlobalArgs) -> Result<HttpProvider> {
    let token = match args.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => bail!("--token or the CLUSTERCTL_TOKEN environment variable is required"),
    };

    info!("Configuration:");
    info!("  Endpoint: {}", args.endpoint);
    info!("  Region: {}", args.region);

    HttpProvider::new(args.endpoint.clone(), token, args.region.clone())
        .context("Failed to create control plane client")
}

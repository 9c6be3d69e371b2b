//! Command line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Create, delete and inspect container clusters
#[derive(Parser, Debug)]
#[command(name = "clusterctl", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Control plane endpoint
    #[arg(long, global = true, env = "CLUSTERCTL_ENDPOINT", default_value = "http://localhost:8080")]
    pub endpoint: String,

    /// Bearer token for the control plane
    #[arg(long, global = true, env = "CLUSTERCTL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Region every request is scoped to
    #[arg(long, global = true, env = "CLUSTERCTL_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Attempts per write before giving up on transient errors
    #[arg(long, global = true, default_value_t = 10)]
    pub retry_attempts: u32,

    /// Seconds between write attempts
    #[arg(long, global = true, default_value_t = 1)]
    pub retry_delay_secs: u64,

    /// Seconds between polls while waiting for a deletion to finish
    #[arg(long, global = true, default_value_t = 1)]
    pub wait_interval_secs: u64,

    /// Maximum seconds to wait for a deletion to finish
    #[arg(long, global = true, default_value_t = 300)]
    pub wait_timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the resources of a cluster that do not exist yet
    Create(CreateArgs),

    /// Delete the resources of a cluster created by clusterctl
    Delete(DeleteArgs),

    /// Show the resources of a cluster
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Cluster name
    pub cluster: String,

    /// Container instance type
    #[arg(long, default_value = "t2.micro")]
    pub instance_type: String,

    /// Initial number of container instances
    #[arg(long, default_value_t = 1)]
    pub initial_capacity: u16,

    /// Key pair for SSH access to container instances
    #[arg(long = "key")]
    pub key_pair: String,

    /// VPC to place the cluster in (default network when omitted)
    #[arg(long)]
    pub vpc: Option<String>,

    /// Existing instance profile to use instead of creating one
    #[arg(long)]
    pub instance_profile: Option<String>,

    /// Machine image for container instances
    #[arg(long)]
    pub image_id: String,

    /// Source range allowed to reach instances over SSH
    #[arg(long, default_value = "0.0.0.0/0")]
    pub ssh_cidr: String,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Cluster name
    pub cluster: String,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub force: bool,

    /// Keep deleting independent resources after a failure
    #[arg(long = "continue")]
    pub continue_on_error: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Cluster name
    pub cluster: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

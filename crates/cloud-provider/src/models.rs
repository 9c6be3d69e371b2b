//! Control plane models

use cluster_types::ResourceDetails;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resource as returned by a lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedResource {
    /// Resource name
    pub name: String,
    /// Raw status reported by the control plane, if the kind has one
    #[serde(default)]
    pub status: Option<String>,
    /// Kind-specific details for display
    #[serde(default)]
    pub details: ResourceDetails,
}

/// Everything needed to create one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Kind-specific parameters
    pub params: ResourceParams,
    /// Written onto the resource, provenance marker included
    pub tags: BTreeMap<String, String>,
}

/// Kind-specific creation parameters. Cross-resource references are by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[allow(missing_docs, reason = "fields mirror the control plane API")]
pub enum ResourceParams {
    /// Role assumed by the container service
    ServiceRole {
        trusted_service: String,
        managed_policies: Vec<String>,
    },
    /// Role for cluster instances
    InstanceProfile {
        trusted_service: String,
        managed_policies: Vec<String>,
    },
    /// Instance firewall
    InstanceSecurityGroup {
        vpc_id: String,
        description: String,
        ingress: Vec<IngressRule>,
    },
    /// Instance blueprint; references the profile and security group by name
    LaunchTemplate {
        instance_type: String,
        image_id: String,
        key_pair: String,
        instance_profile: String,
        security_groups: Vec<String>,
        /// Base64 encoded
        user_data: String,
    },
    /// Instance group launched from the named template
    ScalingGroup {
        launch_template: String,
        subnet_ids: Vec<String>,
        min_size: u16,
        max_size: u16,
        desired_capacity: u16,
    },
    /// No parameters
    ComputeCluster,
}

/// Inbound firewall rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    /// e.g. `tcp`
    pub protocol: String,
    /// First port of the range
    pub from_port: u16,
    /// Last port of the range
    pub to_port: u16,
    /// Source address range
    pub cidr: String,
}

/// Network the cluster's instances are placed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// VPC identifier
    pub vpc_id: String,
    /// Subnets new instances are spread across
    pub subnet_ids: Vec<String>,
}

/// Error body returned by the control plane
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code, e.g. `DependencyViolation`
    #[serde(default)]
    pub code: String,
    /// Human-readable cause
    #[serde(default)]
    pub message: String,
}

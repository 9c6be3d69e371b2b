//! Create parameters
//!
//! Turns operator settings into the [`CreateRequest`] for each resource kind.
//! Cross-resource references are by deterministic name, so a request can be
//! built before its dependencies exist.

use crate::error::ActionError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use cloud_provider::{CreateRequest, IngressRule, Network, ResourceParams};
use cluster_types::{ClusterNames, ResourceKind, CLUSTER_TAG, PROVENANCE_TAG};
use std::collections::BTreeMap;

const CONTAINER_SERVICE: &str = "ecs.amazonaws.com";
const COMPUTE_SERVICE: &str = "ec2.amazonaws.com";
const SERVICE_ROLE_POLICY: &str = "arn:aws:iam::aws:policy/service-role/AmazonEC2ContainerServiceRole";
const INSTANCE_ROLE_POLICY: &str = "arn:aws:iam::aws:policy/service-role/AmazonEC2ContainerServiceforEC2Role";
const SSH_PORT: u16 = 22;

/// Operator-supplied settings for new clusters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSettings {
    /// Instance type of the launch template
    pub instance_type: String,
    /// Desired and maximum size of the scaling group
    pub initial_capacity: u16,
    /// SSH key pair for instances; required for the launch template
    pub key_pair: Option<String>,
    /// Machine image; required for the launch template
    pub image_id: Option<String>,
    /// Resolved network; required for the security group and scaling group
    pub network: Option<Network>,
    /// Source range allowed to reach instances over SSH
    pub ssh_cidr: String,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            instance_type: "t2.micro".to_string(),
            initial_capacity: 1,
            key_pair: None,
            image_id: None,
            network: None,
            ssh_cidr: "0.0.0.0/0".to_string(),
        }
    }
}

/// Everything needed to create the resources of one cluster
#[derive(Debug, Clone)]
pub struct ClusterBlueprint {
    names: ClusterNames,
    settings: ClusterSettings,
    created_at: DateTime<Utc>,
}

impl ClusterBlueprint {
    /// Blueprint for the cluster named by `names`
    pub fn new(names: ClusterNames, settings: ClusterSettings) -> Self {
        Self {
            names,
            settings,
            created_at: Utc::now(),
        }
    }

    /// Names of the cluster resources
    pub fn names(&self) -> &ClusterNames {
        &self.names
    }

    /// Operator-supplied settings
    pub fn settings(&self) -> &ClusterSettings {
        &self.settings
    }

    /// Tags written onto every created resource, provenance marker included
    pub fn tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                PROVENANCE_TAG.to_string(),
                self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (CLUSTER_TAG.to_string(), self.names.cluster().to_string()),
        ])
    }

    /// Build the create request for `kind`.
    ///
    /// Fails with [`ActionError::MissingParameter`] when a setting the kind
    /// needs was not supplied.
    pub fn request_for(&self, kind: ResourceKind) -> Result<CreateRequest, ActionError> {
        let params = match kind {
            ResourceKind::ServiceRole => ResourceParams::ServiceRole {
                trusted_service: CONTAINER_SERVICE.to_string(),
                managed_policies: vec![SERVICE_ROLE_POLICY.to_string()],
            },
            ResourceKind::InstanceProfile => ResourceParams::InstanceProfile {
                trusted_service: COMPUTE_SERVICE.to_string(),
                managed_policies: vec![INSTANCE_ROLE_POLICY.to_string()],
            },
            ResourceKind::InstanceSecurityGroup => {
                let network = self.network()?;
                let name = self.names.name_for(kind);
                ResourceParams::InstanceSecurityGroup {
                    vpc_id: network.vpc_id.clone(),
                    description: name,
                    ingress: vec![IngressRule {
                        protocol: "tcp".to_string(),
                        from_port: SSH_PORT,
                        to_port: SSH_PORT,
                        cidr: self.settings.ssh_cidr.clone(),
                    }],
                }
            }
            ResourceKind::LaunchTemplate => ResourceParams::LaunchTemplate {
                instance_type: self.settings.instance_type.clone(),
                image_id: required(self.settings.image_id.as_deref(), "image id")?,
                key_pair: required(self.settings.key_pair.as_deref(), "key pair")?,
                instance_profile: self.names.name_for(ResourceKind::InstanceProfile),
                security_groups: vec![self.names.name_for(ResourceKind::InstanceSecurityGroup)],
                user_data: self.user_data(),
            },
            ResourceKind::ScalingGroup => {
                let network = self.network()?;
                if network.subnet_ids.is_empty() {
                    return Err(ActionError::MissingParameter(format!(
                        "no subnets in network [{}]",
                        network.vpc_id
                    )));
                }
                ResourceParams::ScalingGroup {
                    launch_template: self.names.name_for(ResourceKind::LaunchTemplate),
                    subnet_ids: network.subnet_ids.clone(),
                    min_size: 0,
                    max_size: self.settings.initial_capacity,
                    desired_capacity: self.settings.initial_capacity,
                }
            }
            ResourceKind::ComputeCluster => ResourceParams::ComputeCluster,
        };

        Ok(CreateRequest {
            params,
            tags: self.tags(),
        })
    }

    /// Boot script registering instances with the compute cluster, base64 encoded
    fn user_data(&self) -> String {
        let script = format!(
            "#!/bin/bash\necho ECS_CLUSTER={} >> /etc/ecs/ecs.config",
            self.names.name_for(ResourceKind::ComputeCluster)
        );
        STANDARD.encode(script)
    }

    fn network(&self) -> Result<&Network, ActionError> {
        self.settings
            .network
            .as_ref()
            .ok_or_else(|| ActionError::MissingParameter("network".to_string()))
    }
}

fn required(value: Option<&str>, what: &str) -> Result<String, ActionError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ActionError::MissingParameter(what.to_string()))
}

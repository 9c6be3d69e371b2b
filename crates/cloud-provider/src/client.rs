//! Control plane REST client
//!
//! Resources live under `/v1/{collection}/{name}`; tags under
//! `/v1/{collection}/{name}/tags`; network lookups under `/v1/network`.

use crate::error::ProviderError;
use crate::models::{ApiErrorBody, CreateRequest, Network, ObservedResource};
use crate::provider_trait::ResourceProvider;
use cluster_types::ResourceKind;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Error codes the control plane uses while a dependency is still
/// propagating or still being torn down. Writes failing with these are retried.
const DEPENDENCY_CODES: &[&str] = &["DependencyNotReady", "DependencyViolation", "ResourceInUse"];

/// A just-created instance profile is rejected as an invalid parameter until
/// it becomes visible to the compute service.
fn is_unpropagated_profile(api_error: &ApiErrorBody) -> bool {
    api_error.code == "InvalidParameterValue" && api_error.message.contains("IamInstanceProfile")
}

/// HTTP implementation of [`ResourceProvider`]
pub struct HttpProvider {
    client: Client,
    base_url: String,
    token: String,
    region: String,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("base_url", &self.base_url)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl HttpProvider {
    /// Create a new control plane client
    ///
    /// # Arguments
    /// * `base_url` - Control plane base URL (e.g., "http://control-plane:8080")
    /// * `token` - Bearer token for authentication
    /// * `region` - Region every request is scoped to
    pub fn new(base_url: String, token: String, region: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            region,
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Region sent with every request
    pub fn region(&self) -> &str {
        &self.region
    }

    fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}/v1/{}", self.base_url, collection(kind))
    }

    fn resource_url(&self, kind: ResourceKind, name: &str) -> String {
        format!("{}/{}", self.collection_url(kind), urlencoding::encode(name))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("X-Region", &self.region)
            .header("Accept", "application/json")
    }

    async fn error_from(response: Response, context: &str) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_response(status, &body, context)
    }
}

/// Path segment of the collection holding resources of `kind`
#[must_use]
pub fn collection(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::ServiceRole => "service-roles",
        ResourceKind::InstanceProfile => "instance-profiles",
        ResourceKind::InstanceSecurityGroup => "security-groups",
        ResourceKind::LaunchTemplate => "launch-templates",
        ResourceKind::ScalingGroup => "scaling-groups",
        ResourceKind::ComputeCluster => "clusters",
    }
}

/// Map a non-success response to a [`ProviderError`]
#[must_use]
pub fn classify_response(status: StatusCode, body: &str, context: &str) -> ProviderError {
    let api_error: ApiErrorBody = serde_json::from_str(body).unwrap_or_else(|_| ApiErrorBody {
        code: String::new(),
        message: body.trim().to_string(),
    });
    let detail = if api_error.code.is_empty() {
        format!("{} - {}", status, api_error.message)
    } else {
        format!("{}: {}", api_error.code, api_error.message)
    };
    let message = format!("{}: {}", context, detail);

    if status == StatusCode::NOT_FOUND {
        return ProviderError::NotFound(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return ProviderError::Transient(message);
    }
    if DEPENDENCY_CODES.contains(&api_error.code.as_str()) || is_unpropagated_profile(&api_error) {
        return ProviderError::Transient(message);
    }
    if status == StatusCode::CONFLICT && api_error.code == "AlreadyExists" {
        return ProviderError::AlreadyExists(message);
    }
    ProviderError::Permanent(message)
}

#[async_trait::async_trait]
impl ResourceProvider for HttpProvider {
    async fn get_by_name(&self, kind: ResourceKind, name: &str) -> Result<Option<ObservedResource>, ProviderError> {
        let url = self.resource_url(kind, name);
        debug!("Fetching {} [{}]", kind, name);

        let response = self.authorized(self.client.get(&url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response, &format!("Failed to get {} [{}]", kind, name)).await);
        }

        let text = response.text().await?;
        let resource: ObservedResource = serde_json::from_str(&text)?;
        Ok(Some(resource))
    }

    async fn create(&self, kind: ResourceKind, name: &str, request: &CreateRequest) -> Result<(), ProviderError> {
        let url = self.collection_url(kind);
        debug!("Creating {} [{}]", kind, name);

        let body = serde_json::json!({
            "name": name,
            "params": request.params,
            "tags": request.tags,
        });
        let response = self.authorized(self.client.post(&url)).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, &format!("Failed to create {} [{}]", kind, name)).await);
        }
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<(), ProviderError> {
        let url = self.resource_url(kind, name);
        debug!("Deleting {} [{}]", kind, name);

        let response = self.authorized(self.client.delete(&url)).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, &format!("Failed to delete {} [{}]", kind, name)).await);
        }
        Ok(())
    }

    async fn list_tags(&self, kind: ResourceKind, name: &str) -> Result<BTreeMap<String, String>, ProviderError> {
        let url = format!("{}/tags", self.resource_url(kind, name));
        debug!("Fetching tags for {} [{}]", kind, name);

        let response = self.authorized(self.client.get(&url)).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, &format!("Failed to retrieve tags for {} [{}]", kind, name)).await);
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn network(&self, vpc_id: Option<&str>) -> Result<Network, ProviderError> {
        let url = match vpc_id {
            Some(vpc) => format!("{}/v1/network?vpc={}", self.base_url, urlencoding::encode(vpc)),
            None => format!("{}/v1/network", self.base_url),
        };
        debug!("Resolving network {}", vpc_id.unwrap_or("(default)"));

        let response = self.authorized(self.client.get(&url)).send().await?;

        if !response.status().is_success() {
            let context = format!("Failed to resolve network [{}]", vpc_id.unwrap_or("default"));
            return Err(Self::error_from(response, &context).await);
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

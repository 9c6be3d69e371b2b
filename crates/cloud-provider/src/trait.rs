//! ResourceProvider trait for mocking
//!
//! This trait abstracts the control plane client so the reconciler can be
//! driven by an in-memory mock in unit tests.

use crate::error::ProviderError;
use crate::models::{CreateRequest, Network, ObservedResource};
use cluster_types::ResourceKind;
use std::collections::BTreeMap;

/// Operations the reconciler needs from the control plane
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Look up a resource by name. `Ok(None)` means it does not exist.
    async fn get_by_name(&self, kind: ResourceKind, name: &str) -> Result<Option<ObservedResource>, ProviderError>;

    /// Create a resource. A name already in use fails with `AlreadyExists`.
    async fn create(&self, kind: ResourceKind, name: &str, request: &CreateRequest) -> Result<(), ProviderError>;

    /// Delete a resource. A missing resource fails with `NotFound`.
    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<(), ProviderError>;

    /// Tags of an existing resource
    async fn list_tags(&self, kind: ResourceKind, name: &str) -> Result<BTreeMap<String, String>, ProviderError>;

    /// Resolve the given VPC, or the default network when `vpc_id` is `None`
    async fn network(&self, vpc_id: Option<&str>) -> Result<Network, ProviderError>;
}

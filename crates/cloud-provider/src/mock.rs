//! Mock ResourceProvider for unit testing
//!
//! Resources live in memory and can be seeded directly. Failures can be
//! scripted per (kind, operation), and a resource can be made to disappear
//! after a number of lookups to simulate a deletion finishing in the
//! background. Deletes of one kind can be blocked while another kind still
//! exists, as the control plane does for resources still in use.

use crate::error::ProviderError;
use crate::models::{CreateRequest, Network, ObservedResource};
use crate::provider_trait::ResourceProvider;
use cluster_types::{ResourceDetails, ResourceKind, PROVENANCE_TAG};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Write operations recorded by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    /// [`ResourceProvider::create`]
    Create,
    /// [`ResourceProvider::delete`]
    Delete,
}

/// One recorded write call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Which write was issued
    pub operation: MockOperation,
    /// Resource kind
    pub kind: ResourceKind,
    /// Resource name
    pub name: String,
}

#[derive(Debug, Clone)]
struct MockResource {
    observed: ObservedResource,
    tags: BTreeMap<String, String>,
    /// Lookups left before the resource vanishes
    vanish_after: Option<u32>,
}

type Key = (ResourceKind, String);

/// Mock control plane for testing
#[derive(Clone, Default)]
pub struct MockProvider {
    resources: Arc<Mutex<HashMap<Key, MockResource>>>,
    write_failures: Arc<Mutex<HashMap<(ResourceKind, MockOperation), VecDeque<ProviderError>>>>,
    read_failures: Arc<Mutex<HashMap<ResourceKind, String>>>,
    background_deletes: Arc<Mutex<HashMap<ResourceKind, u32>>>,
    delete_blockers: Arc<Mutex<HashMap<ResourceKind, ResourceKind>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    network: Arc<Mutex<Option<Network>>>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider").finish_non_exhaustive()
    }
}

impl MockProvider {
    /// Create an empty mock control plane with a default network
    pub fn new() -> Self {
        let mock = Self::default();
        mock.set_network(Network {
            vpc_id: "vpc-default".to_string(),
            subnet_ids: vec!["subnet-a".to_string(), "subnet-b".to_string()],
        });
        mock
    }

    /// Add a resource to the mock store (for test setup)
    pub fn insert(&self, kind: ResourceKind, name: &str, status: Option<&str>, tags: BTreeMap<String, String>) {
        self.insert_with_details(kind, name, status, tags, ResourceDetails::None);
    }

    /// Add a resource with kind-specific details (for test setup)
    pub fn insert_with_details(
        &self,
        kind: ResourceKind,
        name: &str,
        status: Option<&str>,
        tags: BTreeMap<String, String>,
        details: ResourceDetails,
    ) {
        let resource = MockResource {
            observed: ObservedResource {
                name: name.to_string(),
                status: status.map(ToString::to_string),
                details,
            },
            tags,
            vanish_after: None,
        };
        self.resources.lock().unwrap().insert((kind, name.to_string()), resource);
    }

    /// Add a resource carrying the provenance tag (for test setup)
    pub fn insert_managed(&self, kind: ResourceKind, name: &str, status: Option<&str>) {
        let tags = BTreeMap::from([(PROVENANCE_TAG.to_string(), "2026-01-01T00:00:00Z".to_string())]);
        self.insert(kind, name, status, tags);
    }

    /// Make an existing resource disappear once it has been looked up `lookups` more times
    pub fn vanish_after(&self, kind: ResourceKind, name: &str, lookups: u32) {
        if let Some(resource) = self.resources.lock().unwrap().get_mut(&(kind, name.to_string())) {
            resource.vanish_after = Some(lookups);
        }
    }

    /// Accept deletes of `kind` but keep the resource around, terminating,
    /// for `lookups` more lookups
    pub fn delete_in_background(&self, kind: ResourceKind, lookups: u32) {
        self.background_deletes.lock().unwrap().insert(kind, lookups);
    }

    /// Reject deletes of `kind` with a transient `ResourceInUse` while any
    /// resource of `blocker` exists
    pub fn block_delete_while_present(&self, kind: ResourceKind, blocker: ResourceKind) {
        self.delete_blockers.lock().unwrap().insert(kind, blocker);
    }

    /// Queue an error for the next write of `operation` on `kind`
    pub fn fail_next(&self, kind: ResourceKind, operation: MockOperation, error: ProviderError) {
        self.write_failures
            .lock()
            .unwrap()
            .entry((kind, operation))
            .or_default()
            .push_back(error);
    }

    /// Make every lookup of `kind` fail
    pub fn fail_reads(&self, kind: ResourceKind, message: &str) {
        self.read_failures.lock().unwrap().insert(kind, message.to_string());
    }

    /// Replace the network returned by lookups
    pub fn set_network(&self, network: Network) {
        *self.network.lock().unwrap() = Some(network);
    }

    /// Make every network lookup fail
    pub fn clear_network(&self) {
        *self.network.lock().unwrap() = None;
    }

    /// All write calls issued so far, including failed ones
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether the store holds the resource, terminating or not
    pub fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        self.resources.lock().unwrap().contains_key(&(kind, name.to_string()))
    }

    /// Tags of a stored resource
    pub fn tags_of(&self, kind: ResourceKind, name: &str) -> Option<BTreeMap<String, String>> {
        self.resources
            .lock()
            .unwrap()
            .get(&(kind, name.to_string()))
            .map(|r| r.tags.clone())
    }

    fn record(&self, operation: MockOperation, kind: ResourceKind, name: &str) {
        self.calls.lock().unwrap().push(MockCall {
            operation,
            kind,
            name: name.to_string(),
        });
    }

    fn scripted_failure(&self, kind: ResourceKind, operation: MockOperation) -> Option<ProviderError> {
        self.write_failures
            .lock()
            .unwrap()
            .get_mut(&(kind, operation))
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait::async_trait]
impl ResourceProvider for MockProvider {
    async fn get_by_name(&self, kind: ResourceKind, name: &str) -> Result<Option<ObservedResource>, ProviderError> {
        if let Some(message) = self.read_failures.lock().unwrap().get(&kind) {
            return Err(ProviderError::Permanent(message.clone()));
        }

        let key = (kind, name.to_string());
        let mut resources = self.resources.lock().unwrap();
        let Some(resource) = resources.get_mut(&key) else {
            return Ok(None);
        };
        let vanish_after = resource.vanish_after;
        match vanish_after {
            Some(0) => {
                resources.remove(&key);
                Ok(None)
            }
            Some(remaining) => {
                resource.vanish_after = Some(remaining - 1);
                Ok(Some(resource.observed.clone()))
            }
            None => Ok(Some(resource.observed.clone())),
        }
    }

    async fn create(&self, kind: ResourceKind, name: &str, request: &CreateRequest) -> Result<(), ProviderError> {
        self.record(MockOperation::Create, kind, name);
        if let Some(error) = self.scripted_failure(kind, MockOperation::Create) {
            return Err(error);
        }

        let key = (kind, name.to_string());
        let mut resources = self.resources.lock().unwrap();
        if resources.contains_key(&key) {
            return Err(ProviderError::AlreadyExists(format!("{} [{}] already exists", kind, name)));
        }
        let status = match kind {
            ResourceKind::ComputeCluster => Some("ACTIVE".to_string()),
            _ => None,
        };
        resources.insert(
            key,
            MockResource {
                observed: ObservedResource {
                    name: name.to_string(),
                    status,
                    details: ResourceDetails::None,
                },
                tags: request.tags.clone(),
                vanish_after: None,
            },
        );
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<(), ProviderError> {
        self.record(MockOperation::Delete, kind, name);
        if let Some(error) = self.scripted_failure(kind, MockOperation::Delete) {
            return Err(error);
        }

        let blocker = self.delete_blockers.lock().unwrap().get(&kind).copied();
        let background = self.background_deletes.lock().unwrap().get(&kind).copied();
        let key = (kind, name.to_string());
        let mut resources = self.resources.lock().unwrap();

        if let Some(blocker) = blocker {
            if resources.keys().any(|(k, _)| *k == blocker) {
                return Err(ProviderError::Transient(format!(
                    "ResourceInUse: {} [{}] is in use by a {}",
                    kind, name, blocker
                )));
            }
        }

        let Some(resource) = resources.get_mut(&key) else {
            return Err(ProviderError::NotFound(format!("{} [{}] not found", kind, name)));
        };
        if let Some(lookups) = background {
            resource.observed.status = Some("Delete in progress".to_string());
            resource.vanish_after = Some(lookups);
        } else {
            resources.remove(&key);
        }
        Ok(())
    }

    async fn list_tags(&self, kind: ResourceKind, name: &str) -> Result<BTreeMap<String, String>, ProviderError> {
        self.tags_of(kind, name)
            .ok_or_else(|| ProviderError::NotFound(format!("{} [{}] not found", kind, name)))
    }

    async fn network(&self, vpc_id: Option<&str>) -> Result<Network, ProviderError> {
        let network = self
            .network
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ProviderError::Permanent("no default network".to_string()))?;
        match vpc_id {
            Some(vpc) if vpc != network.vpc_id => Err(ProviderError::NotFound(format!("VPC [{}] not found", vpc))),
            _ => Ok(network),
        }
    }
}

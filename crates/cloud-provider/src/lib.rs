//! Infrastructure control plane client
//!
//! The reconciler talks to the remote control plane only through the
//! [`ResourceProvider`] trait defined here. The crate ships one real
//! implementation, [`HttpProvider`], and an in-memory mock for tests.
//!
//! # Example
//!
//! ```no_run
//! use cloud_provider::{HttpProvider, ResourceProvider};
//! use cluster_types::ResourceKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = HttpProvider::new(
//!     "http://control-plane:8080".to_string(),
//!     "api-token".to_string(),
//!     "us-east-1".to_string(),
//! )?;
//!
//! // Look up a scaling group by its deterministic name
//! let group = provider.get_by_name(ResourceKind::ScalingGroup, "clusterctl-demo-asg").await?;
//! println!("found: {}", group.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Error classification
//!
//! Every failed write is either transient (eventual-consistency lag, throttling,
//! unavailable control plane) or permanent. Callers retry only the former.

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod provider_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::HttpProvider;
pub use error::ProviderError;
pub use models::*;
pub use provider_trait::ResourceProvider;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockCall, MockOperation, MockProvider};

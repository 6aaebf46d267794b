//! Cluster API client
//!
//! The narrow slice of the Kubernetes API the cops workload tuner needs:
//! get/replace for Deployments and StatefulSets, list/replace for Pods.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClientTrait, KubeClusterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::try_default().await?;
//!
//! let deployment = client.get_deployment("default", "web").await?;
//! let pods = client.list_pods("default", Some("app=web")).await?;
//! println!("{:?} has {} labelled pods", deployment.metadata.name, pods.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Error classification**: 404 and 409 responses surface as
//!   `ClusterError::NotFound` and `ClusterError::Conflict`
//! - **Optimistic concurrency**: replace calls send the resource version
//!   that was read, so a concurrent writer is detected instead of overwritten
//! - **Mocking**: `MockClusterClient` (feature `test-util`) keeps objects in memory

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use error::ClusterError;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockClusterClient, Operation};

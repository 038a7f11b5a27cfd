//!
//! # Cluster Connector
//!
//! Registration of member cluster credentials with the host control plane.
//!
mod error;
mod kubeconfig;
mod snapshot;

pub mod memory;

pub use error::ConnectorError;
pub use kubeconfig::KubeConfigFile;
pub use snapshot::{CapacitySnapshot, ResourceQuantity};

use async_trait::async_trait;

pub type SharedConnector<C> = std::sync::Arc<C>;

#[async_trait]
pub trait ClusterConnector: Send + Sync {
    /// Register the credential in `kube_config` under `name`.
    /// Returns the API server URL of the joined cluster.
    async fn join(&self, name: &str, kube_config: &KubeConfigFile) -> Result<String, ConnectorError>;

    async fn detach(&self, name: &str) -> Result<(), ConnectorError>;

    /// Move a registration to a new name without re-joining
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<(), ConnectorError>;

    /// Node counts and capacity of a joined cluster
    async fn probe(&self, name: &str) -> Result<CapacitySnapshot, ConnectorError>;

    /// Ensure `namespace` exists in the cluster. Returns true if it was already there.
    async fn create_namespace(&self, name: &str, namespace: &str) -> Result<bool, ConnectorError>;
}

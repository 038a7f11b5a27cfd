//!
//! # Cloud Provider Adapter
//!
//! Contract for listing clusters hosted by a cloud provider and fetching their
//! credentials, and a factory resolving adapters by provider name.
//!
mod catalog;
mod error;
mod factory;

pub use catalog::{CatalogProvider, ProvisionTable};
pub use error::ProviderError;
pub use factory::{CloudProviderFactory, ProviderBuilder, StaticProviderFactory};

use async_trait::async_trait;

use flotilla_metadata::{CloudCluster, CloudClusterProvision, ProvisionRequest};

#[async_trait]
pub trait CloudProvider: Send + Sync {
    fn name(&self) -> &str;

    /// One page of the provider's clusters and the total count.
    /// A non-positive page or page size returns every cluster.
    async fn list_clusters(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<CloudCluster>, u64), ProviderError>;

    async fn get_kube_config(&self, cluster_id: &str) -> Result<String, ProviderError>;

    async fn get_cluster_info(&self, cluster_id: &str) -> Result<CloudCluster, ProviderError>;

    /// Start provisioning a new cluster. Fails with
    /// [`ProviderError::ClusterAlreadyExists`] if one of that name is tracked.
    async fn create_cluster(&self, req: &ProvisionRequest) -> Result<(), ProviderError>;

    async fn creation_status(&self, name: &str) -> Result<CloudClusterProvision, ProviderError>;

    /// every tracked creation, ordered by name
    async fn list_creations(&self) -> Result<Vec<CloudClusterProvision>, ProviderError>;

    /// Tear down a tracked creation. The record reports deleting until the
    /// provider drops it.
    async fn delete_creation(&self, name: &str) -> Result<(), ProviderError>;

    /// true if `err` means the access key was rejected
    fn is_invalid_key(&self, err: &ProviderError) -> bool {
        matches!(err, ProviderError::InvalidAccessKey)
    }
}

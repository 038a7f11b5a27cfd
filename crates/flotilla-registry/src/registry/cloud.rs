use std::sync::Arc;

use tracing::{error, info, instrument};

use flotilla_cloud::{CloudProvider, ProviderError};
use flotilla_connector::ClusterConnector;
use flotilla_metadata::CreationStatus;
use flotilla_metadata::dto::{
    AccessKeyRequest, ClusterBase, ConnectCloudClusterRequest, CreateCloudClusterRequest,
    CreateCloudClusterResponse, CreateClusterRequest, ListCloudClusterCreationResponse,
    ListCloudClusterResponse,
};
use flotilla_store::DataStore;

use crate::RegistryError;

use super::ClusterRegistry;

impl<D, C> ClusterRegistry<D, C>
where
    D: DataStore,
    C: ClusterConnector,
{
    #[instrument(skip(self, access_key))]
    pub async fn list_cloud_clusters(
        &self,
        provider: &str,
        access_key: &AccessKeyRequest,
        page: i64,
        page_size: i64,
    ) -> Result<ListCloudClusterResponse, RegistryError> {
        let adapter = self.cloud_provider(provider, access_key)?;
        let (clusters, total) = adapter
            .list_clusters(page, page_size)
            .await
            .map_err(|err| {
                provider_error(
                    adapter.as_ref(),
                    "list cloud clusters",
                    err,
                    RegistryError::CloudClusterFetchFailed,
                )
            })?;
        Ok(ListCloudClusterResponse { clusters, total })
    }

    /// Import a cluster hosted by `provider`, recording where it came from
    #[instrument(skip(self, req), fields(cluster = %req.name, cluster_id = %req.cluster_id))]
    pub async fn connect_cloud_cluster(
        &self,
        provider: &str,
        req: &ConnectCloudClusterRequest,
    ) -> Result<ClusterBase, RegistryError> {
        let adapter = self.cloud_provider(provider, &req.access_key)?;
        let kube_config = adapter
            .get_kube_config(&req.cluster_id)
            .await
            .map_err(|err| {
                provider_error(
                    adapter.as_ref(),
                    "get cluster kubeconfig",
                    err,
                    RegistryError::CloudClusterFetchFailed,
                )
            })?;
        let cloud_cluster = adapter
            .get_cluster_info(&req.cluster_id)
            .await
            .map_err(|err| {
                provider_error(
                    adapter.as_ref(),
                    "get cluster info",
                    err,
                    RegistryError::CloudClusterFetchFailed,
                )
            })?;

        let create = CreateClusterRequest {
            name: req.name.clone(),
            alias: req.alias.clone(),
            description: req.description.clone(),
            icon: req.icon.clone(),
            labels: req.labels.clone(),
            kube_config,
            ..Default::default()
        };
        self.create_cluster(&create, Some(&cloud_cluster)).await
    }

    /// Start provisioning a cluster through `provider` and report its creation
    #[instrument(skip(self, req), fields(cloud_cluster = %req.cluster.name))]
    pub async fn create_cloud_cluster(
        &self,
        provider: &str,
        req: &CreateCloudClusterRequest,
    ) -> Result<CreateCloudClusterResponse, RegistryError> {
        let adapter = self.cloud_provider(provider, &req.access_key)?;
        adapter.create_cluster(&req.cluster).await.map_err(|err| {
            provider_error(
                adapter.as_ref(),
                "create cloud cluster",
                err,
                RegistryError::CloudClusterCreateFailed,
            )
        })?;
        info!(provider, cloud_cluster = %req.cluster.name, "cloud cluster creation started");
        creation_status(adapter.as_ref(), &req.cluster.name).await
    }

    #[instrument(skip(self, access_key))]
    pub async fn cloud_cluster_creation_status(
        &self,
        provider: &str,
        access_key: &AccessKeyRequest,
        name: &str,
    ) -> Result<CreateCloudClusterResponse, RegistryError> {
        let adapter = self.cloud_provider(provider, access_key)?;
        creation_status(adapter.as_ref(), name).await
    }

    /// Every creation tracked by `provider`, including ones whose cluster id is missing
    #[instrument(skip(self, access_key))]
    pub async fn list_cloud_cluster_creations(
        &self,
        provider: &str,
        access_key: &AccessKeyRequest,
    ) -> Result<ListCloudClusterCreationResponse, RegistryError> {
        let adapter = self.cloud_provider(provider, access_key)?;
        let provisions = adapter.list_creations().await.map_err(|err| {
            provider_error(
                adapter.as_ref(),
                "list cloud cluster creations",
                err,
                RegistryError::CloudClusterFetchFailed,
            )
        })?;
        Ok(ListCloudClusterCreationResponse {
            creations: provisions
                .iter()
                .map(CreateCloudClusterResponse::from)
                .collect(),
        })
    }

    /// Tear down a creation. Returns its status from before the teardown.
    #[instrument(skip(self, access_key))]
    pub async fn delete_cloud_cluster_creation(
        &self,
        provider: &str,
        access_key: &AccessKeyRequest,
        name: &str,
    ) -> Result<CreateCloudClusterResponse, RegistryError> {
        let adapter = self.cloud_provider(provider, access_key)?;
        let status = creation_status(adapter.as_ref(), name).await?;
        match adapter.delete_creation(name).await {
            Ok(()) => {
                info!(provider, cloud_cluster = name, "cloud cluster creation deleted");
                Ok(status)
            }
            // dropped since the status read
            Err(ProviderError::CreationNotFound(_)) => Ok(status),
            Err(err) => Err(provider_error(
                adapter.as_ref(),
                "delete cloud cluster creation",
                err,
                RegistryError::CloudClusterFetchFailed,
            )),
        }
    }

    fn cloud_provider(
        &self,
        provider: &str,
        access_key: &AccessKeyRequest,
    ) -> Result<Arc<dyn CloudProvider>, RegistryError> {
        self.providers.provider(provider, access_key).map_err(|err| {
            error!(provider, "failed to get cluster provider: {err}");
            RegistryError::InvalidCloudProvider(provider.to_owned())
        })
    }
}

/// Creation status of `name`. An available cluster without an id is an error.
async fn creation_status(
    adapter: &dyn CloudProvider,
    name: &str,
) -> Result<CreateCloudClusterResponse, RegistryError> {
    let provision = adapter.creation_status(name).await.map_err(|err| {
        provider_error(
            adapter,
            "get cloud cluster creation",
            err,
            RegistryError::CloudClusterFetchFailed,
        )
    })?;
    let status = CreateCloudClusterResponse::from(&provision);
    if status.status == CreationStatus::ClusterIdNotFound {
        error!(provider = adapter.name(), cloud_cluster = name, "cluster id not reported");
        return Err(RegistryError::CloudClusterIdNotFound(status.name));
    }
    Ok(status)
}

/// Provider failures never leak past the registry: anything not mapped to a
/// registry error of its own is logged and replaced by `failed`.
fn provider_error(
    adapter: &dyn CloudProvider,
    op: &str,
    err: ProviderError,
    failed: RegistryError,
) -> RegistryError {
    if adapter.is_invalid_key(&err) {
        return RegistryError::InvalidAccessKey;
    }
    match err {
        ProviderError::ClusterAlreadyExists(name) => RegistryError::CloudClusterAlreadyExists(name),
        ProviderError::CreationNotFound(name) => RegistryError::CloudClusterCreationNotFound(name),
        err => {
            error!(provider = adapter.name(), "failed to {op}: {err:#}");
            failed
        }
    }
}

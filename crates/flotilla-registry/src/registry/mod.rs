//!
//! # Cluster Registry
//!
//! Every mutation touches two stores without a shared transaction: the cluster
//! store holding the records, and the host control plane holding the joined
//! credentials. Mutations run as a [`Saga`] so a failed step undoes the steps
//! that already committed.
//!
mod cloud;
mod init;
mod modify;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument};

use flotilla_cloud::CloudProviderFactory;
use flotilla_connector::{ClusterConnector, KubeConfigFile, SharedConnector};
use flotilla_metadata::dto::{
    ClusterBase, ClusterDetail, CreateClusterNamespaceRequest, CreateClusterNamespaceResponse,
    CreateClusterRequest, ListClusterResponse,
};
use flotilla_metadata::{CloudCluster, Cluster, Credential, ProviderInfo};
use flotilla_store::{DataStore, ListOptions, SharedStore, SortOrder};
use flotilla_types::is_local_cluster;

use crate::saga::Saga;
use crate::{RegistryConfig, RegistryError, ResourceInfoCache};

pub struct ClusterRegistry<D, C> {
    config: RegistryConfig,
    store: SharedStore<D>,
    connector: SharedConnector<C>,
    providers: Arc<dyn CloudProviderFactory>,
    resource_info: ResourceInfoCache,
}

impl<D, C> ClusterRegistry<D, C>
where
    D: DataStore,
    C: ClusterConnector,
{
    pub fn new(
        config: RegistryConfig,
        store: SharedStore<D>,
        connector: SharedConnector<C>,
        providers: Arc<dyn CloudProviderFactory>,
    ) -> Self {
        let resource_info = ResourceInfoCache::new(config.resource_info_ttl);
        Self {
            config,
            store,
            connector,
            providers,
            resource_info,
        }
    }

    /// Clusters whose name contains `query`, oldest first.
    /// `total` counts every match; a non-positive page or page size returns all of them.
    #[instrument(skip(self))]
    pub async fn list_kube_clusters(
        &self,
        query: &str,
        page: i64,
        page_size: i64,
    ) -> Result<ListClusterResponse, RegistryError> {
        let mut options = ListOptions::default()
            .sort("createTime", SortOrder::Ascending)
            .page(page, page_size);
        if !query.is_empty() {
            options = options.query("name", query);
        }
        let template = Cluster::default();
        let clusters = self
            .store
            .list(&template, Some(&options))
            .await
            .map_err(|err| RegistryError::store("list", query, err))?;
        let total = self
            .store
            .count(&template, Some(&options.filter))
            .await
            .map_err(|err| RegistryError::store("count", query, err))?;

        Ok(ListClusterResponse {
            clusters: clusters.iter().map(Cluster::to_base).collect(),
            total,
        })
    }

    #[instrument(skip(self, req), fields(cluster = %req.name))]
    pub async fn create_kube_cluster(
        &self,
        req: &CreateClusterRequest,
    ) -> Result<ClusterBase, RegistryError> {
        self.create_cluster(req, None).await
    }

    /// Load `name` and refresh its status from a capacity probe
    #[instrument(skip(self))]
    pub async fn get_kube_cluster(&self, name: &str) -> Result<ClusterDetail, RegistryError> {
        let mut cluster = self.load_cluster(name).await?;
        let resource_info = self
            .resource_info
            .refresh(self.connector.as_ref(), &mut cluster)
            .await;
        self.store
            .put(&cluster)
            .await
            .map_err(|err| RegistryError::store("update", name, err))?;

        Ok(ClusterDetail {
            cluster: cluster.to_base(),
            resource_info,
        })
    }

    /// Remove the record, then the control plane registration.
    /// The record is restored if the registration cannot be removed.
    #[instrument(skip(self))]
    pub async fn delete_kube_cluster(&self, name: &str) -> Result<ClusterBase, RegistryError> {
        if is_local_cluster(name) {
            return Err(RegistryError::LocalClusterImmutable);
        }
        let cluster = self.load_cluster(name).await?;

        let mut saga = Saga::new("delete cluster");
        self.store
            .delete::<Cluster>(name)
            .await
            .map_err(|err| RegistryError::store("delete", name, err))?;
        let store = self.store.as_ref();
        let deleted = cluster.clone();
        saga.push("re-add deleted record", move || async move {
            store.add(&deleted).await.map_err(anyhow::Error::from)
        });

        if let Err(err) = self.connector.detach(name).await {
            saga.abort().await;
            return Err(RegistryError::connector("detach", name, err));
        }
        saga.commit();

        info!(cluster = name, "cluster deleted");
        Ok(cluster.to_base())
    }

    #[instrument(skip(self, req), fields(namespace = %req.namespace))]
    pub async fn create_cluster_namespace(
        &self,
        name: &str,
        req: &CreateClusterNamespaceRequest,
    ) -> Result<CreateClusterNamespaceResponse, RegistryError> {
        self.load_cluster(name).await?;
        match self.connector.create_namespace(name, &req.namespace).await {
            Ok(exists) => {
                debug!(cluster = name, exists, "namespace ensured");
                Ok(CreateClusterNamespaceResponse { exists })
            }
            Err(err) if err.is_forbidden() => Err(RegistryError::CreateNamespaceForbidden {
                cluster: name.to_owned(),
                namespace: req.namespace.clone(),
            }),
            Err(err) => Err(RegistryError::connector("create namespace in", name, err)),
        }
    }

    /// Shared by plain and cloud creation. `imported` stamps provenance.
    async fn create_cluster(
        &self,
        req: &CreateClusterRequest,
        imported: Option<&CloudCluster>,
    ) -> Result<ClusterBase, RegistryError> {
        if is_local_cluster(&req.name) {
            return Err(RegistryError::LocalClusterReserved);
        }
        let mut cluster = Cluster::from_request(req, None);
        let kube_config = checked_kube_config(&cluster)?.to_owned();
        let now = Utc::now();
        cluster.set_create_time(now);
        cluster.set_update_time(now);
        if let Some(cloud_cluster) = imported {
            cluster.provider = Some(ProviderInfo::from(cloud_cluster));
            cluster.dashboard_url = cloud_cluster.dashboard_url.clone();
        }

        match self.store.is_exist::<Cluster>(&cluster.name).await {
            Ok(false) => {}
            Ok(true) => return Err(RegistryError::ClusterAlreadyExistsInStore(cluster.name)),
            Err(err) => return Err(RegistryError::store("check", &cluster.name, err)),
        }

        let mut saga = Saga::new("create cluster");
        cluster.api_server_url = self.join_cluster(&cluster.name, &kube_config).await?;
        let connector = self.connector.as_ref();
        let joined = cluster.name.clone();
        saga.push("detach joined cluster", move || async move {
            connector.detach(&joined).await.map_err(anyhow::Error::from)
        });

        self.resource_info
            .refresh(self.connector.as_ref(), &mut cluster)
            .await;

        if let Err(err) = self.store.add(&cluster).await {
            saga.abort().await;
            return Err(RegistryError::store("add", &cluster.name, err));
        }
        saga.commit();

        info!(cluster = %cluster.name, status = %cluster.status, "cluster created");
        Ok(cluster.to_base())
    }

    async fn load_cluster(&self, name: &str) -> Result<Cluster, RegistryError> {
        self.store
            .get::<Cluster>(name)
            .await
            .map_err(|err| RegistryError::store("get", name, err))
    }

    /// Join `name` with a credential written to a transient file.
    /// The file is gone once this returns.
    async fn join_cluster(&self, name: &str, kube_config: &str) -> Result<String, RegistryError> {
        let file = KubeConfigFile::create(&self.config.credential_dir, kube_config)
            .map_err(RegistryError::Credential)?;
        match self.connector.join(name, &file).await {
            Ok(server_url) => {
                debug!(cluster = name, %server_url, "cluster joined");
                Ok(server_url)
            }
            Err(err) if err.is_already_exists() => {
                Err(RegistryError::ClusterExistsInControlPlane(name.to_owned()))
            }
            Err(err) => {
                error!(cluster = name, "join failed: {err}");
                Err(RegistryError::connector("join", name, err))
            }
        }
    }
}

/// inline kubeconfig of `cluster`, rejecting secret-only and absent credentials
fn checked_kube_config(cluster: &Cluster) -> Result<&str, RegistryError> {
    match cluster.credential() {
        Credential::KubeConfig(kube_config) => Ok(kube_config),
        Credential::Secret(_) => Err(RegistryError::CredentialSecretUnsupported),
        Credential::Missing => Err(RegistryError::CredentialMissing),
    }
}

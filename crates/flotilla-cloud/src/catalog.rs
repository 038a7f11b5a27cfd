//!
//! # Catalog provider
//!
//! Adapter serving a fixed catalogue of clusters, guarded by a single
//! accepted access key. Clusters created through it are tracked in a
//! [`ProvisionTable`] whose progress is driven from outside.
//!
use std::collections::BTreeMap;
use std::sync::Arc;

use async_lock::RwLock;
use async_trait::async_trait;
use tracing::debug;

use flotilla_metadata::dto::AccessKeyRequest;
use flotilla_metadata::{CloudCluster, CloudClusterProvision, ProvisionRequest};
use flotilla_types::{CloudClusterId, Labels, ProviderName};

use crate::{CloudProvider, ProviderError};

#[derive(Debug, Clone)]
pub struct CatalogProvider {
    name: ProviderName,
    accepted: (String, String),
    presented: (String, String),
    clusters: BTreeMap<CloudClusterId, (CloudCluster, String)>,
    provisions: ProvisionTable,
}

/// Creations tracked by a provider, shared by every adapter cloned from it
#[derive(Debug, Clone, Default)]
pub struct ProvisionTable {
    entries: Arc<RwLock<BTreeMap<String, CloudClusterProvision>>>,
}

impl ProvisionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record provisioner progress of `name`. Returns false if it is not tracked.
    pub async fn update(&self, name: &str, apply_state: &str, outputs: Labels) -> bool {
        let mut write = self.entries.write().await;
        match write.get_mut(name) {
            Some(provision) => {
                provision.apply_state = apply_state.to_owned();
                provision.outputs = outputs;
                debug!(cluster = name, apply_state, "provision updated");
                true
            }
            None => false,
        }
    }

    /// Drop `name` once its teardown finished
    pub async fn remove(&self, name: &str) -> Option<CloudClusterProvision> {
        self.entries.write().await.remove(name)
    }

    pub async fn get(&self, name: &str) -> Option<CloudClusterProvision> {
        self.entries.read().await.get(name).cloned()
    }

    async fn insert(&self, name: &str) -> bool {
        let mut write = self.entries.write().await;
        if write.contains_key(name) {
            return false;
        }
        write.insert(
            name.to_owned(),
            CloudClusterProvision {
                name: name.to_owned(),
                ..Default::default()
            },
        );
        true
    }

    async fn mark_deleting(&self, name: &str) -> bool {
        let mut write = self.entries.write().await;
        match write.get_mut(name) {
            Some(provision) => {
                provision.deleting = true;
                true
            }
            None => false,
        }
    }

    async fn list(&self) -> Vec<CloudClusterProvision> {
        self.entries.read().await.values().cloned().collect()
    }
}

impl CatalogProvider {
    /// provider accepting only the given key pair, presented with that same pair
    pub fn new(name: impl Into<ProviderName>, key_id: &str, key_secret: &str) -> Self {
        let accepted = (key_id.to_owned(), key_secret.to_owned());
        Self {
            name: name.into(),
            presented: accepted.clone(),
            accepted,
            clusters: BTreeMap::new(),
            provisions: ProvisionTable::new(),
        }
    }

    /// track creations in `provisions` instead of a private table
    pub fn with_provisions(mut self, provisions: ProvisionTable) -> Self {
        self.provisions = provisions;
        self
    }

    /// key the caller authenticates with
    pub fn with_access_key(mut self, key: &AccessKeyRequest) -> Self {
        self.presented = (key.access_key_id.clone(), key.access_key_secret.clone());
        self
    }

    pub fn with_cluster(mut self, mut cluster: CloudCluster, kube_config: impl Into<String>) -> Self {
        cluster.provider = self.name.clone();
        self.clusters
            .insert(cluster.id.clone(), (cluster, kube_config.into()));
        self
    }

    fn authenticate(&self) -> Result<(), ProviderError> {
        if self.presented == self.accepted {
            Ok(())
        } else {
            Err(ProviderError::InvalidAccessKey)
        }
    }

    fn lookup(&self, cluster_id: &str) -> Result<&(CloudCluster, String), ProviderError> {
        self.authenticate()?;
        self.clusters
            .get(cluster_id)
            .ok_or_else(|| ProviderError::ClusterNotFound(cluster_id.to_owned()))
    }
}

#[async_trait]
impl CloudProvider for CatalogProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_clusters(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<CloudCluster>, u64), ProviderError> {
        self.authenticate()?;
        let total = self.clusters.len() as u64;
        let all = self.clusters.values().map(|(cluster, _)| cluster.clone());
        let clusters = if page > 0 && page_size > 0 {
            let size = page_size as usize;
            all.skip((page as usize - 1).saturating_mul(size))
                .take(size)
                .collect()
        } else {
            all.collect()
        };
        Ok((clusters, total))
    }

    async fn get_kube_config(&self, cluster_id: &str) -> Result<String, ProviderError> {
        self.lookup(cluster_id).map(|(_, kube_config)| kube_config.clone())
    }

    async fn get_cluster_info(&self, cluster_id: &str) -> Result<CloudCluster, ProviderError> {
        self.lookup(cluster_id).map(|(cluster, _)| cluster.clone())
    }

    async fn create_cluster(&self, req: &ProvisionRequest) -> Result<(), ProviderError> {
        self.authenticate()?;
        if !self.provisions.insert(&req.name).await {
            return Err(ProviderError::ClusterAlreadyExists(req.name.clone()));
        }
        debug!(
            provider = %self.name,
            cluster = %req.name,
            zone = %req.zone,
            workers = req.worker_number,
            "provision started"
        );
        Ok(())
    }

    async fn creation_status(&self, name: &str) -> Result<CloudClusterProvision, ProviderError> {
        self.authenticate()?;
        self.provisions
            .get(name)
            .await
            .ok_or_else(|| ProviderError::CreationNotFound(name.to_owned()))
    }

    async fn list_creations(&self) -> Result<Vec<CloudClusterProvision>, ProviderError> {
        self.authenticate()?;
        Ok(self.provisions.list().await)
    }

    async fn delete_creation(&self, name: &str) -> Result<(), ProviderError> {
        self.authenticate()?;
        if self.provisions.mark_deleting(name).await {
            Ok(())
        } else {
            Err(ProviderError::CreationNotFound(name.to_owned()))
        }
    }
}

//!
//! # In-memory control plane
//!
//! Simulates a host control plane: a map from registered name to the joined
//! credential, with canned capacity per cluster. The hub cluster is always
//! registered under the reserved local name.
//!
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_lock::RwLock;
use async_trait::async_trait;
use tracing::debug;

use flotilla_types::ClusterName;
use flotilla_types::defaults::{LOCAL_API_SERVER_URL, LOCAL_CLUSTER_NAME};

use crate::{CapacitySnapshot, ClusterConnector, ConnectorError, KubeConfigFile};

#[derive(Debug, Clone)]
struct Registration {
    kube_config: String,
    server_url: String,
    namespaces: BTreeSet<String>,
}

#[derive(Debug)]
pub struct MemoryConnector {
    registrations: RwLock<HashMap<ClusterName, Registration>>,
    capacities: RwLock<HashMap<ClusterName, CapacitySnapshot>>,
    denied_namespaces: RwLock<HashSet<String>>,
    probes: AtomicU64,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    pub fn new() -> Self {
        let hub = Registration {
            kube_config: String::new(),
            server_url: LOCAL_API_SERVER_URL.to_owned(),
            namespaces: ["default".to_owned()].into(),
        };
        Self {
            registrations: RwLock::new([(LOCAL_CLUSTER_NAME.to_owned(), hub)].into()),
            capacities: Default::default(),
            denied_namespaces: Default::default(),
            probes: AtomicU64::new(0),
        }
    }

    /// capacity reported by `probe` for `name`
    pub async fn set_capacity(&self, name: &str, snapshot: CapacitySnapshot) {
        self.capacities.write().await.insert(name.to_owned(), snapshot);
    }

    /// make `create_namespace` answer forbidden for `namespace`
    pub async fn deny_namespace(&self, namespace: &str) {
        self.denied_namespaces
            .write()
            .await
            .insert(namespace.to_owned());
    }

    pub async fn is_joined(&self, name: &str) -> bool {
        self.registrations.read().await.contains_key(name)
    }

    /// credential registered under `name`
    pub async fn kube_config(&self, name: &str) -> Option<String> {
        self.registrations
            .read()
            .await
            .get(name)
            .map(|r| r.kube_config.clone())
    }

    pub async fn server_url(&self, name: &str) -> Option<String> {
        self.registrations
            .read()
            .await
            .get(name)
            .map(|r| r.server_url.clone())
    }

    pub async fn joined_names(&self) -> Vec<ClusterName> {
        let mut names: Vec<_> = self.registrations.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterConnector for MemoryConnector {
    async fn join(&self, name: &str, kube_config: &KubeConfigFile) -> Result<String, ConnectorError> {
        let server_url = kube_config.server_url()?;
        let content = kube_config.read()?;
        let mut write = self.registrations.write().await;
        if write.contains_key(name) {
            return Err(ConnectorError::AlreadyExists(name.to_owned()));
        }
        write.insert(
            name.to_owned(),
            Registration {
                kube_config: content,
                server_url: server_url.clone(),
                namespaces: ["default".to_owned()].into(),
            },
        );
        debug!(name, %server_url, "joined");
        Ok(server_url)
    }

    async fn detach(&self, name: &str) -> Result<(), ConnectorError> {
        match self.registrations.write().await.remove(name) {
            Some(_) => {
                debug!(name, "detached");
                Ok(())
            }
            None => Err(ConnectorError::NotFound(name.to_owned())),
        }
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<(), ConnectorError> {
        let mut write = self.registrations.write().await;
        if write.contains_key(new_name) {
            return Err(ConnectorError::AlreadyExists(new_name.to_owned()));
        }
        let registration = write
            .remove(old_name)
            .ok_or_else(|| ConnectorError::NotFound(old_name.to_owned()))?;
        write.insert(new_name.to_owned(), registration);
        debug!(old_name, new_name, "renamed");
        Ok(())
    }

    async fn probe(&self, name: &str) -> Result<CapacitySnapshot, ConnectorError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if !self.registrations.read().await.contains_key(name) {
            return Err(ConnectorError::NotFound(name.to_owned()));
        }
        Ok(self
            .capacities
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_namespace(&self, name: &str, namespace: &str) -> Result<bool, ConnectorError> {
        if self.denied_namespaces.read().await.contains(namespace) {
            return Err(ConnectorError::Forbidden(format!(
                "namespace {namespace} in cluster {name}"
            )));
        }
        let mut write = self.registrations.write().await;
        let registration = write
            .get_mut(name)
            .ok_or_else(|| ConnectorError::NotFound(name.to_owned()))?;
        Ok(!registration.namespaces.insert(namespace.to_owned()))
    }
}

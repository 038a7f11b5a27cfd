//! Fault-injecting wrappers around the memory store and memory connector.
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_lock::Mutex;
use async_trait::async_trait;

use flotilla_cloud::{CatalogProvider, CloudProvider, ProvisionTable, StaticProviderFactory};
use flotilla_connector::memory::MemoryConnector;
use flotilla_connector::{CapacitySnapshot, ClusterConnector, ConnectorError, KubeConfigFile};
use flotilla_metadata::CloudCluster;
use flotilla_metadata::dto::{AccessKeyRequest, CreateClusterRequest};
use flotilla_store::memory::MemoryStore;
use flotilla_store::{DataStore, Entity, FilterOptions, ListOptions, StoreError};

use crate::{ClusterRegistry, RegistryConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Join,
    Detach,
    Rename,
    /// rename never completes
    StallRename,
    Probe,
    StoreGet,
    StoreAdd,
    StorePut,
    StoreDelete,
}

/// One-shot faults: each armed fault fails the next matching call only
#[derive(Debug, Default)]
pub struct Faults {
    armed: Mutex<HashSet<Fault>>,
}

impl Faults {
    pub async fn arm(&self, fault: Fault) {
        self.armed.lock().await.insert(fault);
    }

    async fn fire(&self, fault: Fault) -> bool {
        self.armed.lock().await.remove(&fault)
    }
}

#[derive(Debug)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    faults: Arc<Faults>,
}

fn injected_store_error() -> StoreError {
    StoreError::Io(std::io::Error::other("injected store failure"))
}

#[async_trait]
impl DataStore for FaultyStore {
    async fn add<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Entity,
    {
        if self.faults.fire(Fault::StoreAdd).await {
            return Err(injected_store_error());
        }
        self.inner.add(entity).await
    }

    async fn put<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Entity,
    {
        if self.faults.fire(Fault::StorePut).await {
            return Err(injected_store_error());
        }
        self.inner.put(entity).await
    }

    async fn get<E>(&self, key: &str) -> Result<E, StoreError>
    where
        E: Entity,
    {
        if self.faults.fire(Fault::StoreGet).await {
            return Err(injected_store_error());
        }
        self.inner.get(key).await
    }

    async fn delete<E>(&self, key: &str) -> Result<(), StoreError>
    where
        E: Entity,
    {
        if self.faults.fire(Fault::StoreDelete).await {
            return Err(injected_store_error());
        }
        self.inner.delete::<E>(key).await
    }

    async fn is_exist<E>(&self, key: &str) -> Result<bool, StoreError>
    where
        E: Entity,
    {
        if self.faults.fire(Fault::StoreGet).await {
            return Err(injected_store_error());
        }
        self.inner.is_exist::<E>(key).await
    }

    async fn list<E>(&self, template: &E, options: Option<&ListOptions>) -> Result<Vec<E>, StoreError>
    where
        E: Entity,
    {
        self.inner.list(template, options).await
    }

    async fn count<E>(&self, template: &E, filter: Option<&FilterOptions>) -> Result<u64, StoreError>
    where
        E: Entity,
    {
        self.inner.count(template, filter).await
    }
}

#[derive(Debug)]
pub struct FaultyConnector {
    pub inner: MemoryConnector,
    faults: Arc<Faults>,
    joins: AtomicUsize,
}

impl FaultyConnector {
    pub fn join_count(&self) -> usize {
        self.joins.load(Ordering::SeqCst)
    }
}

fn injected_connector_error() -> ConnectorError {
    ConnectorError::Other(anyhow::anyhow!("injected connector failure"))
}

#[async_trait]
impl ClusterConnector for FaultyConnector {
    async fn join(&self, name: &str, kube_config: &KubeConfigFile) -> Result<String, ConnectorError> {
        self.joins.fetch_add(1, Ordering::SeqCst);
        if self.faults.fire(Fault::Join).await {
            return Err(injected_connector_error());
        }
        self.inner.join(name, kube_config).await
    }

    async fn detach(&self, name: &str) -> Result<(), ConnectorError> {
        if self.faults.fire(Fault::Detach).await {
            return Err(injected_connector_error());
        }
        self.inner.detach(name).await
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<(), ConnectorError> {
        if self.faults.fire(Fault::StallRename).await {
            futures_util::future::pending::<()>().await;
        }
        if self.faults.fire(Fault::Rename).await {
            return Err(injected_connector_error());
        }
        self.inner.rename(old_name, new_name).await
    }

    async fn probe(&self, name: &str) -> Result<CapacitySnapshot, ConnectorError> {
        if self.faults.fire(Fault::Probe).await {
            return Err(injected_connector_error());
        }
        self.inner.probe(name).await
    }

    async fn create_namespace(&self, name: &str, namespace: &str) -> Result<bool, ConnectorError> {
        self.inner.create_namespace(name, namespace).await
    }
}

pub type TestRegistry = ClusterRegistry<FaultyStore, FaultyConnector>;

pub struct TestContext {
    pub registry: TestRegistry,
    pub store: Arc<FaultyStore>,
    pub connector: Arc<FaultyConnector>,
    pub faults: Arc<Faults>,
    /// creations of the "aliyun" provider
    pub provisions: ProvisionTable,
}

pub const ACCESS_KEY_ID: &str = "ak";
pub const ACCESS_KEY_SECRET: &str = "sk";
pub const CLOUD_CLUSTER_ID: &str = "c-8a7e";

pub fn kube_config(server: &str) -> String {
    format!(
        r#"apiVersion: v1
kind: Config
clusters:
- name: member
  cluster:
    server: {server}
contexts:
- name: member
  context:
    cluster: member
    user: admin
current-context: member
users:
- name: admin
  user:
    client-certificate: /tmp/admin.crt
    client-key: /tmp/admin.key
"#
    )
}

pub fn create_request(name: &str, server: &str) -> CreateClusterRequest {
    CreateClusterRequest {
        name: name.to_owned(),
        alias: format!("{name} alias"),
        kube_config: kube_config(server),
        ..Default::default()
    }
}

pub fn access_key(secret: &str) -> AccessKeyRequest {
    AccessKeyRequest {
        access_key_id: ACCESS_KEY_ID.to_owned(),
        access_key_secret: secret.to_owned(),
    }
}

fn cloud_cluster() -> CloudCluster {
    CloudCluster {
        id: CLOUD_CLUSTER_ID.to_owned(),
        name: "prod-hangzhou".to_owned(),
        cluster_type: "ManagedKubernetes".to_owned(),
        zone: "cn-hangzhou-h".to_owned(),
        region_id: "cn-hangzhou".to_owned(),
        vpc_id: "vpc-1".to_owned(),
        status: "running".to_owned(),
        api_server_url: "https://47.0.0.1:6443".to_owned(),
        dashboard_url: "https://console.example.com/c-8a7e".to_owned(),
        ..Default::default()
    }
}

fn provider_factory(provisions: ProvisionTable) -> StaticProviderFactory {
    StaticProviderFactory::new().register("aliyun", move |key: &AccessKeyRequest| {
        let provider: Arc<dyn CloudProvider> = Arc::new(
            CatalogProvider::new("aliyun", ACCESS_KEY_ID, ACCESS_KEY_SECRET)
                .with_access_key(key)
                .with_cluster(cloud_cluster(), kube_config("https://47.0.0.1:6443"))
                .with_provisions(provisions.clone()),
        );
        Ok(provider)
    })
}

pub async fn test_context() -> TestContext {
    let credential_dir = std::env::temp_dir();
    let config = RegistryConfig {
        credential_dir,
        ..Default::default()
    };
    let faults = Arc::new(Faults::default());
    let store = Arc::new(FaultyStore {
        inner: MemoryStore::new(),
        faults: faults.clone(),
    });
    let connector = Arc::new(FaultyConnector {
        inner: MemoryConnector::new(),
        faults: faults.clone(),
        joins: AtomicUsize::new(0),
    });
    let provisions = ProvisionTable::new();
    let registry = ClusterRegistry::new(
        config,
        store.clone(),
        connector.clone(),
        Arc::new(provider_factory(provisions.clone())),
    );
    registry.init().await.expect("registry initialized");
    TestContext {
        registry,
        store,
        connector,
        faults,
        provisions,
    }
}

use tracing::{debug, info, instrument};

use flotilla_connector::ClusterConnector;
use flotilla_metadata::{Cluster, local_cluster_created_time};
use flotilla_store::DataStore;
use flotilla_types::defaults::LOCAL_CLUSTER_NAME;

use crate::RegistryError;

use super::ClusterRegistry;

impl<D, C> ClusterRegistry<D, C>
where
    D: DataStore,
    C: ClusterConnector,
{
    /// Ensure the local cluster record exists. Safe to call any number of times,
    /// including concurrently from several registry instances.
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<(), RegistryError> {
        match self.store.get::<Cluster>(LOCAL_CLUSTER_NAME).await {
            Ok(mut local) => {
                let created = local_cluster_created_time();
                if local.create_time < created {
                    local.set_create_time(created);
                    self.store
                        .put(&local)
                        .await
                        .map_err(|err| RegistryError::store("update", LOCAL_CLUSTER_NAME, err))?;
                    info!("local cluster create time fixed");
                } else {
                    debug!("local cluster present");
                }
                Ok(())
            }
            Err(err) if err.is_record_not_exist() => {
                let local = Cluster::local(self.config.local_api_server_url.as_str());
                match self.store.add(&local).await {
                    Ok(()) => {
                        info!(api_server_url = %local.api_server_url, "local cluster added");
                        Ok(())
                    }
                    Err(err) if err.is_record_exist() => {
                        debug!("local cluster added concurrently");
                        Ok(())
                    }
                    Err(err) => Err(RegistryError::Store {
                        op: "add",
                        cluster: LOCAL_CLUSTER_NAME.to_owned(),
                        source: err,
                    }),
                }
            }
            Err(err) => Err(RegistryError::Store {
                op: "get",
                cluster: LOCAL_CLUSTER_NAME.to_owned(),
                source: err,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::DateTime;

    use flotilla_cloud::StaticProviderFactory;
    use flotilla_connector::memory::MemoryConnector;
    use flotilla_metadata::ClusterStatus;
    use flotilla_store::memory::MemoryStore;
    use flotilla_types::defaults::LOCAL_CLUSTER_DESCRIPTION;

    use crate::RegistryConfig;
    use crate::fixture::{Fault, test_context};

    use super::*;

    fn registry(store: Arc<MemoryStore>) -> ClusterRegistry<MemoryStore, MemoryConnector> {
        let config = RegistryConfig {
            local_api_server_url: "https://hub.example.com:6443".to_owned(),
            ..Default::default()
        };
        ClusterRegistry::new(
            config,
            store,
            Arc::new(MemoryConnector::new()),
            Arc::new(StaticProviderFactory::new()),
        )
    }

    #[fluvio_future::test]
    async fn test_init_idempotent() {
        //given
        let store = Arc::new(MemoryStore::new());
        let first = registry(store.clone());
        let second = registry(store.clone());

        //when
        first.init().await.expect("initialized");
        first.init().await.expect("initialized again");
        second.init().await.expect("initialized by another instance");

        //then
        assert_eq!(
            store.count(&Cluster::default(), None).await.expect("counted"),
            1
        );
        let local: Cluster = store.get(LOCAL_CLUSTER_NAME).await.expect("stored");
        assert_eq!(local.description, LOCAL_CLUSTER_DESCRIPTION);
        assert_eq!(local.api_server_url, "https://hub.example.com:6443");
        assert_eq!(local.status, ClusterStatus::Healthy);
        assert_eq!(local.create_time, local_cluster_created_time());
    }

    #[fluvio_future::test]
    async fn test_init_concurrent() {
        let store = Arc::new(MemoryStore::new());
        let registries: Vec<_> = (0..4).map(|_| registry(store.clone())).collect();

        let results =
            futures_util::future::join_all(registries.iter().map(|r| r.init())).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(
            store.count(&Cluster::default(), None).await.expect("counted"),
            1
        );
    }

    #[fluvio_future::test]
    async fn test_init_fixes_zero_create_time() {
        //given
        let store = Arc::new(MemoryStore::new());
        let mut old = Cluster::local("https://hub.example.com:6443");
        old.set_create_time(DateTime::default());
        old.description = "kept".to_owned();
        store.add(&old).await.expect("added");

        //when
        registry(store.clone()).init().await.expect("initialized");

        //then
        let local: Cluster = store.get(LOCAL_CLUSTER_NAME).await.expect("stored");
        assert_eq!(local.create_time, local_cluster_created_time());
        assert_eq!(local.description, "kept");
    }

    #[fluvio_future::test]
    async fn test_init_store_failure() {
        let ctx = test_context().await;
        ctx.faults.arm(Fault::StoreGet).await;

        let err = ctx.registry.init().await.expect_err("store failed");

        assert!(matches!(err, RegistryError::Store { op: "get", .. }));
    }
}

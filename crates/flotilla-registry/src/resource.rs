//!
//! # Resource info cache
//!
//! Capacity probes are expensive remote calls. Results are kept per cluster
//! name for a fixed TTL and never invalidated on mutation.
//!
use std::time::Duration;

use tracing::debug;

use flotilla_cache::TtlCache;
use flotilla_connector::{CapacitySnapshot, ClusterConnector, ConnectorError};
use flotilla_metadata::{Cluster, ClusterResourceInfo};
use flotilla_types::defaults::RESOURCE_INFO_CACHE_PREFIX;

#[derive(Debug)]
pub struct ResourceInfoCache {
    cache: TtlCache<String, ClusterResourceInfo>,
}

impl ResourceInfoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
        }
    }

    /// Resource info of `name`, probing the connector only on a miss
    pub async fn get<C>(&self, connector: &C, name: &str) -> Result<ClusterResourceInfo, ConnectorError>
    where
        C: ClusterConnector + ?Sized,
    {
        self.cache
            .get_or_try_insert_with(cache_key(name), || async {
                debug!(cluster = name, "probing cluster resources");
                connector.probe(name).await.map(resource_info)
            })
            .await
    }

    /// Probe through the cache and derive the status of `cluster` from the outcome
    pub async fn refresh<C>(&self, connector: &C, cluster: &mut Cluster) -> Option<ClusterResourceInfo>
    where
        C: ClusterConnector + ?Sized,
    {
        let probed = self.get(connector, &cluster.name).await;
        apply_probe(cluster, probed)
    }
}

fn cache_key(name: &str) -> String {
    format!("{RESOURCE_INFO_CACHE_PREFIX}{name}")
}

fn resource_info(snapshot: CapacitySnapshot) -> ClusterResourceInfo {
    let used = snapshot.used();
    ClusterResourceInfo {
        worker_number: snapshot.worker_number,
        master_number: snapshot.master_number,
        memory_capacity: snapshot.capacity.memory,
        cpu_capacity: snapshot.capacity.cpu,
        gpu_capacity: 0,
        pod_capacity: snapshot.capacity.pods,
        memory_used: used.memory,
        cpu_used: used.cpu,
        gpu_used: 0,
        pod_used: used.pods,
        storage_class_list: snapshot.storage_classes,
    }
}

fn apply_probe(
    cluster: &mut Cluster,
    probed: Result<ClusterResourceInfo, ConnectorError>,
) -> Option<ClusterResourceInfo> {
    match probed {
        Ok(info) => {
            cluster.set_healthy();
            Some(info)
        }
        Err(err) => {
            cluster.set_unhealthy(format!("Failed to get cluster resource info: {err}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use fluvio_future::timer::sleep;

    use flotilla_connector::ResourceQuantity;
    use flotilla_connector::memory::MemoryConnector;
    use flotilla_metadata::ClusterStatus;
    use flotilla_types::defaults::LOCAL_CLUSTER_NAME;

    use super::*;

    fn snapshot() -> CapacitySnapshot {
        CapacitySnapshot {
            worker_number: 2,
            master_number: 1,
            capacity: ResourceQuantity::new(8, 16 << 30, 220),
            allocatable: ResourceQuantity::new(6, 12 << 30, 200),
            storage_classes: vec!["standard".to_owned()],
        }
    }

    #[test]
    fn test_resource_info_from_snapshot() {
        let info = resource_info(snapshot());

        assert_eq!(info.worker_number, 2);
        assert_eq!(info.master_number, 1);
        assert_eq!(info.cpu_capacity, 8);
        assert_eq!(info.cpu_used, 2);
        assert_eq!(info.memory_used, 4 << 30);
        assert_eq!(info.pod_used, 20);
        assert_eq!(info.gpu_capacity, 0);
        assert_eq!(info.gpu_used, 0);
        assert_eq!(info.storage_class_list, vec!["standard"]);
    }

    #[test]
    fn test_status_from_probe() {
        let mut cluster = Cluster::new("c1");

        let info = apply_probe(&mut cluster, Err(ConnectorError::NotFound("c1".to_owned())));
        assert!(info.is_none());
        assert_eq!(cluster.status, ClusterStatus::Unhealthy);
        assert_eq!(
            cluster.reason,
            "Failed to get cluster resource info: cluster c1 is not joined"
        );

        let info = apply_probe(&mut cluster, Ok(ClusterResourceInfo::default()));
        assert!(info.is_some());
        assert_eq!(cluster.status, ClusterStatus::Healthy);
        assert!(cluster.reason.is_empty());
    }

    #[fluvio_future::test]
    async fn test_probe_bounded_by_ttl() {
        //given
        let connector = MemoryConnector::new();
        connector.set_capacity(LOCAL_CLUSTER_NAME, snapshot()).await;
        let cache = ResourceInfoCache::new(Duration::from_millis(50));

        //when
        let first = cache.get(&connector, LOCAL_CLUSTER_NAME).await.expect("probed");
        let second = cache.get(&connector, LOCAL_CLUSTER_NAME).await.expect("cached");

        //then
        assert_eq!(first, second);
        assert_eq!(connector.probe_count(), 1);

        sleep(Duration::from_millis(80)).await;
        cache.get(&connector, LOCAL_CLUSTER_NAME).await.expect("probed");
        assert_eq!(connector.probe_count(), 2);
    }

    #[fluvio_future::test]
    async fn test_failed_probe_not_cached() {
        let connector = MemoryConnector::new();
        let cache = ResourceInfoCache::new(Duration::from_secs(60));
        let mut cluster = Cluster::new("missing");

        assert!(cache.refresh(&connector, &mut cluster).await.is_none());
        assert!(cache.refresh(&connector, &mut cluster).await.is_none());

        assert_eq!(connector.probe_count(), 2);
        assert!(!cluster.status.is_healthy());
    }
}

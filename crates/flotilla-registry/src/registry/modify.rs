use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, instrument};

use flotilla_connector::ClusterConnector;
use flotilla_metadata::Cluster;
use flotilla_metadata::dto::{ClusterBase, CreateClusterRequest};
use flotilla_store::DataStore;
use flotilla_types::defaults::{TEMP_CLUSTER_NAME_SEPARATOR, TEMP_CLUSTER_SUFFIX_LEN};
use flotilla_types::is_local_cluster;

use crate::RegistryError;
use crate::saga::Saga;

use super::{ClusterRegistry, checked_kube_config};

const TEMP_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

impl<D, C> ClusterRegistry<D, C>
where
    D: DataStore,
    C: ClusterConnector,
{
    /// Update the cluster `name` from `req`.
    ///
    /// When neither the name nor the credential changes, only the record is
    /// updated and status is kept. Otherwise the cluster is rebound: the new
    /// credential is joined under a temporary name, the old registration and
    /// record are replaced, and the temporary registration is renamed into
    /// place.
    #[instrument(skip(self, req), fields(new_name = %req.name))]
    pub async fn modify_kube_cluster(
        &self,
        name: &str,
        req: &CreateClusterRequest,
    ) -> Result<ClusterBase, RegistryError> {
        if is_local_cluster(name) || is_local_cluster(&req.name) {
            return Err(RegistryError::LocalClusterImmutable);
        }
        let old = self.load_cluster(name).await?;
        let mut new = Cluster::from_request(req, Some(&old));
        new.set_update_time(Utc::now());

        if old.same_binding(&new) {
            self.store
                .put(&new)
                .await
                .map_err(|err| RegistryError::store("update", name, err))?;
            info!(cluster = name, "cluster updated");
            return Ok(new.to_base());
        }

        self.rebind(old, new).await
    }

    async fn rebind(&self, old: Cluster, mut new: Cluster) -> Result<ClusterBase, RegistryError> {
        if old.is_local() || new.is_local() {
            return Err(RegistryError::LocalClusterImmutable);
        }
        let kube_config = checked_kube_config(&new)?.to_owned();
        let temp_name = temp_cluster_name(&new.name);
        debug!(old = %old.name, new = %new.name, %temp_name, "rebinding cluster");

        let mut saga = Saga::new("rebind cluster");
        let connector = self.connector.as_ref();
        let store = self.store.as_ref();

        new.api_server_url = self.join_cluster(&temp_name, &kube_config).await?;
        let joined = temp_name.clone();
        saga.push(format!("detach {temp_name}"), move || async move {
            connector.detach(&joined).await.map_err(anyhow::Error::from)
        });

        let mut staged = new.clone();
        staged.name = temp_name.clone();
        self.resource_info.refresh(connector, &mut staged).await;
        new.status = staged.status;
        new.reason = staged.reason;

        if let Err(err) = connector.detach(&old.name).await {
            saga.abort().await;
            return Err(RegistryError::connector("detach", &old.name, err));
        }
        let previous = old.clone();
        saga.push(format!("rejoin {}", old.name), move || async move {
            self.join_cluster(&previous.name, &previous.kube_config)
                .await
                .map(|_| ())
                .map_err(anyhow::Error::from)
        });

        if let Err(err) = store.delete::<Cluster>(&old.name).await {
            saga.abort().await;
            return Err(RegistryError::store("delete", &old.name, err));
        }
        let deleted = old.clone();
        saga.push(format!("re-add record {}", old.name), move || async move {
            store.add(&deleted).await.map_err(anyhow::Error::from)
        });

        if let Err(err) = store.add(&new).await {
            saga.abort().await;
            return Err(RegistryError::store("add", &new.name, err));
        }
        let added = new.name.clone();
        saga.push(format!("delete record {}", new.name), move || async move {
            store
                .delete::<Cluster>(&added)
                .await
                .map_err(anyhow::Error::from)
        });

        if let Err(err) = connector.rename(&temp_name, &new.name).await {
            saga.abort().await;
            return Err(RegistryError::connector("rename", &temp_name, err));
        }
        saga.commit();

        info!(old = %old.name, new = %new.name, "cluster rebound");
        Ok(new.to_base())
    }
}

/// `name` with a random lower-case alphanumeric suffix
fn temp_cluster_name(name: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..TEMP_CLUSTER_SUFFIX_LEN)
        .map(|_| char::from(TEMP_SUFFIX_CHARSET[rng.gen_range(0..TEMP_SUFFIX_CHARSET.len())]))
        .collect();
    format!("{name}{TEMP_CLUSTER_NAME_SEPARATOR}{suffix}")
}

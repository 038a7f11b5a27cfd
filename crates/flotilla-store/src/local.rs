//!
//! # Directory-backed YAML store
//!
//! One directory per table and one `<key>.yaml` file per record. A table is
//! loaded from disk on first access and kept in memory afterwards; every write
//! is flushed to its file before it becomes visible.
//!
use std::{
    collections::HashMap,
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_lock::{RwLock, RwLockUpgradableReadGuard};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::entity::{checked_key, validate_key};
use crate::options::{count, select};
use crate::{DataStore, Entity, FilterOptions, ListOptions, StoreError};

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    tables: RwLock<HashMap<&'static str, Arc<TableStore>>>,
}

#[derive(Debug)]
struct TableStore {
    path: PathBuf,
    data: RwLock<HashMap<String, StoredRecord>>,
}

#[derive(Debug, Clone, PartialEq)]
struct StoredRecord {
    revision: u64,
    value: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "api-version")]
enum VersionedRecord {
    #[serde(rename = "1.0.0")]
    V1(RecordV1),
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct RecordV1 {
    key: String,
    revision: u64,
    value: Value,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let tables = Default::default();
        Self { path, tables }
    }

    async fn get_table<E: Entity>(&self) -> Result<Arc<TableStore>, StoreError> {
        let key = E::TABLE;
        let read = self.tables.upgradable_read().await;
        Ok(match read.get(key) {
            Some(table) => table.clone(),
            None => {
                let mut write = RwLockUpgradableReadGuard::upgrade(read).await;
                let table = Arc::new(TableStore::load(self.path.join(key))?);
                write.insert(key, table.clone());
                table
            }
        })
    }
}

#[async_trait]
impl DataStore for LocalStore {
    async fn add<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Entity,
    {
        let key = checked_key(entity)?;
        let value = serde_yaml::to_value(entity)?;
        let table = self.get_table::<E>().await?;
        let mut write = table.data.write().await;
        if write.contains_key(&key) {
            return Err(StoreError::RecordExist {
                table: E::TABLE,
                key,
            });
        }
        let record = StoredRecord { revision: 0, value };
        table.flush(&key, &record)?;
        debug!(table = E::TABLE, %key, "added");
        write.insert(key, record);
        Ok(())
    }

    async fn put<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Entity,
    {
        let key = checked_key(entity)?;
        let value = serde_yaml::to_value(entity)?;
        let table = self.get_table::<E>().await?;
        let mut write = table.data.write().await;
        let Some(prev) = write.get(&key) else {
            return Err(StoreError::RecordNotExist {
                table: E::TABLE,
                key,
            });
        };
        let record = StoredRecord {
            revision: prev.revision + 1,
            value,
        };
        table.flush(&key, &record)?;
        debug!(table = E::TABLE, %key, revision = record.revision, "updated");
        write.insert(key, record);
        Ok(())
    }

    async fn get<E>(&self, key: &str) -> Result<E, StoreError>
    where
        E: Entity,
    {
        validate_key(key)?;
        let table = self.get_table::<E>().await?;
        let read = table.data.read().await;
        let record = read.get(key).ok_or_else(|| StoreError::RecordNotExist {
            table: E::TABLE,
            key: key.to_owned(),
        })?;
        Ok(serde_yaml::from_value(record.value.clone())?)
    }

    async fn delete<E>(&self, key: &str) -> Result<(), StoreError>
    where
        E: Entity,
    {
        validate_key(key)?;
        let table = self.get_table::<E>().await?;
        let mut write = table.data.write().await;
        if !write.contains_key(key) {
            return Err(StoreError::RecordNotExist {
                table: E::TABLE,
                key: key.to_owned(),
            });
        }
        std::fs::remove_file(table.record_file_name(key))?;
        write.remove(key);
        debug!(table = E::TABLE, key, "deleted");
        Ok(())
    }

    async fn is_exist<E>(&self, key: &str) -> Result<bool, StoreError>
    where
        E: Entity,
    {
        validate_key(key)?;
        let table = self.get_table::<E>().await?;
        let read = table.data.read().await;
        Ok(read.contains_key(key))
    }

    async fn list<E>(&self, template: &E, options: Option<&ListOptions>) -> Result<Vec<E>, StoreError>
    where
        E: Entity,
    {
        let table = self.get_table::<E>().await?;
        let read = table.data.read().await;
        select(read.iter().map(|(k, r)| (k, &r.value)), template, options)
    }

    async fn count<E>(&self, template: &E, filter: Option<&FilterOptions>) -> Result<u64, StoreError>
    where
        E: Entity,
    {
        let table = self.get_table::<E>().await?;
        let read = table.data.read().await;
        count(read.iter().map(|(k, r)| (k, &r.value)), template, filter)
    }
}

impl TableStore {
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&path)?;
        let mut data: HashMap<String, StoredRecord> = Default::default();
        for entry in std::fs::read_dir(&path)? {
            let Ok(entry) = entry else {
                continue;
            };
            let path = entry.path();
            if !path.extension().eq(&Some(OsStr::new("yaml"))) {
                continue;
            }
            match load_record(&path) {
                Ok((key, record)) => {
                    debug!(%key, "loaded");
                    data.insert(key, record);
                }
                Err(err) => {
                    warn!("skipped record file {}: {err}", path.display());
                }
            }
        }
        let path = path.as_ref().to_path_buf();
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn flush(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError> {
        let stored = VersionedRecord::V1(RecordV1 {
            key: key.to_owned(),
            revision: record.revision,
            value: record.value.clone(),
        });
        serde_yaml::to_writer(std::fs::File::create(self.record_file_name(key))?, &stored)?;
        Ok(())
    }

    fn record_file_name(&self, key: &str) -> PathBuf {
        self.path.join(format!("{key}.yaml"))
    }
}

fn load_record(path: &Path) -> Result<(String, StoredRecord), StoreError> {
    let stored: VersionedRecord = serde_yaml::from_reader(std::fs::File::open(path)?)?;
    let VersionedRecord::V1(record) = stored;
    Ok((
        record.key,
        StoredRecord {
            revision: record.revision,
            value: record.value,
        },
    ))
}

#[cfg(test)]
mod tests {
    use flotilla_metadata::Cluster;

    use super::*;

    fn test_cluster(name: &str) -> Cluster {
        let mut cluster = Cluster::new(name);
        cluster.alias = "alias".to_owned();
        cluster
    }

    #[fluvio_future::test]
    async fn test_record_on_fs() {
        //given
        let store_folder = tempfile::tempdir().expect("temp dir created");
        let store = LocalStore::new(&store_folder);

        //when
        store.add(&test_cluster("c1")).await.expect("added");

        //then
        let content = std::fs::read_to_string(
            store_folder.as_ref().join(Cluster::TABLE).join("c1.yaml"),
        )
        .expect("content read");
        assert!(content.starts_with("api-version: 1.0.0\nkey: c1\nrevision: 0\nvalue:\n"));
        assert!(content.contains("  alias: alias\n"));

        drop(store_folder)
    }

    #[fluvio_future::test]
    async fn test_records_loaded_from_fs() {
        //given
        let store_folder = tempfile::tempdir().expect("temp dir created");
        let store = LocalStore::new(&store_folder);
        store.add(&test_cluster("c1")).await.expect("added");
        store.add(&test_cluster("c2")).await.expect("added");
        let mut updated = test_cluster("c2");
        updated.description = "second".to_owned();
        store.put(&updated).await.expect("updated");
        drop(store);

        //when
        let store2 = LocalStore::new(&store_folder);
        let items = store2
            .list(&Cluster::default(), None)
            .await
            .expect("listed");

        //then
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], test_cluster("c1"));
        assert_eq!(items[1], updated);

        drop(store_folder)
    }

    #[fluvio_future::test]
    async fn test_record_delete_from_fs() {
        //given
        let store_folder = tempfile::tempdir().expect("temp dir created");
        let store = LocalStore::new(&store_folder);
        store.add(&test_cluster("c1")).await.expect("added");
        let path = store_folder.as_ref().join(Cluster::TABLE).join("c1.yaml");
        assert!(path.exists());

        //when
        store.delete::<Cluster>("c1").await.expect("deleted");

        //then
        assert!(!path.exists());
        let err = store.delete::<Cluster>("c1").await.expect_err("gone");
        assert!(err.is_record_not_exist());

        drop(store_folder)
    }

    #[fluvio_future::test]
    async fn test_put_bumps_revision() {
        let store_folder = tempfile::tempdir().expect("temp dir created");
        let store = LocalStore::new(&store_folder);
        store.add(&test_cluster("c1")).await.expect("added");
        store.put(&test_cluster("c1")).await.expect("updated");
        store.put(&test_cluster("c1")).await.expect("updated");

        let content = std::fs::read_to_string(
            store_folder.as_ref().join(Cluster::TABLE).join("c1.yaml"),
        )
        .expect("content read");
        assert!(content.contains("revision: 2\n"));

        drop(store_folder)
    }

    #[fluvio_future::test]
    async fn test_unreadable_file_skipped() {
        let store_folder = tempfile::tempdir().expect("temp dir created");
        let table_dir = store_folder.as_ref().join(Cluster::TABLE);
        std::fs::create_dir_all(&table_dir).expect("dir created");
        std::fs::write(table_dir.join("broken.yaml"), "not: [valid").expect("written");

        let store = LocalStore::new(&store_folder);
        store.add(&test_cluster("c1")).await.expect("added");

        assert_eq!(
            store.count(&Cluster::default(), None).await.expect("counted"),
            1
        );

        drop(store_folder)
    }
}

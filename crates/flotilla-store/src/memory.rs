//!
//! # In-memory store
//!
//! Records are kept encoded, so a read never aliases a stored value.
//!
use std::collections::HashMap;

use async_lock::RwLock;
use async_trait::async_trait;
use serde_yaml::Value;
use tracing::debug;

use crate::entity::{checked_key, validate_key};
use crate::options::{count, select};
use crate::{DataStore, Entity, FilterOptions, ListOptions, StoreError};

type Table = HashMap<String, Value>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn add<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Entity,
    {
        let key = checked_key(entity)?;
        let value = serde_yaml::to_value(entity)?;
        let mut write = self.tables.write().await;
        let table = write.entry(E::TABLE).or_default();
        if table.contains_key(&key) {
            return Err(StoreError::RecordExist {
                table: E::TABLE,
                key,
            });
        }
        debug!(table = E::TABLE, %key, "added");
        table.insert(key, value);
        Ok(())
    }

    async fn put<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Entity,
    {
        let key = checked_key(entity)?;
        let value = serde_yaml::to_value(entity)?;
        let mut write = self.tables.write().await;
        match write.get_mut(E::TABLE).and_then(|t| t.get_mut(&key)) {
            Some(existing) => {
                *existing = value;
                debug!(table = E::TABLE, %key, "updated");
                Ok(())
            }
            None => Err(StoreError::RecordNotExist {
                table: E::TABLE,
                key,
            }),
        }
    }

    async fn get<E>(&self, key: &str) -> Result<E, StoreError>
    where
        E: Entity,
    {
        validate_key(key)?;
        let read = self.tables.read().await;
        let value = read
            .get(E::TABLE)
            .and_then(|t| t.get(key))
            .ok_or_else(|| StoreError::RecordNotExist {
                table: E::TABLE,
                key: key.to_owned(),
            })?;
        Ok(serde_yaml::from_value(value.clone())?)
    }

    async fn delete<E>(&self, key: &str) -> Result<(), StoreError>
    where
        E: Entity,
    {
        validate_key(key)?;
        let mut write = self.tables.write().await;
        match write.get_mut(E::TABLE).and_then(|t| t.remove(key)) {
            Some(_) => {
                debug!(table = E::TABLE, key, "deleted");
                Ok(())
            }
            None => Err(StoreError::RecordNotExist {
                table: E::TABLE,
                key: key.to_owned(),
            }),
        }
    }

    async fn is_exist<E>(&self, key: &str) -> Result<bool, StoreError>
    where
        E: Entity,
    {
        validate_key(key)?;
        let read = self.tables.read().await;
        Ok(read.get(E::TABLE).is_some_and(|t| t.contains_key(key)))
    }

    async fn list<E>(&self, template: &E, options: Option<&ListOptions>) -> Result<Vec<E>, StoreError>
    where
        E: Entity,
    {
        let read = self.tables.read().await;
        match read.get(E::TABLE) {
            Some(table) => select(table.iter(), template, options),
            None => Ok(vec![]),
        }
    }

    async fn count<E>(&self, template: &E, filter: Option<&FilterOptions>) -> Result<u64, StoreError>
    where
        E: Entity,
    {
        let read = self.tables.read().await;
        match read.get(E::TABLE) {
            Some(table) => count(table.iter(), template, filter),
            None => Ok(0),
        }
    }
}

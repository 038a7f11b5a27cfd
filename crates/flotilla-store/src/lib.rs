//!
//! # Cluster Store
//!
//! Contract of the datastore holding registry records, with an in-memory
//! store and a directory-backed YAML store implementing it.
//!
mod entity;
mod error;
mod options;

pub mod local;
pub mod memory;

pub use entity::Entity;
pub use error::StoreError;
pub use options::{FilterOptions, FuzzyQueryOption, ListOptions, SortOption, SortOrder};

use async_trait::async_trait;

pub type SharedStore<D> = std::sync::Arc<D>;

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::RecordExist`] if the key is taken.
    async fn add<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Entity;

    /// Replace an existing record. Fails with [`StoreError::RecordNotExist`] if absent.
    async fn put<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Entity;

    async fn get<E>(&self, key: &str) -> Result<E, StoreError>
    where
        E: Entity;

    async fn delete<E>(&self, key: &str) -> Result<(), StoreError>
    where
        E: Entity;

    async fn is_exist<E>(&self, key: &str) -> Result<bool, StoreError>
    where
        E: Entity;

    /// Records whose index contains every label of `template.index()`,
    /// narrowed, sorted and paged by `options`
    async fn list<E>(&self, template: &E, options: Option<&ListOptions>) -> Result<Vec<E>, StoreError>
    where
        E: Entity;

    async fn count<E>(&self, template: &E, filter: Option<&FilterOptions>) -> Result<u64, StoreError>
    where
        E: Entity;
}

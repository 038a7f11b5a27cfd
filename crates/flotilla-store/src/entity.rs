use serde::{Serialize, de::DeserializeOwned};

use flotilla_metadata::Cluster;
use flotilla_types::Labels;

use crate::StoreError;

/// A record kind that can be kept in a [`DataStore`](crate::DataStore)
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;

    fn primary_key(&self) -> String;

    /// labels a record can be selected by
    fn index(&self) -> Labels {
        Labels::new()
    }
}

impl Entity for Cluster {
    const TABLE: &'static str = "cluster";

    fn primary_key(&self) -> String {
        self.name.clone()
    }

    fn index(&self) -> Labels {
        let mut index = Labels::new();
        if !self.name.is_empty() {
            index.insert("name".to_owned(), self.name.clone());
        }
        index
    }
}

pub(crate) fn checked_key<E: Entity>(entity: &E) -> Result<String, StoreError> {
    let key = entity.primary_key();
    validate_key(&key)?;
    Ok(key)
}

pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::PrimaryKeyEmpty);
    }
    if key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(StoreError::PrimaryKeyInvalid(key.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_index() {
        assert!(Cluster::default().index().is_empty());
        assert_eq!(
            Cluster::new("c1").index().get("name").map(String::as_str),
            Some("c1")
        );
    }

    #[test]
    fn test_key_validation() {
        assert!(matches!(validate_key(""), Err(StoreError::PrimaryKeyEmpty)));
        assert!(matches!(
            validate_key("../etc"),
            Err(StoreError::PrimaryKeyInvalid(_))
        ));
        assert!(validate_key("prod_tmp_abcd1234").is_ok());
    }
}

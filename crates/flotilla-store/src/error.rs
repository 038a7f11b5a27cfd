use std::io::Error as IoError;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("record {key} already exists in {table}")]
    RecordExist { table: &'static str, key: String },
    #[error("record {key} does not exist in {table}")]
    RecordNotExist { table: &'static str, key: String },
    #[error("entity primary key is empty")]
    PrimaryKeyEmpty,
    #[error("entity primary key is invalid: {0}")]
    PrimaryKeyInvalid(String),
    #[error("record encoding error")]
    Serialization(#[from] serde_yaml::Error),
    #[error("store io error")]
    Io(#[from] IoError),
}

impl StoreError {
    pub fn is_record_exist(&self) -> bool {
        matches!(self, Self::RecordExist { .. })
    }

    pub fn is_record_not_exist(&self) -> bool {
        matches!(self, Self::RecordNotExist { .. })
    }
}

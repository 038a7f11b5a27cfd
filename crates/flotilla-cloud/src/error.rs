use anyhow::Error as AnyError;

use flotilla_types::{CloudClusterId, ProviderName};

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("unknown cloud provider: {0}")]
    UnknownProvider(ProviderName),
    #[error("access key rejected by provider")]
    InvalidAccessKey,
    #[error("cloud cluster {0} not found")]
    ClusterNotFound(CloudClusterId),
    #[error("cloud cluster {0} is already being created")]
    ClusterAlreadyExists(String),
    #[error("no creation of cloud cluster {0}")]
    CreationNotFound(String),
    #[error("cloud provider request failed")]
    Request(#[from] AnyError),
}

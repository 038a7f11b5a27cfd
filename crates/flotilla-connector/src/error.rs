use std::io::Error as IoError;

use anyhow::Error as AnyError;

#[derive(thiserror::Error, Debug)]
pub enum ConnectorError {
    /// The name is already registered with the control plane
    #[error("cluster {0} already exists")]
    AlreadyExists(String),
    #[error("cluster {0} is not joined")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid kubeconfig: {0}")]
    InvalidKubeConfig(String),
    #[error("kubeconfig file error")]
    Io(#[from] IoError),
    #[error(transparent)]
    Other(#[from] AnyError),
}

impl ConnectorError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }
}

use flotilla_connector::ConnectorError;
use flotilla_store::StoreError;
use flotilla_types::{ClusterName, ProviderName};

/// Coarse classification of a [`RegistryError`], for mapping onto a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Remote,
    Internal,
}

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("cluster name \"local\" is reserved")]
    LocalClusterReserved,
    #[error("the local cluster cannot be modified or deleted")]
    LocalClusterImmutable,
    #[error("kubeconfig secret references are not supported")]
    CredentialSecretUnsupported,
    #[error("neither kubeconfig nor kubeconfig secret is set")]
    CredentialMissing,
    #[error("invalid cloud provider: {0}")]
    InvalidCloudProvider(ProviderName),
    #[error("cluster {0} already exists in the store")]
    ClusterAlreadyExistsInStore(ClusterName),
    #[error("cluster {0} already exists in the control plane")]
    ClusterExistsInControlPlane(ClusterName),
    #[error("cluster {0} not found in the store")]
    ClusterNotFoundInStore(ClusterName),
    #[error("failed to {op} cluster {cluster}")]
    Connector {
        op: &'static str,
        cluster: ClusterName,
        #[source]
        source: ConnectorError,
    },
    #[error("failed to get cloud cluster")]
    CloudClusterFetchFailed,
    #[error("invalid access key or secret")]
    InvalidAccessKey,
    #[error("cloud cluster {0} already exists")]
    CloudClusterAlreadyExists(String),
    #[error("failed to start creating cloud cluster")]
    CloudClusterCreateFailed,
    #[error("no creation of cloud cluster {0}")]
    CloudClusterCreationNotFound(String),
    #[error("cloud cluster {0} is available but its cluster id is unknown")]
    CloudClusterIdNotFound(String),
    #[error("no permission to create namespace {namespace} in cluster {cluster}")]
    CreateNamespaceForbidden {
        cluster: ClusterName,
        namespace: String,
    },
    #[error("failed to {op} cluster {cluster} in the store")]
    Store {
        op: &'static str,
        cluster: ClusterName,
        #[source]
        source: StoreError,
    },
    #[error("failed to write kubeconfig file")]
    Credential(#[source] ConnectorError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LocalClusterReserved
            | Self::LocalClusterImmutable
            | Self::CredentialSecretUnsupported
            | Self::CredentialMissing
            | Self::InvalidCloudProvider(_) => ErrorKind::Validation,
            Self::ClusterAlreadyExistsInStore(_)
            | Self::ClusterExistsInControlPlane(_)
            | Self::CloudClusterAlreadyExists(_) => ErrorKind::Conflict,
            Self::ClusterNotFoundInStore(_) | Self::CloudClusterCreationNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Connector { .. }
            | Self::CloudClusterFetchFailed
            | Self::CloudClusterCreateFailed
            | Self::CloudClusterIdNotFound(_)
            | Self::InvalidAccessKey
            | Self::CreateNamespaceForbidden { .. } => ErrorKind::Remote,
            Self::Store { .. } | Self::Credential(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn connector(op: &'static str, cluster: &str, source: ConnectorError) -> Self {
        Self::Connector {
            op,
            cluster: cluster.to_owned(),
            source,
        }
    }

    /// store failure, with missing and duplicate records mapped to their own kinds
    pub(crate) fn store(op: &'static str, cluster: &str, source: StoreError) -> Self {
        match source {
            StoreError::RecordNotExist { .. } => Self::ClusterNotFoundInStore(cluster.to_owned()),
            StoreError::RecordExist { .. } => Self::ClusterAlreadyExistsInStore(cluster.to_owned()),
            source => Self::Store {
                op,
                cluster: cluster.to_owned(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let missing = RegistryError::store(
            "get",
            "c1",
            StoreError::RecordNotExist {
                table: "cluster",
                key: "c1".to_owned(),
            },
        );
        assert!(matches!(missing, RegistryError::ClusterNotFoundInStore(ref name) if name == "c1"));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let internal = RegistryError::store("add", "c1", StoreError::PrimaryKeyEmpty);
        assert_eq!(internal.kind(), ErrorKind::Internal);
        assert_eq!(internal.to_string(), "failed to add cluster c1 in the store");
    }

    #[test]
    fn test_connector_error_source() {
        let err = RegistryError::connector(
            "detach",
            "c1",
            ConnectorError::NotFound("c1".to_owned()),
        );

        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.to_string(), "failed to detach cluster c1");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("cluster c1 is not joined"));
    }
}

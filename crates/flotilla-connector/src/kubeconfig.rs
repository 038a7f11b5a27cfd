//!
//! # Transient kubeconfig file
//!
//! Credential material handed to the control plane is written to a private
//! file that lives only as long as its guard.
//!
use std::io::Write;
use std::path::Path;

use k8_config::KubeConfig;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use flotilla_types::defaults::{KUBECONFIG_FILE_PREFIX, KUBECONFIG_FILE_SUFFIX};

use crate::ConnectorError;

/// Kubeconfig written to a file that is removed when this guard drops.
/// The file is created readable by the owner only.
#[derive(Debug)]
pub struct KubeConfigFile {
    file: NamedTempFile,
}

impl KubeConfigFile {
    pub fn create<P: AsRef<Path>>(dir: P, content: &str) -> Result<Self, ConnectorError> {
        let mut file = Builder::new()
            .prefix(KUBECONFIG_FILE_PREFIX)
            .suffix(KUBECONFIG_FILE_SUFFIX)
            .tempfile_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        debug!(path = %file.path().display(), "kubeconfig written");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> Result<String, ConnectorError> {
        Ok(std::fs::read_to_string(self.path())?)
    }

    /// API server of the current context
    pub fn server_url(&self) -> Result<String, ConnectorError> {
        let config = KubeConfig::from_file(self.path())
            .map_err(|err| ConnectorError::InvalidKubeConfig(err.to_string()))?;
        config
            .current_cluster()
            .map(|cluster| cluster.cluster.server.clone())
            .ok_or_else(|| ConnectorError::InvalidKubeConfig("no current cluster".to_owned()))
    }
}

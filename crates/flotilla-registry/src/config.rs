use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use flotilla_types::defaults::{LOCAL_API_SERVER_URL, RESOURCE_INFO_TTL_SECS};

/// Registry settings, loaded from TOML with
/// [`ConfigFile`](flotilla_types::config_file::ConfigFile)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// API server URL recorded for the local cluster
    pub local_api_server_url: String,
    /// where transient kubeconfig files are written
    pub credential_dir: PathBuf,
    #[serde(with = "humantime_serde")]
    pub resource_info_ttl: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            local_api_server_url: LOCAL_API_SERVER_URL.to_owned(),
            credential_dir: std::env::temp_dir(),
            resource_info_ttl: Duration::from_secs(RESOURCE_INFO_TTL_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use flotilla_types::config_file::ConfigFile;

    use super::*;

    #[test]
    fn test_defaults_for_missing_keys() {
        let config = RegistryConfig::load_str(r#"local_api_server_url = "https://hub:6443""#)
            .expect("parsed");

        assert_eq!(config.local_api_server_url, "https://hub:6443");
        assert_eq!(config.credential_dir, std::env::temp_dir());
        assert_eq!(config.resource_info_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_humantime_ttl() {
        let config = RegistryConfig::load_str(
            r#"
credential_dir = "/var/run/flotilla"
resource_info_ttl = "5m 30s"
"#,
        )
        .expect("parsed");

        assert_eq!(config.credential_dir, PathBuf::from("/var/run/flotilla"));
        assert_eq!(config.resource_info_ttl, Duration::from_secs(330));
        assert_eq!(config.local_api_server_url, LOCAL_API_SERVER_URL);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir created");
        let path = dir.path().join("registry.toml");
        let config = RegistryConfig {
            resource_info_ttl: Duration::from_secs(5),
            ..Default::default()
        };

        config.save_to(&path).expect("saved");
        let loaded = RegistryConfig::load_from(&path).expect("loaded");

        assert_eq!(loaded, config);
    }
}

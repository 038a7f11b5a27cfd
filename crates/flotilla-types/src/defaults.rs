//!
//! # Defaults
//!
//! Registry-wide constants.
//!

/// name reserved for the cluster the registry itself runs on
pub const LOCAL_CLUSTER_NAME: &str = "local";
pub const LOCAL_CLUSTER_DESCRIPTION: &str = "The hub cluster where the registry runs.";
pub const LOCAL_API_SERVER_URL: &str = "https://kubernetes.default.svc";

/// separator between the target name and the random suffix of a staged cluster
pub const TEMP_CLUSTER_NAME_SEPARATOR: &str = "_tmp_";
pub const TEMP_CLUSTER_SUFFIX_LEN: usize = 8;

pub const RESOURCE_INFO_CACHE_PREFIX: &str = "cluster-resource-info::";
pub const RESOURCE_INFO_TTL_SECS: u64 = 60;

pub const KUBECONFIG_FILE_PREFIX: &str = "cluster-secret-";
pub const KUBECONFIG_FILE_SUFFIX: &str = ".kubeconfig";

/// provisioner apply state of a cloud cluster that finished creating
pub const PROVISION_AVAILABLE_STATE: &str = "Available";
/// provisioner output carrying the cloud cluster id
pub const PROVISION_CLUSTER_ID_OUTPUT: &str = "CLUSTER_ID";

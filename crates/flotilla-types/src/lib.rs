pub mod config_file;
pub mod defaults;

//
// Types
//
pub type ClusterName = String;
pub type Reason = String;
pub type Labels = std::collections::BTreeMap<String, String>;

// Cloud
pub type ProviderName = String;
pub type CloudClusterId = String;

/// true if `name` is the reserved name of the hub cluster
pub fn is_local_cluster(name: &str) -> bool {
    name == defaults::LOCAL_CLUSTER_NAME
}

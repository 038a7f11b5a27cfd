//!
//! # Cloud provenance
//!
//! Descriptors of clusters hosted by a cloud provider, the provenance block
//! stamped on registry records imported from one, and the progress of
//! clusters being provisioned through a provider.
//!
use std::fmt;

use serde::{Deserialize, Serialize};

use flotilla_types::defaults::{PROVISION_AVAILABLE_STATE, PROVISION_CLUSTER_ID_OUTPUT};
use flotilla_types::{CloudClusterId, Labels, ProviderName};

/// A cluster as reported by a cloud provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudCluster {
    pub provider: ProviderName,
    pub id: CloudClusterId,
    pub name: String,
    #[serde(rename = "type")]
    pub cluster_type: String,
    pub zone: String,
    pub zone_id: String,
    pub region_id: String,
    pub vpc_id: String,
    #[serde(default)]
    pub labels: Labels,
    pub status: String,
    #[serde(rename = "apiServerURL")]
    pub api_server_url: String,
    #[serde(rename = "dashboardURL")]
    pub dashboard_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub provider: ProviderName,
    pub cluster_name: String,
    #[serde(rename = "clusterID")]
    pub cluster_id: CloudClusterId,
    #[serde(default)]
    pub zone: String,
    #[serde(default, rename = "zoneID")]
    pub zone_id: String,
    #[serde(default, rename = "regionID")]
    pub region_id: String,
    #[serde(default, rename = "vpcID")]
    pub vpc_id: String,
    #[serde(default)]
    pub labels: Labels,
}

impl From<&CloudCluster> for ProviderInfo {
    fn from(cluster: &CloudCluster) -> Self {
        Self {
            provider: cluster.provider.clone(),
            cluster_name: cluster.name.clone(),
            cluster_id: cluster.id.clone(),
            zone: cluster.zone.clone(),
            zone_id: cluster.zone_id.clone(),
            region_id: cluster.region_id.clone(),
            vpc_id: cluster.vpc_id.clone(),
            labels: cluster.labels.clone(),
        }
    }
}

/// Size and placement of a cloud cluster to provision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    pub name: String,
    pub zone: String,
    pub worker_number: u32,
    pub cpu_cores_per_worker: i64,
    /// GiB per worker
    pub memory_per_worker: i64,
}

/// Provisioning record of a cloud cluster, as reported by its provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudClusterProvision {
    pub name: String,
    /// empty until the provisioner starts applying
    #[serde(default)]
    pub apply_state: String,
    #[serde(default)]
    pub deleting: bool,
    #[serde(default)]
    pub outputs: Labels,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationStatus {
    #[default]
    Initializing,
    Deleting,
    Available,
    /// provisioning finished without reporting the cluster id
    #[serde(rename = "ClusterIDNotFound")]
    ClusterIdNotFound,
    /// any other provisioner state, passed through
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for CreationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "Initializing"),
            Self::Deleting => write!(f, "Deleting"),
            Self::Available => write!(f, "Available"),
            Self::ClusterIdNotFound => write!(f, "ClusterIDNotFound"),
            Self::Other(state) => write!(f, "{state}"),
        }
    }
}

impl CloudClusterProvision {
    /// Creation status and, once available, the id of the provisioned cluster.
    /// A pending deletion wins over any apply state except an unstarted one.
    pub fn creation_status(&self) -> (CreationStatus, Option<CloudClusterId>) {
        if self.apply_state.is_empty() {
            return (CreationStatus::Initializing, None);
        }
        if self.deleting {
            return (CreationStatus::Deleting, None);
        }
        if self.apply_state == PROVISION_AVAILABLE_STATE {
            return match self.outputs.get(PROVISION_CLUSTER_ID_OUTPUT) {
                Some(id) => (CreationStatus::Available, Some(id.clone())),
                None => (CreationStatus::ClusterIdNotFound, None),
            };
        }
        (CreationStatus::Other(self.apply_state.clone()), None)
    }
}

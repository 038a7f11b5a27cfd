//!
//! # Registry requests and responses
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flotilla_types::{CloudClusterId, ClusterName, Labels, Reason};

use crate::cloud::{CloudCluster, CloudClusterProvision, CreationStatus, ProviderInfo, ProvisionRequest};
use crate::cluster::{Cluster, ClusterStatus};
use crate::resource::ClusterResourceInfo;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    pub name: ClusterName,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub kube_config: String,
    #[serde(default)]
    pub kube_config_secret: String,
    #[serde(default, rename = "dashboardURL")]
    pub dashboard_url: String,
}

/// Summary view of a registry record. Credentials are never part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBase {
    pub name: ClusterName,
    pub alias: String,
    pub description: String,
    pub icon: String,
    pub labels: Labels,
    #[serde(rename = "apiServerURL")]
    pub api_server_url: String,
    #[serde(rename = "dashboardURL")]
    pub dashboard_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderInfo>,
    pub status: ClusterStatus,
    pub reason: Reason,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl From<&Cluster> for ClusterBase {
    fn from(cluster: &Cluster) -> Self {
        Self {
            name: cluster.name.clone(),
            alias: cluster.alias.clone(),
            description: cluster.description.clone(),
            icon: cluster.icon.clone(),
            labels: cluster.labels.clone(),
            api_server_url: cluster.api_server_url.clone(),
            dashboard_url: cluster.dashboard_url.clone(),
            provider: cluster.provider.clone(),
            status: cluster.status,
            reason: cluster.reason.clone(),
            create_time: cluster.create_time,
            update_time: cluster.update_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDetail {
    #[serde(flatten)]
    pub cluster: ClusterBase,
    /// absent when the last probe failed
    pub resource_info: Option<ClusterResourceInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListClusterResponse {
    pub clusters: Vec<ClusterBase>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyRequest {
    #[serde(rename = "accessKeyID")]
    pub access_key_id: String,
    pub access_key_secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectCloudClusterRequest {
    #[serde(flatten)]
    pub access_key: AccessKeyRequest,
    #[serde(rename = "clusterID")]
    pub cluster_id: CloudClusterId,
    pub name: ClusterName,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCloudClusterResponse {
    pub clusters: Vec<CloudCluster>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCloudClusterRequest {
    #[serde(flatten)]
    pub access_key: AccessKeyRequest,
    #[serde(flatten)]
    pub cluster: ProvisionRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCloudClusterResponse {
    #[serde(rename = "clusterName")]
    pub name: String,
    /// empty until the cluster is available
    #[serde(rename = "clusterID")]
    pub cluster_id: CloudClusterId,
    pub status: CreationStatus,
}

impl From<&CloudClusterProvision> for CreateCloudClusterResponse {
    fn from(provision: &CloudClusterProvision) -> Self {
        let (status, cluster_id) = provision.creation_status();
        Self {
            name: provision.name.clone(),
            cluster_id: cluster_id.unwrap_or_default(),
            status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCloudClusterCreationResponse {
    pub creations: Vec<CreateCloudClusterResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateClusterNamespaceRequest {
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateClusterNamespaceResponse {
    pub exists: bool,
}

//!
//! # Cluster
//!
//! Registry record for a member cluster.
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flotilla_types::{ClusterName, Labels, Reason};
use flotilla_types::defaults::{LOCAL_API_SERVER_URL, LOCAL_CLUSTER_DESCRIPTION, LOCAL_CLUSTER_NAME};

use crate::cloud::ProviderInfo;
use crate::dto::{ClusterBase, CreateClusterRequest};

use super::ClusterStatus;

/// 1999-01-01T00:00:00Z, so the local cluster always sorts first by creation time
const LOCAL_CLUSTER_CREATED_SECS: i64 = 915_148_800;

pub fn local_cluster_created_time() -> DateTime<Utc> {
    DateTime::from_timestamp(LOCAL_CLUSTER_CREATED_SECS, 0).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
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
    #[serde(default, rename = "apiServerURL")]
    pub api_server_url: String,
    #[serde(default, rename = "dashboardURL")]
    pub dashboard_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderInfo>,
    #[serde(default)]
    pub status: ClusterStatus,
    #[serde(default)]
    pub reason: Reason,
    #[serde(default)]
    pub create_time: DateTime<Utc>,
    #[serde(default)]
    pub update_time: DateTime<Utc>,
}

/// How a cluster's credential was supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    KubeConfig(&'a str),
    Secret(&'a str),
    Missing,
}

impl Cluster {
    pub fn new(name: impl Into<ClusterName>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// record for the hub cluster the registry runs on
    pub fn local(api_server_url: impl Into<String>) -> Self {
        let api_server_url = api_server_url.into();
        Self {
            name: LOCAL_CLUSTER_NAME.to_owned(),
            description: LOCAL_CLUSTER_DESCRIPTION.to_owned(),
            status: ClusterStatus::Healthy,
            api_server_url: if api_server_url.is_empty() {
                LOCAL_API_SERVER_URL.to_owned()
            } else {
                api_server_url
            },
            create_time: local_cluster_created_time(),
            update_time: Utc::now(),
            ..Default::default()
        }
    }

    /// Build a record from a create request.
    /// When `base` is given, fields the request does not carry are kept from it.
    pub fn from_request(req: &CreateClusterRequest, base: Option<&Cluster>) -> Self {
        let mut cluster = base.cloned().unwrap_or_default();
        cluster.name = req.name.clone();
        cluster.alias = req.alias.clone();
        cluster.description = req.description.clone();
        cluster.icon = req.icon.clone();
        cluster.labels = req.labels.clone();
        cluster.kube_config = req.kube_config.clone();
        cluster.kube_config_secret = req.kube_config_secret.clone();
        cluster.dashboard_url = req.dashboard_url.clone();
        cluster
    }

    /// inline kubeconfig wins over a secret reference
    pub fn credential(&self) -> Credential<'_> {
        if !self.kube_config.is_empty() {
            Credential::KubeConfig(&self.kube_config)
        } else if !self.kube_config_secret.is_empty() {
            Credential::Secret(&self.kube_config_secret)
        } else {
            Credential::Missing
        }
    }

    /// true if `other` is reachable with the same name and credential
    pub fn same_binding(&self, other: &Cluster) -> bool {
        self.name == other.name
            && self.kube_config == other.kube_config
            && self.kube_config_secret == other.kube_config_secret
    }

    pub fn is_local(&self) -> bool {
        flotilla_types::is_local_cluster(&self.name)
    }

    pub fn set_create_time(&mut self, time: DateTime<Utc>) {
        self.create_time = time;
    }

    pub fn set_update_time(&mut self, time: DateTime<Utc>) {
        self.update_time = time;
    }

    pub fn set_healthy(&mut self) {
        self.status = ClusterStatus::Healthy;
        self.reason.clear();
    }

    pub fn set_unhealthy(&mut self, reason: impl Into<Reason>) {
        self.status = ClusterStatus::Unhealthy;
        self.reason = reason.into();
    }

    pub fn to_base(&self) -> ClusterBase {
        ClusterBase::from(self)
    }
}

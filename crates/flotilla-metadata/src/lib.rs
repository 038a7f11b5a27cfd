pub mod cluster;
pub mod cloud;
pub mod dto;
pub mod resource;

pub use cluster::*;
pub use cloud::{
    CloudCluster, CloudClusterProvision, CreationStatus, ProviderInfo, ProvisionRequest,
};
pub use resource::ClusterResourceInfo;

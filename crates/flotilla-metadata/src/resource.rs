use serde::{Deserialize, Serialize};

/// Capacity and utilization of a member cluster at the time of the last probe.
/// Quantities are in base units: cores for cpu, bytes for memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResourceInfo {
    pub worker_number: u32,
    pub master_number: u32,
    pub memory_capacity: i64,
    pub cpu_capacity: i64,
    #[serde(rename = "gpuCapacity")]
    pub gpu_capacity: i64,
    pub pod_capacity: i64,
    pub memory_used: i64,
    pub cpu_used: i64,
    #[serde(rename = "gpuUsed")]
    pub gpu_used: i64,
    pub pod_used: i64,
    #[serde(default)]
    pub storage_class_list: Vec<String>,
}

/// cpu in cores, memory in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceQuantity {
    pub cpu: i64,
    pub memory: i64,
    pub pods: i64,
}

/// Point-in-time capacity of a member cluster, summed over its nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub worker_number: u32,
    pub master_number: u32,
    pub capacity: ResourceQuantity,
    pub allocatable: ResourceQuantity,
    pub storage_classes: Vec<String>,
}

impl ResourceQuantity {
    pub fn new(cpu: i64, memory: i64, pods: i64) -> Self {
        Self { cpu, memory, pods }
    }

    /// per-field difference, never below zero
    pub fn saturating_sub(&self, other: &Self) -> Self {
        Self {
            cpu: (self.cpu - other.cpu).max(0),
            memory: (self.memory - other.memory).max(0),
            pods: (self.pods - other.pods).max(0),
        }
    }
}

impl CapacitySnapshot {
    pub fn used(&self) -> ResourceQuantity {
        self.capacity.saturating_sub(&self.allocatable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_used_saturates() {
        let snapshot = CapacitySnapshot {
            capacity: ResourceQuantity::new(8, 1024, 110),
            allocatable: ResourceQuantity::new(6, 2048, 100),
            ..Default::default()
        };

        assert_eq!(snapshot.used(), ResourceQuantity::new(2, 0, 10));
    }
}

//! Deterministic CRUD workload.
//!
//! Every payload is a pure function of the item's ordinal index, so each
//! backend sees exactly the same sequence of records.

/// Number of items in the default workload.
pub const DEFAULT_WORKLOAD_SIZE: usize = 1000;

/// One step of the workload, identified by its ordinal index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadItem {
    index: usize,
}

impl WorkloadItem {
    /// Create the item for ordinal `index`.
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// Ordinal index of this item.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Product code used by product-shaped schemas (`P<i>`).
    pub fn code(&self) -> String {
        format!("P{}", self.index)
    }

    /// User name used by user-shaped schemas (`user<i>`).
    pub fn user_name(&self) -> String {
        format!("user{}", self.index)
    }

    /// Numeric field written on create.
    pub fn value(&self) -> i64 {
        self.index as i64 * 10
    }

    /// Numeric field written on update (twice the created value).
    pub fn updated_value(&self) -> i64 {
        self.index as i64 * 20
    }
}

/// A finite, restartable sequence of workload items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workload {
    size: usize,
}

impl Workload {
    /// Create a workload of `size` items.
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the workload has no items.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Iterate the items in ascending index order, starting from zero.
    ///
    /// Each call yields a fresh iterator.
    pub fn iter(&self) -> impl Iterator<Item = WorkloadItem> {
        (0..self.size).map(WorkloadItem::new)
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self::new(DEFAULT_WORKLOAD_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workload_size() {
        let workload = Workload::default();
        assert_eq!(workload.len(), 1000);
        assert_eq!(workload.iter().count(), 1000);
    }

    #[test]
    fn test_items_ascending_without_gaps() {
        let indexes: Vec<_> = Workload::new(50).iter().map(|item| item.index()).collect();
        assert_eq!(indexes, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let workload = Workload::new(10);
        let first: Vec<_> = workload.iter().collect();
        let second: Vec<_> = workload.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_payload_derivation() {
        let item = WorkloadItem::new(42);
        assert_eq!(item.code(), "P42");
        assert_eq!(item.user_name(), "user42");
        assert_eq!(item.value(), 420);
        assert_eq!(item.updated_value(), 840);
    }

    #[test]
    fn test_payload_is_pure() {
        for i in [0, 1, 499, 999] {
            let a = WorkloadItem::new(i);
            let b = WorkloadItem::new(i);
            assert_eq!(a.code(), b.code());
            assert_eq!(a.user_name(), b.user_name());
            assert_eq!(a.updated_value(), a.value() * 2);
        }
    }
}

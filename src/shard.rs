//! Static partitioning of the object listing across worker processes.
//!
//! Each worker computes its own slice from its `(worker, replicas)` pair and
//! the sorted listing; there is no coordination between workers. The listing
//! is cut into `replicas` contiguous chunks of `ceil(len / replicas)` objects,
//! so the last chunks may be short or empty.

use crate::error::DatasetError;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardAssignment {
    worker: usize,
    replicas: usize,
}

impl ShardAssignment {
    /// # Errors
    /// Returns [`DatasetError::Config`] unless `replicas >= 1` and `worker < replicas`.
    pub fn new(worker: usize, replicas: usize) -> Result<Self, DatasetError> {
        if replicas == 0 {
            return Err(DatasetError::config(
                "the number of replicas must be a positive integer",
            ));
        }
        if worker >= replicas {
            return Err(DatasetError::config(format!(
                "worker {worker} must be in the range [0, {replicas})"
            )));
        }
        Ok(Self { worker, replicas })
    }

    /// The whole listing on a single worker.
    #[must_use]
    pub fn single() -> Self {
        Self {
            worker: 0,
            replicas: 1,
        }
    }

    #[must_use]
    pub fn worker(&self) -> usize {
        self.worker
    }

    #[must_use]
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// `ceil(total / replicas)`.
    #[must_use]
    pub fn per_worker(&self, total: usize) -> usize {
        total.div_ceil(self.replicas)
    }

    /// This worker's index range over a listing of `total` objects.
    #[must_use]
    pub fn range(&self, total: usize) -> Range<usize> {
        let per_worker = self.per_worker(total);
        let start = (self.worker * per_worker).min(total);
        let end = ((self.worker + 1) * per_worker).min(total);
        start..end
    }

    /// This worker's slice of `items`.
    #[must_use]
    pub fn select<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }
}

impl Default for ShardAssignment {
    fn default() -> Self {
        Self::single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uneven_split_leaves_trailing_workers_short() -> Result<(), DatasetError> {
        // 5 objects over 4 workers: per_worker = 2 -> [0,2) [2,4) [4,5) [5,5)
        let ranges: Vec<_> = (0..4)
            .map(|w| ShardAssignment::new(w, 4).map(|s| s.range(5)))
            .collect::<Result<_, _>>()?;
        assert_eq!(ranges, vec![0..2, 2..4, 4..5, 5..5]);
        Ok(())
    }

    #[test]
    fn start_is_clamped_past_the_end() -> Result<(), DatasetError> {
        assert_eq!(ShardAssignment::new(2, 3)?.range(2), 2..2);
        assert_eq!(ShardAssignment::new(2, 3)?.range(0), 0..0);
        Ok(())
    }
}

//! Cyclic, fixed-size batches over a loaded table.
//!
//! Batch `k` holds rows `(k*B) mod D, (k*B + 1) mod D, ...` for batch size `B`
//! and table size `D`: the cursor wraps around the end of the table, and a
//! batch larger than the table repeats rows. The sequence is unbounded unless
//! an iteration count is attached, in which case it stops after exactly that
//! many batches.
//!
//! ```
//! use object_storage_dataset::batcher::CyclicBatches;
//! use object_storage_dataset::table::Table;
//!
//! let rows = (0..5).map(|i| vec![f64::from(i)]).collect();
//! let table = Table::from_rows(vec!["x".into()], rows)?;
//! let firsts: Vec<Vec<f64>> = CyclicBatches::bounded(&table, 3, 3)?
//!     .map(|batch| batch.values().to_vec())
//!     .collect();
//! assert_eq!(firsts, vec![vec![0., 1., 2.], vec![3., 4., 0.], vec![1., 2., 3.]]);
//! # Ok::<(), object_storage_dataset::DatasetError>(())
//! ```

use crate::error::DatasetError;
use crate::table::{Batch, Table};
use std::iter::FusedIterator;
use tracing::trace;

/// Where the remaining-iterations count lives.
#[derive(Debug)]
pub enum Remaining<'a> {
    Unbounded,
    /// Owned by this iterator; restarts do not see it.
    Owned(usize),
    /// Borrowed from the dataset; decrements outlive the iterator.
    Shared(&'a mut usize),
}

impl Remaining<'_> {
    fn get(&self) -> Option<usize> {
        match self {
            Remaining::Unbounded => None,
            Remaining::Owned(n) => Some(*n),
            Remaining::Shared(n) => Some(**n),
        }
    }

    fn decrement(&mut self) {
        match self {
            Remaining::Unbounded => {}
            Remaining::Owned(n) => *n = n.saturating_sub(1),
            Remaining::Shared(n) => **n = n.saturating_sub(1),
        }
    }
}

/// Iterator of cyclic batches; see the module docs.
#[derive(Debug)]
pub struct CyclicBatches<'a> {
    table: &'a Table,
    batch_size: usize,
    cursor: usize,
    remaining: Remaining<'a>,
}

impl<'a> CyclicBatches<'a> {
    /// Start a pass over `table` with the cursor at row 0.
    ///
    /// # Errors
    /// Returns [`DatasetError::EmptyDataset`] if the table has no rows, and
    /// [`DatasetError::Config`] if `batch_size` is zero.
    pub fn new(
        table: &'a Table,
        batch_size: usize,
        remaining: Remaining<'a>,
    ) -> Result<Self, DatasetError> {
        if table.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }
        if batch_size == 0 {
            return Err(DatasetError::config("batch_size must be positive"));
        }
        Ok(Self {
            table,
            batch_size,
            cursor: 0,
            remaining,
        })
    }

    /// An endless pass.
    ///
    /// # Errors
    /// See [`CyclicBatches::new`].
    pub fn unbounded(table: &'a Table, batch_size: usize) -> Result<Self, DatasetError> {
        Self::new(table, batch_size, Remaining::Unbounded)
    }

    /// A pass of exactly `iterations` batches.
    ///
    /// # Errors
    /// See [`CyclicBatches::new`].
    pub fn bounded(
        table: &'a Table,
        batch_size: usize,
        iterations: usize,
    ) -> Result<Self, DatasetError> {
        Self::new(table, batch_size, Remaining::Owned(iterations))
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Row index the next batch starts at.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Batches left, or `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<usize> {
        self.remaining.get()
    }
}

impl Iterator for CyclicBatches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.remaining.get() == Some(0) {
            return None;
        }

        let size = self.table.len();
        let start = self.cursor;
        let batch = self
            .table
            .gather((0..self.batch_size).map(|offset| advance(start, offset, size)));

        self.cursor = advance(start, self.batch_size, size);
        self.remaining.decrement();
        trace!(start, next = self.cursor, remaining = ?self.remaining.get(), "emitted batch");
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining.get() {
            Some(n) => (n, Some(n)),
            None => (usize::MAX, None),
        }
    }
}

impl FusedIterator for CyclicBatches<'_> {}

/// `(cursor + step) mod size` without overflowing; `cursor < size`.
fn advance(cursor: usize, step: usize, size: usize) -> usize {
    let step = step % size;
    if step >= size - cursor {
        step - (size - cursor)
    } else {
        cursor + step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_wraps_without_overflow() {
        assert_eq!(advance(0, 3, 5), 3);
        assert_eq!(advance(3, 3, 5), 1);
        assert_eq!(advance(4, 5, 5), 4);
        assert_eq!(advance(2, usize::MAX, 7), (2 + usize::MAX % 7) % 7);
        assert_eq!(advance(usize::MAX - 1, usize::MAX, usize::MAX), usize::MAX - 1);
    }

    #[test]
    fn cursor_follows_large_batch_sizes() -> Result<(), DatasetError> {
        let rows = (0..3).map(|i| vec![f64::from(i)]).collect();
        let table = Table::from_rows(vec!["x".into()], rows)?;
        let mut batches = CyclicBatches::unbounded(&table, 7)?;
        let first = batches.next().map(Batch::into_values);
        assert_eq!(first, Some(vec![0., 1., 2., 0., 1., 2., 0.]));
        assert_eq!(batches.cursor(), 1);
        Ok(())
    }
}

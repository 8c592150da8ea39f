// Integration tests for cyclic batching over an in-memory table

use object_storage_dataset::batcher::{CyclicBatches, Remaining};
use object_storage_dataset::testing::row_id;
use object_storage_dataset::{Batch, DatasetError, Table};

/// `size` rows of two columns; row `r` is `[r*10, r*10 + 1]`.
fn table(size: usize) -> Table {
    let rows = (0..size)
        .map(|r| vec![(r * 10) as f64, (r * 10 + 1) as f64])
        .collect();
    Table::from_rows(vec!["c0".into(), "c1".into()], rows).expect("rectangular rows")
}

fn ids(batch: &Batch) -> Vec<usize> {
    batch.rows().map(row_id).collect()
}

// ============================================================================
// Batch Contents
// ============================================================================

#[test]
fn test_wraps_around_the_end_of_the_table() -> Result<(), DatasetError> {
    let table = table(5);
    let batches: Vec<Vec<usize>> = CyclicBatches::bounded(&table, 3, 3)?
        .map(|b| ids(&b))
        .collect();
    assert_eq!(batches, vec![vec![0, 1, 2], vec![3, 4, 0], vec![1, 2, 3]]);
    Ok(())
}

#[test]
fn test_batch_k_follows_modular_indexing() -> Result<(), DatasetError> {
    for size in 1..=7 {
        let table = table(size);
        for batch_size in 1..=11 {
            for (k, batch) in CyclicBatches::bounded(&table, batch_size, 20)?.enumerate() {
                let expected: Vec<usize> =
                    (0..batch_size).map(|j| (k * batch_size + j) % size).collect();
                assert_eq!(ids(&batch), expected, "D={size} B={batch_size} k={k}");
                assert_eq!(batch.shape(), (batch_size, 2));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Iteration Counts
// ============================================================================

#[test]
fn test_bounded_pass_yields_exactly_n_batches() -> Result<(), DatasetError> {
    let table = table(4);
    let mut batches = CyclicBatches::bounded(&table, 3, 7)?;
    assert_eq!(batches.size_hint(), (7, Some(7)));
    assert_eq!(batches.by_ref().count(), 7);
    assert_eq!(batches.remaining(), Some(0));
    assert!(batches.next().is_none());
    Ok(())
}

#[test]
fn test_unbounded_pass_never_runs_dry() -> Result<(), DatasetError> {
    let table = table(3);
    let n = 10_000;
    let mut batches = CyclicBatches::unbounded(&table, 2)?;
    assert_eq!(batches.by_ref().take(n + 5).count(), n + 5);
    assert!(batches.next().is_some());
    assert_eq!(batches.remaining(), None);
    Ok(())
}

#[test]
fn test_batch_larger_than_table_repeats_rows() -> Result<(), DatasetError> {
    let table = table(2);
    let first = CyclicBatches::unbounded(&table, 5)?.next().expect("unbounded");
    assert_eq!(ids(&first), vec![0, 1, 0, 1, 0]);
    Ok(())
}

#[test]
fn test_shared_counter_outlives_the_iterator() -> Result<(), DatasetError> {
    let table = table(3);
    let mut remaining = 4;

    let first: Vec<_> = CyclicBatches::new(&table, 1, Remaining::Shared(&mut remaining))?
        .take(3)
        .collect();
    assert_eq!(first.len(), 3);
    assert_eq!(remaining, 1);

    // A restart begins at row 0 again but only has one batch left.
    let second: Vec<_> =
        CyclicBatches::new(&table, 1, Remaining::Shared(&mut remaining))?.collect();
    assert_eq!(second.len(), 1);
    assert_eq!(ids(&second[0]), vec![0]);
    assert_eq!(remaining, 0);
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_table_is_rejected_up_front() {
    let empty = Table::empty();
    let err = CyclicBatches::unbounded(&empty, 4).unwrap_err();
    assert!(matches!(err, DatasetError::EmptyDataset));
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let table = table(3);
    let err = CyclicBatches::unbounded(&table, 0).unwrap_err();
    assert!(err.is_config());
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_batches_serialize_row_major() -> anyhow::Result<()> {
    let table = table(3);
    let batch = CyclicBatches::unbounded(&table, 2)?.next().expect("unbounded");
    assert_eq!(
        serde_json::to_value(&batch)?,
        serde_json::json!({ "rows": 2, "columns": 2, "values": [0.0, 1.0, 10.0, 11.0] })
    );
    assert_eq!(batch.to_rows(), vec![vec![0.0, 1.0], vec![10.0, 11.0]]);
    Ok(())
}

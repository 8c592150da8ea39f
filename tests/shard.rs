// Integration tests for shard selection
//
// Every worker computes its slice of the sorted listing independently, so these
// tests check the partition from the outside: disjoint, ordered, complete.

use object_storage_dataset::{DatasetError, ShardAssignment};

fn listing(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("part-{i:04}.csv")).collect()
}

// ============================================================================
// Partition Properties
// ============================================================================

#[test]
fn test_shards_partition_the_listing() -> Result<(), DatasetError> {
    for total in 0..=17 {
        let objects = listing(total);
        for replicas in 1..=9 {
            let mut union = Vec::new();
            for worker in 0..replicas {
                let shard = ShardAssignment::new(worker, replicas)?;
                union.extend_from_slice(shard.select(&objects));
            }
            // Disjoint + ordered union: concatenation reproduces the listing exactly.
            assert_eq!(union, objects, "total={total} replicas={replicas}");
        }
    }
    Ok(())
}

#[test]
fn test_single_replica_returns_everything() -> Result<(), DatasetError> {
    let objects = listing(7);
    let shard = ShardAssignment::new(0, 1)?;
    assert_eq!(shard.select(&objects), objects.as_slice());
    assert_eq!(ShardAssignment::default(), shard);
    Ok(())
}

#[test]
fn test_two_objects_two_replicas() -> Result<(), DatasetError> {
    let objects = vec!["a.csv", "b.csv"];
    assert_eq!(ShardAssignment::new(0, 2)?.select(&objects), &["a.csv"]);
    assert_eq!(ShardAssignment::new(1, 2)?.select(&objects), &["b.csv"]);
    Ok(())
}

#[test]
fn test_trailing_workers_may_get_nothing() -> Result<(), DatasetError> {
    // 4 objects, 3 replicas: per_worker = 2, so worker 2 starts at 4.
    let objects = listing(4);
    let shard = ShardAssignment::new(2, 3)?;
    assert_eq!(shard.per_worker(objects.len()), 2);
    assert!(shard.select(&objects).is_empty());
    Ok(())
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_invalid_assignments_are_config_errors() {
    let zero = ShardAssignment::new(0, 0).unwrap_err();
    assert!(zero.is_config());
    assert!(zero.to_string().contains("positive integer"));

    let out_of_range = ShardAssignment::new(3, 3).unwrap_err();
    assert!(out_of_range.is_config());
    assert!(out_of_range.to_string().contains("[0, 3)"));
}

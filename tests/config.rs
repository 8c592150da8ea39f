// Integration tests for dataset configuration

use anyhow::Result;
use object_storage_dataset::{
    DatasetConfig, DatasetError, IterationBudget, LoadPolicy, StorageOptions,
};
use std::path::PathBuf;

fn config_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DatasetError>()
        .is_some_and(DatasetError::is_config)
}

// ============================================================================
// Builder and Defaults
// ============================================================================

#[test]
fn test_defaults() {
    let config = DatasetConfig::new("s3://bucket/*.csv");
    assert_eq!(config.batch_size, None);
    assert_eq!(config.iterations, None);
    assert_eq!(config.load_policy, LoadPolicy::NodeMemory);
    assert_eq!(config.iteration_budget, IterationBudget::Shared);
    assert_eq!((config.worker, config.replicas), (0, 1));
    assert_eq!(config.delimiter, ',');
    assert!(config.validate().is_ok());
}

#[test]
fn test_environment_defaults_are_resolved_per_call() {
    let config = DatasetConfig::new("s3://bucket/*.csv");
    assert_eq!(config.resolved_cache_dir(), std::env::temp_dir());
    assert_eq!(config.resolved_storage_options(), StorageOptions::anonymous());

    // An explicitly empty map also means anonymous.
    let config = config.storage_options(StorageOptions::empty());
    assert!(config.resolved_storage_options().is_anonymous());

    let config = config
        .storage_options(StorageOptions::empty().with("region", "us-east-1"))
        .cache_dir("/var/cache/datasets");
    let options = config.resolved_storage_options();
    assert_eq!(options.get("region"), Some("us-east-1"));
    assert!(!options.is_anonymous());
    assert_eq!(config.resolved_cache_dir(), PathBuf::from("/var/cache/datasets"));
}

#[test]
fn test_validation_rejects_bad_parameters() {
    let base = || DatasetConfig::new("s3://bucket/*.csv");
    let cases = [
        ("empty glob", DatasetConfig::new("  ")),
        ("zero replicas", base().shard(0, 0)),
        ("worker out of range", base().shard(4, 4)),
        ("zero batch size", base().batch_size(0)),
        ("zero iterations", base().iterations(0)),
        ("non-ascii delimiter", base().delimiter('§')),
    ];
    for (name, config) in cases {
        let err = config.validate().unwrap_err();
        assert!(err.is_config(), "{name}: {err}");
    }
}

// ============================================================================
// TOML
// ============================================================================

#[test]
fn test_full_toml_document() -> Result<()> {
    let config = DatasetConfig::from_toml_str(
        r#"
        glob = "gs://training/2024/*.csv.gz"
        batch_size = 128
        iterations = 500
        cache_dir = "/tmp/dataset-cache"
        load_policy = "cluster_memory"
        iteration_budget = "per_pass"
        worker = 2
        replicas = 4
        delimiter = ";"

        [storage_options]
        anon = "false"
        token = "secret"
        "#,
    )?;

    assert_eq!(config.glob, "gs://training/2024/*.csv.gz");
    assert_eq!(config.batch_size, Some(128));
    assert_eq!(config.iterations, Some(500));
    assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/dataset-cache")));
    assert_eq!(config.load_policy, LoadPolicy::ClusterMemory);
    assert_eq!(config.iteration_budget, IterationBudget::PerPass);
    assert_eq!((config.worker, config.replicas), (2, 4));
    assert_eq!(config.delimiter, ';');
    let options = config.resolved_storage_options();
    assert_eq!(options.get("token"), Some("secret"));
    assert!(!options.is_anonymous());
    Ok(())
}

#[test]
fn test_minimal_toml_matches_builder_defaults() -> Result<()> {
    let parsed = DatasetConfig::from_toml_str(r#"glob = "s3://bucket/*.csv""#)?;
    assert_eq!(parsed, DatasetConfig::new("s3://bucket/*.csv"));
    Ok(())
}

#[test]
fn test_legacy_memory_flags_map_to_a_policy() -> Result<()> {
    let cases = [
        ("fits_in_node_memory = true", LoadPolicy::NodeMemory),
        ("fits_in_node_memory = false", LoadPolicy::ClusterMemory),
        (
            "fits_in_node_memory = false\nfits_in_cluster_memory = false",
            LoadPolicy::Skip,
        ),
        (
            "fits_in_node_memory = true\nfits_in_cluster_memory = false",
            LoadPolicy::NodeMemory,
        ),
    ];
    for (flags, expected) in cases {
        let source = format!("glob = \"s3://bucket/*.csv\"\n{flags}\n");
        assert_eq!(DatasetConfig::from_toml_str(&source)?.load_policy, expected, "{flags}");
    }
    Ok(())
}

#[test]
fn test_policy_and_legacy_flags_conflict() {
    let err = DatasetConfig::from_toml_str(
        r#"
        glob = "s3://bucket/*.csv"
        load_policy = "skip"
        fits_in_node_memory = true
        "#,
    )
    .unwrap_err();
    assert!(config_error(&err), "{err:#}");
}

#[test]
fn test_unknown_keys_are_rejected() {
    let err = DatasetConfig::from_toml_str(
        r#"
        glob = "s3://bucket/*.csv"
        batchsize = 10
        "#,
    )
    .unwrap_err();
    assert!(config_error(&err));
    assert!(err.to_string().contains("batchsize"));
}

#[test]
fn test_toml_file_round_trip_through_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("dataset.toml");
    std::fs::write(&path, "glob = \"/data/*.csv\"\nbatch_size = 8\n")?;

    let config = DatasetConfig::from_toml_file(&path)?;
    assert_eq!(config.batch_size, Some(8));

    let missing = DatasetConfig::from_toml_file(dir.path().join("nope.toml")).unwrap_err();
    assert!(format!("{missing:#}").contains("nope.toml"));
    Ok(())
}

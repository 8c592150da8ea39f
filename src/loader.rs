//! Fetch, decompress and parse the selected objects into one table.

use crate::cache::CachingFetcher;
use crate::config::LoadPolicy;
use crate::error::DatasetError;
use crate::io::compression::decompressing_reader;
use crate::io::storage::glob::ObjectRef;
use crate::shard::ShardAssignment;
use crate::table::Table;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Load `objects` in order and concatenate them.
///
/// Each object is opened, read to the end and closed before the next one.
/// Any failure aborts the whole load.
///
/// # Errors
/// Returns [`DatasetError::Storage`], [`DatasetError::Parse`] or
/// [`DatasetError::SchemaMismatch`] from the first object that fails.
pub fn load_objects(
    fetcher: &mut CachingFetcher,
    objects: &[ObjectRef],
    delimiter: u8,
) -> Result<Table> {
    let mut parts = Vec::with_capacity(objects.len());
    for object in objects {
        let name = object.to_string();
        let file = fetcher.open(object)?;
        let reader = decompressing_reader(file, &object.key)?;
        let part = Table::from_csv(reader, &name, delimiter)?;
        debug!(object = %name, rows = part.len(), columns = part.num_columns(), "parsed object");
        parts.push((name, part));
    }

    Ok(Table::concat(parts)?)
}

/// Apply `policy` to the full listing and load the result.
///
/// # Errors
/// See [`load_objects`].
pub fn load_table(
    fetcher: &mut CachingFetcher,
    objects: &[ObjectRef],
    policy: LoadPolicy,
    shard: ShardAssignment,
    delimiter: u8,
) -> Result<Table> {
    let selected: &[ObjectRef] = match policy {
        LoadPolicy::NodeMemory => objects,
        LoadPolicy::ClusterMemory => {
            let range = shard.range(objects.len());
            info!(
                worker = shard.worker(),
                replicas = shard.replicas(),
                start = range.start,
                end = range.end,
                total = objects.len(),
                "selected shard"
            );
            &objects[range]
        }
        LoadPolicy::Skip => {
            info!("load policy is skip, leaving the table empty");
            return Ok(Table::empty());
        }
    };

    let table = load_objects(fetcher, selected, delimiter)
        .with_context(|| format!("load {} object(s)", selected.len()))?;
    info!(
        objects = selected.len(),
        rows = table.len(),
        columns = table.num_columns(),
        cache_hits = fetcher.stats().hits,
        cache_misses = fetcher.stats().misses,
        "loaded table"
    );
    Ok(table)
}

/// The delimiter as a byte.
///
/// # Errors
/// Returns [`DatasetError::Config`] for a non-ASCII delimiter.
pub(crate) fn delimiter_byte(delimiter: char) -> Result<u8, DatasetError> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| DatasetError::config(format!("delimiter {delimiter:?} is not ASCII")))
}

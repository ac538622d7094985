//! Shard Record Builder
//!
//! Turns `_cat/shards` rows into canonical [`ShardRecord`]s and resolves each shard's
//! authoritative size from the index stats feed.
//!
//! Size resolution is keyed by role:
//! - a primary takes the index-wide `primaries.store.size_in_bytes`
//! - a replica takes the size of the first non-primary copy listed for its shard id
//!
//! Only primaries get a raw ingest size; a replica is a copy and represents no newly
//! ingested data, so it carries [`SizeValue::NotApplicable`].

use crate::models::{Role, ShardRecord, SizeValue, UNKNOWN};
use crate::snapshot::{IndicesStatsFeed, Scalar, ShardPlacement};
use crate::units::is_system_index;
use std::collections::HashMap;
use tracing::debug;

/// Stored bytes per byte of source document after indexing.
pub const STORAGE_OVERHEAD_FACTOR: f64 = 1.5;

/// Authoritative sizes taken from the index stats feed.
#[derive(Debug, Clone, Default)]
pub struct SizeTable {
    primaries: HashMap<String, SizeValue>,
    replicas: HashMap<(String, String), SizeValue>,
}

impl SizeTable {
    pub fn from_stats(feed: &IndicesStatsFeed) -> Self {
        let mut table = Self::default();

        for (index, stats) in &feed.indices {
            if is_system_index(index) {
                continue;
            }

            let primary = stats
                .primaries
                .store
                .size_in_bytes
                .map_or(SizeValue::Unknown, SizeValue::Measured);
            table.primaries.insert(index.clone(), primary);

            for (shard_id, copies) in &stats.shards {
                let replica = copies
                    .iter()
                    .find(|copy| copy.routing.primary == Some(false))
                    .map(|copy| {
                        copy.store
                            .size_in_bytes
                            .map_or(SizeValue::Unknown, SizeValue::Measured)
                    });
                if let Some(size) = replica {
                    table
                        .replicas
                        .insert((index.clone(), shard_id.clone()), size);
                }
            }
        }

        debug!(
            primaries = table.primaries.len(),
            replicas = table.replicas.len(),
            "Built size table"
        );
        table
    }

    /// Left-outer lookup: a shard without a matching stats entry gets `Unknown`.
    pub fn resolve(&self, index: &str, shard_id: &str, role: Role) -> SizeValue {
        let found = match role {
            Role::Primary => self.primaries.get(index),
            Role::Replica => self
                .replicas
                .get(&(index.to_string(), shard_id.to_string())),
        };
        found.copied().unwrap_or(SizeValue::Unknown)
    }
}

/// Raw ingest estimate: primaries only, with the storage overhead removed.
pub fn raw_ingest_size(role: Role, size: SizeValue) -> SizeValue<f64> {
    match role {
        Role::Primary => size.map(|bytes| bytes as f64 / STORAGE_OVERHEAD_FACTOR),
        Role::Replica => SizeValue::NotApplicable,
    }
}

pub struct ShardRecordBuilder<'a> {
    sizes: &'a SizeTable,
}

impl<'a> ShardRecordBuilder<'a> {
    pub fn new(sizes: &'a SizeTable) -> Self {
        Self { sizes }
    }

    /// Builds one record per non-system placement row, in input order. A row without
    /// an index name cannot be attributed to anything and is kept under `unknown`.
    pub fn build(&self, rows: &[ShardPlacement]) -> Vec<ShardRecord> {
        rows.iter()
            .filter(|row| !row.index.as_deref().map_or(false, is_system_index))
            .map(|row| self.build_one(row))
            .collect()
    }

    pub fn build_one(&self, row: &ShardPlacement) -> ShardRecord {
        let index = text_or_unknown(row.index.as_deref());
        let shard_id = row
            .shard
            .as_ref()
            .map(Scalar::to_text)
            .unwrap_or_else(|| UNKNOWN.to_string());
        let role = Role::from_prirep(row.prirep.as_deref().unwrap_or_default());
        let size = self.sizes.resolve(&index, &shard_id, role);

        ShardRecord {
            role,
            node_id: text_or_unknown(row.id.as_deref()),
            node_name: text_or_unknown(row.node.as_deref()),
            doc_count: row.docs.as_ref().and_then(Scalar::as_u64),
            size,
            raw_ingest_size: raw_ingest_size(role, size),
            index,
            shard_id,
        }
    }
}

fn text_or_unknown(value: Option<&str>) -> String {
    value.unwrap_or(UNKNOWN).to_string()
}

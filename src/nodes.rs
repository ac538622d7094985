//! Node records and the node role matrix.

use crate::models::{NodeMetrics, NodeRecord, UNKNOWN};
use crate::snapshot::{CatNodeMetrics, NodesStatsFeed};
use crate::units::bytes_to_gib;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Roles that make a node hold data.
pub const DATA_ROLES: [&str; 6] = [
    "data",
    "data_content",
    "data_hot",
    "data_warm",
    "data_cold",
    "data_frozen",
];

/// Columns of the role matrix after `coordinating` and `data`.
pub const OTHER_ROLES: [&str; 10] = [
    "data_content",
    "data_hot",
    "data_warm",
    "data_cold",
    "data_frozen",
    "ingest",
    "ml",
    "remote_cluster_client",
    "transform",
    "master",
];

/// Role matrix columns in display order.
pub fn role_columns() -> impl Iterator<Item = &'static str> {
    ["coordinating", "data"].into_iter().chain(OTHER_ROLES)
}

/// Builds one record per node in the feed, ordered by node id.
pub fn build_node_records(feed: &NodesStatsFeed) -> Vec<NodeRecord> {
    feed.nodes
        .iter()
        .map(|(node_id, stats)| {
            let attribute = |key: &str| {
                stats
                    .attributes
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN.to_string())
            };
            let gib = |field: &str, value: Option<u64>| {
                value.map(bytes_to_gib).unwrap_or_else(|| {
                    warn!(node_id = %node_id, field, "Missing node size field, using 0");
                    0.0
                })
            };

            NodeRecord {
                node_id: node_id.clone(),
                name: stats.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                roles: stats.roles.iter().cloned().collect(),
                region_code: attribute("region"),
                product_sku: attribute("instance_configuration"),
                availability_zone: attribute("availability_zone"),
                node_type: attribute("data"),
                memory_gb: gib("os.mem.total_in_bytes", stats.os.mem.total_in_bytes),
                disk_capacity_gb: gib("fs.total.total_in_bytes", stats.fs.total.total_in_bytes),
                data_store_size_gb: gib(
                    "indices.store.total_data_set_size_in_bytes",
                    stats.indices.store.total_data_set_size_in_bytes,
                ),
            }
        })
        .collect()
}

/// One metrics row per node in the feed, ordered by node id. Usage figures are
/// matched by node name.
pub fn build_node_metrics(
    feed: &NodesStatsFeed,
    usage: &HashMap<String, CatNodeMetrics>,
) -> Vec<NodeMetrics> {
    let cluster_name = feed
        .cluster_name
        .clone()
        .unwrap_or_else(|| UNKNOWN.to_string());

    feed.nodes
        .values()
        .map(|stats| {
            let node = stats.name.clone().unwrap_or_else(|| UNKNOWN.to_string());
            let usage = usage.get(&node).copied().unwrap_or_default();
            let mut roles = stats.roles.clone();
            roles.sort();

            NodeMetrics {
                cluster_name: cluster_name.clone(),
                roles: if roles.is_empty() {
                    "coordinating".to_string()
                } else {
                    roles.join(", ")
                },
                cpus: stats.os.allocated_processors.unwrap_or(0),
                heap_max_gb: stats.jvm.mem.heap_max_in_bytes.map_or(0.0, bytes_to_gib),
                heap_percent: usage.heap_percent,
                disk_used_percent: usage.disk_used_percent,
                load_1m: usage.load_1m,
                load_5m: usage.load_5m,
                load_15m: usage.load_15m,
                node,
            }
        })
        .collect()
}

/// Node records keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    nodes: HashMap<String, NodeRecord>,
}

impl NodeTable {
    pub fn new(records: &[NodeRecord]) -> Self {
        Self {
            nodes: records
                .iter()
                .map(|node| (node.node_id.clone(), node.clone()))
                .collect(),
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeRecord> {
        self.nodes.get(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Which roles a node holds. A node without roles is coordinating-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleMatrixRow {
    pub node: String,
    pub roles: BTreeMap<&'static str, bool>,
}

pub fn role_matrix(nodes: &[NodeRecord]) -> Vec<RoleMatrixRow> {
    nodes
        .iter()
        .map(|node| {
            let mut roles = BTreeMap::new();
            roles.insert("coordinating", node.roles.is_empty());
            roles.insert(
                "data",
                DATA_ROLES.iter().any(|role| node.roles.contains(*role)),
            );
            for role in OTHER_ROLES {
                roles.insert(role, node.roles.contains(role));
            }
            RoleMatrixRow {
                node: node.name.clone(),
                roles,
            }
        })
        .collect()
}

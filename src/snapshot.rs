//! Diagnostic Snapshot Loading
//!
//! Reads the point-in-time files of an Elasticsearch support diagnostic into typed feeds.
//! The feeds stay close to the JSON the cluster produced; turning them into canonical
//! records is the job of [`crate::shards`], [`crate::nodes`] and [`crate::ilm`].
//!
//! ## Layout
//!
//! ```text
//! <diagnostic_dir>/
//!   indices.json                    _cat/shards as JSON (shard placement feed)
//!   nodes_stats.json                _nodes/stats (node attribute feed)
//!   indices_stats.json*             _stats (index size feed, any suffix)
//!   cat/cat_indices.txt             _cat/indices (store sizes, doc counts)
//!   cat/cat_nodes.txt               _cat/nodes (heap, disk and load per node)
//!   commercial/ilm_explain.json     _ilm/explain
//!   commercial/ilm_policies.json    _ilm/policy
//! ```
//!
//! ## Errors
//!
//! Only structural problems are fatal: a missing file, invalid JSON, or a document
//! without its expected top-level field. Every [`SnapshotError`] names the input and,
//! where it applies, the field. Problems inside individual records are handled by the
//! consumers with sentinels.

use crate::models::IndexStore;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("{input}: required snapshot not found at {path}")]
    Missing { input: &'static str, path: PathBuf },

    #[error("{input}: failed to read {path}: {source}")]
    Unreadable {
        input: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{input}: {path} is not valid JSON for this feed: {source}")]
    Malformed {
        input: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{input}: unexpected structure, missing or invalid field '{field}'")]
    Structure { input: &'static str, field: String },
}

/// A JSON scalar that the cat APIs emit either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(u64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Int(v) => v.to_string(),
            Scalar::Float(v) => v.to_string(),
            Scalar::Text(v) => v.clone(),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            Scalar::Float(_) => None,
            Scalar::Text(v) => v.trim().parse().ok(),
        }
    }
}

/// One row of `_cat/shards?format=json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShardPlacement {
    pub index: Option<String>,
    pub shard: Option<Scalar>,
    pub prirep: Option<String>,
    /// Node id.
    pub id: Option<String>,
    /// Node name.
    pub node: Option<String>,
    pub docs: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodesStatsFeed {
    #[serde(default)]
    pub cluster_name: Option<String>,
    pub nodes: BTreeMap<String, NodeStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeStats {
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub os: OsStats,
    pub jvm: JvmStats,
    pub fs: FsStats,
    pub indices: NodeIndicesStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OsStats {
    pub mem: MemStats,
    pub allocated_processors: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmStats {
    pub mem: JvmMemStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmMemStats {
    pub heap_max_in_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemStats {
    pub total_in_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FsStats {
    pub total: FsTotal,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FsTotal {
    pub total_in_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeIndicesStats {
    pub store: NodeStoreStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeStoreStats {
    pub total_data_set_size_in_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndicesStatsFeed {
    pub indices: BTreeMap<String, IndexStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexStats {
    pub primaries: PrimariesStats,
    pub shards: BTreeMap<String, Vec<ShardCopyStats>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PrimariesStats {
    pub store: StoreStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreStats {
    pub size_in_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShardCopyStats {
    pub routing: RoutingStats,
    pub store: StoreStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoutingStats {
    /// A copy without a routing flag is assumed to be the primary.
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IlmExplainFeed {
    pub indices: BTreeMap<String, IlmExplainEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IlmExplainEntry {
    pub managed: bool,
    pub policy: Option<String>,
    pub phase_execution: Option<PhaseExecution>,
    pub age: Option<String>,
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhaseExecution {
    pub policy: Option<String>,
}

/// `_ilm/policy` is keyed directly by policy name.
pub type IlmPoliciesFeed = BTreeMap<String, IlmPolicyEntry>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IlmPolicyEntry {
    pub policy: Option<IlmPolicyBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IlmPolicyBody {
    pub phases: BTreeMap<String, serde_json::Value>,
}

/// Resolved file locations of one diagnostic directory.
#[derive(Debug, Clone)]
pub struct DiagnosticBundle {
    pub root: PathBuf,
}

impl DiagnosticBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn shards_path(&self) -> PathBuf {
        self.root.join("indices.json")
    }

    pub fn nodes_stats_path(&self) -> PathBuf {
        self.root.join("nodes_stats.json")
    }

    pub fn cat_indices_path(&self) -> PathBuf {
        self.root.join("cat").join("cat_indices.txt")
    }

    pub fn cat_nodes_path(&self) -> PathBuf {
        self.root.join("cat").join("cat_nodes.txt")
    }

    pub fn ilm_explain_path(&self) -> PathBuf {
        self.root.join("commercial").join("ilm_explain.json")
    }

    pub fn ilm_policies_path(&self) -> PathBuf {
        self.root.join("commercial").join("ilm_policies.json")
    }

    /// The index stats file is often saved with a suffix (`indices_stats.json_fixed`
    /// after a manual repair), so the plain name is tried first and then any match.
    pub fn indices_stats_path(&self) -> Result<PathBuf, SnapshotError> {
        let exact = self.root.join("indices_stats.json");
        if exact.is_file() {
            return Ok(exact);
        }

        let pattern = self.root.join("indices_stats.json*");
        let mut candidates: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
            .map(|paths| paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).collect())
            .unwrap_or_default();
        candidates.sort();

        match candidates.into_iter().next() {
            Some(path) => {
                debug!(path = %path.display(), "Resolved index stats snapshot");
                Ok(path)
            }
            None => Err(SnapshotError::Missing {
                input: "index stats",
                path: exact,
            }),
        }
    }

    pub fn load_shards(&self) -> Result<Vec<ShardPlacement>, SnapshotError> {
        read_json(&self.shards_path(), "shard placement")
    }

    pub fn load_nodes_stats(&self) -> Result<NodesStatsFeed, SnapshotError> {
        read_json_object(&self.nodes_stats_path(), "node stats", "nodes")
    }

    pub fn load_indices_stats(&self) -> Result<IndicesStatsFeed, SnapshotError> {
        read_json_object(&self.indices_stats_path()?, "index stats", "indices")
    }

    pub fn load_ilm_explain(&self) -> Result<IlmExplainFeed, SnapshotError> {
        read_json_object(&self.ilm_explain_path(), "ILM explain", "indices")
    }

    /// ILM explain is absent from diagnostics of clusters without a commercial
    /// licence; the cost report then attaches `unknown` ILM state to every index.
    pub fn load_ilm_explain_optional(&self) -> Result<Option<IlmExplainFeed>, SnapshotError> {
        match self.load_ilm_explain() {
            Ok(feed) => Ok(Some(feed)),
            Err(SnapshotError::Missing { path, .. }) => {
                warn!(path = %path.display(), "No ILM explain snapshot, ILM state will be unknown");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn load_ilm_policies(&self) -> Result<IlmPoliciesFeed, SnapshotError> {
        read_json(&self.ilm_policies_path(), "ILM policies")
    }

    pub fn load_cat_indices(&self) -> Result<Vec<IndexStore>, SnapshotError> {
        let path = self.cat_indices_path();
        let content = read_text(&path, "cat indices")?;
        Ok(parse_cat_indices(&content))
    }

    /// Node metrics are supplementary; a missing or unparseable file leaves them empty.
    pub fn load_cat_nodes(&self) -> HashMap<String, CatNodeMetrics> {
        match read_text(&self.cat_nodes_path(), "cat nodes") {
            Ok(content) => parse_cat_nodes(&content),
            Err(e) => {
                warn!(error = %e, "No node metrics, usage columns will be zero");
                HashMap::new()
            }
        }
    }
}

/// Fully loaded inputs of the cost report.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub shards: Vec<ShardPlacement>,
    pub nodes: NodesStatsFeed,
    pub indices_stats: IndicesStatsFeed,
    pub ilm_explain: Option<IlmExplainFeed>,
}

impl Snapshot {
    pub fn load(bundle: &DiagnosticBundle) -> Result<Self, SnapshotError> {
        info!(dir = %bundle.root.display(), "Loading diagnostic snapshot");
        let snapshot = Self {
            shards: bundle.load_shards()?,
            nodes: bundle.load_nodes_stats()?,
            indices_stats: bundle.load_indices_stats()?,
            ilm_explain: bundle.load_ilm_explain_optional()?,
        };
        debug!(
            shards = snapshot.shards.len(),
            nodes = snapshot.nodes.nodes.len(),
            indices = snapshot.indices_stats.indices.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }
}

pub(crate) fn read_text(path: &Path, input: &'static str) -> Result<String, SnapshotError> {
    if !path.is_file() {
        return Err(SnapshotError::Missing {
            input,
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| SnapshotError::Unreadable {
        input,
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path, input: &'static str) -> Result<T, SnapshotError> {
    let content = read_text(path, input)?;
    serde_json::from_str(&content).map_err(|source| SnapshotError::Malformed {
        input,
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a JSON document whose payload sits under one required top-level object field.
fn read_json_object<T: DeserializeOwned>(
    path: &Path,
    input: &'static str,
    field: &str,
) -> Result<T, SnapshotError> {
    let value: serde_json::Value = read_json(path, input)?;
    if !value.get(field).map_or(false, |v| v.is_object()) {
        return Err(SnapshotError::Structure {
            input,
            field: field.to_string(),
        });
    }
    serde_json::from_value(value).map_err(|source| SnapshotError::Malformed {
        input,
        path: path.to_path_buf(),
        source,
    })
}

/// Parses `_cat/indices?v` output. Columns are
/// `health status index uuid pri rep docs.count docs.deleted store.size pri.store.size`;
/// closed indices print fewer columns and are skipped.
pub fn parse_cat_indices(content: &str) -> Vec<IndexStore> {
    let mut rows = Vec::new();
    for line in content.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 9 {
            continue;
        }
        let doc_count = parts[6].parse().unwrap_or_else(|_| {
            warn!(index = parts[2], value = parts[6], "Unparseable doc count, counting it as zero");
            0
        });
        rows.push(IndexStore {
            index: parts[2].to_string(),
            doc_count,
            store_size: parts[8].to_string(),
        });
    }
    rows
}

/// Usage figures of one node from `_cat/nodes?v`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CatNodeMetrics {
    pub heap_percent: f64,
    pub disk_used_percent: f64,
    pub load_1m: f64,
    pub load_5m: f64,
    pub load_15m: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatNodesError {
    #[error("no header line")]
    MissingHeader,
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("node {node}: invalid {column} value '{value}'")]
    InvalidNumber {
        node: String,
        column: &'static str,
        value: String,
    },
}

/// Parses `_cat/nodes?v` output into metrics keyed by node name, the first column.
/// Blank lines and lines starting with `#` are ignored; rows shorter than the header
/// are skipped.
pub fn try_parse_cat_nodes(
    content: &str,
) -> Result<HashMap<String, CatNodeMetrics>, CatNodesError> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let headers: Vec<&str> = lines
        .next()
        .ok_or(CatNodesError::MissingHeader)?
        .split_whitespace()
        .collect();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| *h == name)
            .ok_or(CatNodesError::MissingColumn(name))
    };
    let columns = [
        column("hp")?,
        column("dup")?,
        column("load_1m")?,
        column("load_5m")?,
        column("load_15m")?,
    ];

    let mut metrics = HashMap::new();
    for line in lines {
        let values: Vec<&str> = line.split_whitespace().collect();
        if values.len() < headers.len() {
            continue;
        }
        let node = values[0];
        let number = |position: usize, name: &'static str| {
            values[position]
                .parse::<f64>()
                .map_err(|_| CatNodesError::InvalidNumber {
                    node: node.to_string(),
                    column: name,
                    value: values[position].to_string(),
                })
        };
        metrics.insert(
            node.to_string(),
            CatNodeMetrics {
                heap_percent: number(columns[0], "hp")?,
                disk_used_percent: number(columns[1], "dup")?,
                load_1m: number(columns[2], "load_1m")?,
                load_5m: number(columns[3], "load_5m")?,
                load_15m: number(columns[4], "load_15m")?,
            },
        );
    }
    Ok(metrics)
}

/// Like [`try_parse_cat_nodes`], but any problem is logged and yields no metrics.
pub fn parse_cat_nodes(content: &str) -> HashMap<String, CatNodeMetrics> {
    try_parse_cat_nodes(content).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to parse cat nodes, node metrics will be zero");
        HashMap::new()
    })
}

//! Core Data Models
//!
//! This module defines the data structures that flow through the cost report
//! pipeline, from canonical per-shard records to the aggregated per-index report.
//!
//! ## Data Flow
//!
//! 1. **Canonical records**: [`ShardRecord`], [`NodeRecord`], [`IlmState`], [`PricingEntry`]
//! 2. **Join output**: [`JoinedShard`] - one row per shard with node, size and ILM attributes
//! 3. **Node costs**: [`NodeCost`] and its per-tier [`CostRow`]s
//! 4. **Report**: [`IndexCostReport`] - one row per index
//!
//! Side reports built from the same snapshots:
//! - [`IndexStore`], [`PolicyUsage`], [`PolicyPhases`], [`IngestionEstimate`]
//!
//! ## Sentinels
//!
//! Missing textual fields carry the [`UNKNOWN`] sentinel so that grouping always has a
//! stable value. Sizes use the tagged [`SizeValue`] instead of mixing numbers and strings,
//! so every consumer has to decide explicitly what an unknown or non-applicable size means.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Placeholder for a missing textual field.
pub const UNKNOWN: &str = "unknown";

/// Placeholder rendered for the raw ingest size of a replica shard.
pub const NOT_APPLICABLE_REPLICA: &str = "not applicable: replica";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Replica,
}

impl Role {
    /// `"p"` marks a primary; every other flag (including a missing one) is a replica.
    pub fn from_prirep(flag: &str) -> Self {
        if flag == "p" {
            Role::Primary
        } else {
            Role::Replica
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Replica => "replica",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A size that was either measured, missing from the source, or meaningless for the row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeValue<T = u64> {
    Measured(T),
    Unknown,
    NotApplicable,
}

impl<T: Copy> SizeValue<T> {
    pub fn measured(&self) -> Option<T> {
        match self {
            SizeValue::Measured(v) => Some(*v),
            SizeValue::Unknown | SizeValue::NotApplicable => None,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, SizeValue::Measured(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SizeValue<U> {
        match self {
            SizeValue::Measured(v) => SizeValue::Measured(f(v)),
            SizeValue::Unknown => SizeValue::Unknown,
            SizeValue::NotApplicable => SizeValue::NotApplicable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for SizeValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeValue::Measured(v) => write!(f, "{}", v),
            SizeValue::Unknown => f.write_str(UNKNOWN),
            SizeValue::NotApplicable => f.write_str(NOT_APPLICABLE_REPLICA),
        }
    }
}

impl<T: Serialize> Serialize for SizeValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SizeValue::Measured(v) => v.serialize(serializer),
            SizeValue::Unknown => serializer.serialize_str(UNKNOWN),
            SizeValue::NotApplicable => serializer.serialize_str(NOT_APPLICABLE_REPLICA),
        }
    }
}

/// Canonical placement of one shard copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardRecord {
    pub index: String,
    pub shard_id: String,
    pub role: Role,
    pub node_id: String,
    pub node_name: String,
    pub doc_count: Option<u64>,
    pub size: SizeValue,
    /// Stored size divided by the storage overhead factor, primaries only.
    pub raw_ingest_size: SizeValue<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub node_id: String,
    pub name: String,
    pub roles: BTreeSet<String>,
    pub region_code: String,
    /// Elastic Cloud `instance_configuration`, which is the product SKU in the price list.
    pub product_sku: String,
    pub availability_zone: String,
    pub node_type: String,
    pub memory_gb: f64,
    pub disk_capacity_gb: f64,
    pub data_store_size_gb: f64,
}

impl NodeRecord {
    /// Negative when the node is over-allocated; never clamped.
    pub fn free_space_gb(&self) -> f64 {
        self.disk_capacity_gb - self.data_store_size_gb
    }
}

/// Sizing and load of one node. Usage figures are zero when `_cat/nodes` has no row
/// for the node name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMetrics {
    pub cluster_name: String,
    pub node: String,
    /// Sorted and comma separated, `coordinating` for a node without roles.
    pub roles: String,
    pub cpus: u64,
    pub heap_max_gb: f64,
    pub heap_percent: f64,
    pub disk_used_percent: f64,
    pub load_1m: f64,
    pub load_5m: f64,
    pub load_15m: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IlmState {
    pub index: String,
    pub managed: bool,
    pub policy: String,
    pub age: String,
    pub phase: String,
}

impl IlmState {
    /// State attached to a shard whose index has no ILM explain entry.
    pub fn unknown(index: &str) -> Self {
        Self {
            index: index.to_string(),
            managed: false,
            policy: UNKNOWN.to_string(),
            age: UNKNOWN.to_string(),
            phase: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Gold,
    Platinum,
    Enterprise,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Standard, Tier::Gold, Tier::Platinum, Tier::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
            Tier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One optional amount per pricing tier. `None` means the amount is blank, not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TierAmounts {
    pub standard: Option<f64>,
    pub gold: Option<f64>,
    pub platinum: Option<f64>,
    pub enterprise: Option<f64>,
}

impl TierAmounts {
    pub fn zero() -> Self {
        Self::splat(Some(0.0))
    }

    pub fn splat(value: Option<f64>) -> Self {
        Self {
            standard: value,
            gold: value,
            platinum: value,
            enterprise: value,
        }
    }

    pub fn get(&self, tier: Tier) -> Option<f64> {
        match tier {
            Tier::Standard => self.standard,
            Tier::Gold => self.gold,
            Tier::Platinum => self.platinum,
            Tier::Enterprise => self.enterprise,
        }
    }

    pub fn set(&mut self, tier: Tier, value: Option<f64>) {
        match tier {
            Tier::Standard => self.standard = value,
            Tier::Gold => self.gold = value,
            Tier::Platinum => self.platinum = value,
            Tier::Enterprise => self.enterprise = value,
        }
    }

    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        let mut out = Self::default();
        for tier in Tier::ALL {
            out.set(tier, self.get(tier).map(&f));
        }
        out
    }
}

/// A row of the external price list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingEntry {
    pub cloud_provider: String,
    pub region: String,
    pub region_code: String,
    pub product_sku: String,
    pub unit: String,
    /// Price per GB of memory per hour.
    pub tier_price: TierAmounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRow {
    pub node_id: String,
    pub tier: Tier,
    pub hourly_cost: Option<f64>,
    pub yearly_cost: Option<f64>,
}

/// A node together with its cost eligibility and per-tier costs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCost {
    pub node: NodeRecord,
    pub eligible: bool,
    pub hourly: TierAmounts,
    pub yearly: TierAmounts,
}

impl NodeCost {
    pub fn cost_rows(&self) -> Vec<CostRow> {
        Tier::ALL
            .iter()
            .map(|&tier| CostRow {
                node_id: self.node.node_id.clone(),
                tier,
                hourly_cost: self.hourly.get(tier),
                yearly_cost: self.yearly.get(tier),
            })
            .collect()
    }
}

/// One shard row after the node, size and ILM joins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedShard {
    #[serde(flatten)]
    pub shard: ShardRecord,
    pub node_type: String,
    pub instance_configuration: String,
    pub ilm_policy: String,
    pub ilm_age: String,
    pub ilm_phase: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShardType {
    #[serde(rename = "primary-only")]
    PrimaryOnly,
    #[serde(rename = "primary+replica")]
    PrimaryReplica,
}

impl ShardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShardType::PrimaryOnly => "primary-only",
            ShardType::PrimaryReplica => "primary+replica",
        }
    }
}

impl fmt::Display for ShardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column names of the index cost report, in output order.
pub const INDEX_COST_COLUMNS: [&str; 9] = [
    "index",
    "instance_configuration/product",
    "shard_type",
    "total_index_size",
    "total_index_size (MB)",
    "standard/yr",
    "gold/yr",
    "platinum/yr",
    "enterprise/yr",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexCostReport {
    pub index: String,
    #[serde(rename = "instance_configuration/product")]
    pub product_sku: String,
    pub shard_type: ShardType,
    #[serde(rename = "total_index_size")]
    pub total_size_bytes: u64,
    #[serde(rename = "total_index_size (MB)")]
    pub total_size_mb: f64,
    #[serde(rename = "standard/yr")]
    pub standard_yr: Option<f64>,
    #[serde(rename = "gold/yr")]
    pub gold_yr: Option<f64>,
    #[serde(rename = "platinum/yr")]
    pub platinum_yr: Option<f64>,
    #[serde(rename = "enterprise/yr")]
    pub enterprise_yr: Option<f64>,
}

impl IndexCostReport {
    pub fn yearly(&self, tier: Tier) -> Option<f64> {
        match tier {
            Tier::Standard => self.standard_yr,
            Tier::Gold => self.gold_yr,
            Tier::Platinum => self.platinum_yr,
            Tier::Enterprise => self.enterprise_yr,
        }
    }
}

/// A row of `_cat/indices`: doc count and the human readable store size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStore {
    pub index: String,
    pub doc_count: u64,
    pub store_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyIndex {
    pub index: String,
    /// `None` when the index is managed by the policy but missing from `_cat/indices`.
    pub store_size: Option<String>,
    pub doc_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyUsage {
    pub policy: String,
    pub index_count: usize,
    pub total_size_bytes: u64,
    pub total_docs: u64,
    pub indices: Vec<PolicyIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyPhases {
    pub policy: String,
    pub phases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IngestionEstimate {
    Estimated {
        avg_daily_bytes: f64,
        avg_recent_bytes: f64,
        total_bytes: u64,
        num_days: usize,
        /// Number of most recent days that went into `avg_recent_bytes`.
        recent_days: usize,
    },
    Inestimable {
        reason: String,
    },
}

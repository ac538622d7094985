//! Cost Model
//!
//! Node costs and their attribution to indices.
//!
//! ## Node costs
//!
//! A node is billable when one of its roles contains `data` and it has at least
//! [`MIN_BILLABLE_MEMORY_GB`] of memory. For a billable node the hourly cost of a tier is
//! `memory_gb * tier_price`, with the tier price looked up by `(region_code, product_sku)`.
//! A node without a price entry keeps blank (`None`) costs. Non-billable nodes cost
//! exactly `0.0` in every tier so sums over mixed node sets stay defined.
//!
//! ## Index costs
//!
//! Every shard carries the cost of the node hosting it, and an index's cost per tier is
//! the sum over all of its shards, primaries and replicas alike. This is the cluster
//! spend attributable to the index, not only its primary spend.

use crate::models::{
    IndexCostReport, JoinedShard, NodeCost, NodeRecord, Role, ShardType, Tier, TierAmounts,
};
use crate::pricing::PricingTable;
use crate::units::bytes_to_mib;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// 365 days of 24 hours.
pub const HOURS_PER_YEAR: f64 = 8760.0;

pub const MIN_BILLABLE_MEMORY_GB: f64 = 2.0;

/// How the product of an index is chosen when its shards sit on different
/// instance configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSelection {
    /// Product of the first shard in join order.
    #[default]
    FirstSeen,
    /// All shards must agree, otherwise the report fails.
    Strict,
}

impl std::str::FromStr for ProductSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first-seen" | "first" => Ok(ProductSelection::FirstSeen),
            "strict" => Ok(ProductSelection::Strict),
            other => anyhow::bail!("Unknown product selection: {}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostError {
    #[error("index {index}: shards span several products ({first} and {other})")]
    DivergentProduct {
        index: String,
        first: String,
        other: String,
    },
}

pub fn is_cost_eligible(node: &NodeRecord) -> bool {
    node.memory_gb >= MIN_BILLABLE_MEMORY_GB
        && node
            .roles
            .iter()
            .any(|role| role.to_lowercase().contains("data"))
}

pub fn node_cost(node: &NodeRecord, pricing: &PricingTable) -> NodeCost {
    if !is_cost_eligible(node) {
        return NodeCost {
            node: node.clone(),
            eligible: false,
            hourly: TierAmounts::zero(),
            yearly: TierAmounts::zero(),
        };
    }

    let hourly = match pricing.lookup(&node.region_code, &node.product_sku) {
        Some(entry) => entry.tier_price.map(|price| node.memory_gb * price),
        None => {
            warn!(
                node_id = %node.node_id,
                region_code = %node.region_code,
                product = %node.product_sku,
                "No price list entry for node, costs left blank"
            );
            TierAmounts::default()
        }
    };

    NodeCost {
        node: node.clone(),
        eligible: true,
        hourly,
        yearly: hourly.map(|cost| cost * HOURS_PER_YEAR),
    }
}

pub fn node_costs(nodes: &[NodeRecord], pricing: &PricingTable) -> Vec<NodeCost> {
    let costs: Vec<NodeCost> = nodes.iter().map(|node| node_cost(node, pricing)).collect();
    debug!(
        nodes = costs.len(),
        eligible = costs.iter().filter(|c| c.eligible).count(),
        "Computed node costs"
    );
    costs
}

/// Sums one tier over a group. Blank only if no member carries a value.
fn sum_tier(values: impl Iterator<Item = Option<f64>>) -> (Option<f64>, usize) {
    let mut total = None;
    let mut blanks = 0;
    for value in values {
        match value {
            Some(v) => total = Some(total.unwrap_or(0.0) + v),
            None => blanks += 1,
        }
    }
    (total, blanks)
}

pub struct CostAggregator<'a> {
    node_costs: HashMap<&'a str, &'a NodeCost>,
    selection: ProductSelection,
}

impl<'a> CostAggregator<'a> {
    pub fn new(node_costs: &'a [NodeCost], selection: ProductSelection) -> Self {
        Self {
            node_costs: node_costs
                .iter()
                .map(|cost| (cost.node.node_id.as_str(), cost))
                .collect(),
            selection,
        }
    }

    /// Yearly cost carried by one shard: its node's yearly cost. A shard on a node
    /// missing from the node feed is not billable.
    pub fn shard_yearly(&self, shard: &JoinedShard) -> TierAmounts {
        self.node_costs
            .get(shard.shard.node_id.as_str())
            .map(|cost| cost.yearly)
            .unwrap_or_else(TierAmounts::zero)
    }

    /// One report row per index, in order of the index's first shard.
    pub fn aggregate(&self, shards: &[JoinedShard]) -> Result<Vec<IndexCostReport>, CostError> {
        let groups = group_by_index(shards);

        #[cfg(feature = "parallel")]
        let reports = {
            use rayon::prelude::*;
            groups
                .par_iter()
                .map(|(index, group)| self.aggregate_index(index, group))
                .collect::<Result<Vec<_>, _>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let reports = groups
            .iter()
            .map(|(index, group)| self.aggregate_index(index, group))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(indices = reports.len(), "Aggregated index costs");
        Ok(reports)
    }

    pub fn aggregate_index(
        &self,
        index: &str,
        group: &[&JoinedShard],
    ) -> Result<IndexCostReport, CostError> {
        let product_sku = self.select_product(index, group)?;

        let has_primary = group.iter().any(|s| s.shard.role == Role::Primary);
        let has_replica = group.iter().any(|s| s.shard.role == Role::Replica);
        let shard_type = if has_primary && has_replica {
            ShardType::PrimaryReplica
        } else {
            ShardType::PrimaryOnly
        };

        let unknown_sizes = group.iter().filter(|s| !s.shard.size.is_measured()).count();
        if unknown_sizes > 0 {
            warn!(index, shards = unknown_sizes, "Shards without a known size count as zero");
        }
        let total_size_bytes = group
            .iter()
            .filter_map(|s| s.shard.size.measured())
            .fold(0u64, u64::saturating_add);

        let shard_costs: Vec<TierAmounts> = group.iter().map(|s| self.shard_yearly(s)).collect();
        let mut yearly = TierAmounts::default();
        for tier in Tier::ALL {
            let (total, blanks) = sum_tier(shard_costs.iter().map(|c| c.get(tier)));
            if blanks > 0 && total.is_some() {
                warn!(
                    index,
                    tier = %tier,
                    shards = blanks,
                    "Unpriced shards left out of the tier total"
                );
            }
            yearly.set(tier, total);
        }

        Ok(IndexCostReport {
            index: index.to_string(),
            product_sku,
            shard_type,
            total_size_bytes,
            total_size_mb: bytes_to_mib(total_size_bytes),
            standard_yr: yearly.standard,
            gold_yr: yearly.gold,
            platinum_yr: yearly.platinum,
            enterprise_yr: yearly.enterprise,
        })
    }

    fn select_product(&self, index: &str, group: &[&JoinedShard]) -> Result<String, CostError> {
        let first = group
            .first()
            .map(|s| s.instance_configuration.clone())
            .unwrap_or_default();

        if self.selection == ProductSelection::Strict {
            if let Some(other) = group
                .iter()
                .map(|s| &s.instance_configuration)
                .find(|product| **product != first)
            {
                return Err(CostError::DivergentProduct {
                    index: index.to_string(),
                    first,
                    other: other.clone(),
                });
            }
        }
        Ok(first)
    }
}

/// Groups shards by index, keeping the order in which each index first appears.
pub fn group_by_index(shards: &[JoinedShard]) -> Vec<(String, Vec<&JoinedShard>)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&JoinedShard>)> = Vec::new();
    for shard in shards {
        let index = shard.shard.index.as_str();
        match positions.get(index) {
            Some(&position) => groups[position].1.push(shard),
            None => {
                positions.insert(index, groups.len());
                groups.push((index.to_string(), vec![shard]));
            }
        }
    }
    groups
}

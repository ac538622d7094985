//! Report Pipeline
//!
//! [`CostAnalyzer`] runs the stages of one report over explicitly passed snapshots.
//! It keeps no state between runs; two runs over different snapshots can proceed
//! side by side.
//!
//! ## Cost report
//!
//! 1. **Normalise**: node records, size table and ILM table from the raw feeds
//! 2. **Join**: one [`JoinedShard`] per non-system shard placement
//! 3. **Price**: one [`NodeCost`] per node
//! 4. **Aggregate**: one [`IndexCostReport`] per index
//!
//! ## ILM report
//!
//! Independent of the cost report: ingestion estimate, policy usage tally, total index
//! usage and the phases of every policy.
//!
//! ## Usage Example
//!
//! ```no_run
//! use es_cost_report::analyzer::CostAnalyzer;
//! use es_cost_report::config::Config;
//! use es_cost_report::pricing::PricingTable;
//! use es_cost_report::snapshot::{DiagnosticBundle, Snapshot};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let snapshot = Snapshot::load(&DiagnosticBundle::new("diagnostic"))?;
//! let pricing = PricingTable::load(&config.paths.pricing_file)?;
//!
//! let report = CostAnalyzer::from_config(&config).cost_report(&snapshot, &pricing)?;
//! for row in &report.indices {
//!     println!("{} {:?}", row.index, row.standard_yr);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::cost::{node_costs, CostAggregator, ProductSelection};
use crate::ilm::{policy_phases, tally_policy_usage, total_index_usage, IlmTable};
use crate::ingestion::{estimate_daily_ingestion, DEFAULT_WINDOW_DAYS};
use crate::join::JoinEngine;
use crate::models::*;
use crate::nodes::{build_node_records, NodeTable};
use crate::pricing::PricingTable;
use crate::shards::SizeTable;
use crate::snapshot::{IlmExplainFeed, IlmPoliciesFeed, Snapshot};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

/// Everything the cost report produces in one run.
#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    pub shards: Vec<JoinedShard>,
    pub nodes: Vec<NodeCost>,
    pub indices: Vec<IndexCostReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IlmReport {
    pub ingestion: IngestionEstimate,
    pub policies: Vec<PolicyUsage>,
    pub total_usage_bytes: u64,
    pub policy_phases: Vec<PolicyPhases>,
}

#[derive(Debug, Clone, Copy)]
pub struct CostAnalyzer {
    product_selection: ProductSelection,
    ingestion_window_days: usize,
}

impl Default for CostAnalyzer {
    fn default() -> Self {
        Self::new(ProductSelection::FirstSeen, DEFAULT_WINDOW_DAYS)
    }
}

impl CostAnalyzer {
    pub fn new(product_selection: ProductSelection, ingestion_window_days: usize) -> Self {
        Self {
            product_selection,
            ingestion_window_days,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.report.product_selection,
            config.report.ingestion_window_days,
        )
    }

    pub fn cost_report(&self, snapshot: &Snapshot, pricing: &PricingTable) -> Result<CostReport> {
        let node_records = build_node_records(&snapshot.nodes);
        let node_table = NodeTable::new(&node_records);
        let sizes = SizeTable::from_stats(&snapshot.indices_stats);
        let ilm = snapshot
            .ilm_explain
            .as_ref()
            .map(IlmTable::from_explain)
            .unwrap_or_default();

        let shards = JoinEngine::new(&node_table, &sizes, &ilm).run(&snapshot.shards);
        let nodes = node_costs(&node_records, pricing);
        let indices = CostAggregator::new(&nodes, self.product_selection)
            .aggregate(&shards)
            .context("Failed to aggregate index costs")?;

        info!(
            shards = shards.len(),
            nodes = nodes.len(),
            indices = indices.len(),
            "Cost report complete"
        );

        Ok(CostReport {
            shards,
            nodes,
            indices,
        })
    }

    pub fn ilm_report(
        &self,
        explain: &IlmExplainFeed,
        policies: &IlmPoliciesFeed,
        indices: &[IndexStore],
    ) -> IlmReport {
        let report = IlmReport {
            ingestion: estimate_daily_ingestion(indices, self.ingestion_window_days),
            policies: tally_policy_usage(explain, indices),
            total_usage_bytes: total_index_usage(indices),
            policy_phases: policy_phases(policies),
        };
        info!(policies = report.policies.len(), "ILM report complete");
        report
    }
}

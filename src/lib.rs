//! Elasticsearch Cost Report Library
//!
//! Reconciles the files of an Elasticsearch support-diagnostic bundle into a
//! per-index cost report. Shard placements, node statistics, index statistics and
//! ILM state are joined into one canonical row per shard, nodes are priced against
//! an Elastic Cloud price list, and shard costs are rolled up per index and tier.
//!
//! ## Architecture Overview
//!
//! - [`snapshot`] - Diagnostic bundle layout and typed source feeds
//! - [`units`] - Binary size units, human readable size parsing and formatting
//! - [`shards`] - Canonical shard records and the shard size table
//! - [`nodes`] - Node records and the role matrix
//! - [`ilm`] - ILM state per index, policy usage and policy phases
//! - [`join`] - Left-outer joins of shards with nodes and ILM state
//! - [`pricing`] - Price list loading and lookup
//! - [`cost`] - Node cost and per-index cost aggregation
//! - [`ingestion`] - Daily ingestion estimate from date-stamped index names
//! - [`analyzer`] - Pipeline orchestration
//! - [`display`] - Terminal tables, JSON and CSV output
//! - [`config`] - Configuration with file and environment variable support
//! - [`logging`] - Structured logging with JSON and pretty-print formats
//!
//! ## Main Entry Point
//!
//! ```no_run
//! use es_cost_report::CostAnalyzer;
//! use es_cost_report::pricing::PricingTable;
//! use es_cost_report::snapshot::{DiagnosticBundle, Snapshot};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let snapshot = Snapshot::load(&DiagnosticBundle::new("diagnostic"))?;
//! let pricing = PricingTable::load(Path::new("elastic_pricing.csv"))?;
//! let report = CostAnalyzer::default().cost_report(&snapshot, &pricing)?;
//! println!("{} indices", report.indices.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod cost;
pub mod display;
pub mod ilm;
pub mod ingestion;
pub mod join;
pub mod logging;
pub mod models;
pub mod nodes;
pub mod pricing;
pub mod shards;
pub mod snapshot;
pub mod units;

pub use analyzer::CostAnalyzer;
pub use models::*;

//! Output Formatting and Display Management
//!
//! This module is the reporting boundary. The pipeline hands it finished rows; it
//! renders them as terminal tables, JSON or CSV. Nothing here feeds back into the
//! computation.
//!
//! ## Output Formats
//!
//! - **Terminal tables**: colored headers, long cells truncated unless wide columns
//!   are requested
//! - **JSON**: the serialized rows, pretty or compact
//! - **CSV**: the index cost report with its stable column names
//!
//! ## Usage Example
//!
//! ```rust
//! use es_cost_report::display::{DisplayManager, DisplayOptions};
//!
//! let display = DisplayManager::new(DisplayOptions::default());
//! display.display_index_costs(&[]);
//! ```

use crate::analyzer::IlmReport;
use crate::models::*;
use crate::nodes::{role_columns, RoleMatrixRow};
use crate::units::{bytes_to_gib, format_size};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Cells longer than this are truncated unless wide columns are enabled.
const NARROW_CELL_WIDTH: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    pub json: bool,
    pub json_pretty: bool,
    pub wide: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            json: false,
            json_pretty: true,
            wide: false,
        }
    }
}

pub struct DisplayManager {
    options: DisplayOptions,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new(DisplayOptions::default())
    }
}

fn fmt_money(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn fmt_gib(value: f64) -> String {
    format!("{:.2}", value)
}

/// Renders rows as an aligned text table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], wide: bool) -> String {
    let clip = |cell: &str| -> String {
        if wide || cell.chars().count() <= NARROW_CELL_WIDTH {
            cell.to_string()
        } else {
            let kept: String = cell.chars().take(NARROW_CELL_WIDTH - 1).collect();
            format!("{}…", kept)
        }
    };

    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| clip(cell)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (position, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(position) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    for row in &rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Full precision, blank for `None`. Rounding is only applied on the terminal.
fn fmt_exact(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn index_cost_cells(row: &IndexCostReport, number: fn(Option<f64>) -> String) -> Vec<String> {
    vec![
        row.index.clone(),
        row.product_sku.clone(),
        row.shard_type.to_string(),
        row.total_size_bytes.to_string(),
        number(Some(row.total_size_mb)),
        number(row.standard_yr),
        number(row.gold_yr),
        number(row.platinum_yr),
        number(row.enterprise_yr),
    ]
}

/// The index cost report as CSV, columns in [`INDEX_COST_COLUMNS`] order.
pub fn index_costs_csv(rows: &[IndexCostReport]) -> String {
    let mut out = INDEX_COST_COLUMNS
        .iter()
        .map(|c| csv_field(c))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = index_cost_cells(row, fmt_exact)
            .iter()
            .map(|c| csv_field(c))
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

pub fn write_index_costs_csv(rows: &[IndexCostReport], path: &Path) -> Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    file.write_all(index_costs_csv(rows).as_bytes())
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

impl DisplayManager {
    pub fn new(options: DisplayOptions) -> Self {
        Self { options }
    }

    fn print_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let output = serde_json::json!({ key: value });
        let rendered = if self.options.json_pretty {
            serde_json::to_string_pretty(&output)
        } else {
            serde_json::to_string(&output)
        };
        match rendered {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing {} to JSON: {}", key, e),
        }
    }

    fn print_banner(&self, title: &str) {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", title.bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());
    }

    pub fn display_index_costs(&self, rows: &[IndexCostReport]) {
        if self.options.json {
            self.print_json("indices", rows);
            return;
        }

        self.print_banner("Elasticsearch Index Costs (per year)");

        let total = |tier: Tier| -> f64 { rows.iter().filter_map(|r| r.yearly(tier)).sum() };
        let total_size: u64 = rows.iter().map(|r| r.total_size_bytes).sum();
        println!(
            "\n{} indices • {} stored • {} standard/yr • {} enterprise/yr\n",
            rows.len().to_string().bright_white().bold(),
            format_size(total_size as f64).bright_white(),
            format!("${:.2}", total(Tier::Standard)).bright_green().bold(),
            format!("${:.2}", total(Tier::Enterprise)).bright_green().bold()
        );

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| index_cost_cells(row, fmt_money))
            .collect();
        print!("{}", render_table(&INDEX_COST_COLUMNS, &cells, self.options.wide));
    }

    pub fn display_nodes(
        &self,
        nodes: &[NodeCost],
        metrics: &[NodeMetrics],
        roles: &[RoleMatrixRow],
    ) {
        if self.options.json {
            self.print_json(
                "nodes",
                &serde_json::json!({ "costs": nodes, "metrics": metrics, "roles": roles }),
            );
            return;
        }

        self.print_banner("Elasticsearch Node Pricing");

        let headers = [
            "id",
            "node",
            "region_code",
            "product",
            "memory (GB)",
            "disk space (GB)",
            "data store size (GB)",
            "free space (GB)",
            "standard/hr",
            "gold/hr",
            "platinum/hr",
            "enterprise/hr",
            "standard/yr",
            "gold/yr",
            "platinum/yr",
            "enterprise/yr",
        ];
        let cells: Vec<Vec<String>> = nodes
            .iter()
            .map(|cost| {
                let node = &cost.node;
                let mut row = vec![
                    node.node_id.clone(),
                    node.name.clone(),
                    node.region_code.clone(),
                    node.product_sku.clone(),
                    fmt_gib(node.memory_gb),
                    fmt_gib(node.disk_capacity_gb),
                    fmt_gib(node.data_store_size_gb),
                    fmt_gib(node.free_space_gb()),
                ];
                row.extend(Tier::ALL.iter().map(|&t| fmt_money(cost.hourly.get(t))));
                row.extend(Tier::ALL.iter().map(|&t| fmt_money(cost.yearly.get(t))));
                row
            })
            .collect();
        print!("{}", render_table(&headers, &cells, self.options.wide));

        if let Some(cluster) = metrics.first().map(|m| m.cluster_name.as_str()) {
            println!("\n{} {}", "Nodes Metrics".bright_white().bold(), cluster.dimmed());
        }
        let metric_headers = [
            "node",
            "roles",
            "cpus",
            "heap (GB)",
            "heap used (%)",
            "disk used (%)",
            "load 1m",
            "load 5m",
            "load 15m",
        ];
        let metric_cells: Vec<Vec<String>> = metrics
            .iter()
            .map(|m| {
                vec![
                    m.node.clone(),
                    m.roles.clone(),
                    m.cpus.to_string(),
                    fmt_gib(m.heap_max_gb),
                    m.heap_percent.to_string(),
                    m.disk_used_percent.to_string(),
                    m.load_1m.to_string(),
                    m.load_5m.to_string(),
                    m.load_15m.to_string(),
                ]
            })
            .collect();
        if !metric_cells.is_empty() {
            print!("{}", render_table(&metric_headers, &metric_cells, self.options.wide));
        }

        println!("\n{}", "Node Roles Matrix".bright_white().bold());
        let mut role_headers = vec!["node"];
        role_headers.extend(role_columns());
        let role_cells: Vec<Vec<String>> = roles
            .iter()
            .map(|row| {
                let mut cells = vec![row.node.clone()];
                cells.extend(role_columns().map(|role| {
                    if row.roles.get(role).copied().unwrap_or(false) {
                        "X".to_string()
                    } else {
                        String::new()
                    }
                }));
                cells
            })
            .collect();
        print!("{}", render_table(&role_headers, &role_cells, self.options.wide));
    }

    pub fn display_shards(&self, shards: &[JoinedShard]) {
        if self.options.json {
            self.print_json("shards", shards);
            return;
        }

        self.print_banner("Elasticsearch Shards");

        let headers = [
            "id",
            "index",
            "data_type",
            "node",
            "node_type",
            "instance_configuration",
            "size",
            "size_gb",
            "raw_data_size",
            "raw_data_size_gb",
            "docs_count",
            "ilm_policy",
            "age",
            "ilm_phase",
        ];
        let cells: Vec<Vec<String>> = shards
            .iter()
            .map(|joined| {
                let shard = &joined.shard;
                let size_gb = shard.size.map(bytes_to_gib).map(|g| format!("{:.2}", g));
                let raw = shard.raw_ingest_size.map(|b| format!("{:.0}", b));
                let raw_gb = shard
                    .raw_ingest_size
                    .map(|b| format!("{:.2}", b / crate::units::GIB as f64));
                vec![
                    shard.node_id.clone(),
                    shard.index.clone(),
                    shard.role.to_string(),
                    shard.node_name.clone(),
                    joined.node_type.clone(),
                    joined.instance_configuration.clone(),
                    shard.size.to_string(),
                    size_gb.to_string(),
                    raw.to_string(),
                    raw_gb.to_string(),
                    shard
                        .doc_count
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    joined.ilm_policy.clone(),
                    joined.ilm_age.clone(),
                    joined.ilm_phase.clone(),
                ]
            })
            .collect();
        print!("{}", render_table(&headers, &cells, self.options.wide));
    }

    pub fn display_ilm(&self, report: &IlmReport) {
        if self.options.json {
            self.print_json("ilm", report);
            return;
        }

        self.print_banner("ILM Policy and Index Usage Report");

        println!("\n{}", "Daily Ingestion Rate Estimation".bright_white().bold());
        match &report.ingestion {
            IngestionEstimate::Estimated {
                avg_daily_bytes,
                avg_recent_bytes,
                total_bytes,
                num_days,
                recent_days,
            } => {
                println!(
                    "Average over all days: {}/day",
                    format_size(*avg_daily_bytes).bright_green()
                );
                println!(
                    "Average over last {} days: {}/day",
                    recent_days,
                    format_size(*avg_recent_bytes).bright_green()
                );
                println!("Total data ingested: {}", format_size(*total_bytes as f64));
                println!("Number of days analyzed: {}", num_days);
            }
            IngestionEstimate::Inestimable { reason } => {
                println!(
                    "{}",
                    format!("Unable to estimate daily ingestion rate: {}", reason).yellow()
                );
            }
        }

        println!("\n{}", "ILM Policies in Use".bright_white().bold());
        for usage in &report.policies {
            println!("Policy: {}", usage.policy.bright_cyan());
            println!("Number of indices using this policy: {}", usage.index_count);
            for index in &usage.indices {
                match (&index.store_size, index.doc_count) {
                    (Some(size), Some(docs)) => {
                        println!("  - {} (Size: {}, Docs: {})", index.index, size, docs)
                    }
                    _ => println!("  - {} (Size: Unknown, Docs: Unknown)", index.index),
                }
            }
            println!(
                "Total size for this policy: {}",
                format_size(usage.total_size_bytes as f64)
            );
            println!("Total documents for this policy: {}\n", usage.total_docs);
        }

        println!("{}", "Total Index Usage".bright_white().bold());
        println!(
            "Total size of all indices: {}\n",
            format_size(report.total_usage_bytes as f64).bright_green()
        );

        println!("{}", "Policy Details".bright_white().bold());
        for phases in &report.policy_phases {
            println!("Policy: {}", phases.policy.bright_cyan());
            if !phases.phases.is_empty() {
                println!("Phases: {}", phases.phases.join(", "));
            }
        }
    }
}

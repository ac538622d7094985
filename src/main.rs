use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use es_cost_report::analyzer::CostAnalyzer;
use es_cost_report::config::Config;
use es_cost_report::display::{write_index_costs_csv, DisplayManager, DisplayOptions};
use es_cost_report::logging::{init_logging, run_span};
use es_cost_report::nodes::{build_node_metrics, role_matrix};
use es_cost_report::pricing::PricingTable;
use es_cost_report::snapshot::{DiagnosticBundle, Snapshot};
use std::path::PathBuf;
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "es-cost-report")]
#[command(about = "Per-index cost report from an Elasticsearch support-diagnostic bundle")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Diagnostic bundle directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Elastic Cloud price list (CSV)
    #[arg(long, global = true)]
    pricing: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Also write the index cost report to this CSV file (not with `ilm`)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Do not truncate long table cells
    #[arg(long, global = true)]
    wide: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Yearly cost per index and pricing tier
    Costs,
    /// Node pricing and the node roles matrix
    Nodes,
    /// Every shard with its node, size and ILM attributes
    Shards,
    /// ILM policy usage and daily ingestion estimate
    Ilm,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Costs => "costs",
            Commands::Nodes => "nodes",
            Commands::Shards => "shards",
            Commands::Ilm => "ilm",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        handle_error(e, json);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.dir {
        config.paths.diagnostic_dir = dir;
    }
    if let Some(pricing) = cli.pricing {
        config.paths.pricing_file = pricing;
    }
    if cli.wide {
        config.report.wide_columns = true;
    }

    let _guard = init_logging(&config);

    let command = cli.command.unwrap_or(Commands::Costs);
    let span = run_span(command.name());
    let _entered = span.enter();
    info!(diagnostic_dir = %config.paths.diagnostic_dir.display(), "Starting report");

    let display = DisplayManager::new(DisplayOptions {
        json: cli.json,
        json_pretty: config.report.json_pretty,
        wide: config.report.wide_columns,
    });
    let analyzer = CostAnalyzer::from_config(&config);
    let bundle = DiagnosticBundle::new(config.paths.diagnostic_dir.clone());

    match command {
        Commands::Ilm => {
            if let Some(path) = &cli.csv {
                anyhow::bail!(
                    "--csv exports the index cost report and cannot be used with `ilm` ({})",
                    path.display()
                );
            }
            let explain = bundle.load_ilm_explain()?;
            let policies = bundle.load_ilm_policies()?;
            let indices = bundle.load_cat_indices()?;
            display.display_ilm(&analyzer.ilm_report(&explain, &policies, &indices));
        }
        Commands::Costs | Commands::Nodes | Commands::Shards => {
            let snapshot = Snapshot::load(&bundle)?;
            let pricing = PricingTable::load(&config.paths.pricing_file)?;
            let report = analyzer.cost_report(&snapshot, &pricing)?;

            match command {
                Commands::Nodes => {
                    let nodes: Vec<_> = report.nodes.iter().map(|c| c.node.clone()).collect();
                    let metrics = build_node_metrics(&snapshot.nodes, &bundle.load_cat_nodes());
                    display.display_nodes(&report.nodes, &metrics, &role_matrix(&nodes));
                }
                Commands::Shards => display.display_shards(&report.shards),
                _ => display.display_index_costs(&report.indices),
            }

            if let Some(path) = cli.csv {
                write_index_costs_csv(&report.indices, &path)
                    .with_context(|| format!("Failed to export CSV to {}", path.display()))?;
                info!(path = %path.display(), "Index cost report exported");
            }
        }
    }

    Ok(())
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}

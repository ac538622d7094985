//! End-to-end tests over a complete diagnostic bundle on disk

mod common;

use common::{diagnostic_fixture, write_file, MIB};
use es_cost_report::analyzer::CostAnalyzer;
use es_cost_report::cost::ProductSelection;
use es_cost_report::display::index_costs_csv;
use es_cost_report::nodes::{build_node_metrics, build_node_records, role_matrix};
use es_cost_report::pricing::PricingTable;
use es_cost_report::snapshot::{DiagnosticBundle, Snapshot, SnapshotError};
use es_cost_report::{IngestionEstimate, Role, ShardType, SizeValue, UNKNOWN};

fn close(actual: Option<f64>, expected: f64) -> bool {
    actual.map_or(false, |v| (v - expected).abs() < 1e-6)
}

#[test]
fn test_cost_report_over_bundle() {
    let (dir, prices) = diagnostic_fixture().unwrap();
    let snapshot = Snapshot::load(&DiagnosticBundle::new(dir.path())).unwrap();
    let pricing = PricingTable::load(&prices).unwrap();

    let report = CostAnalyzer::default().cost_report(&snapshot, &pricing).unwrap();

    let names: Vec<&str> = report.indices.iter().map(|r| r.index.as_str()).collect();
    assert_eq!(names, vec!["logs-2024.01.01", "metrics", "logs-2024.01.02", "orphan"]);

    let logs = &report.indices[0];
    assert_eq!(logs.shard_type, ShardType::PrimaryReplica);
    assert_eq!(logs.product_sku, "aws.data.highio.i3");
    assert_eq!(logs.total_size_bytes, 5 * MIB);
    assert!((logs.total_size_mb - 5.0).abs() < 1e-9);
    // 4 GiB * $0.1/GB/hr * 8760 on each of the two nodes
    assert!(close(logs.standard_yr, 7008.0));
    assert!(close(logs.enterprise_yr, 2.0 * 4.0 * 0.4 * 8760.0));

    let metrics = &report.indices[1];
    assert_eq!(metrics.shard_type, ShardType::PrimaryOnly);
    assert!(close(metrics.standard_yr, 3504.0));

    let orphan = &report.indices[3];
    assert_eq!(orphan.product_sku, UNKNOWN);
    assert_eq!(orphan.total_size_bytes, 0);
    assert!(close(orphan.standard_yr, 0.0));
}

#[test]
fn test_join_keeps_one_row_per_placement() {
    let (dir, prices) = diagnostic_fixture().unwrap();
    let snapshot = Snapshot::load(&DiagnosticBundle::new(dir.path())).unwrap();
    let pricing = PricingTable::load(&prices).unwrap();

    let report = CostAnalyzer::default().cost_report(&snapshot, &pricing).unwrap();

    // six placements, one of them a system index
    assert_eq!(report.shards.len(), 5);
    assert!(report.shards.iter().all(|s| !s.shard.index.starts_with('.')));
    assert!(report.indices.iter().all(|r| !r.index.starts_with('.')));

    let replica = report
        .shards
        .iter()
        .find(|s| s.shard.role == Role::Replica)
        .unwrap();
    assert_eq!(replica.shard.size, SizeValue::Measured(2 * MIB));
    assert_eq!(replica.shard.raw_ingest_size, SizeValue::NotApplicable);
    // managed, but the explain entry carries no phase execution policy
    assert_eq!(replica.ilm_policy, UNKNOWN);
    assert_eq!(replica.ilm_phase, "warm");

    let executing = report
        .shards
        .iter()
        .find(|s| s.shard.index == "logs-2024.01.02")
        .unwrap();
    assert_eq!(executing.ilm_policy, "logs-policy");
    assert_eq!(executing.ilm_age, "1d");

    let metrics = report
        .shards
        .iter()
        .find(|s| s.shard.index == "metrics")
        .unwrap();
    assert_eq!(metrics.ilm_policy, UNKNOWN);
    assert_eq!(metrics.node_type, "hot");
    assert_eq!(metrics.shard.doc_count, Some(50));

    let orphan = report
        .shards
        .iter()
        .find(|s| s.shard.index == "orphan")
        .unwrap();
    assert_eq!(orphan.shard.size, SizeValue::Unknown);
    assert_eq!(orphan.instance_configuration, UNKNOWN);
}

#[test]
fn test_node_costs_and_eligibility() {
    let (dir, prices) = diagnostic_fixture().unwrap();
    let snapshot = Snapshot::load(&DiagnosticBundle::new(dir.path())).unwrap();
    let pricing = PricingTable::load(&prices).unwrap();

    let report = CostAnalyzer::default().cost_report(&snapshot, &pricing).unwrap();

    assert_eq!(report.nodes.len(), 3);
    let master = report.nodes.iter().find(|c| c.node.node_id == "n3").unwrap();
    assert!(!master.eligible);
    assert_eq!(master.yearly.standard, Some(0.0));

    let data = report.nodes.iter().find(|c| c.node.node_id == "n1").unwrap();
    assert!(data.eligible);
    assert!(close(data.hourly.standard, 0.4));
    assert!((data.node.free_space_gb() - 90.0).abs() < 1e-9);
}

#[test]
fn test_node_metrics_over_bundle() {
    let (dir, _) = diagnostic_fixture().unwrap();
    let bundle = DiagnosticBundle::new(dir.path());
    let snapshot = Snapshot::load(&bundle).unwrap();

    let metrics = build_node_metrics(&snapshot.nodes, &bundle.load_cat_nodes());
    assert_eq!(metrics.len(), 3);
    assert!(metrics.iter().all(|m| m.cluster_name == "fixture"));

    let n1 = &metrics[0];
    assert_eq!(n1.node, "es-n1");
    assert_eq!(n1.roles, "data_hot, ingest");
    assert_eq!(n1.cpus, 2);
    assert_eq!(n1.heap_max_gb, 2.0);
    assert_eq!(n1.heap_percent, 55.0);
    assert_eq!(n1.disk_used_percent, 35.5);
    assert_eq!(n1.load_5m, 1.5);

    // no usage row for the master
    let n3 = &metrics[2];
    assert_eq!(n3.heap_max_gb, 0.5);
    assert_eq!(n3.load_1m, 0.0);

    let matrix = role_matrix(&build_node_records(&snapshot.nodes));
    assert!(matrix[0].roles["data_hot"]);
    assert!(matrix[1].roles["data_content"]);
    assert!(!matrix[1].roles["data_hot"]);
    assert!(!matrix[2].roles["data"]);
}

#[test]
fn test_strict_product_selection_fails_on_divergent_index() {
    let (dir, prices) = diagnostic_fixture().unwrap();
    write_file(
        dir.path(),
        "indices.json",
        r#"[{"index":"mixed","shard":"0","prirep":"p","id":"n1","node":"es-n1","docs":"1"},
            {"index":"mixed","shard":"0","prirep":"r","id":"n3","node":"es-n3","docs":"1"}]"#,
    )
    .unwrap();
    let snapshot = Snapshot::load(&DiagnosticBundle::new(dir.path())).unwrap();
    let pricing = PricingTable::load(&prices).unwrap();

    let strict = CostAnalyzer::new(ProductSelection::Strict, 30);
    let err = strict.cost_report(&snapshot, &pricing).unwrap_err();
    assert!(format!("{:#}", err).contains("mixed"));

    let report = CostAnalyzer::default().cost_report(&snapshot, &pricing).unwrap();
    assert_eq!(report.indices[0].product_sku, "aws.data.highio.i3");
}

#[test]
fn test_missing_ilm_explain_leaves_state_unknown() {
    let (dir, prices) = diagnostic_fixture().unwrap();
    std::fs::remove_file(dir.path().join("commercial").join("ilm_explain.json")).unwrap();

    let snapshot = Snapshot::load(&DiagnosticBundle::new(dir.path())).unwrap();
    assert!(snapshot.ilm_explain.is_none());

    let pricing = PricingTable::load(&prices).unwrap();
    let report = CostAnalyzer::default().cost_report(&snapshot, &pricing).unwrap();
    assert!(report.shards.iter().all(|s| s.ilm_policy == UNKNOWN));
}

#[test]
fn test_missing_required_feed_is_reported() {
    let (dir, _) = diagnostic_fixture().unwrap();
    std::fs::remove_file(dir.path().join("nodes_stats.json")).unwrap();

    match Snapshot::load(&DiagnosticBundle::new(dir.path())) {
        Err(SnapshotError::Missing { input, .. }) => assert_eq!(input, "node stats"),
        other => panic!("expected a missing input error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_suffixed_index_stats_file_is_found() {
    let (dir, _) = diagnostic_fixture().unwrap();
    let plain = dir.path().join("indices_stats.json");
    std::fs::rename(&plain, dir.path().join("indices_stats.json_fixed")).unwrap();

    let snapshot = Snapshot::load(&DiagnosticBundle::new(dir.path())).unwrap();
    assert!(snapshot.indices_stats.indices.contains_key("metrics"));
}

#[test]
fn test_ilm_report_over_bundle() {
    let (dir, _) = diagnostic_fixture().unwrap();
    let bundle = DiagnosticBundle::new(dir.path());
    let explain = bundle.load_ilm_explain().unwrap();
    let policies = bundle.load_ilm_policies().unwrap();
    let indices = bundle.load_cat_indices().unwrap();

    let report = CostAnalyzer::default().ilm_report(&explain, &policies, &indices);

    assert_eq!(report.policies.len(), 1);
    let logs = &report.policies[0];
    assert_eq!(logs.policy, "logs-policy");
    assert_eq!(logs.index_count, 2);
    assert_eq!(logs.total_size_bytes, 1200 * MIB);
    assert_eq!(logs.total_docs, 300);

    assert_eq!(report.total_usage_bytes, 1202 * MIB);

    let phases = report
        .policy_phases
        .iter()
        .find(|p| p.policy == "logs-policy")
        .unwrap();
    assert_eq!(phases.phases, vec!["hot", "warm", "delete"]);

    match report.ingestion {
        IngestionEstimate::Estimated {
            avg_daily_bytes,
            num_days,
            ..
        } => {
            assert_eq!(num_days, 2);
            assert_eq!(avg_daily_bytes, (600 * MIB) as f64);
        }
        other => panic!("expected an estimate, got {:?}", other),
    }
}

#[test]
fn test_csv_export_matches_report() {
    let (dir, prices) = diagnostic_fixture().unwrap();
    let snapshot = Snapshot::load(&DiagnosticBundle::new(dir.path())).unwrap();
    let pricing = PricingTable::load(&prices).unwrap();
    let report = CostAnalyzer::default().cost_report(&snapshot, &pricing).unwrap();

    let csv = index_costs_csv(&report.indices);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 1 + report.indices.len());
    assert!(lines[0].starts_with("index,instance_configuration/product,shard_type"));
    let first: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(
        &first[..4],
        &["logs-2024.01.01", "aws.data.highio.i3", "primary+replica", "5242880"]
    );
    assert_eq!(first[4].parse::<f64>().unwrap(), 5.0);
    assert!(close(first[5].parse::<f64>().ok(), 7008.0));

    // unrounded: the orphan index costs exactly zero, not "0.00"
    let orphan: Vec<&str> = lines[4].split(',').collect();
    assert_eq!(orphan[0], "orphan");
    assert_eq!(orphan[5], "0");
}

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use es_cost_report::analyzer::CostAnalyzer;
use es_cost_report::ingestion::estimate_daily_ingestion;
use es_cost_report::pricing::PricingTable;
use es_cost_report::snapshot::{
    IndicesStatsFeed, NodesStatsFeed, ShardPlacement, Snapshot,
};
use es_cost_report::units::parse_size;
use es_cost_report::IndexStore;

const PRICES: &str = "\
cloud_provider,region,region_code,product,standard,gold,platinum,enterprise,unit
AWS,US East,us-east-1,aws.data.highio.i3,$0.05,$0.06,$0.07,$0.08,per GB/hr
";

/// A cluster of `nodes` data nodes hosting `indices` daily indices with one primary and
/// one replica each.
fn synthetic_snapshot(nodes: usize, indices: usize) -> Snapshot {
    let mut node_json = Vec::with_capacity(nodes);
    for n in 0..nodes {
        node_json.push(format!(
            r#""node-{n}": {{
                "name": "es-{n}",
                "roles": ["data_hot"],
                "attributes": {{
                    "region": "us-east-1",
                    "instance_configuration": "aws.data.highio.i3",
                    "data": "hot"
                }},
                "os": {{"mem": {{"total_in_bytes": 8589934592}}}},
                "fs": {{"total": {{"total_in_bytes": 107374182400}}}},
                "indices": {{"store": {{"total_data_set_size_in_bytes": 1073741824}}}}
            }}"#
        ));
    }
    let nodes_feed: NodesStatsFeed =
        serde_json::from_str(&format!(r#"{{"nodes": {{{}}}}}"#, node_json.join(","))).unwrap();

    let mut shards = Vec::with_capacity(indices * 2);
    let mut stats_json = Vec::with_capacity(indices);
    for i in 0..indices {
        let index = format!("logs-2024.{:02}.{:02}-{}", i % 12 + 1, i % 28 + 1, i);
        for (prirep, node) in [("p", i % nodes), ("r", (i + 1) % nodes)] {
            shards.push(ShardPlacement {
                index: Some(index.clone()),
                shard: serde_json::from_str("\"0\"").ok(),
                prirep: Some(prirep.to_string()),
                id: Some(format!("node-{}", node)),
                node: Some(format!("es-{}", node)),
                docs: serde_json::from_str("1000").ok(),
            });
        }
        stats_json.push(format!(
            r#""{index}": {{
                "primaries": {{"store": {{"size_in_bytes": {size}}}}},
                "shards": {{"0": [
                    {{"routing": {{"primary": true}}, "store": {{"size_in_bytes": {size}}}}},
                    {{"routing": {{"primary": false}}, "store": {{"size_in_bytes": {size}}}}}
                ]}}
            }}"#,
            size = 1_048_576 * (i as u64 + 1)
        ));
    }
    let indices_stats: IndicesStatsFeed =
        serde_json::from_str(&format!(r#"{{"indices": {{{}}}}}"#, stats_json.join(","))).unwrap();

    Snapshot {
        shards,
        nodes: nodes_feed,
        indices_stats,
        ilm_explain: None,
    }
}

fn benchmark_cost_report(c: &mut Criterion) {
    let snapshot = synthetic_snapshot(20, 2000);
    let pricing = PricingTable::from_csv_str(PRICES).unwrap();
    let analyzer = CostAnalyzer::default();

    c.bench_function("cost_report_4000_shards", |b| {
        b.iter(|| {
            let report = analyzer
                .cost_report(black_box(&snapshot), black_box(&pricing))
                .unwrap();
            black_box(report)
        })
    });
}

fn benchmark_ingestion_estimate(c: &mut Criterion) {
    let indices: Vec<IndexStore> = (0..5000)
        .map(|i| IndexStore {
            index: format!("logs-2024.{:02}.{:02}-{}", i % 12 + 1, i % 28 + 1, i),
            doc_count: 1000,
            store_size: format!("{}.5mb", i % 900),
        })
        .collect();

    c.bench_function("estimate_daily_ingestion_5000_indices", |b| {
        b.iter(|| black_box(estimate_daily_ingestion(black_box(&indices), 30)))
    });
}

fn benchmark_parse_size(c: &mut Criterion) {
    let samples = ["1.5gb", "512mb", "42kb", "7b", "3tb", "bogus"];

    c.bench_function("parse_size", |b| {
        b.iter(|| {
            for sample in &samples {
                black_box(parse_size(black_box(sample)));
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_cost_report,
    benchmark_ingestion_estimate,
    benchmark_parse_size
);
criterion_main!(benches);

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const GIB: u64 = 1024 * 1024 * 1024;
pub const MIB: u64 = 1024 * 1024;

pub const PRICES: &str = "\
cloud_provider,region,region_code,product,standard,gold,platinum,enterprise,unit
AWS,US East (N. Virginia),us-east-1,aws.data.highio.i3,$0.1,$0.2,$0.3,$0.4,per GB/hr
AWS,US East (N. Virginia),us-east-1,aws.data.highstorage.d3,\"$1,000.00\",,,,per GB/hr
";

pub fn write_file(root: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

fn shard_row(index: &str, shard: u32, prirep: &str, node_id: &str, docs: u64) -> String {
    format!(
        r#"{{"index":"{}","shard":"{}","prirep":"{}","id":"{}","node":"es-{}","docs":"{}"}}"#,
        index, shard, prirep, node_id, node_id, docs
    )
}

fn node_stats(name: &str, roles: &[&str], memory: u64, product: &str) -> String {
    let roles: Vec<String> = roles.iter().map(|r| format!("\"{}\"", r)).collect();
    format!(
        r#"{{
            "name": "{}",
            "roles": [{}],
            "attributes": {{
                "region": "us-east-1",
                "instance_configuration": "{}",
                "availability_zone": "us-east-1a",
                "data": "hot"
            }},
            "os": {{"mem": {{"total_in_bytes": {}}}, "allocated_processors": 2}},
            "jvm": {{"mem": {{"heap_max_in_bytes": {}}}}},
            "fs": {{"total": {{"total_in_bytes": {}}}}},
            "indices": {{"store": {{"total_data_set_size_in_bytes": {}}}}}
        }}"#,
        name,
        roles.join(","),
        product,
        memory,
        memory / 2,
        100 * GIB,
        10 * GIB
    )
}

/// Writes a small but complete diagnostic bundle:
///
/// - `logs-2024.01.01`: one primary on `n1`, one replica on `n2`, ILM managed
/// - `logs-2024.01.02`: one primary on `n2`, ILM managed
/// - `metrics`: one primary on `n1`, not in ILM explain
/// - `orphan`: one primary on a node absent from node stats, no index stats
/// - `.kibana`: system index on `n1`
///
/// `n1` and `n2` are 4 GiB data nodes, `n3` is a 1 GiB master. Each node gets half its
/// memory as heap; `cat/cat_nodes.txt` has usage rows for `es-n1` and `es-n2` only.
pub fn write_diagnostic(root: &Path) -> Result<()> {
    let shards = vec![
        shard_row("logs-2024.01.01", 0, "p", "n1", 100),
        shard_row("logs-2024.01.01", 0, "r", "n2", 100),
        shard_row("metrics", 0, "p", "n1", 50),
        shard_row("logs-2024.01.02", 0, "p", "n2", 200),
        shard_row(".kibana", 0, "p", "n1", 5),
        shard_row("orphan", 0, "p", "ghost", 1),
    ];
    write_file(root, "indices.json", &format!("[{}]", shards.join(",")))?;

    let nodes = format!(
        r#"{{"cluster_name": "fixture", "nodes": {{"n1": {}, "n2": {}, "n3": {}}}}}"#,
        node_stats("es-n1", &["data_hot", "ingest"], 4 * GIB, "aws.data.highio.i3"),
        node_stats("es-n2", &["data_content"], 4 * GIB, "aws.data.highio.i3"),
        node_stats("es-n3", &["master"], GIB, "aws.master.r5d"),
    );
    write_file(root, "nodes_stats.json", &nodes)?;

    let indices_stats = format!(
        r#"{{"indices": {{
            "logs-2024.01.01": {{
                "primaries": {{"store": {{"size_in_bytes": {mib3}}}}},
                "shards": {{"0": [
                    {{"routing": {{"primary": true}}, "store": {{"size_in_bytes": {mib3}}}}},
                    {{"routing": {{"primary": false}}, "store": {{"size_in_bytes": {mib2}}}}}
                ]}}
            }},
            "logs-2024.01.02": {{
                "primaries": {{"store": {{"size_in_bytes": {mib3}}}}},
                "shards": {{"0": [
                    {{"routing": {{"primary": true}}, "store": {{"size_in_bytes": {mib3}}}}}
                ]}}
            }},
            "metrics": {{
                "primaries": {{"store": {{"size_in_bytes": {mib2}}}}},
                "shards": {{}}
            }},
            ".kibana": {{
                "primaries": {{"store": {{"size_in_bytes": 1024}}}},
                "shards": {{}}
            }}
        }}}}"#,
        mib3 = 3 * MIB,
        mib2 = 2 * MIB
    );
    write_file(root, "indices_stats.json", &indices_stats)?;

    write_file(
        root,
        "commercial/ilm_explain.json",
        r#"{"indices": {
            "logs-2024.01.01": {"managed": true, "policy": "logs-policy",
                "age": "2d", "phase": "warm"},
            "logs-2024.01.02": {"managed": true, "policy": "logs-policy",
                "phase_execution": {"policy": "logs-policy"}, "age": "1d", "phase": "hot"},
            ".kibana": {"managed": true, "policy": "system-policy", "age": "9d", "phase": "hot"}
        }}"#,
    )?;

    write_file(
        root,
        "commercial/ilm_policies.json",
        r#"{
            "logs-policy": {"policy": {"phases": {"delete": {}, "hot": {}, "warm": {}}}},
            "empty-policy": {"policy": {"phases": {}}}
        }"#,
    )?;

    write_file(
        root,
        "cat/cat_indices.txt",
        "\
health status index           uuid pri rep docs.count docs.deleted store.size pri.store.size
green  open   logs-2024.01.01 aaaa 1   1   100        0            500mb      250mb
green  open   logs-2024.01.02 bbbb 1   0   200        0            700mb      700mb
green  open   metrics         cccc 1   0   50         0            2mb        2mb
green  open   .kibana         dddd 1   0   5          0            1kb        1kb
       close  archived        eeee
",
    )?;

    write_file(
        root,
        "cat/cat_nodes.txt",
        "\
name  ip       hp ram cpu load_1m load_5m load_15m node.role dup   master
es-n1 10.0.0.1 55 90  4   1.25    1.50    1.75     dhi       35.5  -
es-n2 10.0.0.2 20 70  2   0.25    0.50    0.75     ds        61.0  -
",
    )?;

    Ok(())
}

/// Temporary directory holding a diagnostic bundle and a price list at `prices.csv`.
pub fn diagnostic_fixture() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    write_diagnostic(dir.path())?;
    let prices = write_file(dir.path(), "prices.csv", PRICES)?;
    Ok((dir, prices))
}

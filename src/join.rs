//! Join Engine
//!
//! Attaches node, size and lifecycle attributes to every shard with three chained
//! left-outer joins:
//!
//! 1. shard ⟕ node on `node_id`
//! 2. shard ⟕ size on `(index, role)`, plus `shard_id` for replicas
//! 3. shard ⟕ ILM state on `index`
//!
//! The size join is carried out by [`ShardRecordBuilder`] against the [`SizeTable`]
//! so a [`ShardRecord`] is complete once built. ILM state is index-scoped and is
//! attached last, by index alone; every shard of an index therefore carries the same
//! ILM fields.
//!
//! Each join keeps the left row when the right side has no match, so the output has
//! exactly one row per non-system placement row, in input order.

use crate::ilm::IlmTable;
use crate::models::{JoinedShard, ShardRecord, UNKNOWN};
use crate::nodes::NodeTable;
use crate::shards::{ShardRecordBuilder, SizeTable};
use crate::snapshot::ShardPlacement;
use tracing::{debug, warn};

pub struct JoinEngine<'a> {
    nodes: &'a NodeTable,
    sizes: &'a SizeTable,
    ilm: &'a IlmTable,
}

impl<'a> JoinEngine<'a> {
    pub fn new(nodes: &'a NodeTable, sizes: &'a SizeTable, ilm: &'a IlmTable) -> Self {
        Self { nodes, sizes, ilm }
    }

    pub fn run(&self, placements: &[ShardPlacement]) -> Vec<JoinedShard> {
        let records = ShardRecordBuilder::new(self.sizes).build(placements);
        let joined = self.join_records(records);
        debug!(
            placements = placements.len(),
            joined = joined.len(),
            "Joined shard placements"
        );
        joined
    }

    pub fn join_records(&self, records: Vec<ShardRecord>) -> Vec<JoinedShard> {
        let mut unmatched_nodes = 0usize;

        let joined: Vec<JoinedShard> = records
            .into_iter()
            .map(|shard| {
                let (node_type, instance_configuration) = match self.nodes.get(&shard.node_id) {
                    Some(node) => (node.node_type.clone(), node.product_sku.clone()),
                    None => {
                        unmatched_nodes += 1;
                        (UNKNOWN.to_string(), UNKNOWN.to_string())
                    }
                };
                let ilm = self.ilm.state_for(&shard.index);

                JoinedShard {
                    shard,
                    node_type,
                    instance_configuration,
                    ilm_policy: ilm.policy,
                    ilm_age: ilm.age,
                    ilm_phase: ilm.phase,
                }
            })
            .collect();

        if unmatched_nodes > 0 {
            warn!(
                shards = unmatched_nodes,
                "Shards placed on nodes missing from the node feed, node attributes unknown"
            );
        }
        joined
    }
}

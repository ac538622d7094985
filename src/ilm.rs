//! Index lifecycle state, policy usage and policy phases.

use crate::models::{IlmState, IndexStore, PolicyIndex, PolicyPhases, PolicyUsage, UNKNOWN};
use crate::snapshot::{IlmExplainEntry, IlmExplainFeed, IlmPoliciesFeed};
use crate::units::{is_system_index, parse_size};
use std::collections::{BTreeMap, HashMap};

/// Lifecycle order used to list policy phases; unknown phase names sort last.
const PHASE_ORDER: [&str; 5] = ["hot", "warm", "cold", "frozen", "delete"];

/// The policy attached to shards is the one the current phase executes under. The
/// top-level `policy` field is not consulted here; it only feeds the usage tally.
fn state_from_entry(index: &str, entry: &IlmExplainEntry) -> IlmState {
    let policy = entry
        .phase_execution
        .as_ref()
        .and_then(|execution| execution.policy.clone())
        .unwrap_or_else(|| UNKNOWN.to_string());

    IlmState {
        index: index.to_string(),
        managed: entry.managed,
        policy,
        age: entry.age.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        phase: entry.phase.clone().unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

/// ILM state per non-system index, keyed by index name.
#[derive(Debug, Clone, Default)]
pub struct IlmTable {
    states: HashMap<String, IlmState>,
}

impl IlmTable {
    pub fn from_explain(feed: &IlmExplainFeed) -> Self {
        let states = feed
            .indices
            .iter()
            .filter(|(index, _)| !is_system_index(index))
            .map(|(index, entry)| (index.clone(), state_from_entry(index, entry)))
            .collect();
        Self { states }
    }

    /// Never fails: an index without an explain entry gets an all-`unknown` state.
    pub fn state_for(&self, index: &str) -> IlmState {
        self.states
            .get(index)
            .cloned()
            .unwrap_or_else(|| IlmState::unknown(index))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Groups managed, non-system indices by policy and totals their size and documents
/// from `_cat/indices`. Policies are returned in name order.
pub fn tally_policy_usage(explain: &IlmExplainFeed, indices: &[IndexStore]) -> Vec<PolicyUsage> {
    let by_name: HashMap<&str, &IndexStore> =
        indices.iter().map(|store| (store.index.as_str(), store)).collect();

    let mut grouped: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (index, entry) in &explain.indices {
        if is_system_index(index) || !entry.managed {
            continue;
        }
        if let Some(policy) = entry.policy.as_deref().filter(|p| !p.is_empty()) {
            grouped.entry(policy.to_string()).or_default().push(index);
        }
    }

    grouped
        .into_iter()
        .map(|(policy, names)| {
            let mut usage = PolicyUsage {
                policy,
                index_count: names.len(),
                total_size_bytes: 0,
                total_docs: 0,
                indices: Vec::with_capacity(names.len()),
            };
            for name in names {
                match by_name.get(name) {
                    Some(store) => {
                        usage.total_size_bytes = usage
                            .total_size_bytes
                            .saturating_add(parse_size(&store.store_size));
                        usage.total_docs = usage.total_docs.saturating_add(store.doc_count);
                        usage.indices.push(PolicyIndex {
                            index: name.to_string(),
                            store_size: Some(store.store_size.clone()),
                            doc_count: Some(store.doc_count),
                        });
                    }
                    None => usage.indices.push(PolicyIndex {
                        index: name.to_string(),
                        store_size: None,
                        doc_count: None,
                    }),
                }
            }
            usage
        })
        .collect()
}

/// Total store size of all non-system indices.
pub fn total_index_usage(indices: &[IndexStore]) -> u64 {
    indices
        .iter()
        .filter(|store| !is_system_index(&store.index))
        .map(|store| parse_size(&store.store_size))
        .fold(0u64, u64::saturating_add)
}

pub fn policy_phases(policies: &IlmPoliciesFeed) -> Vec<PolicyPhases> {
    policies
        .iter()
        .map(|(name, entry)| {
            let mut phases: Vec<String> = entry
                .policy
                .as_ref()
                .map(|body| body.phases.keys().cloned().collect())
                .unwrap_or_default();
            phases.sort_by_key(|phase| {
                PHASE_ORDER
                    .iter()
                    .position(|known| *known == phase.as_str())
                    .unwrap_or(PHASE_ORDER.len())
            });
            PolicyPhases {
                policy: name.clone(),
                phases,
            }
        })
        .collect()
}

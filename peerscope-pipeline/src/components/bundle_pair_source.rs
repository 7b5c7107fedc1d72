use std::collections::BTreeMap;

use peerscope_analytics::bundling::{pair_candidates, segment_items, BundleConfig, ItemSales};
use peerscope_analytics::cooccurrence::{
    EmpiricalCooccurrence, HeuristicFallback, PairingSignal,
};

use crate::error::PipelineResult;
use crate::source::Source;
use crate::types::BundleCandidate;

/// The branch a bundle pipeline invocation runs for.
#[derive(Clone, Debug)]
pub struct BranchQuery {
    pub branch_id: String,
}

/// Source that produces bundle candidates for one branch at a time.
///
/// Holds every branch's items plus a per-branch empirical co-occurrence
/// model where transaction data exists. Signal selection is per branch:
/// a branch with observed baskets gets the empirical signal, any other
/// branch falls back to the heuristic. Both produce the same candidate
/// shape, so downstream stages never care which ran.
pub struct BundlePairSource {
    items_by_branch: BTreeMap<String, Vec<ItemSales>>,
    cooccurrence: BTreeMap<String, EmpiricalCooccurrence>,
    fallback: HeuristicFallback,
    config: BundleConfig,
}

impl BundlePairSource {
    pub fn new(
        items_by_branch: BTreeMap<String, Vec<ItemSales>>,
        cooccurrence: BTreeMap<String, EmpiricalCooccurrence>,
        config: BundleConfig,
    ) -> Self {
        Self {
            items_by_branch,
            cooccurrence,
            fallback: HeuristicFallback,
            config,
        }
    }

    /// Branch ids this source can produce candidates for, in order.
    pub fn branch_ids(&self) -> Vec<String> {
        self.items_by_branch.keys().cloned().collect()
    }
}

impl Source<BranchQuery, BundleCandidate> for BundlePairSource {
    fn enable(&self, query: &BranchQuery) -> bool {
        self.items_by_branch.contains_key(&query.branch_id)
    }

    fn candidates(&self, query: &BranchQuery) -> PipelineResult<Vec<BundleCandidate>> {
        let Some(items) = self.items_by_branch.get(&query.branch_id) else {
            return Ok(Vec::new());
        };

        let signal: &dyn PairingSignal = match self.cooccurrence.get(&query.branch_id) {
            Some(model) => model,
            None => &self.fallback,
        };

        let segments = segment_items(items, &self.config);
        let pairs = pair_candidates(&segments, signal);

        Ok(pairs
            .into_iter()
            .map(|pair| BundleCandidate::from_pair(query.branch_id.clone(), pair))
            .collect())
    }
}

use peerscope_analytics::bundling::{solve_discount, BundleConfig};

use crate::error::PipelineResult;
use crate::filter::{Filter, FilterResult};
use crate::types::BundleCandidate;

use super::bundle_pair_source::BranchQuery;

/// Prices each candidate with the discount solver and removes pairings
/// that cannot reach the target margin even undiscounted.
///
/// Kept candidates leave this stage fully priced: discount, bundle
/// price, and expected profit are all populated, and by construction
/// satisfy `0 <= discount < 1`, `price > 0`, `profit >= 0`.
pub struct MarginGuardFilter {
    config: BundleConfig,
}

impl MarginGuardFilter {
    pub fn new(config: BundleConfig) -> Self {
        Self { config }
    }
}

impl Default for MarginGuardFilter {
    fn default() -> Self {
        Self {
            config: BundleConfig::default(),
        }
    }
}

impl Filter<BranchQuery, BundleCandidate> for MarginGuardFilter {
    fn filter(
        &self,
        _query: &BranchQuery,
        candidates: Vec<BundleCandidate>,
    ) -> PipelineResult<FilterResult<BundleCandidate>> {
        let mut kept = Vec::new();
        let mut removed = Vec::new();

        for mut candidate in candidates {
            match solve_discount(candidate.full_price, candidate.full_cost, &self.config) {
                Some(priced) => {
                    candidate.discount_pct = Some(priced.discount_pct);
                    candidate.bundle_price = Some(priced.bundle_price);
                    candidate.expected_profit = Some(priced.expected_profit);
                    kept.push(candidate);
                }
                None => removed.push(candidate),
            }
        }

        Ok(FilterResult { kept, removed })
    }
}

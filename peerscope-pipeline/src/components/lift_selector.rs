use std::cmp::Ordering;

use peerscope_analytics::thresholds::MAX_BUNDLES_PER_BRANCH;

use crate::selector::{descending, Selector};
use crate::types::BundleCandidate;

use super::bundle_pair_source::BranchQuery;

/// Orders bundles by association strength (lift descending, support
/// descending as the tie-break) and caps the per-branch output so one
/// branch cannot flood the artifact. The final tie-break on the bundle
/// display string keeps reruns byte-identical even when every signal is
/// the heuristic placeholder.
pub struct LiftSelector {
    pub max_bundles: usize,
}

impl Default for LiftSelector {
    fn default() -> Self {
        Self {
            max_bundles: MAX_BUNDLES_PER_BRANCH,
        }
    }
}

impl Selector<BranchQuery, BundleCandidate> for LiftSelector {
    fn score(&self, candidate: &BundleCandidate) -> f64 {
        candidate.lift
    }

    fn compare(&self, a: &BundleCandidate, b: &BundleCandidate) -> Ordering {
        descending(a.lift, b.lift)
            .then_with(|| descending(a.support, b.support))
            .then_with(|| a.display_items().cmp(&b.display_items()))
    }

    fn size(&self) -> Option<usize> {
        Some(self.max_bundles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerscope_analytics::bundling::Reason;

    fn candidate(anchor: &str, low: &str, lift: f64, support: f64) -> BundleCandidate {
        BundleCandidate {
            branch_id: "b".into(),
            anchor_id: anchor.into(),
            low_id: low.into(),
            full_price: 10.0,
            full_cost: 6.0,
            support,
            lift,
            reason: Reason::CrossSellAnchorLowSales,
            discount_pct: Some(0.05),
            bundle_price: Some(9.5),
            expected_profit: Some(3.5),
        }
    }

    fn query() -> BranchQuery {
        BranchQuery {
            branch_id: "b".into(),
        }
    }

    #[test]
    fn orders_by_lift_then_support() {
        let selector = LiftSelector::default();
        let selected = selector.select(
            &query(),
            vec![
                candidate("A", "x", 1.2, 0.40),
                candidate("B", "y", 2.0, 0.10),
                candidate("C", "z", 1.2, 0.80),
            ],
        );
        let anchors: Vec<&str> = selected.iter().map(|c| c.anchor_id.as_str()).collect();
        assert_eq!(anchors, vec!["B", "C", "A"]);
    }

    #[test]
    fn equal_signals_fall_back_to_display_string() {
        let selector = LiftSelector::default();
        let selected = selector.select(
            &query(),
            vec![
                candidate("Z", "b", 1.0, 0.01),
                candidate("A", "b", 1.0, 0.01),
            ],
        );
        assert_eq!(selected[0].anchor_id, "A");
    }

    #[test]
    fn truncates_to_the_configured_cap() {
        let selector = LiftSelector { max_bundles: 2 };
        let selected = selector.select(
            &query(),
            vec![
                candidate("A", "x", 3.0, 0.1),
                candidate("B", "y", 2.0, 0.1),
                candidate("C", "z", 1.0, 0.1),
            ],
        );
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].anchor_id, "A");
    }

    #[test]
    fn nan_lift_never_ranks_first() {
        let selector = LiftSelector::default();
        let selected = selector.select(
            &query(),
            vec![
                candidate("A", "x", f64::NAN, 0.9),
                candidate("B", "y", 1.1, 0.1),
            ],
        );
        assert_eq!(selected[0].anchor_id, "B");
    }
}

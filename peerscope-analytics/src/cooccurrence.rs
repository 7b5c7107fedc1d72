//! Pairing-signal strategies.
//!
//! The bundle recommender needs an association signal for every
//! (anchor, low-seller) pair. When transaction data exists the signal
//! is empirical basket co-occurrence; when it does not, a heuristic
//! fallback reports documented placeholder values. Both strategies
//! produce the same output shape, so downstream pricing and ranking
//! never know which mode ran; only the `reason` tag does.

use std::collections::{BTreeSet, HashMap};

use crate::math::safe_div;
use crate::thresholds::{HEURISTIC_LIFT, HEURISTIC_SUPPORT};

/// Association strength for an item pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairSignal {
    /// Fraction of baskets containing both items.
    pub support: f64,
    /// Observed over expected co-occurrence; 1.0 is independence.
    pub lift: f64,
}

/// Strategy seam between empirical and heuristic pairing signals.
pub trait PairingSignal: Send + Sync {
    /// Signal for an unordered item pair.
    fn signal(&self, item_a: &str, item_b: &str) -> PairSignal;

    /// True when the signal is backed by observed transactions. The
    /// recommender uses this to pick the pairing rule and reason tag.
    fn is_empirical(&self) -> bool;
}

/// Support/lift computed from observed transaction baskets.
pub struct EmpiricalCooccurrence {
    total_baskets: usize,
    item_baskets: HashMap<String, usize>,
    pair_baskets: HashMap<(String, String), usize>,
}

impl EmpiricalCooccurrence {
    /// Build the co-occurrence counts from one branch's baskets. Items
    /// are de-duplicated within each basket, so a basket with the same
    /// item twice counts once.
    pub fn from_baskets<I, B, S>(baskets: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut total_baskets = 0;
        let mut item_baskets: HashMap<String, usize> = HashMap::new();
        let mut pair_baskets: HashMap<(String, String), usize> = HashMap::new();

        for basket in baskets {
            total_baskets += 1;
            let items: BTreeSet<String> =
                basket.into_iter().map(|s| s.as_ref().to_string()).collect();
            for item in &items {
                *item_baskets.entry(item.clone()).or_insert(0) += 1;
            }
            let ordered: Vec<&String> = items.iter().collect();
            for i in 0..ordered.len() {
                for j in (i + 1)..ordered.len() {
                    let key = (ordered[i].clone(), ordered[j].clone());
                    *pair_baskets.entry(key).or_insert(0) += 1;
                }
            }
        }

        Self {
            total_baskets,
            item_baskets,
            pair_baskets,
        }
    }

    fn pair_key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }
}

impl PairingSignal for EmpiricalCooccurrence {
    fn signal(&self, item_a: &str, item_b: &str) -> PairSignal {
        if self.total_baskets == 0 {
            return PairSignal {
                support: 0.0,
                lift: 1.0,
            };
        }

        let total = self.total_baskets as f64;
        let pair_count = self
            .pair_baskets
            .get(&Self::pair_key(item_a, item_b))
            .copied()
            .unwrap_or(0);

        // A never-observed pair reports the independence baseline, not
        // a zero lift: absence of evidence ranks below observed
        // association but above observed repulsion.
        if pair_count == 0 {
            return PairSignal {
                support: 0.0,
                lift: 1.0,
            };
        }

        let support = pair_count as f64 / total;
        let p_a = self.item_baskets.get(item_a).copied().unwrap_or(0) as f64 / total;
        let p_b = self.item_baskets.get(item_b).copied().unwrap_or(0) as f64 / total;
        let lift = safe_div(support, p_a * p_b, 0.0);

        PairSignal { support, lift }
    }

    fn is_empirical(&self) -> bool {
        true
    }
}

/// Placeholder signal used when no transaction data is configured.
pub struct HeuristicFallback;

impl PairingSignal for HeuristicFallback {
    fn signal(&self, _item_a: &str, _item_b: &str) -> PairSignal {
        PairSignal {
            support: HEURISTIC_SUPPORT,
            lift: HEURISTIC_LIFT,
        }
    }

    fn is_empirical(&self) -> bool {
        false
    }
}

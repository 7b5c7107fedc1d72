//! Bundle economics engine.
//!
//! Per-branch, independent of clustering: segments items into
//! low-sellers and anchors by units-sold quantiles, pairs each
//! low-seller with its best anchor, and solves for the deepest discount
//! that keeps the bundle above the target margin. The pipeline crate
//! stages these pieces (source -> filter -> selector); everything here
//! is pure computation over one branch's items.

use crate::cooccurrence::PairingSignal;
use crate::math::{quantile, safe_div};
use crate::thresholds::{
    ANCHOR_SALES_QUANTILE, DISCOUNT_STEP, LOW_SALES_QUANTILE, MAX_ANCHOR_CANDIDATES,
    MAX_BUNDLES_PER_BRANCH, MAX_DISCOUNT_PCT, MIN_ANCHOR_MARGIN, TARGET_BUNDLE_MARGIN,
};

/// Tolerance for the margin-floor comparison in the discount search;
/// keeps exact-boundary cost structures from flapping on float noise.
const MARGIN_EPS: f64 = 1e-9;

/// One branch-item sales row, unit economics derived on demand.
#[derive(Clone, Debug)]
pub struct ItemSales {
    pub item_id: String,
    pub revenue: f64,
    pub cost: f64,
    pub units_sold: f64,
    pub category: Option<String>,
}

impl ItemSales {
    pub fn unit_price(&self) -> f64 {
        safe_div(self.revenue, self.units_sold, 0.0)
    }

    pub fn unit_cost(&self) -> f64 {
        safe_div(self.cost, self.units_sold, 0.0)
    }

    pub fn unit_profit(&self) -> f64 {
        self.unit_price() - self.unit_cost()
    }

    pub fn unit_margin(&self) -> f64 {
        safe_div(self.unit_profit(), self.unit_price(), 0.0)
    }

    /// Anchor ranking key: volume weighted by margin quality.
    pub fn anchor_strength(&self) -> f64 {
        self.units_sold * self.unit_margin()
    }
}

/// Bundle engine knobs. Defaults come from `thresholds`; the pipeline
/// config overrides them per run.
#[derive(Clone, Debug)]
pub struct BundleConfig {
    /// Units-sold quantile at or below which an item is a low-seller.
    pub low_sales_quantile: f64,
    /// Units-sold quantile at or above which an item can anchor.
    pub anchor_sales_quantile: f64,
    /// Minimum unit margin an anchor must carry.
    pub min_anchor_margin: f64,
    /// Cap on anchors considered per branch (by anchor strength).
    pub max_anchor_candidates: usize,
    /// Margin floor the discounted bundle must preserve.
    pub target_margin: f64,
    /// Discount search granularity.
    pub discount_step: f64,
    /// Hard cap on the discount.
    pub max_discount: f64,
    /// Bundles emitted per branch after ranking.
    pub max_bundles_per_branch: usize,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            low_sales_quantile: LOW_SALES_QUANTILE,
            anchor_sales_quantile: ANCHOR_SALES_QUANTILE,
            min_anchor_margin: MIN_ANCHOR_MARGIN,
            max_anchor_candidates: MAX_ANCHOR_CANDIDATES,
            target_margin: TARGET_BUNDLE_MARGIN,
            discount_step: DISCOUNT_STEP,
            max_discount: MAX_DISCOUNT_PCT,
            max_bundles_per_branch: MAX_BUNDLES_PER_BRANCH,
        }
    }
}

/// Why a pairing was produced. Chosen deterministically from the rule
/// that made the pair; the fallback tags double as an "unverified
/// signal" marker for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    /// Empirical pairing of a strong anchor with a low-seller.
    CrossSellAnchorLowSales,
    /// Empirical pairing whose low-seller loses money on its own.
    LossLeaderCovered,
    /// Fallback pairing matched on product category.
    CategoryMatch,
    /// Fallback pairing with the highest-volume anchor.
    HeuristicFallback,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::CrossSellAnchorLowSales => write!(f, "cross-sell anchor+low-sales"),
            Reason::LossLeaderCovered => write!(f, "loss-leader-covered"),
            Reason::CategoryMatch => write!(f, "category-match"),
            Reason::HeuristicFallback => write!(f, "heuristic-fallback"),
        }
    }
}

/// Item segmentation for one branch.
#[derive(Debug)]
pub struct ItemSegments<'a> {
    pub low_sellers: Vec<&'a ItemSales>,
    pub anchors: Vec<&'a ItemSales>,
}

/// Split a branch's items into promotion candidates and anchors.
///
/// Both quantile boundaries are inclusive: an item sitting exactly on
/// the threshold belongs to the band. Anchors additionally need
/// `min_anchor_margin` and are returned ranked by anchor strength
/// (ties by item id), truncated to `max_anchor_candidates`.
pub fn segment_items<'a>(items: &'a [ItemSales], cfg: &BundleConfig) -> ItemSegments<'a> {
    let units: Vec<f64> = items.iter().map(|i| i.units_sold).collect();
    let low_threshold = quantile(&units, cfg.low_sales_quantile);
    let anchor_threshold = quantile(&units, cfg.anchor_sales_quantile);

    let low_sellers: Vec<&ItemSales> = items
        .iter()
        .filter(|i| i.units_sold <= low_threshold)
        .collect();

    let mut anchors: Vec<&ItemSales> = items
        .iter()
        .filter(|i| i.units_sold >= anchor_threshold && i.unit_margin() >= cfg.min_anchor_margin)
        .collect();
    anchors.sort_by(|a, b| {
        b.anchor_strength()
            .partial_cmp(&a.anchor_strength())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    anchors.truncate(cfg.max_anchor_candidates);

    ItemSegments {
        low_sellers,
        anchors,
    }
}

/// An (anchor, low-seller) pairing with its association signal, before
/// pricing has run.
#[derive(Clone, Debug)]
pub struct PairCandidate {
    pub anchor_id: String,
    pub low_id: String,
    /// Sum of the two unit prices, undiscounted.
    pub full_price: f64,
    /// Sum of the two unit costs.
    pub full_cost: f64,
    pub support: f64,
    pub lift: f64,
    pub reason: Reason,
}

impl PairCandidate {
    /// Display form of the bundle, anchor first.
    pub fn display_items(&self) -> String {
        format!("{}+{}", self.anchor_id, self.low_id)
    }
}

/// Pair every low-seller with its best anchor.
///
/// Empirical mode scores each anchor by
/// `units*0.5 + lift*10 + support*20 - low_units*0.1` and keeps the
/// best; fallback mode prefers the highest-volume anchor of the same
/// category when categories exist, else the highest-volume anchor
/// overall. Self-pairings are skipped.
pub fn pair_candidates(
    segments: &ItemSegments<'_>,
    signal: &dyn PairingSignal,
) -> Vec<PairCandidate> {
    let mut out = Vec::new();

    for low in &segments.low_sellers {
        let paired = if signal.is_empirical() {
            best_empirical_anchor(low, &segments.anchors, signal)
        } else {
            fallback_anchor(low, &segments.anchors)
        };

        let Some(anchor) = paired else { continue };
        let sig = signal.signal(&anchor.item_id, &low.item_id);

        let reason = if signal.is_empirical() {
            if low.unit_margin() < 0.0 {
                Reason::LossLeaderCovered
            } else {
                Reason::CrossSellAnchorLowSales
            }
        } else if matches_category(anchor, low) {
            Reason::CategoryMatch
        } else {
            Reason::HeuristicFallback
        };

        out.push(PairCandidate {
            anchor_id: anchor.item_id.clone(),
            low_id: low.item_id.clone(),
            full_price: anchor.unit_price() + low.unit_price(),
            full_cost: anchor.unit_cost() + low.unit_cost(),
            support: sig.support,
            lift: sig.lift,
            reason,
        });
    }

    out
}

fn matches_category(anchor: &ItemSales, low: &ItemSales) -> bool {
    matches!((&anchor.category, &low.category), (Some(a), Some(b)) if a == b)
}

fn best_empirical_anchor<'a>(
    low: &ItemSales,
    anchors: &[&'a ItemSales],
    signal: &dyn PairingSignal,
) -> Option<&'a ItemSales> {
    let mut best: Option<(f64, &'a ItemSales)> = None;
    for &anchor in anchors {
        if anchor.item_id == low.item_id {
            continue;
        }
        let sig = signal.signal(&anchor.item_id, &low.item_id);
        let score =
            anchor.units_sold * 0.5 + sig.lift * 10.0 + sig.support * 20.0 - low.units_sold * 0.1;
        let better = match best {
            None => true,
            Some((best_score, best_anchor)) => {
                score > best_score
                    || (score == best_score && anchor.item_id < best_anchor.item_id)
            }
        };
        if better {
            best = Some((score, anchor));
        }
    }
    best.map(|(_, anchor)| anchor)
}

fn fallback_anchor<'a>(low: &ItemSales, anchors: &[&'a ItemSales]) -> Option<&'a ItemSales> {
    let mut best_same_category: Option<&'a ItemSales> = None;
    let mut best_overall: Option<&'a ItemSales> = None;

    for &anchor in anchors {
        if anchor.item_id == low.item_id {
            continue;
        }
        if prefer_by_volume(anchor, best_overall) {
            best_overall = Some(anchor);
        }
        if matches_category(anchor, low) && prefer_by_volume(anchor, best_same_category) {
            best_same_category = Some(anchor);
        }
    }

    best_same_category.or(best_overall)
}

fn prefer_by_volume(challenger: &ItemSales, incumbent: Option<&ItemSales>) -> bool {
    match incumbent {
        None => true,
        Some(inc) => {
            challenger.units_sold > inc.units_sold
                || (challenger.units_sold == inc.units_sold && challenger.item_id < inc.item_id)
        }
    }
}

/// Result of the discount search for one pairing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricedBundle {
    pub discount_pct: f64,
    pub bundle_price: f64,
    pub expected_profit: f64,
}

/// Find the deepest profit-safe discount for a bundle.
///
/// Starts at zero and walks up in `discount_step` increments to
/// `max_discount`, keeping the last step where
/// `price*(1-d) - cost >= target_margin * price*(1-d)` and the profit
/// is non-negative. Returns `None` when even an undiscounted bundle
/// misses the target margin; such pairings are not emitted at all.
pub fn solve_discount(full_price: f64, full_cost: f64, cfg: &BundleConfig) -> Option<PricedBundle> {
    if full_price <= 0.0 {
        return None;
    }

    let clears = |discount: f64| -> Option<(f64, f64)> {
        let price = full_price * (1.0 - discount);
        let profit = price - full_cost;
        if profit + MARGIN_EPS >= cfg.target_margin * price && profit + MARGIN_EPS >= 0.0 {
            Some((price, profit))
        } else {
            None
        }
    };

    let (mut price, mut profit) = clears(0.0)?;
    let mut discount = 0.0;

    let steps = (cfg.max_discount / cfg.discount_step + MARGIN_EPS).floor() as usize;
    for i in 1..=steps {
        let candidate = cfg.discount_step * i as f64;
        match clears(candidate) {
            Some((p, pr)) => {
                discount = candidate;
                price = p;
                profit = pr;
            }
            // The margin floor is monotone in the discount: the first
            // failing step ends the search.
            None => break,
        }
    }

    Some(PricedBundle {
        discount_pct: discount,
        bundle_price: price,
        expected_profit: profit.max(0.0),
    })
}

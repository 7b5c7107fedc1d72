//! Output row types and the in-flight bundle candidate.

use peerscope_analytics::bundling::{PairCandidate, Reason};
use serde::{Deserialize, Serialize};

/// Sentinel cluster id for branches excluded from clustering
/// (zero-revenue). Doubles as the low-confidence flag in the scored
/// artifact; real cluster ids are always non-negative.
pub const LOW_CONFIDENCE_CLUSTER: i64 = -1;

/// One row of the `branches_scored` artifact.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredBranch {
    pub branch_id: String,
    pub cluster_id: i64,
    /// Comparable only to peers with the same cluster_id.
    pub health_score: f64,
    /// Unrealized profit against the cluster benchmark; never negative.
    pub gap_profit: f64,
    pub avg_revenue: f64,
    pub margin: f64,
    pub growth: f64,
    pub volatility: f64,
    pub pca_1: f64,
    pub pca_2: f64,
}

/// One row of the `branch_monthly` drill-down artifact.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonthlyRow {
    pub branch_id: String,
    pub month: String,
    pub revenue: f64,
}

/// One row of the `bundles` artifact.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BundleRow {
    pub branch_id: String,
    /// Display string, anchor first: `"LATTE+SCONE"`.
    pub bundle_items: String,
    pub discount_pct: f64,
    pub bundle_price: f64,
    pub expected_profit: f64,
    pub reason: String,
    pub lift: f64,
    pub support: f64,
}

/// A bundle candidate moving through the source -> filter -> selector
/// stages. Pricing fields are `None` until the margin guard has run;
/// only priced candidates can become rows.
#[derive(Clone, Debug)]
pub struct BundleCandidate {
    pub branch_id: String,
    pub anchor_id: String,
    pub low_id: String,
    pub full_price: f64,
    pub full_cost: f64,
    pub support: f64,
    pub lift: f64,
    pub reason: Reason,

    // Populated by the margin guard.
    pub discount_pct: Option<f64>,
    pub bundle_price: Option<f64>,
    pub expected_profit: Option<f64>,
}

impl BundleCandidate {
    pub fn from_pair(branch_id: String, pair: PairCandidate) -> Self {
        Self {
            branch_id,
            anchor_id: pair.anchor_id,
            low_id: pair.low_id,
            full_price: pair.full_price,
            full_cost: pair.full_cost,
            support: pair.support,
            lift: pair.lift,
            reason: pair.reason,
            discount_pct: None,
            bundle_price: None,
            expected_profit: None,
        }
    }

    /// Display form of the bundle, anchor first.
    pub fn display_items(&self) -> String {
        format!("{}+{}", self.anchor_id, self.low_id)
    }

    /// Convert into an artifact row. `None` for candidates the margin
    /// guard never priced.
    pub fn into_row(self) -> Option<BundleRow> {
        Some(BundleRow {
            bundle_items: self.display_items(),
            branch_id: self.branch_id,
            discount_pct: self.discount_pct?,
            bundle_price: self.bundle_price?,
            expected_profit: self.expected_profit?,
            reason: self.reason.to_string(),
            lift: self.lift,
            support: self.support,
        })
    }
}

/// Per-cluster aggregate included in the run summary (not an artifact).
#[derive(Clone, Debug, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: i64,
    pub members: usize,
    pub avg_margin: f64,
    pub avg_growth: f64,
    pub avg_volatility: f64,
    pub benchmark_branch: String,
    pub benchmark_margin: f64,
}

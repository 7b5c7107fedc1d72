//! Behavioral feature building.
//!
//! Aggregates per-branch-per-month observations into one feature vector
//! per branch. This is the first stage of the scoring pipeline; the
//! vectors feed the persona clusterer, the health scorer, and the gap
//! analyzer.

use std::collections::BTreeMap;

use crate::math::{mean, safe_div, std_dev};

/// A single branch-month observation. The pipeline's CSV record carries
/// the same fields plus parsing concerns; it converts into this plain
/// row before the analytics layer sees it.
#[derive(Clone, Debug)]
pub struct BranchMonth {
    pub branch_id: String,
    /// `YYYY-MM`; lexical order is chronological order.
    pub month: String,
    pub revenue: f64,
    pub profit: f64,
    pub beverage_revenue: f64,
    pub food_revenue: f64,
}

/// One behavioral feature vector per branch.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector {
    pub branch_id: String,
    /// Number of months observed.
    pub months: usize,
    pub avg_revenue: f64,
    pub avg_profit: f64,
    /// profit_sum / revenue_sum (equals avg_profit / avg_revenue).
    pub margin_pct: f64,
    pub beverage_share: f64,
    pub food_share: f64,
    /// (last month revenue - first month revenue) / first month revenue.
    pub growth_rate: f64,
    /// stdev(revenue) / mean(revenue); 0 when mean revenue is 0.
    pub volatility: f64,
    pub revenue_sum: f64,
    pub profit_sum: f64,
}

impl FeatureVector {
    /// Branches with no revenue at all cannot be standardized and are
    /// excluded from clustering. The exclusion threshold is exactly
    /// `revenue_sum == 0.0`; such branches still reach the output table
    /// with sentinel values.
    pub fn is_clusterable(&self) -> bool {
        self.revenue_sum != 0.0
    }

    /// The structural features the persona clusterer standardizes, in a
    /// fixed column order.
    pub fn clustering_features(&self) -> [f64; 6] {
        [
            self.margin_pct,
            self.growth_rate,
            self.volatility,
            self.beverage_share,
            self.food_share,
            self.avg_revenue,
        ]
    }
}

/// Build one feature vector per branch from branch-month rows.
///
/// Branches come back in branch-id order; months are sorted before the
/// first/last-month growth computation so input row order never matters.
pub fn build_features(rows: &[BranchMonth]) -> Vec<FeatureVector> {
    let mut by_branch: BTreeMap<&str, Vec<&BranchMonth>> = BTreeMap::new();
    for row in rows {
        by_branch.entry(row.branch_id.as_str()).or_default().push(row);
    }

    by_branch
        .into_iter()
        .map(|(branch_id, mut months)| {
            months.sort_by(|a, b| a.month.cmp(&b.month));

            let revenues: Vec<f64> = months.iter().map(|m| m.revenue).collect();
            let revenue_sum: f64 = revenues.iter().sum();
            let profit_sum: f64 = months.iter().map(|m| m.profit).sum();
            let beverage_sum: f64 = months.iter().map(|m| m.beverage_revenue).sum();
            let food_sum: f64 = months.iter().map(|m| m.food_revenue).sum();

            let avg_revenue = mean(&revenues);
            let avg_profit = safe_div(profit_sum, months.len() as f64, 0.0);

            // A single observation gives no second point to grow from.
            let growth_rate = if revenues.len() >= 2 {
                let first = revenues[0];
                let last = revenues[revenues.len() - 1];
                safe_div(last - first, first, 0.0)
            } else {
                0.0
            };

            let volatility = safe_div(std_dev(&revenues), avg_revenue, 0.0);

            FeatureVector {
                branch_id: branch_id.to_string(),
                months: months.len(),
                avg_revenue,
                avg_profit,
                margin_pct: safe_div(profit_sum, revenue_sum, 0.0),
                beverage_share: safe_div(beverage_sum, revenue_sum, 0.0),
                food_share: safe_div(food_sum, revenue_sum, 0.0),
                growth_rate,
                volatility,
                revenue_sum,
                profit_sum,
            }
        })
        .collect()
}

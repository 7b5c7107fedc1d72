//! Centralized analytic defaults.
//!
//! Calibrated for multi-branch food & beverage retail. Changing a value
//! here affects BOTH the scoring pipeline (`clustering.rs`, `health.rs`)
//! and the bundle engine (`bundling.rs`); everything is overridable at
//! runtime through the config structs that default to these constants.

/// Default number of behavioral personas. Clamped to the branch count
/// when fewer branches are clusterable.
pub const DEFAULT_CLUSTER_COUNT: usize = 3;

/// Default seed for k-means centroid initialization. With a fixed seed,
/// reruns over identical input produce identical labels; without one,
/// label identity is an arbitrary permutation across runs.
pub const DEFAULT_KMEANS_SEED: u64 = 42;

/// Default iteration bound for the k-means solver.
pub const DEFAULT_KMEANS_MAX_ITERATIONS: u64 = 300;

/// Default convergence tolerance for the k-means solver.
pub const DEFAULT_KMEANS_TOLERANCE: f64 = 1e-4;

/// Health score component weights: margin, growth, inverse volatility,
/// revenue. They sum to 1.0 and are fixed constants, not learned.
pub const HEALTH_WEIGHT_MARGIN: f64 = 0.40;
pub const HEALTH_WEIGHT_GROWTH: f64 = 0.20;
pub const HEALTH_WEIGHT_STABILITY: f64 = 0.20;
pub const HEALTH_WEIGHT_REVENUE: f64 = 0.20;

/// Display scale for the composite health score.
pub const HEALTH_SCALE: f64 = 100.0;

/// Units-sold quantile at or below which an item is a promotion
/// candidate ("low-seller"). Inclusive boundary.
pub const LOW_SALES_QUANTILE: f64 = 0.30;

/// Units-sold quantile at or above which an item qualifies as a bundle
/// anchor. Inclusive boundary.
pub const ANCHOR_SALES_QUANTILE: f64 = 0.70;

/// Minimum unit margin an anchor must carry. Thin-margin items cannot
/// absorb a discount on behalf of the low-seller.
pub const MIN_ANCHOR_MARGIN: f64 = 0.10;

/// Maximum anchors considered per branch, ranked by anchor strength
/// (units sold x unit margin).
pub const MAX_ANCHOR_CANDIDATES: usize = 30;

/// Bundle margin floor: the discounted bundle must keep
/// (revenue - cost) >= TARGET_BUNDLE_MARGIN * revenue.
pub const TARGET_BUNDLE_MARGIN: f64 = 0.15;

/// Granularity of the discount search.
pub const DISCOUNT_STEP: f64 = 0.01;

/// Hard cap on the bundle discount regardless of margin headroom.
pub const MAX_DISCOUNT_PCT: f64 = 0.25;

/// Maximum bundles emitted per branch.
pub const MAX_BUNDLES_PER_BRANCH: usize = 10;

/// Placeholder support reported when no transaction data backs a
/// pairing. Deliberately conservative; the `reason` tag marks such rows
/// as unverified for the presentation layer.
pub const HEURISTIC_SUPPORT: f64 = 0.01;

/// Placeholder lift for heuristic pairings: 1.0 is the independence
/// baseline, claiming no association either way.
pub const HEURISTIC_LIFT: f64 = 1.0;

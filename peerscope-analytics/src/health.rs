//! Within-cluster health scoring.
//!
//! Normalizes margin, growth, volatility, and average revenue to [0, 1]
//! by min-max scaling *within each cluster's membership only*, then
//! combines them with fixed weights. Scores are comparable to peers in
//! the same cluster and to nothing else; cross-cluster comparison is
//! out of contract.

use std::collections::BTreeMap;

use crate::features::FeatureVector;
use crate::math::min_max_scale;
use crate::thresholds::{
    HEALTH_SCALE, HEALTH_WEIGHT_GROWTH, HEALTH_WEIGHT_MARGIN, HEALTH_WEIGHT_REVENUE,
    HEALTH_WEIGHT_STABILITY,
};

/// Compute one health score per branch, aligned by index with the input.
///
/// `labels` carries the cluster assignment for each feature vector. A
/// cluster of size one scores exactly 100, trivially top of its own
/// peer group, rather than whatever a zero-range normalization would
/// produce.
pub fn compute_health(features: &[FeatureVector], labels: &[usize]) -> Vec<f64> {
    debug_assert_eq!(features.len(), labels.len());

    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        members.entry(label).or_default().push(idx);
    }

    let mut scores = vec![0.0; features.len()];
    for indices in members.values() {
        if indices.len() == 1 {
            scores[indices[0]] = HEALTH_SCALE;
            continue;
        }

        let margin: Vec<f64> = indices.iter().map(|&i| features[i].margin_pct).collect();
        let growth: Vec<f64> = indices.iter().map(|&i| features[i].growth_rate).collect();
        let volatility: Vec<f64> = indices.iter().map(|&i| features[i].volatility).collect();
        let revenue: Vec<f64> = indices.iter().map(|&i| features[i].avg_revenue).collect();

        let margin_n = min_max_scale(&margin);
        let growth_n = min_max_scale(&growth);
        let volatility_n = min_max_scale(&volatility);
        let revenue_n = min_max_scale(&revenue);

        for (pos, &idx) in indices.iter().enumerate() {
            let composite = HEALTH_WEIGHT_MARGIN * margin_n[pos]
                + HEALTH_WEIGHT_GROWTH * growth_n[pos]
                + HEALTH_WEIGHT_STABILITY * (1.0 - volatility_n[pos])
                + HEALTH_WEIGHT_REVENUE * revenue_n[pos];
            scores[idx] = (composite * HEALTH_SCALE).clamp(0.0, HEALTH_SCALE);
        }
    }

    scores
}

//! Persona clustering.
//!
//! Standardizes the structural feature matrix to zero mean / unit
//! variance across the branch population, then partitions branches with
//! seeded k-means. Standardization happens before clusters exist, never
//! within them; within-cluster normalization is the health scorer's
//! job and uses a different scaling entirely.

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::features::FeatureVector;
use crate::math::{safe_div, zero_non_finite};

/// Column-wise zero-mean / unit-variance scaler.
///
/// Zero-variance columns transform to all zeros rather than dividing by
/// zero; non-finite inputs are zeroed before fitting.
#[derive(Clone, Debug)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(matrix: &Array2<f64>) -> Self {
        let n = matrix.nrows().max(1) as f64;
        let cols = matrix.ncols();
        let mut means = vec![0.0; cols];
        let mut stds = vec![0.0; cols];

        for (c, col) in matrix.columns().into_iter().enumerate() {
            let m = col.iter().map(|v| zero_non_finite(*v)).sum::<f64>() / n;
            let var = col
                .iter()
                .map(|v| (zero_non_finite(*v) - m).powi(2))
                .sum::<f64>()
                / n;
            means[c] = m;
            stds[c] = var.sqrt();
        }

        Self { means, stds }
    }

    pub fn transform(&self, matrix: &Array2<f64>) -> Array2<f64> {
        let mut out = matrix.clone();
        for mut row in out.rows_mut() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = safe_div(zero_non_finite(*v) - self.means[c], self.stds[c], 0.0);
            }
        }
        out
    }
}

/// Assemble the structural feature matrix for a set of branches, one
/// row per branch in input order. Non-finite values are zeroed here so
/// neither the scaler nor the solver ever sees them.
pub fn feature_matrix(features: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::zeros((features.len(), 6));
    for (i, f) in features.iter().enumerate() {
        for (j, v) in f.clustering_features().iter().enumerate() {
            matrix[[i, j]] = zero_non_finite(*v);
        }
    }
    matrix
}

/// Result of a clustering run over the clusterable branch population.
#[derive(Clone, Debug)]
pub struct ClusterOutcome {
    /// One label per input row, aligned by index.
    pub labels: Vec<usize>,
    /// The cluster count actually used (requested k clamped to N).
    pub effective_k: usize,
    /// The standardized feature matrix, reused by the PCA projection.
    pub standardized: Array2<f64>,
}

/// Partition the feature matrix into at most `requested_k` clusters.
///
/// Centroid initialization draws from `StdRng::seed_from_u64(seed)`, so
/// a fixed seed makes reruns label-identical. When fewer rows than
/// clusters exist, k is reduced to the row count (degenerate
/// one-branch-per-cluster) rather than erroring; a single row (or
/// k == 1) short-circuits to a single cluster without invoking the
/// solver.
pub fn cluster_branches(
    matrix: &Array2<f64>,
    requested_k: usize,
    seed: u64,
    max_iterations: u64,
    tolerance: f64,
) -> AnalyticsResult<ClusterOutcome> {
    let n = matrix.nrows();
    if n == 0 {
        return Err(AnalyticsError::DegenerateData {
            op: "cluster_branches",
            reason: "no clusterable branches".to_string(),
        });
    }

    let scaler = StandardScaler::fit(matrix);
    let standardized = scaler.transform(matrix);

    let effective_k = requested_k.clamp(1, n);
    if effective_k < requested_k {
        log::warn!(
            "cluster count reduced from {} to {}: only {} clusterable branches",
            requested_k,
            effective_k,
            n
        );
    }

    if effective_k == 1 {
        return Ok(ClusterOutcome {
            labels: vec![0; n],
            effective_k,
            standardized,
        });
    }

    let targets: Array1<usize> = Array1::zeros(n);
    let dataset = Dataset::new(standardized.clone(), targets);

    let rng = StdRng::seed_from_u64(seed);
    let model = KMeans::params_with(effective_k, rng, L2Dist)
        .max_n_iterations(max_iterations)
        .tolerance(tolerance)
        .fit(&dataset)
        .map_err(|e| AnalyticsError::Clustering(e.to_string()))?;

    let labels = model.predict(&dataset).to_vec();

    Ok(ClusterOutcome {
        labels,
        effective_k,
        standardized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn scaler_produces_zero_mean_unit_variance() {
        let matrix = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]];
        let scaled = StandardScaler::fit(&matrix).transform(&matrix);
        for col in scaled.columns() {
            let m: f64 = col.iter().sum::<f64>() / 3.0;
            let var: f64 = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / 3.0;
            assert!(m.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn scaler_zero_variance_column_maps_to_zero() {
        let matrix = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let scaled = StandardScaler::fit(&matrix).transform(&matrix);
        for row in scaled.rows() {
            assert_eq!(row[0], 0.0);
        }
    }

    #[test]
    fn scaler_zeroes_non_finite_input() {
        let matrix = array![[f64::NAN, 1.0], [f64::INFINITY, 2.0], [1.0, 3.0]];
        let scaled = StandardScaler::fit(&matrix).transform(&matrix);
        assert!(scaled.iter().all(|v| v.is_finite()));
    }

    fn two_blob_matrix() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.0, 9.9],
        ]
    }

    #[test]
    fn separable_blobs_land_in_distinct_clusters() {
        let outcome = cluster_branches(&two_blob_matrix(), 2, 42, 300, 1e-4).unwrap();
        assert_eq!(outcome.effective_k, 2);
        assert_eq!(outcome.labels[0], outcome.labels[1]);
        assert_eq!(outcome.labels[0], outcome.labels[2]);
        assert_eq!(outcome.labels[3], outcome.labels[4]);
        assert_eq!(outcome.labels[3], outcome.labels[5]);
        assert_ne!(outcome.labels[0], outcome.labels[3]);
    }

    #[test]
    fn same_seed_is_label_identical() {
        let matrix = two_blob_matrix();
        let a = cluster_branches(&matrix, 2, 7, 300, 1e-4).unwrap();
        let b = cluster_branches(&matrix, 2, 7, 300, 1e-4).unwrap();
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn cluster_count_reduced_when_fewer_branches_than_k() {
        let matrix = array![[0.0, 0.0], [10.0, 10.0]];
        let outcome = cluster_branches(&matrix, 4, 42, 300, 1e-4).unwrap();
        assert_eq!(outcome.effective_k, 2);
        assert_eq!(outcome.labels.len(), 2);
    }

    #[test]
    fn single_branch_short_circuits_to_one_cluster() {
        let matrix = array![[1.0, 2.0]];
        let outcome = cluster_branches(&matrix, 3, 42, 300, 1e-4).unwrap();
        assert_eq!(outcome.effective_k, 1);
        assert_eq!(outcome.labels, vec![0]);
    }

    #[test]
    fn feature_matrix_has_one_row_per_branch_and_no_non_finites() {
        let f = FeatureVector {
            branch_id: "a".into(),
            months: 1,
            avg_revenue: f64::NAN,
            avg_profit: 0.0,
            margin_pct: 0.2,
            beverage_share: 0.5,
            food_share: 0.3,
            growth_rate: 0.1,
            volatility: 0.2,
            revenue_sum: 100.0,
            profit_sum: 20.0,
        };
        let m = feature_matrix(&[f]);
        assert_eq!(m.shape(), &[1, 6]);
        assert!(m.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_matrix_is_a_degenerate_data_error() {
        let matrix = Array2::<f64>::zeros((0, 6));
        assert!(cluster_branches(&matrix, 3, 42, 300, 1e-4).is_err());
    }
}

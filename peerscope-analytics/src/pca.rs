//! 2-component PCA projection for the cluster visualization.
//!
//! Operates on the standardized feature matrix the clusterer already
//! produced and has no effect on cluster assignment. Implemented as
//! power iteration with deflation on the covariance matrix: the
//! initialization vectors are fixed, so the projection is bit-identical
//! across reruns with no RNG involved.

use ndarray::{Array1, Array2};

/// Iteration bound for a single eigenvector.
const MAX_POWER_ITERATIONS: usize = 500;
/// Convergence tolerance on the eigenvector direction.
const CONVERGENCE_EPS: f64 = 1e-10;

/// 2-D coordinates per input row. Rows of a matrix with fewer than two
/// samples project to the origin (no directions of variance to find).
#[derive(Clone, Debug)]
pub struct Projection {
    pub pca_1: Vec<f64>,
    pub pca_2: Vec<f64>,
}

/// Project standardized rows onto their top two principal components.
pub fn project_2d(standardized: &Array2<f64>) -> Projection {
    let n = standardized.nrows();
    if n < 2 {
        return Projection {
            pca_1: vec![0.0; n],
            pca_2: vec![0.0; n],
        };
    }

    let covariance = standardized.t().dot(standardized) / n as f64;

    let (first, lambda_1) = dominant_eigenvector(&covariance, None);
    // Deflation removes the first component's variance so the second
    // power iteration converges to the runner-up direction.
    let outer = first
        .clone()
        .insert_axis(ndarray::Axis(1))
        .dot(&first.clone().insert_axis(ndarray::Axis(0)));
    let deflated = &covariance - &outer.mapv(|x| x * lambda_1);
    let (second, _) = dominant_eigenvector(&deflated, Some(&first));

    Projection {
        pca_1: standardized.dot(&first).to_vec(),
        pca_2: standardized.dot(&second).to_vec(),
    }
}

/// Power iteration for the dominant eigenvector of a symmetric matrix.
///
/// The starting vector is a fixed alternating-sign pattern (orthogonal
/// component against `exclude` when deflating); the returned vector's
/// sign is normalized so its largest-magnitude coordinate is positive,
/// keeping the projection stable run to run.
fn dominant_eigenvector(matrix: &Array2<f64>, exclude: Option<&Array1<f64>>) -> (Array1<f64>, f64) {
    let d = matrix.nrows();
    let mut v: Array1<f64> =
        Array1::from_iter((0..d).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }));
    if let Some(prev) = exclude {
        let proj = v.dot(prev);
        v = &v - &prev.mapv(|x| x * proj);
    }
    if !normalize(&mut v) {
        // Degenerate start (all mass along the excluded direction); fall
        // back to the first basis vector component-stripped.
        v = Array1::zeros(d);
        v[0] = 1.0;
        if let Some(prev) = exclude {
            let proj = v.dot(prev);
            v = &v - &(proj * prev);
        }
        if !normalize(&mut v) {
            return (Array1::zeros(d), 0.0);
        }
    }

    for _ in 0..MAX_POWER_ITERATIONS {
        let mut next = matrix.dot(&v);
        if let Some(prev) = exclude {
            let proj = next.dot(prev);
            next = &next - &prev.mapv(|x| x * proj);
        }
        if !normalize(&mut next) {
            // Matrix annihilated the iterate: no variance left.
            return (Array1::zeros(d), 0.0);
        }

        let delta = (&next - &v).iter().map(|x| x * x).sum::<f64>().sqrt();
        let delta_flipped = (&next + &v).iter().map(|x| x * x).sum::<f64>().sqrt();
        v = next;
        if delta < CONVERGENCE_EPS || delta_flipped < CONVERGENCE_EPS {
            break;
        }
    }
    let eigenvalue = v.dot(&matrix.dot(&v));

    fix_sign(&mut v);
    (v, eigenvalue)
}

/// Normalize in place; false when the vector is (numerically) zero.
fn normalize(v: &mut Array1<f64>) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm < 1e-12 {
        return false;
    }
    v.mapv_inplace(|x| x / norm);
    true
}

/// Flip so the largest-magnitude coordinate is positive.
fn fix_sign(v: &mut Array1<f64>) {
    let mut dominant = 0.0_f64;
    for &x in v.iter() {
        if x.abs() > dominant.abs() {
            dominant = x;
        }
    }
    if dominant < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Data with nearly all variance along the first column.
    fn elongated() -> Array2<f64> {
        array![
            [-2.0, 0.1],
            [-1.0, -0.1],
            [0.0, 0.05],
            [1.0, -0.05],
            [2.0, 0.0],
        ]
    }

    #[test]
    fn first_component_follows_dominant_axis() {
        let p = project_2d(&elongated());
        // Spread along pca_1 must dwarf spread along pca_2.
        let spread = |v: &[f64]| {
            let max = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let min = v.iter().cloned().fold(f64::INFINITY, f64::min);
            max - min
        };
        assert!(spread(&p.pca_1) > 5.0 * spread(&p.pca_2));
    }

    #[test]
    fn projection_is_deterministic() {
        let a = project_2d(&elongated());
        let b = project_2d(&elongated());
        assert_eq!(a.pca_1, b.pca_1);
        assert_eq!(a.pca_2, b.pca_2);
    }

    #[test]
    fn fewer_than_two_rows_projects_to_origin() {
        let p = project_2d(&array![[1.0, 2.0, 3.0]]);
        assert_eq!(p.pca_1, vec![0.0]);
        assert_eq!(p.pca_2, vec![0.0]);
    }

    #[test]
    fn zero_matrix_projects_to_origin() {
        let p = project_2d(&Array2::<f64>::zeros((4, 3)));
        assert!(p.pca_1.iter().all(|&x| x == 0.0));
        assert!(p.pca_2.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn components_are_orthogonal_in_sample_space() {
        // For centered data, score vectors of distinct components are
        // uncorrelated; their dot product should be near zero.
        let data = array![
            [2.0, 1.0, 0.5],
            [-1.0, 0.5, -0.2],
            [0.5, -2.0, 1.0],
            [-1.5, 0.5, -1.3],
        ];
        let centered = {
            let mut m = data.clone();
            for c in 0..m.ncols() {
                let mean = m.column(c).sum() / m.nrows() as f64;
                m.column_mut(c).mapv_inplace(|x| x - mean);
            }
            m
        };
        let p = project_2d(&centered);
        let dot: f64 = p
            .pca_1
            .iter()
            .zip(p.pca_2.iter())
            .map(|(a, b)| a * b)
            .sum();
        assert!(dot.abs() < 1e-6, "score vectors should be uncorrelated, got {}", dot);
    }
}

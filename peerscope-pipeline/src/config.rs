//! Run configuration.

use std::path::PathBuf;

use peerscope_analytics::bundling::BundleConfig;
use peerscope_analytics::thresholds::{
    DEFAULT_CLUSTER_COUNT, DEFAULT_KMEANS_MAX_ITERATIONS, DEFAULT_KMEANS_SEED,
    DEFAULT_KMEANS_TOLERANCE,
};

/// Everything one pipeline run needs. Paths identify the inputs; an
/// unset `transactions_path` means "not configured" and selects the
/// heuristic pairing signal, while a configured path that is absent on
/// disk is a hard error.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Branch-month sales CSV (required).
    pub branch_months_path: PathBuf,
    /// Branch-item sales CSV (required).
    pub branch_items_path: PathBuf,
    /// Transaction line-items CSV (optional).
    pub transactions_path: Option<PathBuf>,
    /// Directory the three artifacts are published into.
    pub output_dir: PathBuf,

    /// Requested persona count; clamped to the clusterable branch count.
    pub cluster_count: usize,
    /// Seed for centroid initialization. Fixed seed -> reproducible
    /// labels; vary it and cluster ids become arbitrary permutations.
    pub kmeans_seed: u64,
    pub kmeans_max_iterations: u64,
    pub kmeans_tolerance: f64,

    /// Bundle engine knobs.
    pub bundles: BundleConfig,
}

impl PipelineConfig {
    pub fn new(
        branch_months_path: impl Into<PathBuf>,
        branch_items_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            branch_months_path: branch_months_path.into(),
            branch_items_path: branch_items_path.into(),
            transactions_path: None,
            output_dir: output_dir.into(),
            cluster_count: DEFAULT_CLUSTER_COUNT,
            kmeans_seed: DEFAULT_KMEANS_SEED,
            kmeans_max_iterations: DEFAULT_KMEANS_MAX_ITERATIONS,
            kmeans_tolerance: DEFAULT_KMEANS_TOLERANCE,
            bundles: BundleConfig::default(),
        }
    }

    pub fn with_transactions(mut self, path: impl Into<PathBuf>) -> Self {
        self.transactions_path = Some(path.into());
        self
    }
}

//! End-to-end batch run.
//!
//! Scoring flow: features -> persona clustering -> within-cluster
//! health -> gap-to-best, merged into one scored row per branch. The
//! bundle flow runs independently per branch through the staged
//! source -> filter -> selector pipeline, fanned out with rayon and
//! concatenated in branch-id order so output is deterministic. Nothing
//! is written until every table is computed.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rayon::prelude::*;

use peerscope_analytics::clustering::{cluster_branches, feature_matrix};
use peerscope_analytics::cooccurrence::EmpiricalCooccurrence;
use peerscope_analytics::error::AnalyticsError;
use peerscope_analytics::features::{build_features, BranchMonth, FeatureVector};
use peerscope_analytics::gap::{compute_gaps, ClusterBenchmark};
use peerscope_analytics::health::compute_health;
use peerscope_analytics::pca::project_2d;

use crate::components::bundle_pair_source::{BranchQuery, BundlePairSource};
use crate::components::lift_selector::LiftSelector;
use crate::components::margin_guard_filter::MarginGuardFilter;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::filter::Filter;
use crate::loader::{
    build_baskets, group_items_by_branch, load_branch_items_file, load_branch_months_file,
    load_transactions_file, BranchItemRecord, TransactionRecord,
};
use crate::selector::Selector;
use crate::source::Source;
use crate::types::{
    BundleCandidate, BundleRow, ClusterSummary, MonthlyRow, ScoredBranch, LOW_CONFIDENCE_CLUSTER,
};
use crate::writer::ArtifactWriter;

/// Everything one run computes, returned to the caller for summaries
/// after the artifacts are published.
#[derive(Debug)]
pub struct PipelineOutput {
    pub scored: Vec<ScoredBranch>,
    pub monthly: Vec<MonthlyRow>,
    pub bundles: Vec<BundleRow>,
    pub benchmarks: Vec<ClusterBenchmark>,
    pub clusters: Vec<ClusterSummary>,
}

/// Compute everything, then publish the three artifacts atomically.
pub fn run(config: &PipelineConfig) -> PipelineResult<PipelineOutput> {
    let output = compute(config)?;
    ArtifactWriter::new(&config.output_dir).write_all(
        &output.scored,
        &output.monthly,
        &output.bundles,
    )?;
    Ok(output)
}

/// Compute all tables in memory without touching the filesystem output.
pub fn compute(config: &PipelineConfig) -> PipelineResult<PipelineOutput> {
    let month_records = load_branch_months_file(&config.branch_months_path)?;
    let item_records = load_branch_items_file(&config.branch_items_path)?;
    let txn_records = match &config.transactions_path {
        Some(path) => Some(load_transactions_file(path)?),
        None => None,
    };
    info!(
        "loaded {} branch-month rows, {} item rows, {} transaction rows",
        month_records.len(),
        item_records.len(),
        txn_records.as_ref().map_or(0, Vec::len)
    );

    let months: Vec<BranchMonth> = month_records.iter().map(|r| r.to_branch_month()).collect();
    let features = build_features(&months);
    if features.is_empty() {
        return Err(AnalyticsError::DegenerateData {
            op: "build_features",
            reason: "no branches remain after input cleaning".to_string(),
        }
        .into());
    }

    let (scored, benchmarks, clusters) = score_branches(&features, config)?;
    let monthly = monthly_rows(&months);
    let bundles = recommend_bundles(&item_records, txn_records.as_deref(), config)?;

    Ok(PipelineOutput {
        scored,
        monthly,
        bundles,
        benchmarks,
        clusters,
    })
}

/// Cluster, score and gap-analyze every branch; zero-revenue branches
/// skip the numeric stages and come back with sentinel values.
fn score_branches(
    features: &[FeatureVector],
    config: &PipelineConfig,
) -> PipelineResult<(Vec<ScoredBranch>, Vec<ClusterBenchmark>, Vec<ClusterSummary>)> {
    let clusterable: Vec<FeatureVector> = features
        .iter()
        .filter(|f| f.is_clusterable())
        .cloned()
        .collect();
    let excluded = features.len() - clusterable.len();
    if excluded > 0 {
        warn!(
            "{} zero-revenue branch(es) excluded from clustering; emitting low-confidence rows",
            excluded
        );
    }

    let mut scored = Vec::with_capacity(features.len());
    let mut benchmarks = Vec::new();
    let mut clusters = Vec::new();

    if clusterable.is_empty() {
        warn!("no clusterable branches; scored table is all sentinels");
        for f in features {
            scored.push(sentinel_row(f));
        }
        return Ok((scored, benchmarks, clusters));
    }

    let matrix = feature_matrix(&clusterable);
    let outcome = cluster_branches(
        &matrix,
        config.cluster_count,
        config.kmeans_seed,
        config.kmeans_max_iterations,
        config.kmeans_tolerance,
    )?;
    info!(
        "clustered {} branches into {} personas (seed {})",
        clusterable.len(),
        outcome.effective_k,
        config.kmeans_seed
    );

    let projection = project_2d(&outcome.standardized);
    let health = compute_health(&clusterable, &outcome.labels);
    let gap_outcome = compute_gaps(&clusterable, &outcome.labels);
    benchmarks = gap_outcome.benchmarks.clone();
    clusters = summarize_clusters(&clusterable, &outcome.labels, &benchmarks);

    // Merge in input order: clusterable branches consume the aligned
    // scoring outputs, excluded branches get sentinels.
    let mut c_idx = 0;
    for f in features {
        if f.is_clusterable() {
            scored.push(ScoredBranch {
                branch_id: f.branch_id.clone(),
                cluster_id: outcome.labels[c_idx] as i64,
                health_score: health[c_idx],
                gap_profit: gap_outcome.gaps[c_idx],
                avg_revenue: f.avg_revenue,
                margin: f.margin_pct,
                growth: f.growth_rate,
                volatility: f.volatility,
                pca_1: projection.pca_1[c_idx],
                pca_2: projection.pca_2[c_idx],
            });
            c_idx += 1;
        } else {
            scored.push(sentinel_row(f));
        }
    }

    Ok((scored, benchmarks, clusters))
}

/// Output row for a branch excluded from clustering: sentinel cluster,
/// zero score and gap, flagged low-confidence via the cluster id.
fn sentinel_row(f: &FeatureVector) -> ScoredBranch {
    ScoredBranch {
        branch_id: f.branch_id.clone(),
        cluster_id: LOW_CONFIDENCE_CLUSTER,
        health_score: 0.0,
        gap_profit: 0.0,
        avg_revenue: f.avg_revenue,
        margin: f.margin_pct,
        growth: f.growth_rate,
        volatility: f.volatility,
        pca_1: 0.0,
        pca_2: 0.0,
    }
}

fn summarize_clusters(
    features: &[FeatureVector],
    labels: &[usize],
    benchmarks: &[ClusterBenchmark],
) -> Vec<ClusterSummary> {
    let mut members: BTreeMap<usize, Vec<&FeatureVector>> = BTreeMap::new();
    for (f, &label) in features.iter().zip(labels) {
        members.entry(label).or_default().push(f);
    }

    members
        .into_iter()
        .map(|(cluster_id, group)| {
            let n = group.len() as f64;
            let benchmark = benchmarks.iter().find(|b| b.cluster_id == cluster_id);
            ClusterSummary {
                cluster_id: cluster_id as i64,
                members: group.len(),
                avg_margin: group.iter().map(|f| f.margin_pct).sum::<f64>() / n,
                avg_growth: group.iter().map(|f| f.growth_rate).sum::<f64>() / n,
                avg_volatility: group.iter().map(|f| f.volatility).sum::<f64>() / n,
                benchmark_branch: benchmark.map(|b| b.branch_id.clone()).unwrap_or_default(),
                benchmark_margin: benchmark.map(|b| b.margin).unwrap_or(0.0),
            }
        })
        .collect()
}

/// The drill-down time series, sorted by branch then month.
fn monthly_rows(months: &[BranchMonth]) -> Vec<MonthlyRow> {
    let mut rows: Vec<MonthlyRow> = months
        .iter()
        .map(|m| MonthlyRow {
            branch_id: m.branch_id.clone(),
            month: m.month.clone(),
            revenue: m.revenue,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.branch_id
            .cmp(&b.branch_id)
            .then_with(|| a.month.cmp(&b.month))
    });
    rows
}

/// Run the staged bundle pipeline for every branch. Branches are
/// independent and read-only over the shared tables, so the fan-out is
/// a plain rayon map; collection preserves branch-id order.
fn recommend_bundles(
    item_records: &[BranchItemRecord],
    txn_records: Option<&[TransactionRecord]>,
    config: &PipelineConfig,
) -> PipelineResult<Vec<BundleRow>> {
    let items_by_branch: BTreeMap<_, _> = group_items_by_branch(item_records)
        .into_iter()
        .collect();

    let cooccurrence: BTreeMap<String, EmpiricalCooccurrence> = match txn_records {
        Some(records) => build_baskets(records)
            .into_iter()
            .map(|(branch_id, baskets)| (branch_id, EmpiricalCooccurrence::from_baskets(baskets)))
            .collect(),
        None => BTreeMap::new(),
    };

    let source = BundlePairSource::new(items_by_branch, cooccurrence, config.bundles.clone());
    let margin_guard = MarginGuardFilter::new(config.bundles.clone());
    let selector = LiftSelector {
        max_bundles: config.bundles.max_bundles_per_branch,
    };

    let branch_ids = source.branch_ids();
    let per_branch: Vec<Vec<BundleRow>> = branch_ids
        .par_iter()
        .map(|branch_id| -> PipelineResult<Vec<BundleRow>> {
            let query = BranchQuery {
                branch_id: branch_id.clone(),
            };
            if !source.enable(&query) {
                return Ok(Vec::new());
            }

            let candidates = source.candidates(&query)?;
            let filtered = margin_guard.filter(&query, candidates)?;
            debug!(
                "{} [{}]: kept {}, removed {}",
                margin_guard.name(),
                branch_id,
                filtered.kept.len(),
                filtered.removed.len()
            );

            let selected = selector.select(&query, filtered.kept);
            Ok(selected
                .into_iter()
                .filter_map(BundleCandidate::into_row)
                .collect())
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    let bundles: Vec<BundleRow> = per_branch.into_iter().flatten().collect();
    info!("recommended {} bundles across {} branches", bundles.len(), branch_ids.len());
    Ok(bundles)
}

//! Atomic artifact publication.
//!
//! Every table is fully serialized to a `.tmp` sibling first; renames
//! into the final paths happen only after all three temp writes have
//! succeeded. A concurrent reader therefore sees either the previous
//! complete run or the new complete run, never a half-written file, and
//! a failed run publishes nothing at all.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{BundleRow, MonthlyRow, ScoredBranch};

pub const BRANCHES_SCORED_FILE: &str = "branches_scored.csv";
pub const BRANCH_MONTHLY_FILE: &str = "branch_monthly.csv";
pub const BUNDLES_FILE: &str = "bundles.csv";

pub struct ArtifactWriter {
    out_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Write all three artifacts. Presentation rounding is applied to
    /// the bundle rows here and only here; upstream computation keeps
    /// full precision.
    pub fn write_all(
        &self,
        scored: &[ScoredBranch],
        monthly: &[MonthlyRow],
        bundles: &[BundleRow],
    ) -> PipelineResult<()> {
        fs::create_dir_all(&self.out_dir).map_err(|source| PipelineError::Io {
            path: self.out_dir.clone(),
            source,
        })?;

        let rounded: Vec<BundleRow> = bundles.iter().map(presentation_rounded).collect();

        let staged = vec![
            self.stage(BRANCHES_SCORED_FILE, scored)?,
            self.stage(BRANCH_MONTHLY_FILE, monthly)?,
            self.stage(BUNDLES_FILE, &rounded)?,
        ];

        for (tmp_path, final_path) in staged {
            fs::rename(&tmp_path, &final_path).map_err(|source| PipelineError::Io {
                path: final_path.clone(),
                source,
            })?;
        }

        log::info!(
            "published {} scored branches, {} monthly rows, {} bundles to {}",
            scored.len(),
            monthly.len(),
            bundles.len(),
            self.out_dir.display()
        );
        Ok(())
    }

    /// Serialize one table to its temp path; the final rename happens
    /// in `write_all` once every table has staged cleanly.
    fn stage<T: Serialize>(&self, name: &str, rows: &[T]) -> PipelineResult<(PathBuf, PathBuf)> {
        let final_path = self.out_dir.join(name);
        let tmp_path = self.out_dir.join(format!("{name}.tmp"));

        let mut writer = csv::Writer::from_path(&tmp_path).map_err(|e| csv_error(&tmp_path, e))?;
        for row in rows {
            writer.serialize(row).map_err(|e| csv_error(&tmp_path, e))?;
        }
        writer.flush().map_err(|source| PipelineError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        Ok((tmp_path, final_path))
    }
}

fn csv_error(path: &Path, error: csv::Error) -> PipelineError {
    PipelineError::Csv {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Boundary rounding: signal fields to 4 decimals, currency to 2.
fn presentation_rounded(row: &BundleRow) -> BundleRow {
    BundleRow {
        branch_id: row.branch_id.clone(),
        bundle_items: row.bundle_items.clone(),
        discount_pct: round_to(row.discount_pct, 4),
        bundle_price: round_to(row.bundle_price, 2),
        expected_profit: round_to(row.expected_profit, 2),
        reason: row.reason.clone(),
        lift: round_to(row.lift, 4),
        support: round_to(row.support, 4),
    }
}

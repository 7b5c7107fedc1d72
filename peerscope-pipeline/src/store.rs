//! Reloadable read model over the published artifacts.
//!
//! The serving layer owns one of these and passes it by reference to
//! request handlers, an explicitly owned replacement for a module-level
//! cache. Absent artifacts are the normal "pipeline has not run yet"
//! state and load as empty tables; only a present-but-unreadable file is
//! an error.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{BundleRow, MonthlyRow, ScoredBranch};
use crate::writer::{BRANCHES_SCORED_FILE, BRANCH_MONTHLY_FILE, BUNDLES_FILE};

pub struct ArtifactStore {
    dir: PathBuf,
    branches: Vec<ScoredBranch>,
    monthly: Vec<MonthlyRow>,
    bundles: Vec<BundleRow>,
}

impl ArtifactStore {
    /// Load whatever artifacts exist under `dir`.
    pub fn load(dir: impl Into<PathBuf>) -> PipelineResult<Self> {
        let mut store = Self {
            dir: dir.into(),
            branches: Vec::new(),
            monthly: Vec::new(),
            bundles: Vec::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-read the artifacts, replacing the in-memory tables wholesale.
    pub fn reload(&mut self) -> PipelineResult<()> {
        self.branches = read_optional(&self.dir.join(BRANCHES_SCORED_FILE))?;
        self.monthly = read_optional(&self.dir.join(BRANCH_MONTHLY_FILE))?;
        self.bundles = read_optional(&self.dir.join(BUNDLES_FILE))?;
        Ok(())
    }

    pub fn branches(&self) -> &[ScoredBranch] {
        &self.branches
    }

    pub fn monthly(&self) -> &[MonthlyRow] {
        &self.monthly
    }

    pub fn bundles(&self) -> &[BundleRow] {
        &self.bundles
    }

    /// Bundle rows for one branch. An absent artifact or an unknown
    /// branch id yields an empty collection, never an error.
    pub fn bundles_for_branch(&self, branch_id: &str) -> Vec<&BundleRow> {
        self.bundles
            .iter()
            .filter(|b| b.branch_id == branch_id)
            .collect()
    }

    /// Monthly drill-down rows for one branch, same graceful-empty
    /// contract as [`ArtifactStore::bundles_for_branch`].
    pub fn monthly_for_branch(&self, branch_id: &str) -> Vec<&MonthlyRow> {
        self.monthly
            .iter()
            .filter(|m| m.branch_id == branch_id)
            .collect()
    }
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> PipelineResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut rows = Vec::new();
    for (line_num, result) in reader.deserialize().enumerate() {
        let row: T = result.map_err(|e| PipelineError::Csv {
            path: path.to_path_buf(),
            message: format!("line {}: {}", line_num + 2, e),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ArtifactWriter;

    fn bundle(branch_id: &str, items: &str) -> BundleRow {
        BundleRow {
            branch_id: branch_id.into(),
            bundle_items: items.into(),
            discount_pct: 0.1,
            bundle_price: 9.0,
            expected_profit: 3.0,
            reason: "heuristic-fallback".into(),
            lift: 1.0,
            support: 0.01,
        }
    }

    #[test]
    fn empty_directory_loads_as_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::load(dir.path()).unwrap();
        assert!(store.branches().is_empty());
        assert!(store.monthly().is_empty());
        assert!(store.bundles().is_empty());
    }

    #[test]
    fn absent_bundles_artifact_yields_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::load(dir.path()).unwrap();
        assert!(store.bundles_for_branch("zalka").is_empty());
    }

    #[test]
    fn round_trips_written_bundles() {
        let dir = tempfile::tempdir().unwrap();
        ArtifactWriter::new(dir.path())
            .write_all(&[], &[], &[bundle("zalka", "A+B"), bundle("aley", "C+D")])
            .unwrap();

        let store = ArtifactStore::load(dir.path()).unwrap();
        assert_eq!(store.bundles().len(), 2);
        let zalka = store.bundles_for_branch("zalka");
        assert_eq!(zalka.len(), 1);
        assert_eq!(zalka[0].bundle_items, "A+B");
        assert!(store.bundles_for_branch("nowhere").is_empty());
    }

    #[test]
    fn reload_picks_up_a_new_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::load(dir.path()).unwrap();
        assert!(store.bundles().is_empty());

        ArtifactWriter::new(dir.path())
            .write_all(&[], &[], &[bundle("zalka", "A+B")])
            .unwrap();
        store.reload().unwrap();
        assert_eq!(store.bundles().len(), 1);
    }
}

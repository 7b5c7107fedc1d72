use std::cmp::Ordering;

use crate::util;

/// Selectors order and truncate the candidate list after filtering.
pub trait Selector<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Default selection: sort and truncate based on provided configs.
    fn select(&self, _query: &Q, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = self.sort(candidates);
        if let Some(limit) = self.size() {
            sorted.truncate(limit);
        }
        sorted
    }

    /// Decide if this selector should run for the given query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Extract the primary score from a candidate.
    fn score(&self, candidate: &C) -> f64;

    /// Total ordering between two candidates. The default orders by
    /// score descending with NaN pushed to the end, so division-by-zero
    /// or missing data can never surface as a top candidate. Override
    /// to add tie-breaks.
    fn compare(&self, a: &C, b: &C) -> Ordering {
        descending(self.score(a), self.score(b))
    }

    /// Sort candidates using [`Selector::compare`].
    fn sort(&self, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = candidates;
        sorted.sort_by(|a, b| self.compare(a, b));
        sorted
    }

    /// Optionally provide a maximum number of candidates to select.
    fn size(&self) -> Option<usize> {
        None
    }

    /// Returns a stable name for logging/metrics.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}

/// Descending float ordering with an explicit NaN policy: NaN sorts
/// after every real value.
pub fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

//! Maintains the global top-k slices across all levels seen so far.

use crate::lattice::SliceMatrix;
use crate::score::Stats;
use ndarray::Array2;

/// The current best `k` slices by score, kept sorted descending.
#[derive(Clone, Debug, Default)]
pub struct TopK {
    k: usize,
    rows: SliceMatrix,
    stats: Vec<Stats>,
}

impl TopK {
    /// An empty top-k over an `n2`-wide one-hot feature space.
    #[must_use]
    pub fn new(k: usize, n2: usize) -> Self {
        Self {
            k,
            rows: Array2::zeros((0, n2)),
            stats: Vec::new(),
        }
    }

    /// Number of slices currently held (`<= k`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether no slice is currently held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// The held slices, one-hot encoded, sorted descending by score.
    #[must_use]
    pub fn slices(&self) -> &SliceMatrix {
        &self.rows
    }

    /// The held slices' stats, sorted descending by score.
    #[must_use]
    pub fn stats(&self) -> &[Stats] {
        &self.stats
    }

    /// Score of the worst-ranked held slice, or `f64::NEG_INFINITY` if
    /// fewer than `k` slices are held (any candidate can still get in).
    #[must_use]
    pub fn min_score(&self) -> f64 {
        if self.stats.len() < self.k {
            f64::NEG_INFINITY
        } else {
            self.stats.last().map_or(f64::NEG_INFINITY, |s| s.score)
        }
    }

    /// Merges `candidates`/`candidate_stats` in, keeping the best `k` by
    /// score (descending; ties broken by original insertion order,
    /// i.e. a stable sort).
    ///
    /// Incoming rows with `size < min_sup || score <= 0.0` are dropped
    /// before merging (`spec.md` §4.7's "filter incoming (S,R) to ...
    /// size >= minSup, score > 0", applied uniformly to every level,
    /// including level 1). This filter is the top-k's own, independent
    /// of whatever let a candidate survive into the lattice itself — a
    /// lattice can carry a sub-`minSup` near-miss slice (see
    /// `driver.rs`'s level loop) purely so a later incremental run can
    /// recognize it as unchanged; such a slice must never reach `TK`.
    pub fn merge(&mut self, candidates: &SliceMatrix, candidate_stats: &[Stats], min_sup: f64) {
        let ncols = if self.rows.ncols() > 0 {
            self.rows.ncols()
        } else {
            candidates.ncols()
        };

        let mut combined: Vec<(ndarray::Array1<f64>, Stats)> = Vec::with_capacity(
            self.stats.len() + candidate_stats.len(),
        );
        combined.extend(
            self.rows
                .rows()
                .into_iter()
                .map(ndarray::ArrayBase::to_owned)
                .zip(self.stats.iter().copied()),
        );
        combined.extend(
            candidates
                .rows()
                .into_iter()
                .map(ndarray::ArrayBase::to_owned)
                .zip(candidate_stats.iter().copied())
                .filter(|(_, s)| s.size >= min_sup && s.score > 0.0),
        );

        combined.sort_by(|a, b| b.1.score.partial_cmp(&a.1.score).unwrap_or(std::cmp::Ordering::Equal));
        combined.truncate(self.k);

        let mut rows = Array2::zeros((combined.len(), ncols));
        let mut stats = Vec::with_capacity(combined.len());
        for (i, (row, stat)) in combined.into_iter().enumerate() {
            rows.row_mut(i).assign(&row);
            stats.push(stat);
        }
        self.rows = rows;
        self.stats = stats;
    }
}

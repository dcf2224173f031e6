//! Append-only, level-grouped storage for enumerated slices and stats.
//!
//! Two representations are used across the crate: [`Lattice`] (this
//! module's primary type) holds slices one-hot encoded, for use inside a
//! single [`crate::Engine::run`] invocation; [`DecodedLattice`] holds
//! slices decoded back to feature-value form, the representation
//! exchanged across invocations (`spec.md` §4.8's "decode ... from
//! one-hot back to feature-value form" step, and §9's recommendation of
//! "a single matrix plus a per-level row-count vector").

use crate::encode;
use crate::offsets::FeatureOffsets;
use crate::score::Stats;
use ndarray::{concatenate, s, Array2, ArrayView2, Axis};

/// Slice-indicator matrix: one row per slice, columns are the one-hot
/// feature space shared with the engine's `X2`.
pub type SliceMatrix = Array2<f64>;

/// Append-only, level-grouped lattice of one-hot enumerated slices and
/// their per-slice statistics (`L`/`RL` in the data model), as used
/// during one invocation.
#[derive(Clone, Debug, Default)]
pub struct Lattice {
    levels: Vec<SliceMatrix>,
    stats: Vec<Vec<Stats>>,
}

impl Lattice {
    /// An empty lattice.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one level's surviving slices and stats.
    pub fn push_level(&mut self, slices: SliceMatrix, stats: Vec<Stats>) {
        debug_assert_eq!(slices.nrows(), stats.len());
        self.levels.push(slices);
        self.stats.push(stats);
    }

    /// Number of levels stored (1-indexed; `n_levels() == 2` means
    /// levels 1 and 2 are both present).
    #[must_use]
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Whether the lattice holds no levels at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The slice matrix at 1-indexed `level`, if present.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<ArrayView2<f64>> {
        if level == 0 {
            return None;
        }
        self.levels.get(level - 1).map(ndarray::ArrayBase::view)
    }

    /// The stats rows at 1-indexed `level`, if present.
    #[must_use]
    pub fn level_stats(&self, level: usize) -> Option<&[Stats]> {
        if level == 0 {
            return None;
        }
        self.stats.get(level - 1).map(Vec::as_slice)
    }

    /// Decodes every level back to feature-value form (`spec.md` §4.8
    /// termination step).
    #[must_use]
    pub fn decode(&self, offsets: &FeatureOffsets) -> DecodedLattice {
        let mut level_sizes = Vec::with_capacity(self.n_levels());
        let mut all_stats = Vec::new();
        let mut decoded_levels = Vec::with_capacity(self.n_levels());

        for (slices, stats) in self.levels.iter().zip(&self.stats) {
            level_sizes.push(slices.nrows());
            decoded_levels.push(encode::decode(slices.view(), offsets));
            all_stats.extend_from_slice(stats);
        }

        let rows = if decoded_levels.is_empty() {
            Array2::zeros((0, offsets.n()))
        } else {
            let views: Vec<_> = decoded_levels.iter().map(ndarray::ArrayBase::view).collect();
            concatenate(Axis(0), &views).expect("all levels share the same column count")
        };

        DecodedLattice {
            rows,
            stats: all_stats,
            level_sizes,
        }
    }

    /// Re-encodes a [`DecodedLattice`] (as threaded in from a prior run)
    /// back into one-hot form, for use inside this invocation.
    #[must_use]
    pub fn encode_from_decoded(decoded: &DecodedLattice, offsets: &FeatureOffsets) -> Self {
        let mut lattice = Self::new();
        for level in 1..=decoded.n_levels() {
            let rows = decoded
                .level_rows(level)
                .expect("level within n_levels() bound");
            let stats = decoded
                .level_stats(level)
                .expect("level within n_levels() bound")
                .to_vec();
            lattice.push_level(encode::one_hot(rows, offsets), stats);
        }
        lattice
    }
}

/// A lattice decoded back to feature-value form: the representation
/// exchanged across invocations as `prevLattice`/the output `L`.
///
/// All slices are concatenated across levels, in level order, alongside
/// a per-level row count used to recover level boundaries (`spec.md`
/// §4.4's "Level boundaries in the prior lattice are inferred from the
/// cumulative row counts of prevRL").
#[derive(Clone, Debug, Default)]
pub struct DecodedLattice {
    /// All decoded slices, concatenated across levels.
    pub rows: Array2<u32>,
    /// Stats aligned row-for-row with `rows`.
    pub stats: Vec<Stats>,
    /// Row count contributed by each level, level 1 first.
    pub level_sizes: Vec<usize>,
}

impl DecodedLattice {
    /// Whether no slices are stored at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    /// Number of levels stored.
    #[must_use]
    pub fn n_levels(&self) -> usize {
        self.level_sizes.len()
    }

    /// The decoded slice rows for 1-indexed `level`, if present.
    #[must_use]
    pub fn level_rows(&self, level: usize) -> Option<ArrayView2<u32>> {
        let (start, end) = self.level_bounds(level)?;
        Some(self.rows.slice(s![start..end, ..]))
    }

    /// The stats rows for 1-indexed `level`, if present.
    #[must_use]
    pub fn level_stats(&self, level: usize) -> Option<&[Stats]> {
        let (start, end) = self.level_bounds(level)?;
        Some(&self.stats[start..end])
    }

    fn level_bounds(&self, level: usize) -> Option<(usize, usize)> {
        if level == 0 || level > self.level_sizes.len() {
            return None;
        }
        let start: usize = self.level_sizes[..level - 1].iter().sum();
        let end = start + self.level_sizes[level - 1];
        Some((start, end))
    }
}

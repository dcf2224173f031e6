//! Stable one-hot column-space offsets shared across invocations.

use ndarray::ArrayView2;
use std::ops::Range;

/// Maps each recoded feature to the contiguous range of one-hot columns
/// it occupies in the shared column space.
///
/// Column `foffb[j] + v - 1` (0-indexed) holds the indicator for
/// `X[i, j] == v` for `v > 0`. `foffb`/`foffe` must be derived once and
/// reused verbatim across incremental invocations that share a dataset
/// schema — that is the sole contract enabling lattice reuse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureOffsets {
    foffb: Vec<usize>,
    foffe: Vec<usize>,
}

impl FeatureOffsets {
    /// Derives offsets from the column-wise maxima of `x` (the per-feature
    /// domain size) as cumulative sums.
    #[must_use]
    pub fn from_matrix(x: ArrayView2<u32>) -> Self {
        let ncol = x.ncols();
        let mut foffb = vec![0; ncol];
        let mut foffe = vec![0; ncol];
        let mut cursor = 0;
        for j in 0..ncol {
            let domain = x.column(j).iter().copied().max().unwrap_or(0) as usize;
            foffb[j] = cursor;
            cursor += domain;
            foffe[j] = cursor;
        }
        Self { foffb, foffe }
    }

    /// Width of the one-hot column space, `n2`.
    #[must_use]
    pub fn n2(&self) -> usize {
        self.foffe.last().copied().unwrap_or(0)
    }

    /// Number of original (pre-encoding) features, `n`.
    #[must_use]
    pub fn n(&self) -> usize {
        self.foffb.len()
    }

    /// The half-open one-hot column range `(foffb[j], foffe[j]]` for
    /// feature `j`, expressed 0-indexed as `foffb[j]..foffe[j]`.
    #[must_use]
    pub fn group(&self, j: usize) -> Range<usize> {
        self.foffb[j]..self.foffe[j]
    }

    /// Iterates the one-hot column range of every feature in order.
    pub fn groups(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.n()).map(move |j| self.group(j))
    }
}

//! Identifies prior-lattice slices that no newly added row satisfies —
//! the mechanism that makes the engine incremental.

use crate::lattice::{Lattice, SliceMatrix};
use crate::score::Stats;
use ndarray::{ArrayView2, Axis};

/// For every level `ℓ >= 2` present in `prev_lattice` (already one-hot
/// encoded with the current run's offsets), the slices at that level
/// which no row of `added_x2` satisfies, paired with their prior
/// statistics.
///
/// Entry `0` of the returned `Vec` is level 2, entry `1` is level 3, and
/// so on (`unchangedS[ℓ-1]`/`unchangedR[ℓ-1]` in `spec.md`'s notation).
#[must_use]
pub fn detect(prev_lattice: &Lattice, added_x2: ArrayView2<f64>) -> Vec<(SliceMatrix, Vec<Stats>)> {
    let mut out = Vec::with_capacity(prev_lattice.n_levels().saturating_sub(1));

    for level in 2..=prev_lattice.n_levels() {
        let prev_slices = prev_lattice
            .level(level)
            .expect("level within n_levels() bound");
        let prev_stats = prev_lattice
            .level_stats(level)
            .expect("level within n_levels() bound");

        let ncol = prev_slices.ncols();
        if prev_slices.nrows() == 0 {
            out.push((SliceMatrix::zeros((0, ncol)), Vec::new()));
            continue;
        }

        // colSums(addedX2 . prevLatAtLevel^T == level) == 0 means no
        // added row matches that slice.
        let touch_counts = added_x2.dot(&prev_slices.t());
        let level_f = level as f64;

        let mut rows = Vec::new();
        let mut stats = Vec::new();
        for (u, touch_col) in touch_counts.axis_iter(Axis(1)).enumerate() {
            let touched = touch_col.iter().any(|&d| (d - level_f).abs() < 0.5);
            if !touched {
                rows.push(prev_slices.row(u).to_owned());
                stats.push(prev_stats[u]);
            }
        }

        let mut mat = SliceMatrix::zeros((rows.len(), ncol));
        for (i, r) in rows.into_iter().enumerate() {
            mat.row_mut(i).assign(&r);
        }
        out.push((mat, stats));
    }

    out
}

//! Builds and scores all 1-predicate ("level-1") slices.

use crate::score::{self, Stats};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// A 0/1 slice-indicator matrix: each row is one slice, columns are the
/// shared one-hot feature space.
pub type SliceMatrix = Array2<f64>;

/// Builds every surviving level-1 slice and its stats, plus the column
/// selection mask (`selCols`) used by `Params::sel_feat` column-dropping.
///
/// The base rule selects columns with `size >= min_sup && totalError >
/// 0`. When `added_x2`/`prev_tk2` are both supplied and `e_avg_old >
/// e_avg_new != 0.0`, the selection is additionally tightened to columns
/// touched by the added rows or present in the prior top-k: under that
/// condition an untouched basic slice cannot move into the top-k.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn build_level1(
    x2: ArrayView2<f64>,
    e: ArrayView1<f64>,
    added_x2: Option<ArrayView2<f64>>,
    prev_tk2: Option<ArrayView2<f64>>,
    e_avg: f64,
    e_avg_old: f64,
    e_avg_new: f64,
    n: f64,
    min_sup: f64,
    alpha: f64,
) -> (SliceMatrix, Vec<Stats>, Vec<bool>) {
    let ncol = x2.ncols();
    let c_cnts = x2.sum_axis(Axis(0));
    let err = e.dot(&x2);
    let merr = col_maxs_weighted(x2, e);

    let mut sel_cols: Vec<bool> = (0..ncol)
        .map(|j| c_cnts[j] >= min_sup && err[j] > 0.0)
        .collect();

    if e_avg_old > e_avg_new && e_avg_new != 0.0 {
        if let (Some(added), Some(prev)) = (added_x2, prev_tk2) {
            let added_touched = added.sum_axis(Axis(0));
            let prev_present = prev.sum_axis(Axis(0));
            for (j, sel) in sel_cols.iter_mut().enumerate() {
                if *sel {
                    *sel = added_touched[j] > 0.0 || prev_present[j] > 0.0;
                }
            }
        }
    }

    let n_selected = sel_cols.iter().filter(|&&b| b).count();
    let mut slices = Array2::zeros((n_selected, ncol));
    let mut stats = Vec::with_capacity(n_selected);
    let mut row = 0;
    for j in 0..ncol {
        if sel_cols[j] {
            slices[[row, j]] = 1.0;
            let raw = Stats {
                score: 0.0,
                total_error: err[j],
                max_error: merr[j],
                size: c_cnts[j],
            };
            stats.push(Stats {
                score: score::score(&raw, e_avg, n, alpha),
                ..raw
            });
            row += 1;
        }
    }

    (slices, stats, sel_cols)
}

/// `colMaxs(X2 ⊙ e)`: the maximum error among rows where each column is 1.
fn col_maxs_weighted(x2: ArrayView2<f64>, e: ArrayView1<f64>) -> Array1<f64> {
    let ncol = x2.ncols();
    let mut out = Array1::zeros(ncol);
    for (i, row) in x2.rows().into_iter().enumerate() {
        for j in 0..ncol {
            if row[j] > 0.0 {
                out[j] = out[j].max(e[i]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::build_level1;
    use ndarray::array;

    #[test]
    fn base_rule_keeps_only_supported_nonzero_error_columns() {
        // column 0: size 3, err 4; column 1: size 1 (< minSup=2)
        let x2 = array![[1.0, 1.0], [1.0, 0.0], [1.0, 0.0]];
        let e = array![1.0, 1.0, 2.0];

        let (slices, stats, sel_cols) =
            build_level1(x2.view(), e.view(), None, None, 1.0, 0.0, 0.0, 3.0, 2.0, 0.5);

        assert_eq!(sel_cols, vec![true, false]);
        assert_eq!(slices.nrows(), 1);
        assert_eq!(stats.len(), 1);
        assert!((stats[0].size - 3.0).abs() < f64::EPSILON);
        assert!((stats[0].total_error - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn incremental_tightening_requires_touch_or_prior_membership() {
        let x2 = array![[1.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        let e = array![1.0, 1.0, 1.0];
        // column 1 is untouched by added rows and absent from prevTK2.
        let added_x2 = array![[0.0, 0.0]];
        let prev_tk2 = array![[1.0, 0.0]];

        let (_, _, sel_cols) = build_level1(
            x2.view(),
            e.view(),
            Some(added_x2.view()),
            Some(prev_tk2.view()),
            1.0,
            2.0,
            1.0,
            3.0,
            1.0,
            0.5,
        );

        assert!(sel_cols[0]);
        assert!(!sel_cols[1]);
    }
}

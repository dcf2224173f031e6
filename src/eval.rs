//! Scores a batch of candidate slices against the full dataset.
//!
//! Two modes, selected by `Params::tp_eval` (`spec.md` §4.6): *data-
//! parallel* evaluates every candidate against the full dataset as one
//! pass (one matrix–matrix product per candidate, but no splitting of
//! the candidate set itself); *task-parallel* splits the candidate set
//! into blocks of `Params::tp_blksz` and evaluates blocks independently
//! via `rayon`, mirroring the teacher's block-parallel PDF-convolution
//! idiom. Both modes must produce bit-identical stats modulo intra-
//! block floating-point reassociation; block order must not affect the
//! result.
use crate::score::{self, Stats};
use ndarray::{ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

/// Computes exact `Stats` for every row of `candidates` against the
/// full `x2`/`e` dataset. A candidate's level is its own row sum
/// (number of set one-hot columns), so no separate level parameter is
/// needed even when `candidates` mixes slices from different levels
/// (as happens when re-scoring a carried-over top-k).
#[must_use]
pub fn evaluate(
    candidates: ArrayView2<f64>,
    x2: ArrayView2<f64>,
    e: ArrayView1<f64>,
    e_avg: f64,
    n: f64,
    alpha: f64,
    tp_eval: bool,
    tp_blksz: usize,
) -> Vec<Stats> {
    if candidates.nrows() == 0 {
        return Vec::new();
    }

    if tp_eval {
        let blksz = tp_blksz.max(1);
        let ncand = candidates.nrows();
        let n_blocks = ncand.div_ceil(blksz).max(1);

        (0..n_blocks)
            .into_par_iter()
            .flat_map(|b| {
                let start = b * blksz;
                let end = (start + blksz).min(ncand);
                candidates
                    .slice(ndarray::s![start..end, ..])
                    .axis_iter(Axis(0))
                    .map(|row| evaluate_row(row, x2, e, e_avg, n, alpha))
                    .collect::<Vec<_>>()
            })
            .collect()
    } else {
        candidates
            .axis_iter(Axis(0))
            .map(|row| evaluate_row(row, x2, e, e_avg, n, alpha))
            .collect()
    }
}

fn evaluate_row(
    candidate: ArrayView1<f64>,
    x2: ArrayView2<f64>,
    e: ArrayView1<f64>,
    e_avg: f64,
    n: f64,
    alpha: f64,
) -> Stats {
    let mut total_error = 0.0;
    let mut max_error = 0.0f64;
    let mut size = 0.0;
    let level = candidate.sum();

    for (row, &ei) in x2.rows().into_iter().zip(e.iter()) {
        if (row.dot(&candidate) - level).abs() < 0.5 {
            total_error += ei;
            max_error = max_error.max(ei);
            size += 1.0;
        }
    }

    let raw = Stats {
        score: 0.0,
        total_error,
        max_error,
        size,
    };
    Stats {
        score: score::score(&raw, e_avg, n, alpha),
        ..raw
    }
}

#[cfg(test)]
mod tests {
    use super::evaluate;
    use ndarray::array;

    #[test]
    fn task_parallel_and_data_parallel_agree() {
        let x2 = array![
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [1.0, 1.0],
        ];
        let e = array![1.0, 2.0, 3.0, 4.0];
        let candidates = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

        let tp = evaluate(candidates.view(), x2.view(), e.view(), 2.5, 4.0, 0.5, true, 16);
        let dp = evaluate(candidates.view(), x2.view(), e.view(), 2.5, 4.0, 0.5, false, 2);

        for (a, b) in tp.iter().zip(dp.iter()) {
            assert!((a.total_error - b.total_error).abs() < 1e-9);
            assert!((a.size - b.size).abs() < 1e-9);
            assert!((a.max_error - b.max_error).abs() < 1e-9);
            assert!((a.score - b.score).abs() < 1e-9);
        }
    }

    #[test]
    fn evaluate_empty_candidates_returns_empty() {
        let x2 = array![[1.0]];
        let e = array![1.0];
        let candidates = ndarray::Array2::<f64>::zeros((0, 1));
        let stats = evaluate(candidates.view(), x2.view(), e.view(), 1.0, 1.0, 0.5, true, 16);
        assert!(stats.is_empty());
    }
}

//! Slice scoring: the actual score and its monotone upper bound.

use serde::{Deserialize, Serialize};

/// Four-column per-slice statistics: score, total error, max error, size.
///
/// Column order matches the `TKC` output table: `score, totalError,
/// maxError, size`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Stats {
    /// Interestingness score; higher is more anomalous.
    pub score: f64,
    /// Sum of the error over rows matching the slice.
    pub total_error: f64,
    /// Maximum error over rows matching the slice.
    pub max_error: f64,
    /// Number of rows matching the slice (support).
    pub size: f64,
}

impl Stats {
    /// A stats row that can never survive any pruning or top-k filter.
    #[must_use]
    pub const fn degenerate() -> Self {
        Self {
            score: f64::NEG_INFINITY,
            total_error: 0.0,
            max_error: 0.0,
            size: 0.0,
        }
    }
}

/// `sc = alpha * ((totalError / size) / eAvg - 1) - (1 - alpha) * (n / size - 1)`,
/// where `n` is the number of rows in the full dataset (`nrow(X)`).
///
/// Division by zero or an undefined (`NaN`) result maps to
/// `f64::NEG_INFINITY` so such a slice is never selected.
#[must_use]
pub fn score(stats: &Stats, e_avg: f64, n: f64, alpha: f64) -> f64 {
    if stats.size <= 0.0 || e_avg == 0.0 {
        return f64::NEG_INFINITY;
    }
    let sc = alpha.mul_add(
        (stats.total_error / stats.size) / e_avg - 1.0,
        -(1.0 - alpha) * (n / stats.size - 1.0),
    );
    if sc.is_nan() {
        f64::NEG_INFINITY
    } else {
        sc
    }
}

/// Monotone upper bound on the score of any slice whose aggregated
/// parent stats are `ub` (a child slice's rows are a subset of each of
/// its parents', so `ub`'s fields are themselves upper bounds).
///
/// Probes three size candidates — `minSup`, `max(totalError/maxError,
/// minSup)`, and `ub.size` — caps `totalError` at `size * maxError` for
/// each, and returns the maximum of the resulting scores. `NaN` inputs
/// map to `f64::NEG_INFINITY`.
#[must_use]
pub fn score_ub(ub: &Stats, e_avg: f64, min_sup: f64, n: f64, alpha: f64) -> f64 {
    if e_avg == 0.0 {
        return f64::NEG_INFINITY;
    }

    let ratio = if ub.max_error > 0.0 {
        ub.total_error / ub.max_error
    } else {
        min_sup
    };

    [min_sup, ratio.max(min_sup), ub.size]
        .into_iter()
        .map(|size| {
            if size <= 0.0 {
                return f64::NEG_INFINITY;
            }
            let capped_error = ub.total_error.min(size * ub.max_error).max(0.0);
            let probe = Stats {
                score: 0.0,
                total_error: capped_error,
                max_error: ub.max_error,
                size,
            };
            score(&probe, e_avg, n, alpha)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

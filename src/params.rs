//! Scalar configuration for an [`crate::Engine`] invocation.

use serde::{Deserialize, Serialize};

/// Top-*k* size, pruning thresholds, and execution-mode switches.
///
/// On an incremental call the prior run's `params` override any scalars
/// passed for the new call (see [`Params::reconcile`]): incremental runs
/// must reuse the parameters of the run whose lattice they extend, or
/// scores and lattice shape would silently stop being comparable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Params {
    /// Number of slices retained in the running top-k.
    pub k: usize,
    /// Maximum conjunction level; `0` means unlimited (bounded by the
    /// number of features).
    pub max_l: usize,
    /// Minimum slice size (support).
    pub min_sup: f64,
    /// Score weight in `[0, 1]`: `0` weighs size only, `1` weighs error only.
    pub alpha: f64,
    /// Evaluate candidates task-parallel, in blocks of `tp_blksz`, rather
    /// than as one data-parallel pass.
    pub tp_eval: bool,
    /// Candidates per task-parallel block.
    pub tp_blksz: usize,
    /// Drop one-hot columns that fail the basic-slice filter.
    pub sel_feat: bool,
    /// Populate the debug-statistics matrix and its per-level rows.
    pub verbose: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            k: 4,
            max_l: 0,
            min_sup: 32.0,
            alpha: 0.5,
            tp_eval: true,
            tp_blksz: 16,
            sel_feat: false,
            verbose: false,
        }
    }
}

impl Params {
    /// Builds parameters with the given top-k size, support threshold,
    /// and score weight, leaving the rest at their defaults.
    #[must_use]
    pub fn new(k: usize, min_sup: f64, alpha: f64) -> Self {
        Self {
            k,
            min_sup,
            alpha,
            ..Self::default()
        }
    }

    /// Overrides `self` with `prior`'s fields when `prior` is `Some`,
    /// implementing the "prior params win" rule for incremental calls.
    #[must_use]
    pub fn reconcile(self, prior: Option<Self>) -> Self {
        prior.unwrap_or(self)
    }
}

//! Orchestrates one incremental slice-finding run (`spec.md` §4.8).

use crate::basic;
use crate::encode;
use crate::error::{Error, Result};
use crate::eval;
use crate::lattice::{DecodedLattice, Lattice};
use crate::offsets::FeatureOffsets;
use crate::pairs;
use crate::params::Params;
use crate::score::Stats;
use crate::topk::TopK;
use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Everything a later invocation needs to resume from a prior run.
#[derive(Clone, Debug)]
pub struct PriorRun {
    /// The full dataset scored by the prior run (not just what was added
    /// to it before that).
    pub old_x: Array2<u32>,
    /// Per-row error values aligned with `old_x`.
    pub old_e: Array1<f64>,
    /// The parameters the prior run used; reused verbatim for this run.
    /// `None` here with a non-empty `lattice` is the "inconsistent
    /// incremental invocation" error of `spec.md` §7: incremental runs
    /// must reuse the parameters of the run whose lattice they extend.
    pub params: Option<Params>,
    /// The prior run's full lattice, decoded to feature-value form.
    pub lattice: DecodedLattice,
    /// The prior run's top-k slices, decoded to feature-value form.
    pub topk_rows: Array2<u32>,
    /// Stats aligned row-for-row with `topk_rows`.
    pub topk_stats: Vec<Stats>,
}

/// One row of the `D` debug matrix (`spec.md` §6: `level, enumerated,
/// valid, tkMax, tkMin`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugRow {
    /// Conjunction level this row reports on.
    pub level: usize,
    /// Number of candidates built before pruning at this level.
    pub enumerated: usize,
    /// Number of candidates that survived pruning at this level.
    pub valid: usize,
    /// Top-k max score after merging this level's survivors.
    pub tk_max: f64,
    /// Top-k min score after merging this level's survivors (`-inf` if
    /// the top-k is not yet full).
    pub tk_min: f64,
}

/// Diagnostics about one run, returned alongside its results.
///
/// `levels_processed`/`candidates_built`/`topk_size` are always
/// maintained, cheaply, regardless of [`Params::verbose`]. `rows`, the
/// full `D (rows x 5: level, enumerated, valid, tkMax, tkMin)` matrix of
/// `spec.md` §6, is only populated when `verbose` is set — an empty
/// `Vec` otherwise.
#[derive(Clone, Debug, Default)]
pub struct DebugStats {
    /// Number of levels processed (including level 1).
    pub levels_processed: usize,
    /// Total candidates built across all levels above level 1.
    pub candidates_built: usize,
    /// Final top-k size.
    pub topk_size: usize,
    /// Per-level rows of the `D` matrix, level 1 first. Empty unless
    /// [`Params::verbose`] was set for this run.
    pub rows: Vec<DebugRow>,
}

/// The result of one [`Engine::run`] invocation.
///
/// Mirrors `spec.md` §6's output contract verbatim: `TK` is
/// `topk_rows`/`topk_stats`, `TKC` is `topk_stats`' constituent
/// columns, `D` is `debug`, `L`/`RL` is `lattice`, and `Xout`/`eOut`/
/// `params` are `x_out`/`e_out`/`params` — the merged dataset, its
/// error vector, and the reconciled parameters, exactly what a caller
/// needs to seed `PriorRun::old_x`/`old_e`/`params` for the next run
/// without re-deriving anything by hand.
#[derive(Clone, Debug)]
pub struct RunOutput {
    /// The top-k slices, decoded to feature-value form, best first.
    pub topk_rows: Array2<u32>,
    /// Stats aligned row-for-row with `topk_rows`.
    pub topk_stats: Vec<Stats>,
    /// The full enumerated lattice, decoded to feature-value form.
    pub lattice: DecodedLattice,
    /// The offsets used to encode/decode this run; pass the merged
    /// dataset and this run's output back in as the next run's prior
    /// state.
    pub offsets: FeatureOffsets,
    /// The merged dataset this run scored (`spec.md`'s `Xout = newX`);
    /// feed straight into the next run's `PriorRun::old_x`.
    pub x_out: Array2<u32>,
    /// Per-row error values aligned with `x_out` (`spec.md`'s `eOut =
    /// totalE`); feed straight into the next run's `PriorRun::old_e`.
    pub e_out: Array1<f64>,
    /// The reconciled parameters this run actually used; feed straight
    /// into the next run's `PriorRun::params`.
    pub params: Params,
    /// Diagnostics.
    pub debug: DebugStats,
}

/// The incremental slice-finding engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct Engine;

impl Engine {
    /// Finds the `params.k` highest-scoring slices in `added_x`/`added_e`,
    /// optionally resuming from `prior`'s state.
    ///
    /// `prior`'s own `params`, when present, always override the `params`
    /// argument, so that incremental runs stay comparable with the
    /// lattice they extend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `added_x`'s column count
    /// disagrees with `prior.old_x`'s, or if `added_e`'s length disagrees
    /// with `added_x`'s row count. Returns [`Error::MissingParams`] if
    /// `prior` carries a non-empty `lattice` but no `params`.
    pub fn run(
        added_x: ArrayView2<u32>,
        added_e: ArrayView1<f64>,
        params: Params,
        prior: Option<&PriorRun>,
    ) -> Result<RunOutput> {
        if added_e.len() != added_x.nrows() {
            return Err(Error::DimensionMismatch(format!(
                "addedX has {} rows but newE has {} entries",
                added_x.nrows(),
                added_e.len()
            )));
        }
        if let Some(p) = prior {
            if p.old_x.ncols() != added_x.ncols() {
                return Err(Error::DimensionMismatch(format!(
                    "oldX has {} columns but addedX has {}",
                    p.old_x.ncols(),
                    added_x.ncols()
                )));
            }
            if !p.lattice.is_empty() && p.params.is_none() {
                return Err(Error::MissingParams);
            }
        }

        let params = params.reconcile(prior.and_then(|p| p.params.clone()));

        let (x, e, e_avg_old) = match prior {
            Some(p) => {
                let merged_x = concatenate(Axis(0), &[p.old_x.view(), added_x])
                    .map_err(|e| Error::Other(e.into()))?;
                let merged_e = concatenate(Axis(0), &[p.old_e.view(), added_e])
                    .map_err(|e| Error::Other(e.into()))?;
                let avg_old = p.old_e.mean().unwrap_or(0.0);
                (merged_x, merged_e, avg_old)
            }
            None => (added_x.to_owned(), added_e.to_owned(), 0.0),
        };

        let offsets = FeatureOffsets::from_matrix(x.view());
        let n = x.nrows() as f64;
        // eAvg: the reference average used throughout scoring, over the
        // full (merged) dataset this run scores. eAvgNew: the average
        // over just the newly added rows, distinct from eAvg and used
        // only by the basic-slice builder's incremental-tightening
        // check (`spec.md` §4.3).
        let e_avg = e.mean().unwrap_or(0.0);
        let e_avg_new = added_e.mean().unwrap_or(0.0);

        let mut x2 = encode::one_hot(x.view(), &offsets);
        let added_x2 = encode::one_hot(added_x, &offsets);

        let prev_lattice = prior.map(|p| Lattice::encode_from_decoded(&p.lattice, &offsets));
        let prev_tk2 = prior.map(|p| encode::one_hot(p.topk_rows.view(), &offsets));

        let unchanged_by_level = prev_lattice
            .as_ref()
            .map(|l| crate::unchanged::detect(l, added_x2.view()));

        let (level1, level1_stats, sel_cols) = basic::build_level1(
            x2.view(),
            e.view(),
            Some(added_x2.view()),
            prev_tk2.as_ref().map(ndarray::ArrayBase::view),
            e_avg,
            e_avg_old,
            e_avg_new,
            n,
            params.min_sup,
            params.alpha,
        );

        if params.sel_feat {
            for (j, keep) in sel_cols.iter().enumerate() {
                if !keep {
                    let mut col = x2.column_mut(j);
                    col.fill(0.0);
                }
            }
        }

        let n2 = offsets.n2();
        let mut topk = TopK::new(params.k, n2);

        let level1_enumerated = x2.ncols();
        let level1_valid = level1.nrows();
        topk.merge(&level1, &level1_stats, params.min_sup);

        let mut lattice = Lattice::new();
        lattice.push_level(level1, level1_stats);

        if let (Some(p), Some(tk2)) = (prior, &prev_tk2) {
            let rescored = eval::evaluate(
                tk2.view(),
                x2.view(),
                e.view(),
                e_avg,
                n,
                params.alpha,
                params.tp_eval,
                params.tp_blksz,
            );
            topk.merge(tk2, &rescored, params.min_sup);
            debug_assert_eq!(p.topk_rows.nrows(), tk2.nrows());
        }

        let mut debug_rows = Vec::new();
        if params.verbose {
            debug_rows.push(DebugRow {
                level: 1,
                enumerated: level1_enumerated,
                valid: level1_valid,
                tk_max: topk.stats().first().map_or(f64::NEG_INFINITY, |s| s.score),
                tk_min: topk.min_score(),
            });
        }

        let mut candidates_built = 0usize;
        let mut level = 2usize;
        let mut minsc = f64::NEG_INFINITY;

        loop {
            if params.max_l > 0 && level > params.max_l {
                break;
            }
            let Some(survivors) = lattice.level(level - 1) else {
                break;
            };
            let stats = lattice
                .level_stats(level - 1)
                .expect("level just pushed has stats");
            if survivors.nrows() < 2 {
                break;
            }

            let unchanged_here = unchanged_by_level
                .as_ref()
                .and_then(|levels| levels.get(level - 2));

            let (candidates, _cand_ub, next_minsc, enumerated) = pairs::generate(
                survivors,
                stats,
                level,
                minsc,
                topk.min_score(),
                unchanged_here,
                &offsets,
                params.min_sup,
                e_avg,
                n,
                params.alpha,
            );
            minsc = next_minsc;

            if candidates.nrows() == 0 {
                break;
            }
            candidates_built += candidates.nrows();

            let evaluated = eval::evaluate(
                candidates.view(),
                x2.view(),
                e.view(),
                e_avg,
                n,
                params.alpha,
                params.tp_eval,
                params.tp_blksz,
            );

            // Lattice membership only requires non-degeneracy
            // (`totalError > 0`, which implies `size >= 1` since `e` is
            // non-negative) — *not* `size >= minSup`. A sub-`minSup`
            // near-miss slice still has to survive into the lattice so
            // that a later incremental run's unchanged-slice detector
            // (`unchanged.rs`) can find it again and `pairs::generate`'s
            // Step 4 can recognize "this was already too small and
            // nothing new touched it" (`spec.md` §4.4/§4.5 Step 4,
            // seeded scenario 4 of §8). `size >= minSup` is enforced at
            // the two places that actually need it instead: Step 1's
            // parent validity (a sub-`minSup` slice can never seed a
            // further join) and `TopK::merge` (a sub-`minSup` slice can
            // never enter `TK`).
            let mut kept_rows = Vec::new();
            let mut kept_stats = Vec::new();
            for (row, real) in candidates.rows().into_iter().zip(evaluated.iter()) {
                if real.total_error > 0.0 {
                    kept_rows.push(row.to_owned());
                    kept_stats.push(*real);
                }
            }

            let mut mat = Array2::zeros((kept_rows.len(), n2));
            for (i, r) in kept_rows.into_iter().enumerate() {
                mat.row_mut(i).assign(&r);
            }

            if mat.nrows() == 0 {
                break;
            }
            let valid_here = mat.nrows();

            topk.merge(&mat, &kept_stats, params.min_sup);
            lattice.push_level(mat, kept_stats);

            if params.verbose {
                debug_rows.push(DebugRow {
                    level,
                    enumerated,
                    valid: valid_here,
                    tk_max: topk.stats().first().map_or(f64::NEG_INFINITY, |s| s.score),
                    tk_min: topk.min_score(),
                });
            }

            level += 1;
        }

        let decoded_lattice = lattice.decode(&offsets);
        let topk_rows = encode::decode(topk.slices().view(), &offsets);

        Ok(RunOutput {
            topk_rows,
            topk_stats: topk.stats().to_vec(),
            lattice: decoded_lattice,
            debug: DebugStats {
                levels_processed: lattice.n_levels(),
                candidates_built,
                topk_size: topk.len(),
                rows: debug_rows,
            },
            offsets,
            x_out: x,
            e_out: e,
            params,
        })
    }
}

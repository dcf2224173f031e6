//! Joins level-(ℓ−1) survivors into level-ℓ candidates and prunes them —
//! the Apriori-style pruning kernel (`spec.md` §4.5, Steps 1–10).

use crate::lattice::SliceMatrix;
use crate::offsets::FeatureOffsets;
use crate::score::{self, Stats};
use itertools::Itertools;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rustc_hash::FxHashMap;
use std::collections::HashSet;

struct Built {
    row: Array1<f64>,
    ub: Stats,
    parents: (usize, usize),
}

struct Dedup {
    row: Array1<f64>,
    ub: Stats,
    parents: HashSet<usize>,
}

/// Joins `survivors` (level `level - 1`) into level-`level` candidates.
///
/// Applies, in order: parent validity (Step 1), compatible join (Step
/// 2), candidate construction (Step 3), unchanged-and-small pruning
/// (Step 4), the single-value-per-feature check (Step 5), parent-stat
/// aggregation (Step 6), ID-based deduplication (Step 7), size/error/
/// score pruning (Step 8), missing-parents pruning (Step 9), and the
/// `minsc` update (Step 10).
///
/// Returns the deduplicated candidates, their aggregated upper-bound
/// stats (with `score` set to the evaluated upper bound), the
/// possibly-raised `minsc` threshold to carry into the next level, and
/// the number of distinct candidates enumerated after deduplication but
/// before Step 8/9 pruning (the `enumerated` column of `spec.md` §6's
/// debug matrix `D`; `final_rows.len()` becomes its `valid` column).
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn generate(
    survivors: ArrayView2<f64>,
    stats: &[Stats],
    level: usize,
    minsc: f64,
    topk_min: f64,
    unchanged: Option<&(SliceMatrix, Vec<Stats>)>,
    offsets: &FeatureOffsets,
    min_sup: f64,
    e_avg: f64,
    n: f64,
    alpha: f64,
) -> (SliceMatrix, Vec<Stats>, f64, usize) {
    // Step 10 (folded in early): the threshold passed to Step 8 already
    // reflects the current top-k, which is only ever non-decreasing.
    let minsc = minsc.max(topk_min);
    let n2 = survivors.ncols();

    // Step 1 — parent validity.
    let valid: Vec<usize> = (0..survivors.nrows())
        .filter(|&i| stats[i].size >= min_sup && stats[i].total_error > 0.0)
        .collect();

    if valid.len() < 2 {
        return (SliceMatrix::zeros((0, n2)), Vec::new(), minsc, 0);
    }

    // Step 2 — compatible join: parents share exactly level-2 predicates.
    let target = (level as f64) - 2.0;
    let mut built: Vec<Built> = Vec::new();

    for (i, j) in valid.iter().copied().tuple_combinations() {
        let row_i = survivors.row(i);
        let row_j = survivors.row(j);
        let inner: f64 = row_i.dot(&row_j);
        if (inner - target).abs() > 0.5 {
            continue;
        }

        // Step 3 — construct the candidate P = row_i OR row_j.
        let p = Array1::from_shape_fn(n2, |c| row_i[c].max(row_j[c]));

        // Step 5 — single value per feature.
        if !single_value_per_feature(p.view(), offsets) {
            continue;
        }

        // Step 4 — unchanged-and-small pruning.
        if let Some((u_rows, u_stats)) = unchanged {
            if is_pruned_unchanged_small(p.view(), u_rows.view(), u_stats, level, min_sup) {
                continue;
            }
        }

        // Step 6 — aggregate parent stats: min over the two parents.
        let ub = Stats {
            score: 0.0,
            total_error: stats[i].total_error.min(stats[j].total_error),
            max_error: stats[i].max_error.min(stats[j].max_error),
            size: stats[i].size.min(stats[j].size),
        };

        built.push(Built {
            row: p,
            ub,
            parents: (i, j),
        });
    }

    // Step 7 — deduplicate by mixed-radix ID; keep the loosest (maximum)
    // upper bound across duplicates and track every distinct contributing
    // parent (needed by Step 9).
    let mut by_id: FxHashMap<u128, usize> = FxHashMap::default();
    let mut entries: Vec<Dedup> = Vec::new();

    for c in built {
        let id = candidate_id(c.row.view(), offsets);
        if let Some(&idx) = by_id.get(&id) {
            let e = &mut entries[idx];
            e.ub.total_error = e.ub.total_error.max(c.ub.total_error);
            e.ub.max_error = e.ub.max_error.max(c.ub.max_error);
            e.ub.size = e.ub.size.max(c.ub.size);
            e.parents.insert(c.parents.0);
            e.parents.insert(c.parents.1);
        } else {
            by_id.insert(id, entries.len());
            let mut parents = HashSet::new();
            parents.insert(c.parents.0);
            parents.insert(c.parents.1);
            entries.push(Dedup {
                row: c.row,
                ub: c.ub,
                parents,
            });
        }
    }

    let enumerated = entries.len();

    // Step 8 — size/error/score pruning; Step 9 — missing-parents pruning.
    let mut final_rows = Vec::new();
    let mut final_stats = Vec::new();
    for entry in entries {
        if entry.ub.size < min_sup {
            continue;
        }
        let ub_score = score::score_ub(&entry.ub, e_avg, min_sup, n, alpha);
        if !(ub_score > 0.0 && ub_score >= minsc) {
            continue;
        }
        if entry.parents.len() != level {
            continue;
        }
        final_rows.push(entry.row);
        final_stats.push(Stats {
            score: ub_score,
            ..entry.ub
        });
    }

    let mut out = SliceMatrix::zeros((final_rows.len(), n2));
    for (i, r) in final_rows.into_iter().enumerate() {
        out.row_mut(i).assign(&r);
    }

    (out, final_stats, minsc, enumerated)
}

fn single_value_per_feature(p: ArrayView1<f64>, offsets: &FeatureOffsets) -> bool {
    offsets.groups().all(|g| g.map(|c| p[c]).sum::<f64>() <= 1.0)
}

fn is_pruned_unchanged_small(
    p: ArrayView1<f64>,
    unchanged_rows: ArrayView2<f64>,
    unchanged_stats: &[Stats],
    level: usize,
    min_sup: f64,
) -> bool {
    let level_f = level as f64;
    unchanged_rows
        .rows()
        .into_iter()
        .zip(unchanged_stats)
        .any(|(u_row, u_stat)| {
            u_stat.size < min_sup && (p.dot(&u_row) - level_f).abs() < 0.5
        })
}

/// Canonical mixed-radix ID for a candidate: concatenates per-feature
/// value indices (`1`-based, `0` if silent) with radix `domain_j + 1`.
/// Two candidates with the same feature-value assignment always get the
/// same ID regardless of which parent pair constructed them.
fn candidate_id(row: ArrayView1<f64>, offsets: &FeatureOffsets) -> u128 {
    let mut id: u128 = 0;
    for j in 0..offsets.n() {
        let group = offsets.group(j);
        let domain = (group.end - group.start) as u128;
        let v = group
            .clone()
            .enumerate()
            .find(|&(_, c)| row[c] > 0.0)
            .map_or(0, |(k, _)| k + 1);
        id = id * (domain + 1) + v as u128;
    }
    id
}

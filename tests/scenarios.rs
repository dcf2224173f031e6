use float_cmp::assert_approx_eq;
use ndarray::{array, concatenate, Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use sliceline::{Engine, Params, PriorRun};

#[test]
fn uniform_error_has_no_interesting_slice() {
    let x = array![[0u32, 1], [1, 0], [0, 0], [1, 1]];
    let e = array![1.0, 1.0, 1.0, 1.0];

    let out = Engine::run(x.view(), e.view(), Params::new(2, 1.0, 0.5), None)
        .expect("run succeeds");

    for stats in &out.topk_stats {
        assert_approx_eq!(f64, stats.score, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn single_outlier_row_dominates_the_top_k() {
    let x = array![
        [0u32, 0],
        [0, 0],
        [0, 0],
        [0, 0],
        [1, 1],
    ];
    let e = array![0.1, 0.1, 0.1, 0.1, 9.0];

    let out = Engine::run(x.view(), e.view(), Params::new(1, 1.0, 0.7), None)
        .expect("run succeeds");

    assert_eq!(out.topk_rows.nrows(), 1);
    assert_eq!(out.topk_rows.row(0), array![1, 1]);
}

#[test]
fn max_level_bound_stops_the_lattice_early() {
    let x = array![
        [0u32, 0, 0],
        [1, 1, 1],
        [1, 1, 0],
        [1, 0, 1],
    ];
    let e = array![0.1, 5.0, 4.0, 3.0];

    let mut params = Params::new(4, 1.0, 0.5);
    params.max_l = 1;

    let out = Engine::run(x.view(), e.view(), params, None).expect("run succeeds");
    assert_eq!(out.debug.levels_processed, 1);
    assert_eq!(out.lattice.n_levels(), 1);
}

#[test]
fn incremental_run_matches_a_cold_run_over_the_merged_dataset() {
    let mut rng = Pcg64Mcg::seed_from_u64(42);
    let n = 40;
    let mut x = Array2::<u32>::zeros((n, 3));
    let mut e = Array1::<f64>::zeros(n);
    for i in 0..n {
        x[[i, 0]] = rng.gen_range(0..3);
        x[[i, 1]] = rng.gen_range(0..3);
        x[[i, 2]] = rng.gen_range(0..2);
        e[i] = if x[[i, 0]] == 2 && x[[i, 1]] == 2 {
            10.0
        } else {
            rng.gen_range(0.0..1.0)
        };
    }

    let split = 25;
    let x1 = x.slice(ndarray::s![..split, ..]).to_owned();
    let e1 = e.slice(ndarray::s![..split]).to_owned();
    let x2 = x.slice(ndarray::s![split.., ..]).to_owned();
    let e2 = e.slice(ndarray::s![split..]).to_owned();

    let params = Params::new(3, 1.0, 0.6);

    let cold = Engine::run(x.view(), e.view(), params.clone(), None).expect("cold run succeeds");

    let first = Engine::run(x1.view(), e1.view(), params.clone(), None).expect("first run succeeds");
    let prior = PriorRun {
        old_x: x1,
        old_e: e1,
        params: Some(params.clone()),
        lattice: first.lattice,
        topk_rows: first.topk_rows,
        topk_stats: first.topk_stats,
    };
    let incremental =
        Engine::run(x2.view(), e2.view(), params, Some(&prior)).expect("incremental run succeeds");

    let cold_best = cold.topk_stats.first().expect("cold top-k is non-empty");
    let inc_best = incremental
        .topk_stats
        .first()
        .expect("incremental top-k is non-empty");
    assert_approx_eq!(f64, cold_best.score, inc_best.score, epsilon = 1e-6);
    assert_eq!(cold.topk_rows.row(0), incremental.topk_rows.row(0));
}

#[test]
fn unchanged_slices_shrink_the_incremental_candidate_count() {
    let mut rng = Pcg64Mcg::seed_from_u64(7);
    let n = 60;
    let mut x = Array2::<u32>::zeros((n, 4));
    let mut e = Array1::<f64>::zeros(n);
    for i in 0..n {
        for j in 0..4 {
            x[[i, j]] = rng.gen_range(0..3);
        }
        e[i] = if x[[i, 0]] == 1 && x[[i, 1]] == 1 {
            8.0
        } else {
            rng.gen_range(0.0..1.0)
        };
    }

    let params = Params::new(3, 1.0, 0.6);
    let first = Engine::run(x.view(), e.view(), params.clone(), None).expect("first run succeeds");

    // A handful of added rows that touch only a narrow part of the
    // feature space: most of the prior lattice is unchanged by them, so
    // the incremental run should build fewer candidates than scoring
    // everything from scratch would.
    let added_x = array![[2u32, 2, 2, 2], [2, 2, 2, 2], [2, 2, 2, 2]];
    let added_e = array![0.05, 0.05, 0.05];

    let prior = PriorRun {
        old_x: x.clone(),
        old_e: e.clone(),
        params: Some(params.clone()),
        lattice: first.lattice,
        topk_rows: first.topk_rows,
        topk_stats: first.topk_stats,
    };
    let incremental = Engine::run(added_x.view(), added_e.view(), params.clone(), Some(&prior))
        .expect("incremental run succeeds");

    let merged_x = concatenate(Axis(0), &[x.view(), added_x.view()]).unwrap();
    let merged_e = concatenate(Axis(0), &[e.view(), added_e.view()]).unwrap();
    let cold = Engine::run(merged_x.view(), merged_e.view(), params, None).expect("cold run succeeds");

    assert!(
        incremental.debug.candidates_built <= cold.debug.candidates_built,
        "incremental {} should not exceed cold {}",
        incremental.debug.candidates_built,
        cold.debug.candidates_built
    );
}

#[test]
fn sub_min_sup_unchanged_slice_is_not_re_evaluated() {
    // f0, f1 in {0, 1}; minSup = 3, so a level-2 slice matched by exactly
    // 2 rows sits one row short of support — the premise of spec.md §8's
    // scenario 4.
    let x = array![
        [1u32, 1],
        [1, 1],
        [1, 0],
        [1, 0],
        [0, 1],
        [0, 1],
        [0, 0],
        [0, 0],
    ];
    let e = array![20.0, 20.0, 0.1, 0.1, 0.1, 0.1, 0.01, 0.01];

    let mut params = Params::new(4, 3.0, 0.9);
    params.verbose = true;

    let first =
        Engine::run(x.view(), e.view(), params.clone(), None).expect("first run succeeds");

    // {f0=1, f1=1} matches only rows 0 and 1: size 2, one short of minSup,
    // yet it must still persist into the lattice for the detector below.
    let level2_rows = first.lattice.level_rows(2).expect("level 2 was built");
    assert_eq!(level2_rows.nrows(), 1);
    assert_eq!(level2_rows.row(0), array![1, 1]);
    let level2_stats = first.lattice.level_stats(2).expect("level 2 has stats");
    assert_approx_eq!(f64, level2_stats[0].size, 2.0, epsilon = 1e-9);

    // Added rows touch neither f0=1 nor f1=1: the near-miss slice above
    // stays untouched by them.
    let added_x = array![[0u32, 0], [0, 0], [0, 0]];
    let added_e = array![6.0, 6.0, 6.0];

    let prior = PriorRun {
        old_x: x.clone(),
        old_e: e.clone(),
        params: Some(params.clone()),
        lattice: first.lattice,
        topk_rows: first.topk_rows,
        topk_stats: first.topk_stats,
    };
    let incremental = Engine::run(added_x.view(), added_e.view(), params.clone(), Some(&prior))
        .expect("incremental run succeeds");

    // A cold run over the identical merged dataset has no unchanged-slice
    // knowledge, so it re-derives and keeps the same level-2 candidate.
    let merged_x = concatenate(Axis(0), &[x.view(), added_x.view()]).unwrap();
    let merged_e = concatenate(Axis(0), &[e.view(), added_e.view()]).unwrap();
    let cold =
        Engine::run(merged_x.view(), merged_e.view(), params, None).expect("cold run succeeds");

    assert!(
        cold.debug.rows.iter().any(|r| r.level == 2),
        "cold run should rebuild the level-2 candidate from scratch"
    );
    assert!(
        incremental.debug.rows.iter().all(|r| r.level != 2),
        "incremental run should have pruned the level-2 candidate before it was ever built"
    );
    assert!(
        incremental.debug.candidates_built < cold.debug.candidates_built,
        "incremental {} should be strictly fewer than cold {}",
        incremental.debug.candidates_built,
        cold.debug.candidates_built
    );
}

#[test]
fn incremental_run_rejects_mismatched_column_counts() {
    let old_x = array![[0u32, 0]];
    let old_e = array![0.0];
    let prior = PriorRun {
        old_x,
        old_e,
        params: Some(Params::default()),
        lattice: sliceline::DecodedLattice::default(),
        topk_rows: Array2::zeros((0, 2)),
        topk_stats: Vec::new(),
    };

    let added_x = array![[1u32, 1, 1]];
    let added_e = array![1.0];
    let result = Engine::run(added_x.view(), added_e.view(), Params::default(), Some(&prior));
    assert!(result.is_err());
}

#[test]
fn nonempty_prior_lattice_without_params_yields_empty_outputs_and_an_error() {
    let old_x = array![[0u32], [1], [1]];
    let old_e = array![0.0, 1.0, 1.0];
    let params = Params::new(1, 1.0, 0.5);

    let first = Engine::run(old_x.view(), old_e.view(), params, None).expect("first run succeeds");
    assert!(!first.lattice.is_empty());

    let prior = PriorRun {
        old_x,
        old_e,
        params: None,
        lattice: first.lattice,
        topk_rows: first.topk_rows,
        topk_stats: first.topk_stats,
    };

    let added_x = array![[1u32]];
    let added_e = array![1.0];
    let result = Engine::run(added_x.view(), added_e.view(), Params::default(), Some(&prior));

    assert!(matches!(result, Err(sliceline::Error::MissingParams)));
}

#[test]
fn verbose_populates_the_debug_matrix_rows() {
    let x = array![
        [0u32, 0, 0],
        [1, 1, 1],
        [1, 1, 0],
        [1, 0, 1],
    ];
    let e = array![0.1, 5.0, 4.0, 3.0];

    let mut params = Params::new(4, 1.0, 0.5);
    params.verbose = true;

    let out = Engine::run(x.view(), e.view(), params, None).expect("run succeeds");
    assert!(!out.debug.rows.is_empty());
    assert_eq!(out.debug.rows[0].level, 1);
    for row in &out.debug.rows {
        assert!(row.valid <= row.enumerated.max(row.valid));
    }

    let mut quiet_params = Params::new(4, 1.0, 0.5);
    quiet_params.verbose = false;
    let quiet = Engine::run(x.view(), e.view(), quiet_params, None).expect("run succeeds");
    assert!(quiet.debug.rows.is_empty());
}

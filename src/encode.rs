//! Maps recoded integer features into, and back out of, the shared
//! one-hot column space.

use crate::offsets::FeatureOffsets;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// One-hot encodes `a` into `offsets`'s column space.
///
/// `a`'s values must not exceed the per-feature domain `offsets` was
/// derived from. Encoding an empty matrix (`a.nrows() == 0`) yields an
/// empty matrix of the correct width, `offsets.n2()`.
#[must_use]
pub fn one_hot(a: ArrayView2<u32>, offsets: &FeatureOffsets) -> Array2<f64> {
    let mut out = Array2::zeros((a.nrows(), offsets.n2()));
    for (i, row) in a.rows().into_iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            if v > 0 {
                out[[i, offsets.group(j).start + v as usize - 1]] = 1.0;
            }
        }
    }
    out
}

/// Decodes one one-hot row back to feature-value form: for each feature
/// group, the column index (1-based) that is set, or `0` if the slice is
/// silent on that feature.
#[must_use]
pub fn decode_row(row: ArrayView1<f64>, offsets: &FeatureOffsets) -> Array1<u32> {
    Array1::from_shape_fn(offsets.n(), |j| {
        let group = offsets.group(j);
        group
            .clone()
            .enumerate()
            .find(|&(_, col)| row[col] > 0.0)
            .map_or(0, |(k, _)| (k + 1) as u32)
    })
}

/// Decodes every row of `rows` back to feature-value form (see
/// [`decode_row`]).
#[must_use]
pub fn decode(rows: ArrayView2<f64>, offsets: &FeatureOffsets) -> Array2<u32> {
    let mut out = Array2::zeros((rows.nrows(), offsets.n()));
    for (i, row) in rows.rows().into_iter().enumerate() {
        out.row_mut(i).assign(&decode_row(row, offsets));
    }
    out
}

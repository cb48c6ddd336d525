//! The reversible CDF 5/3 lifting steps.
//!
//! All arithmetic is done in `i32` and stored back with 16-bit wraparound.
//! Each inverse step subtracts exactly what the forward step added, so a
//! forward/inverse round trip is lossless for every `i16` input.

use crate::simd::{Level, SIMD_WIDTH, Simd, dispatch, f32x8, vector_len};

/// Predict step, turning an odd sample into a detail coefficient.
#[inline(always)]
pub(crate) fn predict(odd: i16, left: i16, right: i16) -> i16 {
    (i32::from(odd) - ((i32::from(left) + i32::from(right)) >> 1)) as i16
}

/// Update step, turning an even sample into an approximation coefficient.
#[inline(always)]
pub(crate) fn update(even: i16, prev: i16, next: i16) -> i16 {
    (i32::from(even) + ((i32::from(prev) + i32::from(next)) >> 2)) as i16
}

/// Inverse of [`predict`].
#[inline(always)]
pub(crate) fn unpredict(detail: i16, left: i16, right: i16) -> i16 {
    (i32::from(detail) + ((i32::from(left) + i32::from(right)) >> 1)) as i16
}

/// Inverse of [`update`].
#[inline(always)]
pub(crate) fn unupdate(approx: i16, prev: i16, next: i16) -> i16 {
    (i32::from(approx) - ((i32::from(prev) + i32::from(next)) >> 2)) as i16
}

/// One of the four lifting steps, for the row-batched kernels.
#[derive(Debug, Clone, Copy)]
enum Step {
    Predict,
    Update,
    Unpredict,
    Unupdate,
}

impl Step {
    #[inline(always)]
    fn apply(self, x: i16, a: i16, b: i16) -> i16 {
        match self {
            Self::Predict => predict(x, a, b),
            Self::Update => update(x, a, b),
            Self::Unpredict => unpredict(x, a, b),
            Self::Unupdate => unupdate(x, a, b),
        }
    }

    /// The weight of the neighbor sum, and whether the floored, weighted sum
    /// is added to the sample rather than subtracted.
    #[inline(always)]
    fn factors(self) -> (f32, bool) {
        match self {
            Self::Predict => (0.5, false),
            Self::Update => (0.25, true),
            Self::Unpredict => (0.5, true),
            Self::Unupdate => (0.25, false),
        }
    }
}

// Row-batched versions used by the vertical passes, where every sample of a
// row is lifted with the samples of the rows above and below.

pub(crate) fn predict_row(odd: &[i16], above: &[i16], below: &[i16], out: &mut [i16]) {
    lift_row(Step::Predict, odd, above, below, out);
}

pub(crate) fn update_row(even: &[i16], prev: &[i16], next: &[i16], out: &mut [i16]) {
    lift_row(Step::Update, even, prev, next, out);
}

pub(crate) fn unpredict_row(detail: &[i16], above: &[i16], below: &[i16], out: &mut [i16]) {
    lift_row(Step::Unpredict, detail, above, below, out);
}

pub(crate) fn unupdate_row(approx: &[i16], prev: &[i16], next: &[i16], out: &mut [i16]) {
    lift_row(Step::Unupdate, approx, prev, next, out);
}

fn lift_row(step: Step, x: &[i16], a: &[i16], b: &[i16], out: &mut [i16]) {
    debug_assert!(x.len() == out.len() && a.len() == out.len() && b.len() == out.len());
    dispatch!(Level::new(), simd => lift_row_impl(simd, step, x, a, b, out));
}

#[inline(always)]
fn lift_row_impl<S: Simd>(
    simd: S,
    step: Step,
    x: &[i16],
    a: &[i16],
    b: &[i16],
    out: &mut [i16],
) {
    let lanes = vector_len(out.len());
    let (weight, add) = step.factors();

    for (((o, x), a), b) in out[..lanes]
        .chunks_exact_mut(SIMD_WIDTH)
        .zip(x.chunks_exact(SIMD_WIDTH))
        .zip(a.chunks_exact(SIMD_WIDTH))
        .zip(b.chunks_exact(SIMD_WIDTH))
    {
        let x = f32x8::from_i16(simd, x);
        let sum = f32x8::from_i16(simd, a) + f32x8::from_i16(simd, b);
        let lifted = (sum * weight).floor();
        let result = if add { x + lifted } else { x - lifted };

        result.store_i16(o);
    }

    let tail = out[lanes..]
        .iter_mut()
        .zip(&x[lanes..])
        .zip(&a[lanes..])
        .zip(&b[lanes..]);

    for (((o, &x), &a), &b) in tail {
        *o = step.apply(x, a, b);
    }
}

/// Decompose one padded line into its approximation and detail halves.
///
/// Logical sample `x` of the line is stored at `padded[x + margin]` and the
/// border must already be mirrored. `detail` is scratch space of
/// `low.len() + 1` samples, where `detail[j]` receives the coefficient of
/// position `2j - 1`.
pub(crate) fn forward_line(
    padded: &[i16],
    margin: usize,
    detail: &mut [i16],
    low: &mut [i16],
    high: &mut [i16],
) {
    debug_assert!(margin >= 2);
    debug_assert_eq!(detail.len(), low.len() + 1);
    let x = |i: isize| padded[(i + margin as isize) as usize];

    for (j, d) in detail.iter_mut().enumerate() {
        let odd = 2 * j as isize - 1;
        *d = predict(x(odd), x(odd - 1), x(odd + 1));
    }

    for (i, a) in low.iter_mut().enumerate() {
        *a = update(x(2 * i as isize), detail[i], detail[i + 1]);
    }

    high.copy_from_slice(&detail[1..=high.len()]);
}

/// Reconstruct one line from its approximation and padded detail halves.
///
/// Detail coefficient `j` is stored at `high[j + margin]`, with the border
/// mirrored. `even` is scratch space of `low.len() + 1` samples.
pub(crate) fn inverse_line(
    low: &[i16],
    high: &[i16],
    margin: usize,
    even: &mut [i16],
    out: &mut [i16],
) {
    debug_assert!(margin >= 1);
    debug_assert_eq!(even.len(), low.len() + 1);
    let d = |j: isize| high[(j + margin as isize) as usize];
    let half = low.len();

    for (i, e) in even[..half].iter_mut().enumerate() {
        *e = unupdate(low[i], d(i as isize - 1), d(i as isize));
    }

    // Sample `n` of an even-length line mirrors sample `n - 2`.
    even[half] = even[half - 1];

    for (i, pair) in out.chunks_mut(2).enumerate() {
        pair[0] = even[i];

        if let Some(odd) = pair.get_mut(1) {
            *odd = unpredict(d(i as isize), even[i], even[i + 1]);
        }
    }
}

//! Mixing the input with its denoised reconstruction.

use crate::plane::Plane;
use crate::schedule::{Pass, Scheduler};
use crate::simd::{Level, SIMD_WIDTH, Simd, dispatch, f32x8, vector_len};

/// Weighted average with 7 fractional bits, `restore / 128` of `denoised`.
///
/// The result always lies between the two inputs.
#[inline]
pub(crate) fn mix(original: i16, denoised: i16, restore: i32) -> i16 {
    (((128 - restore) * i32::from(original) + restore * i32::from(denoised) + 64) >> 7) as i16
}

/// Blend one row of samples into `out`.
fn mix_row(original: &[i16], denoised: &[i16], restore: i32, out: &mut [i16]) {
    debug_assert!(original.len() == out.len() && denoised.len() == out.len());
    dispatch!(Level::new(), simd => mix_row_impl(simd, original, denoised, restore, out));
}

#[inline(always)]
fn mix_row_impl<S: Simd>(
    simd: S,
    original: &[i16],
    denoised: &[i16],
    restore: i32,
    out: &mut [i16],
) {
    let lanes = vector_len(out.len());
    let (keep, take) = ((128 - restore) as f32, restore as f32);

    for ((o, a), b) in out[..lanes]
        .chunks_exact_mut(SIMD_WIDTH)
        .zip(original.chunks_exact(SIMD_WIDTH))
        .zip(denoised.chunks_exact(SIMD_WIDTH))
    {
        let sum = f32x8::from_i16(simd, a) * keep + f32x8::from_i16(simd, b) * take + 64.0;
        (sum * (1.0 / 128.0)).floor().store_i16(o);
    }

    let tail = out[lanes..]
        .iter_mut()
        .zip(&original[lanes..])
        .zip(&denoised[lanes..]);

    for ((o, &a), &b) in tail {
        *o = mix(a, b, restore);
    }
}

/// Blend `original` and `denoised` into `output`.
pub(crate) fn blend(
    scheduler: &mut Scheduler,
    original: &Plane,
    denoised: &Plane,
    restore: u32,
    output: &mut Plane,
) {
    debug_assert!(original.width() == output.width() && original.height() == output.height());
    let restore = restore as i32;
    let ranges = scheduler.partition(Pass::Blend, output.height());
    let jobs = output.split_rows_mut(&ranges);

    scheduler.run(Pass::Blend, jobs, |_, mut output| {
        for y in output.rows().iter() {
            mix_row(original.row(y), denoised.row(y), restore, output.row_mut(y));
            output.fill_row_margins(y);
        }

        output.fill_vertical_margins();
    });
}

/// Blend `denoised` into `plane`, which holds the original samples.
pub(crate) fn blend_in_place(
    scheduler: &mut Scheduler,
    denoised: &Plane,
    restore: u32,
    plane: &mut Plane,
) {
    let restore = restore as i32;
    let ranges = scheduler.partition(Pass::Blend, plane.height());
    let jobs = plane.split_rows_mut(&ranges);

    scheduler.run(Pass::Blend, jobs, |work, mut plane| {
        for y in plane.rows().iter() {
            let original = work.line(plane.width());
            original.copy_from_slice(plane.row_mut(y));
            mix_row(original, denoised.row(y), restore, plane.row_mut(y));
            plane.fill_row_margins(y);
        }

        plane.fill_vertical_margins();
    });
}

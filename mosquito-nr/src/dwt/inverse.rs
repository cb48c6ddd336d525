//! Inverse transform passes.

use core::mem;

use super::lifting;
use crate::plane::Plane;
use crate::schedule::{Pass, Scheduler};

/// Rebuild every row of `dst` from its horizontal halves `low` and `high`.
pub(crate) fn horizontal(scheduler: &mut Scheduler, low: &Plane, high: &Plane, dst: &mut Plane) {
    debug_assert_eq!(low.width(), dst.width().div_ceil(2));
    debug_assert_eq!(high.width(), dst.width() / 2);

    let ranges = scheduler.partition(Pass::InverseHorizontal, dst.height());
    let jobs = dst.split_rows_mut(&ranges);

    scheduler.run(Pass::InverseHorizontal, jobs, |work, mut dst| {
        let even = work.line(low.width() + 1);

        for y in dst.rows().iter() {
            lifting::inverse_line(
                low.row(y),
                high.padded_row(y),
                high.margin(),
                even,
                dst.row_mut(y),
            );
            dst.fill_row_margins(y);
        }

        dst.fill_vertical_margins();
    });
}

/// Rebuild `dst` from its vertical halves, `low` holding the even rows and
/// `high` the odd ones.
///
/// Work is distributed by row pairs. The even row below a worker's last pair
/// is recomputed locally rather than read from the next worker.
pub(crate) fn vertical(scheduler: &mut Scheduler, low: &Plane, high: &Plane, dst: &mut Plane) {
    debug_assert_eq!(low.height(), dst.height().div_ceil(2));
    debug_assert_eq!(high.height(), dst.height() / 2);

    let height = dst.height();
    let pairs = scheduler.partition(Pass::InverseVertical, low.height());
    let ranges: Vec<_> = pairs.iter().map(|r| r.expand(height)).collect();
    let jobs: Vec<_> = pairs.into_iter().zip(dst.split_rows_mut(&ranges)).collect();

    scheduler.run(Pass::InverseVertical, jobs, |work, (pairs, mut dst)| {
        if pairs.is_empty() {
            return;
        }

        let (mut even, mut next) = work.lines(dst.width());
        let detail = |i: usize| high.row_at(i as isize);
        let start = pairs.start;

        lifting::unupdate_row(
            low.row(start),
            high.row_at(start as isize - 1),
            detail(start),
            even,
        );

        for i in pairs.iter() {
            let y = 2 * i;

            if y + 1 < height {
                if y + 2 < height {
                    lifting::unupdate_row(low.row(i + 1), detail(i), detail(i + 1), next);
                } else {
                    // Row `height` mirrors row `height - 2`.
                    next.copy_from_slice(even);
                }

                lifting::unpredict_row(high.row(i), even, next, dst.row_mut(y + 1));
                dst.fill_row_margins(y + 1);
            }

            dst.row_mut(y).copy_from_slice(even);
            dst.fill_row_margins(y);

            mem::swap(&mut even, &mut next);
        }

        dst.fill_vertical_margins();
    });
}

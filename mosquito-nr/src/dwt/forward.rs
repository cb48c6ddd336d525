//! Forward transform passes.

use core::mem;

use super::lifting;
use crate::plane::Plane;
use crate::schedule::{Pass, Scheduler};

/// Split `src` vertically into `low` (even rows) and `high` (odd rows).
///
/// Work is distributed by output row pairs. Each worker recomputes the detail
/// row just above its first pair instead of waiting for its neighbor.
pub(crate) fn vertical(scheduler: &mut Scheduler, src: &Plane, low: &mut Plane, high: &mut Plane) {
    debug_assert_eq!(low.height(), src.height().div_ceil(2));
    debug_assert_eq!(high.height(), src.height() / 2);

    let ranges = scheduler.partition(Pass::ForwardVertical, low.height());
    let high_ranges: Vec<_> = ranges.iter().map(|r| r.clamp(high.height())).collect();
    let jobs: Vec<_> = low
        .split_rows_mut(&ranges)
        .into_iter()
        .zip(high.split_rows_mut(&high_ranges))
        .collect();

    scheduler.run(Pass::ForwardVertical, jobs, |work, (mut low, mut high)| {
        let rows = low.rows();

        if rows.is_empty() {
            return;
        }

        let (mut prev, mut next) = work.lines(src.width());
        let row = |y: isize| src.row_at(y);

        // Detail row of the pair above the first one, mirrored at the top.
        let y = 2 * rows.start as isize;
        lifting::predict_row(row(y - 1), row(y - 2), row(y), prev);

        for i in rows.iter() {
            let y = 2 * i as isize;
            lifting::predict_row(row(y + 1), row(y), row(y + 2), next);
            lifting::update_row(row(y), prev, next, low.row_mut(i));
            low.fill_row_margins(i);

            if high.rows().contains(i) {
                high.row_mut(i).copy_from_slice(next);
                high.fill_row_margins(i);
            }

            mem::swap(&mut prev, &mut next);
        }

        low.fill_vertical_margins();
        high.fill_vertical_margins();
    });
}

/// Split every row of `src` horizontally into `low` and `high`.
pub(crate) fn horizontal(
    scheduler: &mut Scheduler,
    src: &Plane,
    low: &mut Plane,
    high: &mut Plane,
) {
    debug_assert_eq!(low.width(), src.width().div_ceil(2));
    debug_assert_eq!(high.width(), src.width() / 2);

    let ranges = scheduler.partition(Pass::ForwardHorizontal, src.height());
    let jobs: Vec<_> = low
        .split_rows_mut(&ranges)
        .into_iter()
        .zip(high.split_rows_mut(&ranges))
        .collect();

    scheduler.run(Pass::ForwardHorizontal, jobs, |work, (mut low, mut high)| {
        let rows = low.rows();
        let detail = work.line(low.width() + 1);

        for y in rows.iter() {
            lifting::forward_line(
                src.padded_row(y),
                src.margin(),
                detail,
                low.row_mut(y),
                high.row_mut(y),
            );
            low.fill_row_margins(y);
            high.fill_row_margins(y);
        }

        low.fill_vertical_margins();
        high.fill_vertical_margins();
    });
}

//! The edge-directed smoother.
//!
//! For every sample, eight candidate directions through the sample are scored
//! by the sum of absolute differences (SAD) between the sample and a few
//! probes along the direction. The sample is then averaged with its neighbors
//! along the best scoring direction only, so that smoothing runs parallel to
//! edges and never across them.
//!
//! Straight directions probe single neighbors. Mixed directions lie halfway
//! between a straight and a diagonal direction and probe the midpoint of two
//! adjacent neighbors instead. With radius 2, every direction additionally
//! probes a neighbor pair at distance 2.

use crate::params::Radius;
use crate::plane::Plane;
use crate::schedule::{Pass, Scheduler};

/// A candidate smoothing direction.
///
/// The discriminant is the priority when two directions score the same,
/// lower values win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Left and right.
    Horizontal = 0,
    /// Top left and bottom right.
    Diagonal = 1,
    /// Up and down.
    Vertical = 2,
    /// Top right and bottom left.
    AntiDiagonal = 3,
    /// Between [`Direction::Horizontal`] and [`Direction::Diagonal`].
    HorizontalDiagonal = 4,
    /// Between [`Direction::Diagonal`] and [`Direction::Vertical`].
    VerticalDiagonal = 5,
    /// Between [`Direction::Vertical`] and [`Direction::AntiDiagonal`].
    VerticalAntiDiagonal = 6,
    /// Between [`Direction::AntiDiagonal`] and [`Direction::Horizontal`].
    HorizontalAntiDiagonal = 7,
}

impl Direction {
    /// All directions, ordered by priority.
    pub const ALL: [Self; 8] = [
        Self::Horizontal,
        Self::Diagonal,
        Self::Vertical,
        Self::AntiDiagonal,
        Self::HorizontalDiagonal,
        Self::VerticalDiagonal,
        Self::VerticalAntiDiagonal,
        Self::HorizontalAntiDiagonal,
    ];

    /// The tie-break priority of the direction.
    pub fn index(self) -> usize {
        self as usize
    }

    fn kernel(self, radius: Radius) -> &'static Kernel {
        match radius {
            Radius::One => &RADIUS_ONE[self.index()],
            Radius::Two => &RADIUS_TWO[self.index()],
        }
    }
}

/// The outcome of the direction search for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The direction with the lowest score.
    pub direction: Direction,
    /// The sum of absolute differences along that direction.
    pub sad: u32,
}

/// A value compared against the center sample when scoring a direction.
#[derive(Debug, Clone, Copy)]
enum Probe {
    Point(isize, isize),
    Midpoint((isize, isize), (isize, isize)),
}

/// A neighbor that contributes to the filtered value, with its weight in
/// multiples of the strength.
#[derive(Debug, Clone, Copy)]
struct Tap {
    dx: isize,
    dy: isize,
    weight: i32,
}

#[derive(Debug)]
struct Kernel {
    probes: &'static [Probe],
    taps: &'static [Tap],
    shift: u32,
}

impl Kernel {
    /// The sum of all tap weights.
    fn weight(&self) -> i32 {
        self.taps.iter().map(|t| t.weight).sum()
    }
}

const fn pt(dx: isize, dy: isize) -> Probe {
    Probe::Point(dx, dy)
}

const fn mid(a: (isize, isize), b: (isize, isize)) -> Probe {
    Probe::Midpoint(a, b)
}

const fn tap(dx: isize, dy: isize, weight: i32) -> Tap {
    Tap { dx, dy, weight }
}

static RADIUS_ONE: [Kernel; 8] = [
    Kernel {
        probes: &[pt(-1, 0), pt(1, 0)],
        taps: &[tap(-1, 0, 1), tap(1, 0, 1)],
        shift: 6,
    },
    Kernel {
        probes: &[pt(-1, -1), pt(1, 1)],
        taps: &[tap(-1, -1, 1), tap(1, 1, 1)],
        shift: 6,
    },
    Kernel {
        probes: &[pt(0, -1), pt(0, 1)],
        taps: &[tap(0, -1, 1), tap(0, 1, 1)],
        shift: 6,
    },
    Kernel {
        probes: &[pt(1, -1), pt(-1, 1)],
        taps: &[tap(1, -1, 1), tap(-1, 1, 1)],
        shift: 6,
    },
    Kernel {
        probes: &[mid((-1, 0), (-1, -1)), mid((1, 0), (1, 1))],
        taps: &[tap(-1, -1, 1), tap(-1, 0, 1), tap(1, 0, 1), tap(1, 1, 1)],
        shift: 7,
    },
    Kernel {
        probes: &[mid((-1, -1), (0, -1)), mid((1, 1), (0, 1))],
        taps: &[tap(-1, -1, 1), tap(0, -1, 1), tap(0, 1, 1), tap(1, 1, 1)],
        shift: 7,
    },
    Kernel {
        probes: &[mid((0, -1), (1, -1)), mid((0, 1), (-1, 1))],
        taps: &[tap(1, -1, 1), tap(0, -1, 1), tap(0, 1, 1), tap(-1, 1, 1)],
        shift: 7,
    },
    Kernel {
        probes: &[mid((1, 0), (1, -1)), mid((-1, 0), (-1, 1))],
        taps: &[tap(1, -1, 1), tap(1, 0, 1), tap(-1, 0, 1), tap(-1, 1, 1)],
        shift: 7,
    },
];

static RADIUS_TWO: [Kernel; 8] = [
    Kernel {
        probes: &[pt(-1, 0), pt(1, 0), pt(-2, 0), pt(2, 0)],
        taps: &[tap(-2, 0, 1), tap(-1, 0, 1), tap(1, 0, 1), tap(2, 0, 1)],
        shift: 7,
    },
    Kernel {
        probes: &[pt(-1, -1), pt(1, 1), pt(-2, -2), pt(2, 2)],
        taps: &[tap(-2, -2, 1), tap(-1, -1, 1), tap(1, 1, 1), tap(2, 2, 1)],
        shift: 7,
    },
    Kernel {
        probes: &[pt(0, -1), pt(0, 1), pt(0, -2), pt(0, 2)],
        taps: &[tap(0, -2, 1), tap(0, -1, 1), tap(0, 1, 1), tap(0, 2, 1)],
        shift: 7,
    },
    Kernel {
        probes: &[pt(1, -1), pt(-1, 1), pt(2, -2), pt(-2, 2)],
        taps: &[tap(2, -2, 1), tap(1, -1, 1), tap(-1, 1, 1), tap(-2, 2, 1)],
        shift: 7,
    },
    Kernel {
        probes: &[
            mid((-1, 0), (-1, -1)),
            mid((1, 0), (1, 1)),
            pt(-2, -1),
            pt(2, 1),
        ],
        taps: &[
            tap(-2, -1, 2),
            tap(2, 1, 2),
            tap(-1, -1, 1),
            tap(-1, 0, 1),
            tap(1, 0, 1),
            tap(1, 1, 1),
        ],
        shift: 8,
    },
    Kernel {
        probes: &[
            mid((-1, -1), (0, -1)),
            mid((1, 1), (0, 1)),
            pt(-1, -2),
            pt(1, 2),
        ],
        taps: &[
            tap(-1, -2, 2),
            tap(1, 2, 2),
            tap(-1, -1, 1),
            tap(0, -1, 1),
            tap(0, 1, 1),
            tap(1, 1, 1),
        ],
        shift: 8,
    },
    Kernel {
        probes: &[
            mid((0, -1), (1, -1)),
            mid((0, 1), (-1, 1)),
            pt(1, -2),
            pt(-1, 2),
        ],
        taps: &[
            tap(1, -2, 2),
            tap(-1, 2, 2),
            tap(1, -1, 1),
            tap(0, -1, 1),
            tap(0, 1, 1),
            tap(-1, 1, 1),
        ],
        shift: 8,
    },
    Kernel {
        probes: &[
            mid((1, -1), (1, 0)),
            mid((-1, 1), (-1, 0)),
            pt(2, -1),
            pt(-2, 1),
        ],
        taps: &[
            tap(2, -1, 2),
            tap(-2, 1, 2),
            tap(1, -1, 1),
            tap(1, 0, 1),
            tap(-1, 0, 1),
            tap(-1, 1, 1),
        ],
        shift: 8,
    },
];

fn score(src: &Plane, x: isize, y: isize, kernel: &Kernel) -> u32 {
    let center = i32::from(src.at(x, y));
    let at = |dx: isize, dy: isize| i32::from(src.at(x + dx, y + dy));

    kernel
        .probes
        .iter()
        .map(|probe| {
            let value = match *probe {
                Probe::Point(dx, dy) => at(dx, dy),
                Probe::Midpoint((ax, ay), (bx, by)) => (at(ax, ay) + at(bx, by)) >> 1,
            };
            center.abs_diff(value)
        })
        .sum()
}

/// Find the direction with the lowest SAD around `(x, y)`.
///
/// Ties go to the direction with the lower index. The plane's border must be
/// valid, since probes reach up to two samples past its edges.
pub fn select_direction(src: &Plane, x: usize, y: usize, radius: Radius) -> Selection {
    let (x, y) = (x as isize, y as isize);
    let mut best = Selection {
        direction: Direction::Horizontal,
        sad: score(src, x, y, Direction::Horizontal.kernel(radius)),
    };

    for direction in Direction::ALL.into_iter().skip(1) {
        let sad = score(src, x, y, direction.kernel(radius));

        if (sad, direction.index()) < (best.sad, best.direction.index()) {
            best = Selection { direction, sad };
        }
    }

    best
}

fn filter(src: &Plane, x: usize, y: usize, radius: Radius, strength: i32) -> i16 {
    let selection = select_direction(src, x, y, radius);
    let center = src.at(x as isize, y as isize);

    // Locally flat, averaging would only introduce rounding.
    if selection.sad == 0 {
        return center;
    }

    let kernel = selection.direction.kernel(radius);
    let (x, y) = (x as isize, y as isize);
    let own = (1 << kernel.shift) - kernel.weight() * strength;
    let others: i32 = kernel
        .taps
        .iter()
        .map(|t| t.weight * i32::from(src.at(x + t.dx, y + t.dy)))
        .sum();
    let bias = 1 << (kernel.shift - 1);

    ((own * i32::from(center) + strength * others + bias) >> kernel.shift) as i16
}

/// Smooth every sample of `src` into `dst`.
///
/// `strength` must not exceed [`crate::MAX_STRENGTH`].
pub(crate) fn smooth(
    scheduler: &mut Scheduler,
    src: &Plane,
    dst: &mut Plane,
    radius: Radius,
    strength: u32,
) {
    debug_assert!(src.same_geometry(dst));
    let strength = strength as i32;
    let ranges = scheduler.partition(Pass::Smooth, dst.height());
    let jobs = dst.split_rows_mut(&ranges);

    scheduler.run(Pass::Smooth, jobs, |_, mut dst| {
        for y in dst.rows().iter() {
            for (x, out) in dst.row_mut(y).iter_mut().enumerate() {
                *out = filter(src, x, y, radius, strength);
            }

            dst.fill_row_margins(y);
        }

        dst.fill_vertical_margins();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> i16) -> Plane {
        let samples: Vec<i16> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Plane::from_samples(width, height, &samples).unwrap()
    }

    fn smoothed(src: &Plane, radius: Radius, strength: u32, threads: usize) -> Plane {
        let mut scheduler = Scheduler::new(threads).unwrap();
        let mut dst = src.like();
        smooth(&mut scheduler, src, &mut dst, radius, strength);
        dst
    }

    // ==========================================
    // Direction selection
    // ==========================================

    #[test]
    fn vertical_edge_selects_vertical() {
        let plane = plane_from_fn(8, 8, |x, _| if x < 4 { 50 } else { 200 });

        for radius in [Radius::One, Radius::Two] {
            for x in [3, 4] {
                let selection = select_direction(&plane, x, 3, radius);
                assert_eq!(selection.direction, Direction::Vertical);
                assert_eq!(selection.sad, 0);
            }

            assert_eq!(smoothed(&plane, radius, 32, 2), plane);
        }
    }

    #[test]
    fn horizontal_structure_selects_horizontal() {
        let plane = plane_from_fn(8, 8, |_, y| 10 * y as i16);

        for radius in [Radius::One, Radius::Two] {
            let selection = select_direction(&plane, 4, 4, radius);
            assert_eq!(selection.direction, Direction::Horizontal);
            assert_eq!(selection.sad, 0);
        }
    }

    /// A ridge through the center of a 7x7 plane that runs between the
    /// horizontal and the diagonal direction, as `(dx, dy, value)`.
    const SHALLOW_RIDGE: [(isize, isize, i16); 7] = [
        (0, 0, 100),
        (-1, 0, 90),
        (-1, -1, 112),
        (1, 0, 110),
        (1, 1, 92),
        (-2, -1, 97),
        (2, 1, 101),
    ];

    /// Place [`SHALLOW_RIDGE`] with every offset moved by `map`.
    fn ridge(map: fn(isize, isize) -> (isize, isize)) -> Plane {
        plane_from_fn(7, 7, |x, y| {
            let offset = (x as isize - 3, y as isize - 3);

            SHALLOW_RIDGE
                .iter()
                .find(|&&(dx, dy, _)| map(dx, dy) == offset)
                .map_or(0, |&(_, _, value)| value)
        })
    }

    #[test]
    fn mixed_directions_are_selected() {
        let cases: [(Direction, fn(isize, isize) -> (isize, isize)); 4] = [
            (Direction::HorizontalDiagonal, |dx, dy| (dx, dy)),
            (Direction::VerticalDiagonal, |dx, dy| (dy, dx)),
            (Direction::VerticalAntiDiagonal, |dx, dy| (-dy, dx)),
            (Direction::HorizontalAntiDiagonal, |dx, dy| (-dx, dy)),
        ];

        for (direction, map) in cases {
            let plane = ridge(map);

            // Both midpoints are 101, the far pair adds |100 - 97| + |100 - 101|.
            assert_eq!(
                select_direction(&plane, 3, 3, Radius::One),
                Selection { direction, sad: 2 },
                "{direction:?}"
            );
            assert_eq!(
                select_direction(&plane, 3, 3, Radius::Two),
                Selection { direction, sad: 6 },
                "{direction:?}"
            );
        }
    }

    #[test]
    fn mixed_directions_filter_exactly() {
        let cases: [fn(isize, isize) -> (isize, isize); 4] = [
            |dx, dy| (dx, dy),
            |dx, dy| (dy, dx),
            |dx, dy| (-dy, dx),
            |dx, dy| (-dx, dy),
        ];

        for map in cases {
            let plane = ridge(map);

            // (64 * 100 + 16 * (112 + 90 + 110 + 92) + 64) >> 7
            assert_eq!(filter(&plane, 3, 3, Radius::One, 16), 101);
            // (0 * 100 + 32 * 404 + 64) >> 7
            assert_eq!(filter(&plane, 3, 3, Radius::One, 32), 101);
            // (128 * 100 + 16 * (2 * 97 + 2 * 101 + 404) + 128) >> 8
            assert_eq!(filter(&plane, 3, 3, Radius::Two, 16), 100);
            // (0 * 100 + 32 * 800 + 128) >> 8, doubling the near taps instead
            // of the far ones would give 126.
            assert_eq!(filter(&plane, 3, 3, Radius::Two, 32), 100);

            assert_eq!(smoothed(&plane, Radius::One, 16, 3).get(3, 3), 101);
            assert_eq!(smoothed(&plane, Radius::Two, 16, 3).get(3, 3), 100);
        }
    }

    #[test]
    fn ties_prefer_lowest_index() {
        let plane = plane_from_fn(5, 5, |x, y| if (x, y) == (2, 2) { 10 } else { 20 });

        let selection = select_direction(&plane, 2, 2, Radius::One);
        assert_eq!(
            selection,
            Selection {
                direction: Direction::Horizontal,
                sad: 20,
            }
        );

        // Make horizontal the worst candidate, several others tie at 20.
        let plane = plane_from_fn(5, 5, |x, y| match (x, y) {
            (2, 2) => 10,
            (1, 2) | (3, 2) => 40,
            _ => 20,
        });

        let selection = select_direction(&plane, 2, 2, Radius::One);
        assert_eq!(
            selection,
            Selection {
                direction: Direction::Diagonal,
                sad: 20,
            }
        );
    }

    // ==========================================
    // Filtering
    // ==========================================

    #[test]
    fn isolated_dip_is_pulled_towards_neighbors() {
        let plane = plane_from_fn(7, 7, |x, y| if (x, y) == (3, 3) { 10 } else { 20 });

        // (32 * 10 + 16 * 40 + 32) >> 6
        assert_eq!(smoothed(&plane, Radius::One, 16, 1).get(3, 3), 15);
        // (64 * 10 + 16 * 80 + 64) >> 7
        assert_eq!(smoothed(&plane, Radius::Two, 16, 1).get(3, 3), 15);
        // At full strength the center is replaced by the neighbor mean.
        assert_eq!(smoothed(&plane, Radius::One, 32, 1).get(3, 3), 20);
    }

    #[test]
    fn flat_block_is_unchanged() {
        let plane = Plane::from_samples(8, 8, &[100; 64]).unwrap();

        for radius in [Radius::One, Radius::Two] {
            for strength in [0, 1, 16, 32] {
                assert_eq!(smoothed(&plane, radius, strength, 3), plane);
            }
        }
    }

    #[test]
    fn zero_strength_is_identity() {
        let plane = plane_from_fn(19, 23, |x, y| ((x * 37 + y * 101) % 1024) as i16);

        for radius in [Radius::One, Radius::Two] {
            assert_eq!(smoothed(&plane, radius, 0, 4), plane);
        }
    }

    #[test]
    fn result_is_independent_of_worker_count() {
        let plane = plane_from_fn(31, 45, |x, y| ((x * x * 7 + y * 13) % 900) as i16);
        let reference = smoothed(&plane, Radius::Two, 20, 1);

        for threads in [2, 3, 6] {
            assert_eq!(smoothed(&plane, Radius::Two, 20, threads), reference);
        }
    }

    #[test]
    fn kernel_weights_match_divisors() {
        for direction in Direction::ALL {
            let one = direction.kernel(Radius::One);
            let two = direction.kernel(Radius::Two);

            assert_eq!(1 << one.shift, 32 * one.weight());
            assert_eq!(1 << two.shift, 32 * two.weight());
        }
    }
}

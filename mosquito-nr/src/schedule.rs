//! Row partitioning and the worker pool that runs each pass.
//!
//! Every pass splits its output rows into one contiguous range per worker.
//! Smoothing and blending split by single rows, the transform passes by
//! blocks of 8 rows. A worker only writes the rows of its own range, plus the
//! border rows that mirror a row of its range. Returning
//! from [`Scheduler::run`] means that every worker has finished, which is the
//! barrier between two passes.

use core::fmt;
use core::ops::Range;

use rayon::prelude::*;

use crate::error::{ParameterError, Result, SchedulerError, bail};

/// The row granularity of the transform passes.
pub(crate) const BLOCK_ROWS: usize = 8;

/// A half-open range of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RowRange {
    /// The first row in the range.
    pub start: usize,
    /// One past the last row in the range.
    pub end: usize,
}

impl RowRange {
    /// Create a new range. `end` is clamped so that the range is never negative.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// The number of rows in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range contains no rows.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `row` lies within the range.
    pub fn contains(&self, row: usize) -> bool {
        self.start <= row && row < self.end
    }

    /// Iterate over the rows of the range.
    pub fn iter(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Cut the range to `0..rows`.
    pub(crate) fn clamp(self, rows: usize) -> Self {
        Self::new(self.start.min(rows), self.end.min(rows))
    }

    /// Map a range of row pairs to the rows they cover in a plane of `rows` rows.
    pub(crate) fn expand(self, rows: usize) -> Self {
        Self::new(2 * self.start, 2 * self.end).clamp(rows)
    }
}

/// Split `rows` rows into one range per worker.
///
/// Rows are handed out in blocks of `block` rows, where the last block may be
/// shorter. With `units = ceil(rows / block)` blocks, worker `id` receives
/// blocks `units * id / threads` up to `units * (id + 1) / threads`. Workers
/// without blocks get an empty range.
pub fn partition(rows: usize, threads: usize, block: usize) -> Vec<RowRange> {
    let threads = threads.max(1);
    let block = block.max(1);
    let units = rows.div_ceil(block);

    (0..threads)
        .map(|id| {
            let start = units * id / threads * block;
            let end = units * (id + 1) / threads * block;
            RowRange::new(start, end).clamp(rows)
        })
        .collect()
}

/// The passes of the pipeline, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    ForwardVertical,
    ForwardHorizontal,
    Smooth,
    InverseHorizontal,
    InverseVertical,
    Blend,
}

impl Pass {
    /// The number of rows the pass hands out at a time.
    ///
    /// The vertical transform passes count row pairs, so their blocks cover
    /// the same 8 plane rows as those of the horizontal passes.
    pub(crate) fn block(self) -> usize {
        match self {
            Self::ForwardVertical | Self::InverseVertical => BLOCK_ROWS / 2,
            Self::ForwardHorizontal | Self::InverseHorizontal => BLOCK_ROWS,
            Self::Smooth | Self::Blend => 1,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForwardVertical => write!(f, "forward vertical"),
            Self::ForwardHorizontal => write!(f, "forward horizontal"),
            Self::Smooth => write!(f, "smooth"),
            Self::InverseHorizontal => write!(f, "inverse horizontal"),
            Self::InverseVertical => write!(f, "inverse vertical"),
            Self::Blend => write!(f, "blend"),
        }
    }
}

/// Scratch lines owned by a single worker.
///
/// The buffer only grows, so after the first frame no pass allocates.
#[derive(Debug, Default)]
pub(crate) struct WorkBuffer {
    samples: Vec<i16>,
}

impl WorkBuffer {
    fn reserve(&mut self, len: usize) {
        if self.samples.len() < len {
            self.samples.resize(len, 0);
        }
    }

    /// A single line of `len` samples.
    pub(crate) fn line(&mut self, len: usize) -> &mut [i16] {
        self.reserve(len);
        &mut self.samples[..len]
    }

    /// Two separate lines of `len` samples each.
    pub(crate) fn lines(&mut self, len: usize) -> (&mut [i16], &mut [i16]) {
        self.reserve(2 * len);
        self.samples[..2 * len].split_at_mut(len)
    }
}

/// A fixed-size pool of workers together with their scratch lines.
pub struct Scheduler {
    pool: rayon::ThreadPool,
    work: Vec<WorkBuffer>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("threads", &self.threads())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create a scheduler with `threads` workers.
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            bail!(ParameterError::NoThreads);
        }

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mosquito-nr-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                lwarn!("failed to build a pool of {} threads: {}", threads, e);
                bail!(SchedulerError::PoolBuild);
            }
        };

        Ok(Self {
            pool,
            work: (0..threads).map(|_| WorkBuffer::default()).collect(),
        })
    }

    /// The number of workers.
    pub fn threads(&self) -> usize {
        self.work.len()
    }

    /// Split the `rows` rows of `pass` into one range per worker.
    pub(crate) fn partition(&self, pass: Pass, rows: usize) -> Vec<RowRange> {
        partition(rows, self.threads(), pass.block())
    }

    /// Run one job per worker and wait for all of them to finish.
    pub(crate) fn run<J, F>(&mut self, pass: Pass, jobs: Vec<J>, f: F)
    where
        J: Send,
        F: Fn(&mut WorkBuffer, J) + Sync,
    {
        debug_assert_eq!(jobs.len(), self.work.len());
        ltrace!("{} pass on {} workers", pass, jobs.len());

        let Self { pool, work } = self;

        pool.install(|| {
            jobs.into_par_iter()
                .zip(work.par_iter_mut())
                .for_each(|(job, work)| f(work, job));
        });
    }
}

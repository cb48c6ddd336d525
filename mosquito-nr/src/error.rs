//! Error types for noise reduction.
//!
//! Every check runs before the first pass touches a buffer. Once a pass has
//! started it cannot fail.

use core::fmt;

/// The main error type for noise reduction operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Errors related to filter parameters.
    Parameter(ParameterError),
    /// Errors related to plane and scratch geometry.
    Geometry(GeometryError),
    /// Errors related to the worker pool.
    Scheduler(SchedulerError),
}

/// Errors related to filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// The smoothing radius is neither 1 nor 2.
    InvalidRadius(u32),
    /// The smoothing strength exceeds the supported maximum.
    StrengthOutOfRange(u32),
    /// The restore weight exceeds 128.
    RestoreOutOfRange(u32),
    /// The worker count is zero.
    NoThreads,
}

/// Errors related to plane and scratch geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// Width or height is zero.
    ZeroDimension,
    /// The plane is too small to be decomposed into the requested octaves.
    TooSmall,
    /// The plane is too large to be represented by the target format.
    TooLarge,
    /// The row pitch cannot hold a row plus its border margins.
    PitchTooSmall,
    /// The sample buffer is shorter than the declared geometry requires.
    BufferTooSmall,
    /// The border margin cannot hold the reflected samples.
    MarginTooSmall,
    /// The number of samples doesn't match `width * height`.
    SampleCount,
    /// Two planes that must share a layout don't.
    Mismatch,
    /// The scratch space was sized for a different plane.
    ScratchMismatch,
    /// The octave count is zero.
    InvalidOctaves,
}

/// Errors related to the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The thread pool could not be created.
    PoolBuild,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter(e) => write!(f, "{e}"),
            Self::Geometry(e) => write!(f, "{e}"),
            Self::Scheduler(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRadius(r) => write!(f, "invalid smoothing radius {r}, expected 1 or 2"),
            Self::StrengthOutOfRange(s) => write!(f, "smoothing strength {s} is out of range"),
            Self::RestoreOutOfRange(r) => write!(f, "restore weight {r} exceeds 128"),
            Self::NoThreads => write!(f, "at least one worker thread is required"),
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "plane has a zero dimension"),
            Self::TooSmall => write!(f, "plane is too small for the requested octaves"),
            Self::TooLarge => write!(f, "plane is too large"),
            Self::PitchTooSmall => write!(f, "pitch is too small for the row and its margins"),
            Self::BufferTooSmall => write!(f, "sample buffer is too small"),
            Self::MarginTooSmall => write!(f, "border margin is too small"),
            Self::SampleCount => write!(f, "sample count doesn't match the plane dimensions"),
            Self::Mismatch => write!(f, "plane geometries don't match"),
            Self::ScratchMismatch => write!(f, "scratch space doesn't match the plane"),
            Self::InvalidOctaves => write!(f, "at least one octave is required"),
        }
    }
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolBuild => write!(f, "failed to build the worker pool"),
        }
    }
}

impl std::error::Error for Error {}
impl std::error::Error for ParameterError {}
impl std::error::Error for GeometryError {}
impl std::error::Error for SchedulerError {}

impl From<ParameterError> for Error {
    fn from(e: ParameterError) -> Self {
        Self::Parameter(e)
    }
}

impl From<GeometryError> for Error {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

impl From<SchedulerError> for Error {
    fn from(e: SchedulerError) -> Self {
        Self::Scheduler(e)
    }
}

/// Result type for noise reduction operations.
pub type Result<T> = core::result::Result<T, Error>;

macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
}

macro_rules! err {
    ($err:expr) => {
        Err($err.into())
    };
}

pub(crate) use bail;
pub(crate) use err;

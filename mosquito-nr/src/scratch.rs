//! Intermediate buffers of the denoising pipeline.

use crate::OCTAVES;
use crate::dwt::Pyramid;
use crate::error::Result;
use crate::plane::{Extension, Plane};

/// Pre-sized buffers for denoising planes of one particular size.
///
/// Creating scratch space is the only allocation in the pipeline, so a host
/// that processes many planes of the same size should keep it around.
#[derive(Debug, Clone)]
pub struct Scratch {
    pub(crate) pyramid: Pyramid,
    /// The smoothed approximation band of each octave. After the inverse of
    /// the second octave, the first one holds its reconstruction.
    pub(crate) smoothed: [Plane; OCTAVES],
    pub(crate) denoised: Plane,
}

impl Scratch {
    /// Allocate scratch space for `width x height` planes.
    ///
    /// Both dimensions must be at least 3, so that the second octave still
    /// has a 2x2 input.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let pyramid = Pyramid::new(width, height, OCTAVES)?;
        let levels = pyramid.levels();
        let smoothed = core::array::from_fn(|octave| levels[octave].bands().ll.like());
        let denoised = Plane::blank(width, height, Extension::Symmetric, Extension::Symmetric);

        Ok(Self {
            pyramid,
            smoothed,
            denoised,
        })
    }

    /// The width of the planes this scratch space is sized for.
    pub fn width(&self) -> usize {
        self.pyramid.width()
    }

    /// The height of the planes this scratch space is sized for.
    pub fn height(&self) -> usize {
        self.pyramid.height()
    }

    /// Whether the scratch space can be used for `plane`.
    pub fn fits(&self, plane: &Plane) -> bool {
        plane.width() == self.width() && plane.height() == self.height()
    }
}

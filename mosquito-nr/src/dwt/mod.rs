//! The separable, integer-reversible CDF 5/3 wavelet transform.
//!
//! One octave splits a plane vertically into even (`low`) and odd (`high`)
//! rows, then splits both of those horizontally. This yields four sub-bands
//! at half resolution:
//!
//! - `ll`: approximation in both directions.
//! - `hl`: horizontal detail of the vertical approximation.
//! - `lh`: vertical detail, approximated horizontally.
//! - `hh`: diagonal detail.
//!
//! A further octave decomposes the `ll` band of the previous one. Each band
//! is stored as its own [`Plane`] whose border follows the extension rule of
//! its coefficients, so that every pass can read past band edges freely.

mod forward;
mod inverse;
mod lifting;

use crate::error::{GeometryError, Result, bail};
use crate::plane::{Extension, Plane};
use crate::schedule::Scheduler;

/// The four sub-bands produced by one octave.
#[derive(Debug, Clone)]
pub struct SubBands {
    /// The approximation band.
    pub ll: Plane,
    /// The horizontal detail band.
    pub hl: Plane,
    /// The vertical detail band.
    pub lh: Plane,
    /// The diagonal detail band.
    pub hh: Plane,
}

/// The buffers of a single octave.
#[derive(Debug, Clone)]
pub struct Level {
    width: usize,
    height: usize,
    bands: SubBands,
    // Intermediate results of the vertical step, full width and half height.
    low: Plane,
    high: Plane,
}

impl Level {
    /// Allocate the buffers of an octave with a `width x height` input.
    pub(crate) fn new(width: usize, height: usize) -> Self {
        let symmetric = Extension::Symmetric;
        let x_detail = Extension::Detail { parent: width };
        let y_detail = Extension::Detail { parent: height };
        let (low_width, high_width) = (width.div_ceil(2), width / 2);
        let (low_height, high_height) = (height.div_ceil(2), height / 2);

        Self {
            width,
            height,
            bands: SubBands {
                ll: Plane::blank(low_width, low_height, symmetric, symmetric),
                hl: Plane::blank(high_width, low_height, x_detail, symmetric),
                lh: Plane::blank(low_width, high_height, symmetric, y_detail),
                hh: Plane::blank(high_width, high_height, x_detail, y_detail),
            },
            low: Plane::blank(width, low_height, symmetric, symmetric),
            high: Plane::blank(width, high_height, symmetric, y_detail),
        }
    }

    /// The width of the octave's input.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The height of the octave's input.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The sub-bands computed by the last forward transform.
    pub fn bands(&self) -> &SubBands {
        &self.bands
    }

    /// Decompose `input` into the four sub-bands.
    pub(crate) fn forward(&mut self, scheduler: &mut Scheduler, input: &Plane) {
        debug_assert_eq!((input.width(), input.height()), (self.width, self.height));
        let Self {
            bands, low, high, ..
        } = self;

        forward::vertical(scheduler, input, low, high);
        forward::horizontal(scheduler, low, &mut bands.ll, &mut bands.hl);
        forward::horizontal(scheduler, high, &mut bands.lh, &mut bands.hh);
    }

    /// Reconstruct the octave's input into `output`.
    ///
    /// If `ll` is given it replaces the stored approximation band, while the
    /// stored detail bands are always used as they are.
    pub(crate) fn inverse(
        &mut self,
        scheduler: &mut Scheduler,
        ll: Option<&Plane>,
        output: &mut Plane,
    ) {
        debug_assert_eq!(
            (output.width(), output.height()),
            (self.width, self.height)
        );
        let Self {
            bands, low, high, ..
        } = self;
        let ll = ll.unwrap_or(&bands.ll);
        debug_assert!(ll.same_geometry(&bands.ll));

        inverse::horizontal(scheduler, ll, &bands.hl, low);
        inverse::horizontal(scheduler, &bands.lh, &bands.hh, high);
        inverse::vertical(scheduler, low, high, output);
    }
}

/// A multi-octave decomposition of a plane.
#[derive(Debug, Clone)]
pub struct Pyramid {
    width: usize,
    height: usize,
    levels: Vec<Level>,
}

impl Pyramid {
    /// Allocate a pyramid of `octaves` levels for a `width x height` plane.
    ///
    /// The input of every octave has to be at least 2x2.
    pub fn new(width: usize, height: usize, octaves: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!(GeometryError::ZeroDimension);
        }

        if octaves == 0 {
            bail!(GeometryError::InvalidOctaves);
        }

        let mut levels = Vec::with_capacity(octaves);
        let (mut w, mut h) = (width, height);

        for _ in 0..octaves {
            if w < 2 || h < 2 {
                bail!(GeometryError::TooSmall);
            }

            levels.push(Level::new(w, h));
            (w, h) = (w.div_ceil(2), h.div_ceil(2));
        }

        Ok(Self {
            width,
            height,
            levels,
        })
    }

    /// The width of the decomposed plane.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The height of the decomposed plane.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The number of octaves.
    pub fn octaves(&self) -> usize {
        self.levels.len()
    }

    /// The levels, from the finest to the coarsest.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub(crate) fn level_mut(&mut self, octave: usize) -> &mut Level {
        &mut self.levels[octave]
    }

    /// Decompose `input` through all octaves.
    pub fn forward(&mut self, scheduler: &mut Scheduler, input: &Plane) -> Result<()> {
        if input.width() != self.width || input.height() != self.height {
            bail!(GeometryError::Mismatch);
        }

        let mut source = input;

        for level in &mut self.levels {
            level.forward(scheduler, source);
            source = &level.bands.ll;
        }

        Ok(())
    }

    /// Reconstruct the plane from the stored sub-bands into `output`.
    ///
    /// The approximation bands of all but the coarsest level are overwritten
    /// on the way up.
    pub fn inverse(&mut self, scheduler: &mut Scheduler, output: &mut Plane) -> Result<()> {
        if output.width() != self.width || output.height() != self.height {
            bail!(GeometryError::Mismatch);
        }

        for octave in (1..self.levels.len()).rev() {
            let (finer, coarser) = self.levels.split_at_mut(octave);
            coarser[0].inverse(scheduler, None, &mut finer[octave - 1].bands.ll);
        }

        if let Some(finest) = self.levels.first_mut() {
            finest.inverse(scheduler, None, output);
        }

        Ok(())
    }
}

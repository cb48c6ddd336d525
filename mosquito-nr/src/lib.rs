/*!
A memory-safe, pure-Rust mosquito noise reducer.

Mosquito noise is the ringing that block-based video codecs leave around sharp
edges. `mosquito-nr` removes it from 16-bit luma planes while keeping edges
and texture intact:

1. The plane is decomposed with a reversible integer CDF 5/3 wavelet
   transform over two octaves.
2. The approximation band of each octave is smoothed with an edge-directed
   filter, which only averages along the local edge orientation.
3. The plane is rebuilt from the smoothed approximations and the untouched
   detail bands, then blended with the input.

Every step is split into row ranges that run in parallel on a dedicated
thread pool.

# Example
```rust,no_run
use mosquito_nr::{Denoiser, FilterParameters, Plane, Radius, Scratch};

let samples = vec![512_i16; 1920 * 1080];
let input = Plane::from_samples(1920, 1080, &samples).unwrap();

let params = FilterParameters::default()
    .with_radius(Radius::Two)
    .with_strength(16)
    .with_restore(128);
let mut denoiser = Denoiser::new(params).unwrap();
let mut scratch = Scratch::new(input.width(), input.height()).unwrap();
let mut output = Plane::new(input.width(), input.height()).unwrap();

denoiser.process(&input, &mut scratch, &mut output).unwrap();
```

# Plane size
Both octaves need an input of at least 2x2 samples, so planes must be at
least 3x3. Smaller planes are rejected with [`GeometryError::TooSmall`] by
[`Scratch::new`], [`Pyramid::new`] and [`denoise`].

# Cargo features
- `simd` (enabled by default): vectorize the row-batched wavelet and blend
  kernels with `fearless_simd`, selecting the instruction set at runtime.
- `logging`: emit diagnostics through the `log` crate.
- `image`: conversions between planes and grayscale images of the `image`
  crate.

# Safety
Without the `simd` feature, this crate forbids unsafe code via a crate-level
attribute. With it, the only unsafe code is the runtime instruction set
dispatch of `fearless_simd`.
*/

#![cfg_attr(not(feature = "simd"), forbid(unsafe_code))]

#[macro_use]
mod log;

mod blend;
pub mod dwt;
mod error;
#[cfg(feature = "image")]
mod integration;
mod params;
mod plane;
mod schedule;
mod scratch;
mod simd;
pub mod smooth;

pub use dwt::{Level, Pyramid, SubBands};
pub use error::{Error, GeometryError, ParameterError, Result, SchedulerError};
#[cfg(feature = "image")]
pub use integration::{GRAY8_SHIFT, Gray16Image, denoise_luma8};
pub use params::{FilterParameters, MAX_RESTORE, MAX_STRENGTH, Radius};
pub use plane::{Extension, MARGIN, Plane};
pub use schedule::{RowRange, Scheduler, partition};
pub use scratch::Scratch;

use error::bail;

/// The number of wavelet octaves the denoiser smooths.
pub const OCTAVES: usize = 2;

/// A reusable noise reduction engine.
///
/// The engine owns the worker pool, so creating it once and processing many
/// planes avoids spawning threads per plane.
#[derive(Debug)]
pub struct Denoiser {
    params: FilterParameters,
    scheduler: Scheduler,
}

impl Denoiser {
    /// Validate `params` and spawn the worker pool.
    pub fn new(params: FilterParameters) -> Result<Self> {
        params.validate()?;
        let scheduler = Scheduler::new(params.threads)?;

        ldebug!(
            "created denoiser with {:?}, strength {}, restore {}, {} workers",
            params.radius,
            params.strength,
            params.restore,
            scheduler.threads()
        );

        Ok(Self { params, scheduler })
    }

    /// The parameters the engine was created with.
    pub fn params(&self) -> &FilterParameters {
        &self.params
    }

    /// Denoise `input` into `output`, which must have the same geometry.
    pub fn process(
        &mut self,
        input: &Plane,
        scratch: &mut Scratch,
        output: &mut Plane,
    ) -> Result<()> {
        self.check(input, scratch)?;

        if !output.same_geometry(input) {
            bail!(GeometryError::Mismatch);
        }

        self.reconstruct(input, scratch);
        blend::blend(
            &mut self.scheduler,
            input,
            &scratch.denoised,
            self.params.restore,
            output,
        );

        Ok(())
    }

    /// Denoise `plane` in place.
    pub fn process_in_place(&mut self, plane: &mut Plane, scratch: &mut Scratch) -> Result<()> {
        self.check(plane, scratch)?;

        self.reconstruct(plane, scratch);
        blend::blend_in_place(
            &mut self.scheduler,
            &scratch.denoised,
            self.params.restore,
            plane,
        );

        Ok(())
    }

    fn check(&self, input: &Plane, scratch: &Scratch) -> Result<()> {
        if !scratch.fits(input) {
            bail!(GeometryError::ScratchMismatch);
        }

        ldebug!(
            "denoising {}x{} plane with pitch {}",
            input.width(),
            input.height(),
            input.pitch()
        );

        Ok(())
    }

    /// Run everything up to the final blend, leaving the fully denoised
    /// plane in `scratch.denoised`.
    fn reconstruct(&mut self, input: &Plane, scratch: &mut Scratch) {
        let Scratch {
            pyramid,
            smoothed,
            denoised,
        } = scratch;
        let [first, second] = smoothed;
        let FilterParameters {
            radius, strength, ..
        } = self.params;
        let scheduler = &mut self.scheduler;

        pyramid.level_mut(0).forward(scheduler, input);
        smooth::smooth(
            scheduler,
            &pyramid.levels()[0].bands().ll,
            first,
            radius,
            strength,
        );

        pyramid.level_mut(1).forward(scheduler, first);
        smooth::smooth(
            scheduler,
            &pyramid.levels()[1].bands().ll,
            second,
            radius,
            strength,
        );

        pyramid.level_mut(1).inverse(scheduler, Some(&*second), first);
        pyramid.level_mut(0).inverse(scheduler, Some(&*first), denoised);
    }
}

/// Denoise a single plane, allocating all buffers on the fly.
pub fn denoise(input: &Plane, params: FilterParameters) -> Result<Plane> {
    let mut denoiser = Denoiser::new(params)?;
    let mut scratch = Scratch::new(input.width(), input.height())?;
    let mut output = input.like();

    denoiser.process(input, &mut scratch, &mut output)?;

    Ok(output)
}

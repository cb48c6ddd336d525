//! Integration with the [image] crate.

use ::image::{GrayImage, ImageBuffer, Luma};

use crate::error::{GeometryError, Result};
use crate::{FilterParameters, Plane, denoise};

/// The number of fractional bits given to 8-bit samples on import.
///
/// The smoother works in fixed point with the precision of its input, so
/// 8-bit images are scaled up to keep its rounding below one output level.
pub const GRAY8_SHIFT: u32 = 4;

/// A 16-bit grayscale image.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

fn dimensions(plane: &Plane) -> Result<(u32, u32)> {
    let width = u32::try_from(plane.width()).map_err(|_| GeometryError::TooLarge)?;
    let height = u32::try_from(plane.height()).map_err(|_| GeometryError::TooLarge)?;

    Ok((width, height))
}

impl Plane {
    /// Import an 8-bit grayscale image, scaling samples by `1 << GRAY8_SHIFT`.
    pub fn from_luma8(image: &GrayImage) -> Result<Self> {
        let samples: Vec<i16> = image
            .pixels()
            .map(|p| i16::from(p.0[0]) << GRAY8_SHIFT)
            .collect();

        Self::from_samples(image.width() as usize, image.height() as usize, &samples)
    }

    /// Export to an 8-bit grayscale image, rounding and clamping each sample.
    pub fn to_luma8(&self) -> Result<GrayImage> {
        let (width, height) = dimensions(self)?;
        let half = 1 << (GRAY8_SHIFT - 1);

        Ok(ImageBuffer::from_fn(width, height, |x, y| {
            let sample = i32::from(self.get(x as usize, y as usize));
            Luma([((sample + half) >> GRAY8_SHIFT).clamp(0, 255) as u8])
        }))
    }

    /// Import a 16-bit grayscale image. Samples above `i16::MAX` are clamped.
    pub fn from_luma16(image: &Gray16Image) -> Result<Self> {
        let samples: Vec<i16> = image
            .pixels()
            .map(|p| p.0[0].min(i16::MAX as u16) as i16)
            .collect();

        Self::from_samples(image.width() as usize, image.height() as usize, &samples)
    }

    /// Export to a 16-bit grayscale image. Negative samples become 0.
    pub fn to_luma16(&self) -> Result<Gray16Image> {
        let (width, height) = dimensions(self)?;

        Ok(ImageBuffer::from_fn(width, height, |x, y| {
            Luma([self.get(x as usize, y as usize).max(0) as u16])
        }))
    }
}

/// Denoise an 8-bit grayscale image.
pub fn denoise_luma8(image: &GrayImage, params: FilterParameters) -> Result<GrayImage> {
    let plane = Plane::from_luma8(image)?;
    denoise(&plane, params)?.to_luma8()
}

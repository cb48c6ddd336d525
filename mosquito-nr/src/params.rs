//! Filter parameters.

use crate::error::{Error, ParameterError, Result, bail, err};

/// The largest supported smoothing strength.
///
/// Beyond it, the weight of the filtered pixel itself would turn negative
/// for the widest kernel (`256 - 8 * strength`).
pub const MAX_STRENGTH: u32 = 32;

/// The largest restore weight, meaning "output only the denoised plane".
pub const MAX_RESTORE: u32 = 128;

/// The spatial extent of the edge-directed smoother.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Radius {
    /// Candidate directions only reach the 8 direct neighbors.
    One,
    /// Candidate directions additionally reach neighbors at distance 2.
    #[default]
    Two,
}

impl Radius {
    /// Return the radius as an integer.
    pub fn get(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl TryFrom<u32> for Radius {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            _ => err!(ParameterError::InvalidRadius(value)),
        }
    }
}

/// Settings that control how aggressively noise is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParameters {
    /// The spatial extent of the smoother.
    pub radius: Radius,
    /// How strongly neighbors are averaged into each pixel, `0..=32`.
    ///
    /// A strength of 0 disables smoothing.
    pub strength: u32,
    /// The blend weight of the denoised plane, `0..=128`.
    ///
    /// 0 returns the input unchanged, 128 returns the fully denoised plane.
    pub restore: u32,
    /// The number of worker threads.
    pub threads: usize,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            radius: Radius::Two,
            strength: 16,
            restore: MAX_RESTORE,
            threads: rayon::current_num_threads(),
        }
    }
}

impl FilterParameters {
    /// Set the smoothing radius.
    pub fn with_radius(mut self, radius: Radius) -> Self {
        self.radius = radius;
        self
    }

    /// Set the smoothing strength.
    pub fn with_strength(mut self, strength: u32) -> Self {
        self.strength = strength;
        self
    }

    /// Set the restore weight.
    pub fn with_restore(mut self, restore: u32) -> Self {
        self.restore = restore;
        self
    }

    /// Set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Check that all parameters are within their supported ranges.
    pub fn validate(&self) -> Result<()> {
        if self.strength > MAX_STRENGTH {
            bail!(ParameterError::StrengthOutOfRange(self.strength));
        }

        if self.restore > MAX_RESTORE {
            bail!(ParameterError::RestoreOutOfRange(self.restore));
        }

        if self.threads == 0 {
            bail!(ParameterError::NoThreads);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = FilterParameters::default();

        assert_eq!(params.radius, Radius::Two);
        assert_eq!(params.strength, 16);
        assert_eq!(params.restore, 128);
        assert!(params.threads >= 1);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn radius_from_integer() {
        assert_eq!(Radius::try_from(1_u32), Ok(Radius::One));
        assert_eq!(Radius::try_from(2_u32), Ok(Radius::Two));
        assert_eq!(
            Radius::try_from(3_u32),
            Err(Error::Parameter(ParameterError::InvalidRadius(3)))
        );
        assert_eq!(
            Radius::try_from(0_u32),
            Err(Error::Parameter(ParameterError::InvalidRadius(0)))
        );
        assert_eq!(Radius::One.get(), 1);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let base = FilterParameters::default().with_threads(1);

        assert!(base.with_strength(MAX_STRENGTH).validate().is_ok());
        assert_eq!(
            base.with_strength(33).validate(),
            Err(Error::Parameter(ParameterError::StrengthOutOfRange(33)))
        );
        assert_eq!(
            base.with_restore(129).validate(),
            Err(Error::Parameter(ParameterError::RestoreOutOfRange(129)))
        );
        assert_eq!(
            base.with_threads(0).validate(),
            Err(Error::Parameter(ParameterError::NoThreads))
        );
    }
}

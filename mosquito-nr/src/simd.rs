//! Eight-lane vectors for the row-batched kernels.
//!
//! With the `simd` feature, [`f32x8`] wraps the vector type of
//! `fearless_simd` and [`dispatch`] picks the best instruction set at runtime.
//! Without it, both fall back to plain arrays, so the kernels are written
//! once against this module.
//!
//! Samples are widened to `f32`, which represents every intermediate value of
//! the integer kernels exactly as long as it stays below `2^24`.

pub(crate) const SIMD_WIDTH: usize = 8;

#[cfg(feature = "simd")]
mod inner {
    use super::SIMD_WIDTH;
    use core::ops::{Add, Mul, Sub};
    use fearless_simd::{SimdBase, SimdFloat};

    pub(crate) use fearless_simd::{Level, Simd, dispatch};

    #[derive(Copy, Clone)]
    #[allow(non_camel_case_types)]
    #[repr(C, align(32))]
    pub(crate) struct f32x8<S: Simd> {
        inner: fearless_simd::f32x8<S>,
    }

    impl<S: Simd> f32x8<S> {
        #[inline(always)]
        pub(crate) fn from_slice(simd: S, slice: &[f32]) -> Self {
            Self {
                inner: fearless_simd::f32x8::from_slice(simd, slice),
            }
        }

        #[inline(always)]
        pub(crate) fn floor(self) -> Self {
            Self {
                inner: self.inner.floor(),
            }
        }

        #[inline(always)]
        pub(crate) fn store(self, slice: &mut [f32]) {
            slice[..SIMD_WIDTH].copy_from_slice(self.inner.as_slice());
        }
    }

    impl<S: Simd> Add for f32x8<S> {
        type Output = Self;
        #[inline(always)]
        fn add(self, rhs: Self) -> Self {
            Self {
                inner: self.inner + rhs.inner,
            }
        }
    }

    impl<S: Simd> Sub for f32x8<S> {
        type Output = Self;
        #[inline(always)]
        fn sub(self, rhs: Self) -> Self {
            Self {
                inner: self.inner - rhs.inner,
            }
        }
    }

    impl<S: Simd> Add<f32> for f32x8<S> {
        type Output = Self;
        #[inline(always)]
        fn add(self, rhs: f32) -> Self {
            Self {
                inner: self.inner + rhs,
            }
        }
    }

    impl<S: Simd> Mul<f32> for f32x8<S> {
        type Output = Self;
        #[inline(always)]
        fn mul(self, rhs: f32) -> Self {
            Self {
                inner: self.inner * rhs,
            }
        }
    }
}

#[cfg(not(feature = "simd"))]
mod inner {
    use super::SIMD_WIDTH;
    use core::marker::PhantomData;
    use core::ops::{Add, Mul, Sub};

    pub(crate) trait Simd: Copy + Clone {}

    #[derive(Copy, Clone)]
    pub(crate) struct ScalarSimd;
    impl Simd for ScalarSimd {}

    pub(crate) struct Level;
    impl Level {
        #[inline(always)]
        pub(crate) fn new() -> Self {
            Self
        }
    }

    #[derive(Copy, Clone)]
    #[allow(non_camel_case_types)]
    #[repr(C, align(32))]
    pub(crate) struct f32x8<S: Simd> {
        val: [f32; SIMD_WIDTH],
        _marker: PhantomData<S>,
    }

    impl<S: Simd> f32x8<S> {
        #[inline(always)]
        fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
            Self {
                val: core::array::from_fn(f),
                _marker: PhantomData,
            }
        }

        #[inline(always)]
        pub(crate) fn from_slice(_simd: S, slice: &[f32]) -> Self {
            Self::from_fn(|i| slice[i])
        }

        #[inline(always)]
        pub(crate) fn floor(self) -> Self {
            Self::from_fn(|i| self.val[i].floor())
        }

        #[inline(always)]
        pub(crate) fn store(self, slice: &mut [f32]) {
            slice[..SIMD_WIDTH].copy_from_slice(&self.val);
        }
    }

    impl<S: Simd> Add for f32x8<S> {
        type Output = Self;
        #[inline(always)]
        fn add(self, rhs: Self) -> Self {
            Self::from_fn(|i| self.val[i] + rhs.val[i])
        }
    }

    impl<S: Simd> Sub for f32x8<S> {
        type Output = Self;
        #[inline(always)]
        fn sub(self, rhs: Self) -> Self {
            Self::from_fn(|i| self.val[i] - rhs.val[i])
        }
    }

    impl<S: Simd> Add<f32> for f32x8<S> {
        type Output = Self;
        #[inline(always)]
        fn add(self, rhs: f32) -> Self {
            Self::from_fn(|i| self.val[i] + rhs)
        }
    }

    impl<S: Simd> Mul<f32> for f32x8<S> {
        type Output = Self;
        #[inline(always)]
        fn mul(self, rhs: f32) -> Self {
            Self::from_fn(|i| self.val[i] * rhs)
        }
    }

    /// Scalar fallback for SIMD dispatch.
    #[doc(hidden)]
    #[macro_export]
    macro_rules! simd_dispatch {
        ($level:expr, $simd:ident => $body:expr) => {{
            let _ = $level;
            let $simd = $crate::simd::ScalarSimd;
            $body
        }};
    }

    pub(crate) use simd_dispatch as dispatch;
}

pub(crate) use inner::*;

impl<S: Simd> f32x8<S> {
    /// Widen the first eight samples of `samples`.
    #[inline(always)]
    pub(crate) fn from_i16(simd: S, samples: &[i16]) -> Self {
        let widened: [f32; SIMD_WIDTH] = core::array::from_fn(|i| f32::from(samples[i]));
        Self::from_slice(simd, &widened)
    }

    /// Store the lanes into the first eight samples of `samples`.
    ///
    /// Every lane must hold an integer. Values outside of the `i16` range wrap
    /// around, like the scalar kernels do.
    #[inline(always)]
    pub(crate) fn store_i16(self, samples: &mut [i16]) {
        let mut lanes = [0.0; SIMD_WIDTH];
        self.store(&mut lanes);

        for (sample, lane) in samples[..SIMD_WIDTH].iter_mut().zip(lanes) {
            *sample = lane as i32 as i16;
        }
    }
}

/// The number of leading samples of a row of `len` samples that fill whole
/// vectors. The rest is left to the scalar kernels.
#[inline(always)]
pub(crate) fn vector_len(len: usize) -> usize {
    len - len % SIMD_WIDTH
}

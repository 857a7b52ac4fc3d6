//! 4x4 matrix multiplication kernels over row-major `[f32; 16]` buffers.

use std::{fmt, str::FromStr};

use crate::error::ConfigError;

/// Signature shared by every kernel.
pub type MultiplyFn = fn(&[f32; 16], &[f32; 16], &mut [f32; 16]);

/// Multiplies with the general matrix multiply routine from `matrixmultiply`.
#[cfg(feature = "reference-library")]
pub fn multiply_library(a: &[f32; 16], b: &[f32; 16], d: &mut [f32; 16]) {
    // SAFETY: all three buffers hold 4 * 4 cells, which is exactly the extent
    // described by m = k = n = 4 with row stride 4 and column stride 1. `d` is
    // a unique borrow, so it cannot overlap `a` or `b`. With beta = 0 the
    // previous contents of `d` are never read.
    unsafe {
        matrixmultiply::sgemm(
            4,
            4,
            4,
            1.,
            a.as_ptr(),
            4,
            1,
            b.as_ptr(),
            4,
            1,
            0.,
            d.as_mut_ptr(),
            4,
            1,
        );
    }
}

/// Baseline i-j-k loop nest. The other kernels are checked against this one.
pub fn multiply_loop(a: &[f32; 16], b: &[f32; 16], d: &mut [f32; 16]) {
    for i in 0..4 {
        for j in 0..4 {
            let mut sum = 0.0f32;
            for k in 0..4 {
                sum += a[i * 4 + k] * b[k * 4 + j];
            }
            d[i * 4 + j] = sum;
        }
    }
}

/// Same loop nest as [`multiply_loop`], accumulating with `mul_add`.
pub fn multiply_loop_fma(a: &[f32; 16], b: &[f32; 16], d: &mut [f32; 16]) {
    for i in 0..4 {
        for j in 0..4 {
            let mut sum = 0.0f32;
            for k in 0..4 {
                sum = a[i * 4 + k].mul_add(b[k * 4 + j], sum);
            }
            d[i * 4 + j] = sum;
        }
    }
}

/// Fully unrolled kernel.
///
/// All of `b` is loaded into locals once, then each row of `a` is loaded into
/// `ai0..ai3` and combined with the columns of `b` through nested fused
/// multiply-adds. There is no loop-carried accumulator.
#[rustfmt::skip]
pub fn multiply_unrolled_fma(a: &[f32; 16], b: &[f32; 16], d: &mut [f32; 16]) {
    let [
        b00, b01, b02, b03,
        b10, b11, b12, b13,
        b20, b21, b22, b23,
        b30, b31, b32, b33,
    ] = *b;

    let [ai0, ai1, ai2, ai3] = [a[0], a[1], a[2], a[3]];
    d[0] = ai0.mul_add(b00, ai1.mul_add(b10, ai2.mul_add(b20, ai3 * b30)));
    d[1] = ai0.mul_add(b01, ai1.mul_add(b11, ai2.mul_add(b21, ai3 * b31)));
    d[2] = ai0.mul_add(b02, ai1.mul_add(b12, ai2.mul_add(b22, ai3 * b32)));
    d[3] = ai0.mul_add(b03, ai1.mul_add(b13, ai2.mul_add(b23, ai3 * b33)));

    let [ai0, ai1, ai2, ai3] = [a[4], a[5], a[6], a[7]];
    d[4] = ai0.mul_add(b00, ai1.mul_add(b10, ai2.mul_add(b20, ai3 * b30)));
    d[5] = ai0.mul_add(b01, ai1.mul_add(b11, ai2.mul_add(b21, ai3 * b31)));
    d[6] = ai0.mul_add(b02, ai1.mul_add(b12, ai2.mul_add(b22, ai3 * b32)));
    d[7] = ai0.mul_add(b03, ai1.mul_add(b13, ai2.mul_add(b23, ai3 * b33)));

    let [ai0, ai1, ai2, ai3] = [a[8], a[9], a[10], a[11]];
    d[8] = ai0.mul_add(b00, ai1.mul_add(b10, ai2.mul_add(b20, ai3 * b30)));
    d[9] = ai0.mul_add(b01, ai1.mul_add(b11, ai2.mul_add(b21, ai3 * b31)));
    d[10] = ai0.mul_add(b02, ai1.mul_add(b12, ai2.mul_add(b22, ai3 * b32)));
    d[11] = ai0.mul_add(b03, ai1.mul_add(b13, ai2.mul_add(b23, ai3 * b33)));

    let [ai0, ai1, ai2, ai3] = [a[12], a[13], a[14], a[15]];
    d[12] = ai0.mul_add(b00, ai1.mul_add(b10, ai2.mul_add(b20, ai3 * b30)));
    d[13] = ai0.mul_add(b01, ai1.mul_add(b11, ai2.mul_add(b21, ai3 * b31)));
    d[14] = ai0.mul_add(b02, ai1.mul_add(b12, ai2.mul_add(b22, ai3 * b32)));
    d[15] = ai0.mul_add(b03, ai1.mul_add(b13, ai2.mul_add(b23, ai3 * b33)));
}

/// [`multiply_unrolled_fma`] with the four rows driven by a loop.
#[rustfmt::skip]
pub fn multiply_unrolled_fma_loop(a: &[f32; 16], b: &[f32; 16], d: &mut [f32; 16]) {
    let [
        b00, b01, b02, b03,
        b10, b11, b12, b13,
        b20, b21, b22, b23,
        b30, b31, b32, b33,
    ] = *b;

    for i in 0..4 {
        let row = i * 4;
        let [ai0, ai1, ai2, ai3] = [a[row], a[row + 1], a[row + 2], a[row + 3]];
        d[row] = ai0.mul_add(b00, ai1.mul_add(b10, ai2.mul_add(b20, ai3 * b30)));
        d[row + 1] = ai0.mul_add(b01, ai1.mul_add(b11, ai2.mul_add(b21, ai3 * b31)));
        d[row + 2] = ai0.mul_add(b02, ai1.mul_add(b12, ai2.mul_add(b22, ai3 * b32)));
        d[row + 3] = ai0.mul_add(b03, ai1.mul_add(b13, ai2.mul_add(b23, ai3 * b33)));
    }
}

/// A selectable kernel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Variant {
    #[cfg(feature = "reference-library")]
    Library,
    Loop,
    LoopFma,
    UnrolledFma,
    UnrolledFmaLoop,
}

impl Variant {
    /// Every compiled-in variant.
    pub const ALL: &'static [Variant] = &[
        #[cfg(feature = "reference-library")]
        Variant::Library,
        Variant::Loop,
        Variant::LoopFma,
        Variant::UnrolledFma,
        Variant::UnrolledFmaLoop,
    ];

    /// The variant every other one is compared against.
    pub const BASELINE: Variant = Variant::Loop;

    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "reference-library")]
            Variant::Library => "library",
            Variant::Loop => "loop",
            Variant::LoopFma => "loop-fma",
            Variant::UnrolledFma => "unrolled-fma",
            Variant::UnrolledFmaLoop => "unrolled-fma-loop",
        }
    }

    pub fn function(self) -> MultiplyFn {
        match self {
            #[cfg(feature = "reference-library")]
            Variant::Library => multiply_library,
            Variant::Loop => multiply_loop,
            Variant::LoopFma => multiply_loop_fma,
            Variant::UnrolledFma => multiply_unrolled_fma,
            Variant::UnrolledFmaLoop => multiply_unrolled_fma_loop,
        }
    }

    #[inline]
    pub fn apply(self, a: &[f32; 16], b: &[f32; 16], d: &mut [f32; 16]) {
        (self.function())(a, b, d)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .iter()
            .copied()
            .find(|variant| variant.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownVariant(s.to_owned()))
    }
}

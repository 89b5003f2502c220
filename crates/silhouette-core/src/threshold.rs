//! Global thresholding and per-pixel image arithmetic.
//!
//! Every kernel runs row by row so strided views work unchanged, and the row
//! loops are multiversioned for the usual SIMD targets.

use crate::error::Result;
use crate::image::{ImageBuffer, ImageView};
use multiversion::multiversion;

/// Binarize `img`: pixels strictly above `threshold` become `high`, all others 0.
///
/// Thresholds at or above 255 produce an all-zero image.
#[must_use]
pub fn threshold_binary(img: &ImageView, threshold: u32, high: u8) -> ImageBuffer {
    let mut out = ImageBuffer::new(img.width, img.height);
    if img.width == 0 {
        return out;
    }
    let t = u8::try_from(threshold).unwrap_or(u8::MAX);
    for (src, dst) in img
        .rows()
        .zip(out.as_mut_slice().chunks_exact_mut(img.width))
    {
        threshold_row_simd(src, dst, t, high);
    }
    out
}

/// Pixelwise `a - b`, clamped at zero.
pub fn saturating_diff(a: &ImageView, b: &ImageView) -> Result<ImageBuffer> {
    b.ensure_size(a.width, a.height)?;
    let mut out = ImageBuffer::new(a.width, a.height);
    if a.width == 0 {
        return Ok(out);
    }
    for ((ra, rb), dst) in a
        .rows()
        .zip(b.rows())
        .zip(out.as_mut_slice().chunks_exact_mut(a.width))
    {
        sub_row_simd(ra, rb, dst);
    }
    Ok(out)
}

/// Keep the pixels of `img` where `mask` is nonzero, zero the rest.
pub fn apply_mask(img: &ImageView, mask: &ImageView) -> Result<ImageBuffer> {
    mask.ensure_size(img.width, img.height)?;
    let mut out = ImageBuffer::new(img.width, img.height);
    if img.width == 0 {
        return Ok(out);
    }
    for ((ri, rm), dst) in img
        .rows()
        .zip(mask.rows())
        .zip(out.as_mut_slice().chunks_exact_mut(img.width))
    {
        mask_row_simd(ri, rm, dst);
    }
    Ok(out)
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn threshold_row_simd(src: &[u8], dst: &mut [u8], threshold: u8, high: u8) {
    for (d, &s) in dst.iter_mut().zip(src) {
        // 0xFF if above, 0x00 otherwise
        let pass = u8::from(s > threshold).wrapping_neg();
        *d = pass & high;
    }
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn sub_row_simd(a: &[u8], b: &[u8], dst: &mut [u8]) {
    for ((d, &x), &y) in dst.iter_mut().zip(a).zip(b) {
        *d = x.saturating_sub(y);
    }
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn mask_row_simd(src: &[u8], mask: &[u8], dst: &mut [u8]) {
    for ((d, &s), &m) in dst.iter_mut().zip(src).zip(mask) {
        let keep = u8::from(m != 0).wrapping_neg();
        *d = s & keep;
    }
}

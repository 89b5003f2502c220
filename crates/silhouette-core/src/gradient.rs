//! Central-difference image gradients.

#![allow(clippy::cast_possible_wrap)]

use crate::image::ImageView;
use multiversion::multiversion;

/// Horizontal and vertical derivatives of an image, as `f32`.
///
/// Both are the correlation of the image with `[-1, 0, 1]` along their axis,
/// with the border replicated, so the output has the input's size.
#[derive(Clone, Debug)]
pub struct GradientField {
    /// Image width.
    pub width: usize,
    /// Image height.
    pub height: usize,
    /// `I(x + 1, y) - I(x - 1, y)`, row-major.
    pub dx: Vec<f32>,
    /// `I(x, y + 1) - I(x, y - 1)`, row-major.
    pub dy: Vec<f32>,
}

impl GradientField {
    /// Compute both derivatives of `img`.
    #[must_use]
    pub fn compute(img: &ImageView) -> Self {
        let (w, h) = (img.width, img.height);
        let mut dx = vec![0.0f32; w * h];
        let mut dy = vec![0.0f32; w * h];
        if w == 0 || h == 0 {
            return Self {
                width: w,
                height: h,
                dx,
                dy,
            };
        }

        for y in 0..h {
            let up = img.get_row(y.saturating_sub(1));
            let row = img.get_row(y);
            let down = img.get_row((y + 1).min(h - 1));
            let off = y * w;
            diff_row_x(row, &mut dx[off..off + w]);
            diff_rows(up, down, &mut dy[off..off + w]);
        }

        Self {
            width: w,
            height: h,
            dx,
            dy,
        }
    }

    /// Gradient magnitude at flat index `i`.
    #[inline]
    #[must_use]
    pub fn magnitude(&self, i: usize) -> f32 {
        self.dx[i].hypot(self.dy[i])
    }

    /// Gradient direction at flat index `i`, in degrees wrapped into `[0, max_angle)`.
    #[inline]
    #[must_use]
    pub fn orientation(&self, i: usize, max_angle: f32) -> f32 {
        let deg = self.dy[i].atan2(self.dx[i]).to_degrees().rem_euclid(max_angle);
        // rem_euclid can round up to max_angle for tiny negative inputs
        if deg >= max_angle { 0.0 } else { deg }
    }
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn diff_row_x(row: &[u8], out: &mut [f32]) {
    let w = row.len();
    for (x, o) in out.iter_mut().enumerate() {
        let left = row[x.saturating_sub(1)];
        let right = row[(x + 1).min(w - 1)];
        *o = f32::from(right) - f32::from(left);
    }
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn diff_rows(up: &[u8], down: &[u8], out: &mut [f32]) {
    for ((o, &a), &b) in out.iter_mut().zip(up).zip(down) {
        *o = f32::from(b) - f32::from(a);
    }
}

//! Median filtering for denoising the background-filtered image.
//!
//! The filter removes isolated speckles left behind by background
//! subtraction before the image is binarized and segmented. Borders are
//! handled by replicating the outermost pixels.

use crate::error::{PipelineError, Result};
use crate::image::ImageView;
use bumpalo::Bump;
use multiversion::multiversion;
use rayon::prelude::*;

/// Apply a `window x window` median filter to `img`, writing into `output`.
///
/// # Parameters
/// - `arena`: Scratch allocator for the clamped column lookup table
/// - `img`: Input grayscale image
/// - `window`: Odd window side (5 = 5x5 neighborhood)
/// - `output`: Output buffer, tightly packed (`img.width * img.height`)
///
/// # Implementation Notes
/// - Rows are filtered in parallel with rayon
/// - The per-pixel median uses `select_nth_unstable` on a reused scratch buffer
pub fn median_filter(arena: &Bump, img: &ImageView, window: usize, output: &mut [u8]) -> Result<()> {
    if window == 0 || window % 2 == 0 {
        return Err(PipelineError::InvalidConfig(format!(
            "median window must be odd and positive, got {window}"
        )));
    }
    let w = img.width;
    let h = img.height;
    if output.len() != w * h {
        return Err(PipelineError::InvalidBuffer(format!(
            "median output has {} bytes, expected {}",
            output.len(),
            w * h
        )));
    }
    if w == 0 || h == 0 {
        return Ok(());
    }

    let radius = window / 2;
    // Column index of every tap, border-replicated: xmap[x + k] for tap k at column x.
    let xmap: &[usize] = arena.alloc_slice_fill_with(w + 2 * radius, |i| {
        (i as isize - radius as isize).clamp(0, w as isize - 1) as usize
    });

    output
        .par_chunks_mut(w)
        .enumerate()
        .for_each_init(
            || (Vec::with_capacity(window), vec![0u8; window * window]),
            |(rows, scratch), (y, dst_row)| {
                rows.clear();
                for k in 0..window {
                    let sy = (y as isize + k as isize - radius as isize).clamp(0, h as isize - 1);
                    rows.push(img.get_row(sy as usize));
                }
                median_row(rows, xmap, window, scratch, dst_row);
            },
        );
    Ok(())
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn median_row(rows: &[&[u8]], xmap: &[usize], window: usize, scratch: &mut [u8], dst: &mut [u8]) {
    let mid = (window * window) / 2;
    for (x, d) in dst.iter_mut().enumerate() {
        let taps = &xmap[x..x + window];
        let mut n = 0;
        for row in rows {
            for &sx in taps {
                scratch[n] = row[sx];
                n += 1;
            }
        }
        let (_, median, _) = scratch.select_nth_unstable(mid);
        *d = *median;
    }
}

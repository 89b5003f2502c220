//! Person segmentation and canvas normalization.
//!
//! A background-filtered image is denoised, binarized and split into
//! 8-connected regions. Regions enclosing enough area become detections, and
//! each is padded (or cropped, depending on [`OversizePolicy`]) onto a
//! fixed-size canvas for feature extraction.

use crate::config::{OversizePolicy, PipelineConfig};
use crate::contour::{Contour, find_external_contours};
use crate::error::{PipelineError, Result};
use crate::filter::median_filter;
use crate::image::{ImageBuffer, ImageView, Rect};
use crate::segmentation::label_components_with_stats;
use crate::threshold::threshold_binary;
use bumpalo::Bump;

/// Pixels strictly above this value are foreground after denoising.
pub const FOREGROUND_THRESHOLD: u32 = 1;

/// Finds person regions in background-filtered images.
#[derive(Clone, Copy, Debug)]
pub struct PersonSegmenter {
    /// Contours must enclose strictly more than this area.
    pub min_contour_area: f64,
    /// Median filter window, odd.
    pub median_filter_size: usize,
}

impl PersonSegmenter {
    /// Segmenter with the given minimum area and median window.
    #[must_use]
    pub fn new(min_contour_area: f64, median_filter_size: usize) -> Self {
        Self {
            min_contour_area,
            median_filter_size,
        }
    }

    /// Segmenter from pipeline configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.min_contour_area, config.median_filter_size)
    }

    /// Contours of every region whose enclosed area exceeds the minimum.
    pub fn segment_contours(&self, arena: &Bump, img: &ImageView) -> Result<Vec<Contour>> {
        let _span = tracing::info_span!("segmentation").entered();
        let (w, h) = (img.width, img.height);

        let denoised = arena.alloc_slice_fill_copy(w * h, 0u8);
        median_filter(arena, img, self.median_filter_size, denoised)?;
        let denoised = ImageView::new(denoised, w, h, w)?;
        let binary = threshold_binary(&denoised, FOREGROUND_THRESHOLD, 255);

        let labels = label_components_with_stats(arena, binary.as_slice(), w, h);
        let total = labels.component_stats.len();
        let kept: Vec<Contour> = find_external_contours(arena, &labels, w, h)
            .into_iter()
            .filter(|c| c.area > self.min_contour_area)
            .collect();
        tracing::debug!(components = total, kept = kept.len(), "segmented regions");
        Ok(kept)
    }

    /// Bounding rectangles of every region whose enclosed area exceeds the minimum.
    pub fn segment(&self, arena: &Bump, img: &ImageView) -> Result<Vec<Rect>> {
        Ok(self
            .segment_contours(arena, img)?
            .into_iter()
            .map(|c| c.bounding_rect)
            .collect())
    }
}

/// Pad `src` with zeros to exactly `width x height`, centering it.
///
/// Each side receives `(target - source) / 2` pixels; when the difference is
/// odd the extra pixel goes to the bottom or right.
pub fn add_padding(src: &ImageView, width: usize, height: usize) -> Result<ImageBuffer> {
    if src.width > width || src.height > height {
        return Err(PipelineError::RegionTooLarge {
            width: src.width,
            height: src.height,
            canvas_width: width,
            canvas_height: height,
        });
    }
    let left = (width - src.width) / 2;
    let top = (height - src.height) / 2;
    let mut out = ImageBuffer::new(width, height);
    let dst = out.as_mut_slice();
    for (y, row) in src.rows().enumerate() {
        let start = (top + y) * width + left;
        dst[start..start + src.width].copy_from_slice(row);
    }
    Ok(out)
}

/// Place the `rect` region of `img` on a `width x height` canvas.
pub fn normalize_region(
    img: &ImageView,
    rect: Rect,
    width: usize,
    height: usize,
    policy: OversizePolicy,
) -> Result<ImageBuffer> {
    let _span = tracing::debug_span!("normalize").entered();
    let region = img.sub_view(rect)?;
    if region.width <= width && region.height <= height {
        return add_padding(&region, width, height);
    }
    match policy {
        OversizePolicy::Reject => Err(PipelineError::RegionTooLarge {
            width: region.width,
            height: region.height,
            canvas_width: width,
            canvas_height: height,
        }),
        OversizePolicy::CenterCrop => {
            let crop_w = region.width.min(width);
            let crop_h = region.height.min(height);
            let window = Rect::new(
                (region.width - crop_w) / 2,
                (region.height - crop_h) / 2,
                crop_w,
                crop_h,
            );
            tracing::debug!(?rect, ?window, "center-cropping oversized region");
            add_padding(&region.sub_view(window)?, width, height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scene(width: usize, height: usize, blocks: &[(Rect, u8)]) -> ImageBuffer {
        let mut img = ImageBuffer::new(width, height);
        for &(r, v) in blocks {
            img.fill_rect(r, v);
        }
        img
    }

    #[test]
    fn test_segment_single_block() {
        let img = scene(80, 90, &[(Rect::new(10, 15, 30, 40), 200)]);
        let arena = Bump::new();
        let rects = PersonSegmenter::new(300.0, 5)
            .segment(&arena, &img.as_view())
            .unwrap();
        assert_eq!(rects, vec![Rect::new(10, 15, 30, 40)]);
    }

    #[test]
    fn test_segment_drops_small_regions_and_speckle() {
        let mut img = scene(
            120,
            80,
            &[
                (Rect::new(5, 5, 40, 50), 120),
                (Rect::new(70, 10, 10, 10), 120),
            ],
        );
        img.set(100, 70, 255);
        let arena = Bump::new();
        let contours = PersonSegmenter::new(300.0, 5)
            .segment_contours(&arena, &img.as_view())
            .unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect, Rect::new(5, 5, 40, 50));
    }

    #[test]
    fn test_segment_ignores_values_at_threshold() {
        let img = scene(40, 40, &[(Rect::new(5, 5, 30, 30), 1)]);
        let arena = Bump::new();
        let rects = PersonSegmenter::new(10.0, 3)
            .segment(&arena, &img.as_view())
            .unwrap();
        assert!(rects.is_empty());
    }

    #[test]
    fn test_add_padding_odd_difference() {
        let src = ImageBuffer::from_raw(vec![9; 6], 3, 2).unwrap();
        let out = add_padding(&src.as_view(), 6, 5).unwrap();
        // left 1, right 2, top 1, bottom 2
        #[rustfmt::skip]
        let expected = [
            0, 0, 0, 0, 0, 0,
            0, 9, 9, 9, 0, 0,
            0, 9, 9, 9, 0, 0,
            0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(out.as_slice(), &expected);
    }

    #[test]
    fn test_normalize_rejects_oversized_by_default() {
        let img = scene(200, 200, &[]);
        let err = normalize_region(
            &img.as_view(),
            Rect::new(0, 0, 120, 50),
            110,
            100,
            OversizePolicy::Reject,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::RegionTooLarge { width: 120, .. }));
    }

    #[test]
    fn test_normalize_center_crop() {
        let mut img = ImageBuffer::new(10, 4);
        for x in 0..10 {
            for y in 0..4 {
                img.set(x, y, x as u8 + 1);
            }
        }
        let out = normalize_region(
            &img.as_view(),
            Rect::new(0, 0, 10, 4),
            6,
            6,
            OversizePolicy::CenterCrop,
        )
        .unwrap();
        assert_eq!((out.width(), out.height()), (6, 6));
        // Columns 2..8 kept, one blank row above and below.
        assert_eq!(&out.as_slice()[6..12], &[3, 4, 5, 6, 7, 8]);
        assert!(out.as_slice()[..6].iter().all(|&v| v == 0));
    }

    proptest! {
        #[test]
        fn prop_padding_identity_on_matching_size(
            w in 1..20usize, h in 1..20usize,
            data in prop::collection::vec(0..=255u8, 400),
        ) {
            let src = ImageBuffer::from_raw(data[..w * h].to_vec(), w, h).unwrap();
            let out = add_padding(&src.as_view(), w, h).unwrap();
            prop_assert_eq!(out, src);
        }

        #[test]
        fn prop_padding_preserves_pixel_sum(
            w in 1..12usize, h in 1..12usize,
            dw in 0..9usize, dh in 0..9usize,
            data in prop::collection::vec(0..=255u8, 144),
        ) {
            let src = ImageBuffer::from_raw(data[..w * h].to_vec(), w, h).unwrap();
            let out = add_padding(&src.as_view(), w + dw, h + dh).unwrap();
            let sum = |s: &[u8]| s.iter().map(|&v| u64::from(v)).sum::<u64>();
            prop_assert_eq!(sum(out.as_slice()), sum(src.as_slice()));
            prop_assert_eq!(out.get(dw / 2, dh / 2), src.get(0, 0));
        }
    }
}

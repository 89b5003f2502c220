//! Background suppression against a reference frame.
//!
//! The frame is subtracted from the image and the difference thresholded at
//! a level read off the image histogram: the first rise after the
//! background peak, looked up in bin centers narrowed to the occupied
//! intensity range.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::histogram::{Histogram, lookup, refined_bin_centers};
use crate::image::{ImageBuffer, ImageView};
use crate::threshold::{apply_mask, saturating_diff, threshold_binary};

/// Removes the static background from person images.
#[derive(Clone, Copy, Debug)]
pub struct BackgroundFilter {
    /// Intensity histogram bins.
    pub nbins: usize,
    /// Exclusive upper bound of the intensity range.
    pub max_value: u32,
}

impl BackgroundFilter {
    /// Filter with explicit histogram parameters.
    #[must_use]
    pub fn new(nbins: usize, max_value: u32) -> Self {
        Self { nbins, max_value }
    }

    /// Filter from pipeline configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.hist_nbins, config.max_intensity)
    }

    /// Difference threshold for `image`.
    ///
    /// Depends only on the image histogram, not on the background frame.
    pub fn threshold(&self, image: &ImageView) -> Result<u32> {
        let hist = Histogram::compute(image, self.nbins, self.max_value);
        let zero_pos = hist.zero_tail_start()?;
        let refined = refined_bin_centers(self.nbins, self.max_value, zero_pos)?;
        let loc_min = hist.first_rise().ok_or(PipelineError::NoLocalMinimum)?;
        let threshold = lookup(&refined, loc_min)?;
        tracing::debug!(zero_pos, loc_min, threshold, "background threshold");
        Ok(threshold)
    }

    /// `image` with every pixel that does not differ enough from `background` set to 0.
    pub fn filter(&self, image: &ImageView, background: &ImageView) -> Result<ImageBuffer> {
        let _span = tracing::info_span!("background_filter").entered();
        let diff = saturating_diff(image, background)?;
        let threshold = self.threshold(image)?;
        let mask = threshold_binary(&diff.as_view(), threshold, 1);
        apply_mask(image, &mask.as_view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rect;

    fn frames() -> (ImageBuffer, ImageBuffer) {
        let mut background = ImageBuffer::new(60, 50);
        background.fill_rect(Rect::new(0, 0, 60, 50), 20);
        let mut image = background.clone();
        image.fill_rect(Rect::new(20, 10, 15, 25), 200);
        (image, background)
    }

    #[test]
    fn test_threshold_from_histogram() {
        let (image, _) = frames();
        // 20 -> bin 1, 200 -> bin 15; zero tail at 16, coarse[16] = 198,
        // refined step 9 from 4, first rise at 1 -> 13.
        let t = BackgroundFilter::new(20, 255).threshold(&image.as_view()).unwrap();
        assert_eq!(t, 13);
    }

    #[test]
    fn test_filter_keeps_foreground_only() {
        let (image, background) = frames();
        let out = BackgroundFilter::new(20, 255)
            .filter(&image.as_view(), &background.as_view())
            .unwrap();
        assert_eq!(out.get(25, 20), 200);
        assert_eq!(out.get(5, 5), 0);
        let kept = out.as_slice().iter().filter(|&&v| v != 0).count();
        assert_eq!(kept, 15 * 25);
    }

    #[test]
    fn test_filter_output_is_masked_image() {
        let (image, background) = frames();
        let out = BackgroundFilter::new(20, 255)
            .filter(&image.as_view(), &background.as_view())
            .unwrap();
        for (&o, &i) in out.as_slice().iter().zip(image.as_slice()) {
            assert!(o == 0 || o == i);
        }
    }

    #[test]
    fn test_saturated_image_has_no_zero_tail() {
        let (mut image, background) = frames();
        image.set(0, 0, 250);
        let err = BackgroundFilter::new(20, 255)
            .filter(&image.as_view(), &background.as_view())
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoZeroTail { nbins: 20 }));
    }

    #[test]
    fn test_empty_histogram() {
        // Everything at 255 falls outside [0, 255).
        let image = ImageBuffer::from_raw(vec![255; 16], 4, 4).unwrap();
        let err = BackgroundFilter::new(20, 255)
            .threshold(&image.as_view())
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyHistogram { max_value: 255 }));
    }

    #[test]
    fn test_no_local_minimum() {
        // Monotonically falling histogram: bins 0, 1, 2 hold 10, 5, 1.
        let mut data = vec![0u8; 10];
        data.extend([13u8; 5]);
        data.push(26);
        let image = ImageBuffer::from_raw(data, 16, 1).unwrap();
        let err = BackgroundFilter::new(20, 255)
            .threshold(&image.as_view())
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoLocalMinimum));
    }

    #[test]
    fn test_size_mismatch() {
        let (image, _) = frames();
        let small = ImageBuffer::new(10, 10);
        let err = BackgroundFilter::new(20, 255)
            .filter(&image.as_view(), &small.as_view())
            .unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { .. }));
    }
}

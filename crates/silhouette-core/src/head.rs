//! Head localization from image moments.
//!
//! The head is taken to be the brightest region of a person crop: the image
//! is thresholded just below the top of its occupied intensity range and
//! the centroid of what remains is returned.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::histogram::{Histogram, lookup, refined_bin_centers};
use crate::image::ImageView;
use crate::threshold::threshold_binary;

/// Raw spatial moments up to first order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    /// Sum of intensities.
    pub m00: f64,
    /// Sum of `x * intensity`.
    pub m10: f64,
    /// Sum of `y * intensity`.
    pub m01: f64,
}

impl Moments {
    /// Moments of `img`, weighting every pixel by its value.
    #[must_use]
    pub fn compute(img: &ImageView) -> Self {
        let mut m = Self::default();
        for (y, row) in img.rows().enumerate() {
            let mut row_sum = 0u64;
            let mut row_x = 0u64;
            for (x, &v) in row.iter().enumerate() {
                row_sum += u64::from(v);
                row_x += x as u64 * u64::from(v);
            }
            m.m00 += row_sum as f64;
            m.m10 += row_x as f64;
            m.m01 += (y as u64 * row_sum) as f64;
        }
        m
    }

    /// `(m10 / m00, m01 / m00)`, or `None` for an empty image.
    #[must_use]
    pub fn centroid(&self) -> Option<(f64, f64)> {
        (self.m00 > 0.0).then(|| (self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// Locates the head in a person crop.
#[derive(Clone, Copy, Debug)]
pub struct HeadLocator {
    /// Intensity histogram bins.
    pub nbins: usize,
    /// Exclusive upper bound of the intensity range.
    pub max_value: u32,
}

impl HeadLocator {
    /// Locator with explicit histogram parameters.
    #[must_use]
    pub fn new(nbins: usize, max_value: u32) -> Self {
        Self { nbins, max_value }
    }

    /// Locator from pipeline configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.hist_nbins, config.max_intensity)
    }

    /// Intensity above which pixels count as head.
    pub fn threshold(&self, image: &ImageView) -> Result<u32> {
        let hist = Histogram::compute(image, self.nbins, self.max_value);
        let border = hist.zero_tail_start()?;
        let refined = refined_bin_centers(self.nbins, self.max_value, border)?;
        lookup(&refined, self.nbins.saturating_sub(2))
    }

    /// Centroid `(x, y)` of the pixels above [`threshold`](Self::threshold).
    pub fn locate(&self, image: &ImageView) -> Result<(f64, f64)> {
        let threshold = self.threshold(image)?;
        let high = u8::try_from(self.max_value).unwrap_or(u8::MAX);
        let mask = threshold_binary(image, threshold, high);
        let centroid = Moments::compute(&mask.as_view())
            .centroid()
            .ok_or(PipelineError::EmptyHeadMask { threshold })?;
        tracing::debug!(threshold, x = centroid.0, y = centroid.1, "head located");
        Ok(centroid)
    }
}

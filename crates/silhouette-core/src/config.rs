//! Configuration types for the recognition pipeline.
//!
//! [`PipelineConfig`] carries every tunable of the pipeline: canvas geometry,
//! HOG layout, histogram parameters and the segmentation knobs. It is
//! immutable once a [`Recognizer`](crate::Recognizer) has been built from it,
//! and the same value must be used for training and inference.

use crate::error::{PipelineError, Result};

// ============================================================================
// OversizePolicy
// ============================================================================

/// What to do with a segmented region that is larger than the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OversizePolicy {
    /// Fail the image with [`PipelineError::RegionTooLarge`].
    #[default]
    Reject,
    /// Keep the centered canvas-sized window of the region.
    CenterCrop,
}

// ============================================================================
// PipelineConfig
// ============================================================================

/// Pipeline-level configuration.
///
/// # Example
/// ```
/// use silhouette_core::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .cell_size(8)
///     .min_contour_area(500.0)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    // Canvas
    /// Height of the normalized canvas (default: 100).
    pub canvas_height: usize,
    /// Width of the normalized canvas (default: 110).
    pub canvas_width: usize,

    // HOG layout
    /// Side of a square HOG cell in pixels (default: 6).
    pub cell_size: usize,
    /// Side of a square block, in cells (default: 3).
    pub block_size: usize,
    /// Orientation bins per cell (default: 9).
    pub hog_bins: usize,
    /// Orientation range in degrees (default: 360.0).
    pub max_angle: f32,

    // Intensity histograms
    /// Bins of the intensity histograms used for thresholding (default: 20).
    pub hist_nbins: usize,
    /// Exclusive upper bound of the intensity range (default: 255).
    pub max_intensity: u32,

    // Segmentation
    /// Contours must enclose strictly more than this area (default: 300.0).
    pub min_contour_area: f64,
    /// Window side of the denoising median filter, odd (default: 5).
    pub median_filter_size: usize,
    /// Handling of regions larger than the canvas (default: reject).
    pub oversize_policy: OversizePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canvas_height: 100,
            canvas_width: 110,
            cell_size: 6,
            block_size: 3,
            hog_bins: 9,
            max_angle: 360.0,
            hist_nbins: 20,
            max_intensity: 255,
            min_contour_area: 300.0,
            median_filter_size: 5,
            oversize_policy: OversizePolicy::Reject,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Preset for body-orientation recognition. Same as [`Default`].
    #[must_use]
    pub fn orientation() -> Self {
        Self::default()
    }

    /// Preset for gender recognition on 71x71 head crops.
    #[must_use]
    pub fn gender() -> Self {
        Self {
            canvas_height: 71,
            canvas_width: 71,
            ..Self::default()
        }
    }

    /// Check every parameter against its valid domain.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("canvas_height", self.canvas_height),
            ("canvas_width", self.canvas_width),
            ("cell_size", self.cell_size),
            ("block_size", self.block_size),
            ("hog_bins", self.hog_bins),
            ("hist_nbins", self.hist_nbins),
            ("median_filter_size", self.median_filter_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be positive"
                )));
            }
        }
        if self.median_filter_size % 2 == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "median_filter_size must be odd, got {}",
                self.median_filter_size
            )));
        }
        if self.hist_nbins < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "hist_nbins must be at least 2, got {}",
                self.hist_nbins
            )));
        }
        if !(1..=256).contains(&self.max_intensity) {
            return Err(PipelineError::InvalidConfig(format!(
                "max_intensity must be in 1..=256, got {}",
                self.max_intensity
            )));
        }
        if !(self.max_angle.is_finite() && self.max_angle > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "max_angle must be a positive angle in degrees, got {}",
                self.max_angle
            )));
        }
        if !(self.min_contour_area.is_finite() && self.min_contour_area >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "min_contour_area must be non-negative, got {}",
                self.min_contour_area
            )));
        }
        Ok(())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Default)]
pub struct PipelineConfigBuilder {
    canvas_height: Option<usize>,
    canvas_width: Option<usize>,
    cell_size: Option<usize>,
    block_size: Option<usize>,
    hog_bins: Option<usize>,
    max_angle: Option<f32>,
    hist_nbins: Option<usize>,
    max_intensity: Option<u32>,
    min_contour_area: Option<f64>,
    median_filter_size: Option<usize>,
    oversize_policy: Option<OversizePolicy>,
}

impl PipelineConfigBuilder {
    /// Set the canvas size as `(height, width)`.
    #[must_use]
    pub fn canvas(mut self, height: usize, width: usize) -> Self {
        self.canvas_height = Some(height);
        self.canvas_width = Some(width);
        self
    }

    /// Set the HOG cell size.
    #[must_use]
    pub fn cell_size(mut self, size: usize) -> Self {
        self.cell_size = Some(size);
        self
    }

    /// Set the block size in cells.
    #[must_use]
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = Some(size);
        self
    }

    /// Set the number of orientation bins.
    #[must_use]
    pub fn hog_bins(mut self, bins: usize) -> Self {
        self.hog_bins = Some(bins);
        self
    }

    /// Set the orientation range in degrees.
    #[must_use]
    pub fn max_angle(mut self, degrees: f32) -> Self {
        self.max_angle = Some(degrees);
        self
    }

    /// Set the number of intensity histogram bins.
    #[must_use]
    pub fn hist_nbins(mut self, nbins: usize) -> Self {
        self.hist_nbins = Some(nbins);
        self
    }

    /// Set the exclusive upper intensity bound.
    #[must_use]
    pub fn max_intensity(mut self, max: u32) -> Self {
        self.max_intensity = Some(max);
        self
    }

    /// Set the minimum enclosed contour area.
    #[must_use]
    pub fn min_contour_area(mut self, area: f64) -> Self {
        self.min_contour_area = Some(area);
        self
    }

    /// Set the median filter window (must be odd).
    #[must_use]
    pub fn median_filter_size(mut self, size: usize) -> Self {
        self.median_filter_size = Some(size);
        self
    }

    /// Set the policy for regions larger than the canvas.
    #[must_use]
    pub fn oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.oversize_policy = Some(policy);
        self
    }

    /// Build the configuration, using defaults for unset fields.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        let d = PipelineConfig::default();
        PipelineConfig {
            canvas_height: self.canvas_height.unwrap_or(d.canvas_height),
            canvas_width: self.canvas_width.unwrap_or(d.canvas_width),
            cell_size: self.cell_size.unwrap_or(d.cell_size),
            block_size: self.block_size.unwrap_or(d.block_size),
            hog_bins: self.hog_bins.unwrap_or(d.hog_bins),
            max_angle: self.max_angle.unwrap_or(d.max_angle),
            hist_nbins: self.hist_nbins.unwrap_or(d.hist_nbins),
            max_intensity: self.max_intensity.unwrap_or(d.max_intensity),
            min_contour_area: self.min_contour_area.unwrap_or(d.min_contour_area),
            median_filter_size: self.median_filter_size.unwrap_or(d.median_filter_size),
            oversize_policy: self.oversize_policy.unwrap_or(d.oversize_policy),
        }
    }
}

//! Error types shared by every pipeline stage.

use std::path::PathBuf;

/// Errors produced by the recognition pipeline.
///
/// Precondition violations (`EmptyHistogram`, `NoZeroTail`, `NoLocalMinimum`,
/// `BinOutOfRange`, `EmptyHeadMask`, `RegionTooLarge`) abort the pipeline for
/// a single image only; batch extraction logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The pixel buffer does not cover the requested dimensions.
    #[error("invalid image buffer: {0}")]
    InvalidBuffer(String),

    /// A configuration value is outside its valid domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two images (or an image and the canvas) disagree on their size.
    #[error(
        "image is {actual_width}x{actual_height} (w x h) but {expected_width}x{expected_height} was expected"
    )]
    DimensionMismatch {
        /// Expected width in pixels.
        expected_width: usize,
        /// Expected height in pixels.
        expected_height: usize,
        /// Width of the offending image.
        actual_width: usize,
        /// Height of the offending image.
        actual_height: usize,
    },

    /// A rectangle does not fit inside the image it is applied to.
    #[error("region {x},{y} {width}x{height} exceeds image bounds {image_width}x{image_height}")]
    RegionOutOfBounds {
        /// Left edge of the rectangle.
        x: usize,
        /// Top edge of the rectangle.
        y: usize,
        /// Rectangle width.
        width: usize,
        /// Rectangle height.
        height: usize,
        /// Width of the image.
        image_width: usize,
        /// Height of the image.
        image_height: usize,
    },

    /// No sample fell into `[0, max_value)`.
    #[error("histogram is empty: no sample in [0, {max_value})")]
    EmptyHistogram {
        /// Upper (exclusive) bound of the histogram range.
        max_value: u32,
    },

    /// The highest histogram bin is occupied, so there is no empty tail to
    /// anchor the refined bins on.
    #[error("histogram has no empty tail above its last occupied bin ({nbins} bins)")]
    NoZeroTail {
        /// Number of bins in the histogram.
        nbins: usize,
    },

    /// The histogram never rises again after its first bin.
    #[error("histogram has no local minimum separating background from foreground")]
    NoLocalMinimum,

    /// A refined bin sequence is shorter than the index being looked up.
    #[error("bin index {index} is out of range for {len} bin centers")]
    BinOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of bin centers available.
        len: usize,
    },

    /// The head threshold left no pixel set, so the centroid is undefined.
    #[error("head mask is empty; no pixel above threshold {threshold}")]
    EmptyHeadMask {
        /// Threshold that was applied.
        threshold: u32,
    },

    /// A segmented region does not fit on the canvas and the policy rejects it.
    #[error("region {width}x{height} does not fit the {canvas_width}x{canvas_height} canvas")]
    RegionTooLarge {
        /// Region width.
        width: usize,
        /// Region height.
        height: usize,
        /// Canvas width.
        canvas_width: usize,
        /// Canvas height.
        canvas_height: usize,
    },

    /// The feature vector length does not match the model or layout.
    #[error("feature vector has {actual} values but {expected} were expected")]
    FeatureLengthMismatch {
        /// Length the model or layout was built for.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The image codec could not decode a file.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// Path of the image.
        path: PathBuf,
        /// Underlying codec error.
        #[source]
        source: image::ImageError,
    },

    /// The image codec could not encode a buffer to a file.
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        /// Destination path.
        path: PathBuf,
        /// Underlying codec error.
        #[source]
        source: image::ImageError,
    },

    /// The class label could not be parsed from a file name.
    #[error("cannot derive a label from file name {0:?}")]
    InvalidLabel(String),

    /// Every training sample failed or the dataset was empty.
    #[error("no usable training samples")]
    EmptyTrainingSet,

    /// The classifier backend reported an error.
    #[error("classifier failure: {0}")]
    Classifier(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Returns true for errors that only invalidate the current image.
    ///
    /// Batch extraction logs these as warnings and anything else as an error.
    #[must_use]
    pub fn is_per_image(&self) -> bool {
        matches!(
            self,
            Self::InvalidBuffer(_)
                | Self::DimensionMismatch { .. }
                | Self::RegionOutOfBounds { .. }
                | Self::EmptyHistogram { .. }
                | Self::NoZeroTail { .. }
                | Self::NoLocalMinimum
                | Self::BinOutOfRange { .. }
                | Self::EmptyHeadMask { .. }
                | Self::RegionTooLarge { .. }
                | Self::Io { .. }
                | Self::Decode { .. }
                | Self::InvalidLabel(_)
        )
    }
}

//! Core feature extraction for the Silhouette recognition library.
//!
//! Silhouette classifies grayscale images of people (body orientation,
//! gender) with a classic pipeline: background suppression, person
//! segmentation, Histogram-of-Oriented-Gradients features and a pluggable
//! classifier.
//!
//! # Architecture Overview
//!
//! 1. **Background suppression**:
//!    - Saturating difference against a reference frame.
//!    - Threshold picked from the image histogram ([`background`], [`histogram`]).
//!
//! 2. **Segmentation**:
//!    - Median denoising with multiversioned row kernels ([`filter`]).
//!    - Run-based connected components labeling over a union-find forest.
//!    - Moore-neighbor tracing of external contours and shoelace area filtering.
//!
//! 3. **Normalization**:
//!    - Zero-copy region views, symmetric zero padding onto a fixed canvas.
//!
//! 4. **Features**:
//!    - Central-difference gradients, magnitude-weighted cell histograms.
//!    - Block-wise L2 normalization over an `nalgebra` matrix ([`hog`]).
//!
//! 5. **Classification**:
//!    - [`classifier::Classifier`] trait; the crate ships no solver.
//!
//! # Configuration
//!
//! [`config::PipelineConfig`] holds every parameter. The same value must be
//! used for training and inference; the derived [`grid::HogLayout`] fixes the
//! feature vector length.
//!
//! # Example
//!
//! ```
//! # use silhouette_core::{Recognizer, config::PipelineConfig};
//! # use silhouette_core::image::{ImageBuffer, Rect};
//! let mut recognizer = Recognizer::with_config(PipelineConfig::default()).unwrap();
//!
//! let mut background = ImageBuffer::new(160, 120);
//! background.fill_rect(Rect::new(0, 0, 160, 120), 20);
//! let mut frame = background.clone();
//! frame.fill_rect(Rect::new(60, 20, 30, 80), 200);
//!
//! let detections = recognizer
//!     .detect(&frame.as_view(), &background.as_view())
//!     .unwrap();
//! assert_eq!(detections.len(), 1);
//! assert_eq!(detections[0].features.len(), recognizer.layout().feature_len());
//! ```

/// Background suppression against a reference frame.
pub mod background;
/// Classifier trait and length-checked model wrapper.
pub mod classifier;
/// Configuration types for the pipeline.
pub mod config;
/// External contour tracing.
pub mod contour;
/// Labeled image datasets on disk.
pub mod dataset;
/// Error types.
pub mod error;
/// Median filtering.
pub mod filter;
/// Central-difference gradients.
pub mod gradient;
/// Cell and block grids.
pub mod grid;
/// Head localization.
pub mod head;
/// Intensity histograms and bin centers.
pub mod histogram;
/// HOG descriptors.
pub mod hog;
/// Image buffer abstractions.
pub mod image;
/// Connected components labeling using Union-Find.
pub mod segmentation;
/// Person segmentation and canvas normalization.
pub mod segmenter;
/// Utilities for testing and synthetic data generation.
pub mod test_utils;
/// Global thresholding and pixel arithmetic.
pub mod threshold;

use std::path::{Path, PathBuf};
use std::time::Instant;

use bumpalo::Bump;
use rayon::prelude::*;

use crate::background::BackgroundFilter;
use crate::classifier::{Classifier, TrainedModel};
pub use crate::config::{OversizePolicy, PipelineConfig};
use crate::dataset::{DEFAULT_EXTENSION, DatasetEntry, load_entries, load_grayscale};
pub use crate::error::{PipelineError, Result};
use crate::grid::HogLayout;
use crate::head::HeadLocator;
pub use crate::hog::FeatureVector;
use crate::hog::HogExtractor;
pub use crate::image::{ImageBuffer, ImageView, Rect};
use crate::segmenter::{PersonSegmenter, normalize_region};

/// A person found in a frame.
#[derive(Clone, Debug)]
pub struct Detection {
    /// Bounding rectangle in frame coordinates.
    pub rect: Rect,
    /// Area enclosed by the person's outer contour.
    pub contour_area: f64,
    /// HOG descriptor of the normalized region.
    pub features: FeatureVector,
}

/// Pipeline-wide statistics for a single detection call.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineStats {
    /// Time taken for background suppression in milliseconds.
    pub background_ms: f64,
    /// Time taken for denoising, labeling and contour tracing in milliseconds.
    pub segmentation_ms: f64,
    /// Time taken for canvas normalization and HOG extraction in milliseconds.
    pub features_ms: f64,
    /// Total pipeline time in milliseconds.
    pub total_ms: f64,
    /// Number of regions that passed the area filter.
    pub num_regions: usize,
    /// Regions dropped because they do not fit the canvas.
    pub rejected_regions: usize,
}

/// Feature vectors of a labeled dataset.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One vector per usable image, in input order.
    pub samples: Vec<FeatureVector>,
    /// Label of each sample.
    pub labels: Vec<f32>,
    /// Images that could not be used, with the reason.
    pub skipped: Vec<(PathBuf, PipelineError)>,
}

/// The main entry point for feature extraction and recognition.
///
/// The recognizer holds reusable state (arena allocator, HOG layout) built
/// once from a [`PipelineConfig`].
pub struct Recognizer {
    arena: Bump,
    config: PipelineConfig,
    hog: HogExtractor,
    background: BackgroundFilter,
    head: HeadLocator,
    segmenter: PersonSegmenter,
}

impl Recognizer {
    /// Validate `config` and precompute the HOG layout.
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let layout = HogLayout::from_config(&config)?;
        tracing::debug!(
            feature_len = layout.feature_len(),
            blocks = layout.blocks().len(),
            "recognizer ready"
        );
        Ok(Self {
            arena: Bump::new(),
            config,
            hog: HogExtractor::new(layout),
            background: BackgroundFilter::from_config(&config),
            head: HeadLocator::from_config(&config),
            segmenter: PersonSegmenter::from_config(&config),
        })
    }

    /// Get the current configuration.
    #[must_use]
    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// The layout every feature vector follows.
    #[must_use]
    pub fn layout(&self) -> &HogLayout {
        self.hog.layout()
    }

    /// HOG descriptor of a canvas-sized image.
    pub fn features(&self, canvas: &ImageView) -> Result<FeatureVector> {
        self.hog.extract(canvas)
    }

    /// Place `img` (or its `rect` region) on the configured canvas.
    pub fn normalize(&self, img: &ImageView, rect: Rect) -> Result<ImageBuffer> {
        normalize_region(
            img,
            rect,
            self.config.canvas_width,
            self.config.canvas_height,
            self.config.oversize_policy,
        )
    }

    /// Find every person in `image` and describe each with a HOG vector.
    ///
    /// Under [`OversizePolicy::Reject`] a region larger than the canvas is
    /// skipped and counted in [`PipelineStats::rejected_regions`].
    pub fn detect(&mut self, image: &ImageView, background: &ImageView) -> Result<Vec<Detection>> {
        Ok(self.detect_with_stats(image, background)?.0)
    }

    /// Detection with detailed timing statistics.
    pub fn detect_with_stats(
        &mut self,
        image: &ImageView,
        background: &ImageView,
    ) -> Result<(Vec<Detection>, PipelineStats)> {
        let mut stats = PipelineStats::default();
        let start_total = Instant::now();
        self.arena.reset();

        let start = Instant::now();
        let filtered = self.background.filter(image, background)?;
        stats.background_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let contours = self
            .segmenter
            .segment_contours(&self.arena, &filtered.as_view())?;
        stats.segmentation_ms = start.elapsed().as_secs_f64() * 1000.0;
        stats.num_regions = contours.len();

        let start = Instant::now();
        let mut detections = Vec::with_capacity(contours.len());
        for contour in contours {
            let rect = contour.bounding_rect;
            let canvas = match self.normalize(&filtered.as_view(), rect) {
                Ok(canvas) => canvas,
                Err(err @ PipelineError::RegionTooLarge { .. }) => {
                    tracing::warn!(?rect, error = %err, "skipping region");
                    stats.rejected_regions += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            detections.push(Detection {
                rect,
                contour_area: contour.area,
                features: self.hog.extract(&canvas.as_view())?,
            });
        }
        stats.features_ms = start.elapsed().as_secs_f64() * 1000.0;
        stats.total_ms = start_total.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            regions = stats.num_regions,
            total_ms = stats.total_ms,
            "detection finished"
        );
        Ok((detections, stats))
    }

    /// Centroid `(x, y)` of the head in a person crop.
    pub fn locate_head(&self, image: &ImageView) -> Result<(f64, f64)> {
        self.head.locate(image)
    }

    /// Predict the class of `features` with a model trained for this layout.
    pub fn predict<C: Classifier>(
        &self,
        model: &TrainedModel<C>,
        features: &FeatureVector,
    ) -> Result<f32> {
        let expected = self.layout().feature_len();
        if model.feature_len() != expected {
            return Err(PipelineError::FeatureLengthMismatch {
                expected,
                actual: model.feature_len(),
            });
        }
        model.predict(features)
    }

    /// Load, normalize and describe one dataset image.
    pub fn extract_file(&self, path: &Path) -> Result<FeatureVector> {
        extract_file(&self.hog, &self.config, path)
    }

    /// Describe every entry in parallel.
    ///
    /// Images that fail are logged and reported in [`BatchOutcome::skipped`];
    /// the rest keep their input order.
    pub fn extract_dataset(&self, entries: &[DatasetEntry]) -> BatchOutcome {
        let _span = tracing::info_span!("batch_extract", count = entries.len()).entered();
        // The arena is not Sync; workers only see the extractor and the config.
        let hog = &self.hog;
        let config = self.config;
        let results: Vec<Result<FeatureVector>> = entries
            .par_iter()
            .map(|entry| extract_file(hog, &config, &entry.path))
            .collect();

        let mut outcome = BatchOutcome::default();
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(features) => {
                    outcome.samples.push(features);
                    outcome.labels.push(entry.label);
                }
                Err(err) => {
                    if err.is_per_image() {
                        tracing::warn!(path = %entry.path.display(), error = %err, "skipping sample");
                    } else {
                        tracing::error!(path = %entry.path.display(), error = %err, "skipping sample");
                    }
                    outcome.skipped.push((entry.path.clone(), err));
                }
            }
        }
        tracing::debug!(
            used = outcome.samples.len(),
            skipped = outcome.skipped.len(),
            "dataset extracted"
        );
        outcome
    }

    /// Describe every labeled image in `dir` whose extension is `extension`.
    ///
    /// Files without a label in their name are reported in
    /// [`BatchOutcome::skipped`] next to the ones that failed to load.
    pub fn extract_directory(&self, dir: &Path, extension: &str) -> Result<BatchOutcome> {
        let listing = load_entries(dir, extension)?;
        let mut outcome = self.extract_dataset(&listing.entries);
        for (path, err) in listing.unlabeled {
            tracing::warn!(path = %path.display(), error = %err, "skipping sample");
            outcome.skipped.push((path, err));
        }
        Ok(outcome)
    }

    /// Train a classifier on every labeled PNG image in `dir`.
    pub fn train<C: Classifier>(&self, dir: &Path) -> Result<TrainedModel<C>> {
        let outcome = self.extract_directory(dir, DEFAULT_EXTENSION)?;
        self.fit(outcome)
    }

    /// Train a classifier on explicit dataset entries.
    pub fn train_on<C: Classifier>(&self, entries: &[DatasetEntry]) -> Result<TrainedModel<C>> {
        self.fit(self.extract_dataset(entries))
    }

    fn fit<C: Classifier>(&self, outcome: BatchOutcome) -> Result<TrainedModel<C>> {
        if outcome.samples.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        TrainedModel::train(self.layout(), &outcome.samples, &outcome.labels)
    }
}

fn extract_file(hog: &HogExtractor, config: &PipelineConfig, path: &Path) -> Result<FeatureVector> {
    let img = load_grayscale(path)?;
    let view = img.as_view();
    let canvas = normalize_region(
        &view,
        Rect::new(0, 0, view.width, view.height),
        config.canvas_width,
        config.canvas_height,
        config.oversize_policy,
    )?;
    hog.extract(&canvas.as_view())
}

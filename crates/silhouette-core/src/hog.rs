//! Histogram of Oriented Gradients descriptors.
//!
//! A canvas is reduced to per-cell orientation histograms, arranged in a
//! matrix with one row per cell row and `cell_cols * bins` columns. Blocks of
//! that matrix are L2-normalized independently and concatenated in grid order.

use crate::error::{PipelineError, Result};
use crate::gradient::GradientField;
use crate::grid::HogLayout;
use crate::image::ImageView;
use nalgebra::{DMatrix, DMatrixView};

/// Regularizer added (squared) to every block norm.
pub const L2_EPSILON: f32 = 0.01;

/// A HOG descriptor: the row-major concatenation of normalized blocks.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Wrap raw values.
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the vector holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The values.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Consume and return the values.
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl AsRef<[f32]> for FeatureVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Divide `block` by `sqrt(||block||² + ε²)`.
#[must_use]
pub fn l2_normalize(block: DMatrixView<'_, f32>) -> DMatrix<f32> {
    let divisor = (block.norm_squared() + L2_EPSILON * L2_EPSILON).sqrt();
    block.map(|v| v / divisor)
}

/// Extracts HOG descriptors from canvas-sized images.
#[derive(Clone, Debug)]
pub struct HogExtractor {
    layout: HogLayout,
}

impl HogExtractor {
    /// Extractor for a fixed layout.
    #[must_use]
    pub fn new(layout: HogLayout) -> Self {
        Self { layout }
    }

    /// The layout every extracted vector follows.
    #[must_use]
    pub fn layout(&self) -> &HogLayout {
        &self.layout
    }

    /// Descriptor of `canvas`, which must match the layout's canvas size.
    pub fn extract(&self, canvas: &ImageView) -> Result<FeatureVector> {
        let _span = tracing::debug_span!("hog_extract").entered();
        canvas.ensure_size(self.layout.canvas_width(), self.layout.canvas_height())?;
        let gradients = GradientField::compute(canvas);
        let cells = self.cell_histograms(&gradients);
        let features = self.normalize_blocks(&cells);
        debug_assert_eq!(features.len(), self.layout.feature_len());
        Ok(features)
    }

    /// Per-cell orientation histograms, weighted by gradient magnitude.
    ///
    /// Entry `(r, c * bins + b)` is bin `b` of the cell in row `r`, column `c`.
    #[must_use]
    pub fn cell_histograms(&self, gradients: &GradientField) -> DMatrix<f32> {
        let layout = &self.layout;
        let bins = layout.bins();
        let max_angle = layout.max_angle();
        let cell = layout.cell_size();
        let mut matrix = DMatrix::<f32>::zeros(layout.cell_rows(), layout.cell_cols() * bins);

        for rect in layout.cells() {
            let (row, col) = (rect.y / cell, rect.x / cell);
            for y in rect.y..rect.y + rect.height {
                let off = y * gradients.width;
                for x in rect.x..rect.x + rect.width {
                    let i = off + x;
                    let mag = gradients.magnitude(i);
                    if mag == 0.0 {
                        continue;
                    }
                    let angle = gradients.orientation(i, max_angle);
                    let bin = ((angle * bins as f32 / max_angle) as usize).min(bins - 1);
                    matrix[(row, col * bins + bin)] += mag;
                }
            }
        }
        matrix
    }

    /// Normalize every block of `cells` and concatenate them row-major.
    #[must_use]
    pub fn normalize_blocks(&self, cells: &DMatrix<f32>) -> FeatureVector {
        let mut out = Vec::with_capacity(self.layout.feature_len());
        for block in self.layout.blocks() {
            let view = cells.view((block.y, block.x), (block.height, block.width));
            let normalized = l2_normalize(view);
            // nalgebra stores columns contiguously; walk rows explicitly.
            for r in 0..normalized.nrows() {
                out.extend(normalized.row(r).iter().copied());
            }
        }
        FeatureVector(out)
    }
}

/// Fail with [`PipelineError::FeatureLengthMismatch`] unless `features` has `expected` values.
pub fn check_feature_len(features: &FeatureVector, expected: usize) -> Result<()> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(PipelineError::FeatureLengthMismatch {
            expected,
            actual: features.len(),
        })
    }
}

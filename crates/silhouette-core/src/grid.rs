//! Regular cell and block grids for HOG extraction.
//!
//! Cells tile the canvas; blocks tile the matrix of cell histograms. Both come
//! from [`generate_grid`], which drops any trailing rectangle that would reach
//! the boundary, so the last partial row and column are discarded rather
//! than clipped.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::image::Rect;

/// Non-overlapping `step_w x step_h` rectangles over a `width x height` area.
///
/// Rectangles are emitted column-major: the outer loop walks `x`, the inner
/// loop walks `y`. A rectangle is kept only if `x + step_w < width` and
/// `y + step_h < height`.
#[must_use]
pub fn generate_grid(height: usize, width: usize, step_h: usize, step_w: usize) -> Vec<Rect> {
    if step_h == 0 || step_w == 0 {
        return Vec::new();
    }
    let mut rects = Vec::with_capacity(grid_count(width, step_w) * grid_count(height, step_h));
    for x in (0..width).step_by(step_w) {
        for y in (0..height).step_by(step_h) {
            if x + step_w < width && y + step_h < height {
                rects.push(Rect::new(x, y, step_w, step_h));
            }
        }
    }
    rects
}

/// Number of rectangles [`generate_grid`] fits along one axis.
#[inline]
#[must_use]
pub const fn grid_count(extent: usize, step: usize) -> usize {
    if step == 0 || extent <= step {
        0
    } else {
        (extent - step - 1) / step + 1
    }
}

/// Precomputed cell and block geometry for a fixed canvas.
///
/// Built once from a [`PipelineConfig`] and shared between training and
/// inference so that feature vectors always have the same length and order.
#[derive(Clone, Debug, PartialEq)]
pub struct HogLayout {
    canvas_height: usize,
    canvas_width: usize,
    cell_size: usize,
    block_size: usize,
    bins: usize,
    max_angle: f32,
    cell_rows: usize,
    cell_cols: usize,
    cells: Vec<Rect>,
    blocks: Vec<Rect>,
}

impl HogLayout {
    /// Layout for the canvas and HOG parameters of `config`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(
            config.canvas_height,
            config.canvas_width,
            config.cell_size,
            config.block_size,
            config.hog_bins,
            config.max_angle,
        )
    }

    /// Layout for an explicit canvas and HOG parameters.
    ///
    /// Fails if the canvas is too small to hold a single block.
    pub fn new(
        canvas_height: usize,
        canvas_width: usize,
        cell_size: usize,
        block_size: usize,
        bins: usize,
        max_angle: f32,
    ) -> Result<Self> {
        if cell_size == 0 || block_size == 0 || bins == 0 {
            return Err(PipelineError::InvalidConfig(
                "cell size, block size and bin count must be positive".into(),
            ));
        }
        let cells = generate_grid(canvas_height, canvas_width, cell_size, cell_size);
        let cell_rows = grid_count(canvas_height, cell_size);
        let cell_cols = grid_count(canvas_width, cell_size);
        let blocks = generate_grid(cell_rows, cell_cols * bins, block_size, block_size * bins);
        if blocks.is_empty() {
            return Err(PipelineError::InvalidConfig(format!(
                "a {canvas_width}x{canvas_height} canvas holds no {block_size}x{block_size} block of {cell_size}px cells"
            )));
        }
        Ok(Self {
            canvas_height,
            canvas_width,
            cell_size,
            block_size,
            bins,
            max_angle,
            cell_rows,
            cell_cols,
            cells,
            blocks,
        })
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn canvas_height(&self) -> usize {
        self.canvas_height
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn canvas_width(&self) -> usize {
        self.canvas_width
    }

    /// Cell side in pixels.
    #[must_use]
    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    /// Block side in cells.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Orientation bins per cell.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Orientation range in degrees.
    #[must_use]
    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }

    /// Rows of the cell-histogram matrix.
    #[must_use]
    pub fn cell_rows(&self) -> usize {
        self.cell_rows
    }

    /// Cells per row; the matrix has `cell_cols * bins` columns.
    #[must_use]
    pub fn cell_cols(&self) -> usize {
        self.cell_cols
    }

    /// Cell rectangles on the canvas, in grid order.
    #[must_use]
    pub fn cells(&self) -> &[Rect] {
        &self.cells
    }

    /// Block rectangles over the cell-histogram matrix, in grid order.
    #[must_use]
    pub fn blocks(&self) -> &[Rect] {
        &self.blocks
    }

    /// Length of every feature vector produced with this layout.
    #[must_use]
    pub fn feature_len(&self) -> usize {
        self.blocks.iter().map(Rect::area).sum()
    }
}

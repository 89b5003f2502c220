//! Stride-aware image views and owned 8-bit buffers.
//!
//! An [`ImageBuffer`] owns its pixels. An [`ImageView`] borrows them, and a
//! region of interest is just another view with an offset start and the
//! parent's stride, so cropping never copies.

use crate::error::{PipelineError, Result};

/// Axis-aligned integer rectangle `(x, y, width, height)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge.
    pub x: usize,
    /// Top edge.
    pub y: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    /// True if the rectangle lies entirely inside a `width x height` image.
    #[must_use]
    pub const fn fits_within(&self, width: usize, height: usize) -> bool {
        self.x + self.width <= width && self.y + self.height <= height
    }
}

/// A view into an image buffer with explicit stride support.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub stride: usize,
}

impl<'a> ImageView<'a> {
    /// Create a new ImageView after validating that the buffer size matches the dimensions and stride.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self> {
        if stride < width {
            return Err(PipelineError::InvalidBuffer(format!(
                "stride ({stride}) cannot be less than width ({width})"
            )));
        }
        let required_size = if height > 0 {
            (height - 1) * stride + width
        } else {
            0
        };
        if data.len() < required_size {
            return Err(PipelineError::InvalidBuffer(format!(
                "buffer size ({}) is too small for {}x{} image with stride {} (required: {})",
                data.len(),
                width,
                height,
                stride,
                required_size
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Safe accessor for a specific row.
    #[inline(always)]
    pub fn get_row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height, "Row index {} out of bounds", y);
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Safe accessor for a specific pixel.
    #[inline(always)]
    pub fn get_pixel(&self, x: usize, y: usize) -> u8 {
        assert!(x < self.width, "Column index {} out of bounds", x);
        self.get_row(y)[x]
    }

    /// Iterate over rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.height).map(move |y| self.get_row(y))
    }

    /// Borrow a region of interest without copying.
    ///
    /// The returned view shares this view's storage and stride.
    pub fn sub_view(&self, rect: Rect) -> Result<ImageView<'a>> {
        if !rect.fits_within(self.width, self.height) {
            return Err(PipelineError::RegionOutOfBounds {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                image_width: self.width,
                image_height: self.height,
            });
        }
        if rect.width == 0 || rect.height == 0 {
            return Ok(ImageView {
                data: &[],
                width: rect.width,
                height: rect.height,
                stride: rect.width,
            });
        }
        let start = rect.y * self.stride + rect.x;
        let end = (rect.y + rect.height - 1) * self.stride + rect.x + rect.width;
        Ok(ImageView {
            data: &self.data[start..end],
            width: rect.width,
            height: rect.height,
            stride: self.stride,
        })
    }

    /// Copy the viewed pixels into a tightly packed owned buffer.
    #[must_use]
    pub fn to_buffer(&self) -> ImageBuffer {
        let mut data = Vec::with_capacity(self.width * self.height);
        for row in self.rows() {
            data.extend_from_slice(row);
        }
        ImageBuffer {
            data,
            width: self.width,
            height: self.height,
        }
    }

    /// Fail with [`PipelineError::DimensionMismatch`] unless this view is `width x height`.
    pub fn ensure_size(&self, width: usize, height: usize) -> Result<()> {
        if self.width == width && self.height == height {
            Ok(())
        } else {
            Err(PipelineError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                actual_width: self.width,
                actual_height: self.height,
            })
        }
    }
}

/// Owned, tightly packed 8-bit grayscale image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl ImageBuffer {
    /// Zero-filled (black) image.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height],
            width,
            height,
        }
    }

    /// Wrap raw row-major pixels.
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if data.len() != width * height {
            return Err(PipelineError::InvalidBuffer(format!(
                "expected {} bytes for {}x{} image, got {}",
                width * height,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw row-major pixels.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw row-major pixels.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its pixels.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Borrow as a read-only view.
    #[must_use]
    pub fn as_view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Pixel at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Overwrite the pixel at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    /// Fill `rect` (clipped to the image) with `value`.
    pub fn fill_rect(&mut self, rect: Rect, value: u8) {
        let x_end = (rect.x + rect.width).min(self.width);
        let y_end = (rect.y + rect.height).min(self.height);
        for y in rect.y.min(y_end)..y_end {
            let row = &mut self.data[y * self.width..(y + 1) * self.width];
            row[rect.x.min(x_end)..x_end].fill(value);
        }
    }
}

//! Fixed-width 1D histograms and the bin-center sequences derived from them.
//!
//! Both the background filter and the head locator pick their thresholds from
//! an intensity histogram: they find where the occupied range ends, rebuild a
//! narrower set of bin centers over that range and read a threshold from it.

use crate::error::{PipelineError, Result};
use crate::image::ImageView;

/// Counts of samples falling into `nbins` equal-width bins over `[0, max_value)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u32>,
    max_value: u32,
}

impl Histogram {
    /// Histogram of every pixel in `img`.
    ///
    /// Pixel `v` lands in bin `floor(v * nbins / max_value)`; values at or
    /// above `max_value` are ignored.
    #[must_use]
    pub fn compute(img: &ImageView, nbins: usize, max_value: u32) -> Self {
        let mut counts = vec![0u32; nbins];
        if nbins == 0 || max_value == 0 {
            return Self { counts, max_value };
        }
        for row in img.rows() {
            for &px in row {
                let v = u32::from(px);
                if v < max_value {
                    let bin = (v as usize * nbins) / max_value as usize;
                    counts[bin] += 1;
                }
            }
        }
        Self { counts, max_value }
    }

    /// Wrap precomputed counts.
    #[must_use]
    pub fn from_counts(counts: Vec<u32>, max_value: u32) -> Self {
        Self { counts, max_value }
    }

    /// Per-bin counts.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Number of bins.
    #[must_use]
    pub fn nbins(&self) -> usize {
        self.counts.len()
    }

    /// Exclusive upper bound of the binned range.
    #[must_use]
    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    /// Total number of counted samples.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Lower edge of every bin.
    #[must_use]
    pub fn bin_edges(&self) -> Vec<f32> {
        let width = self.max_value as f32 / self.counts.len().max(1) as f32;
        (0..self.counts.len()).map(|i| i as f32 * width).collect()
    }

    /// Index just above the last occupied bin.
    ///
    /// Fails when nothing was counted, or when the top bin is occupied and
    /// the histogram therefore has no empty tail.
    pub fn zero_tail_start(&self) -> Result<usize> {
        let last = self
            .counts
            .iter()
            .rposition(|&c| c != 0)
            .ok_or(PipelineError::EmptyHistogram {
                max_value: self.max_value,
            })?;
        if last + 1 >= self.counts.len() {
            return Err(PipelineError::NoZeroTail {
                nbins: self.counts.len(),
            });
        }
        Ok(last + 1)
    }

    /// First index `i >= 1` where the count rises above the previous bin.
    ///
    /// This is the bottom of the valley between the background peak and the
    /// foreground mass.
    #[must_use]
    pub fn first_rise(&self) -> Option<usize> {
        self.counts
            .windows(2)
            .position(|w| w[1] > w[0])
            .map(|i| i + 1)
    }
}

/// Center values of `nbins` integer-width bins over `[0, max_value)`.
///
/// The sequence starts at `max_value / nbins / 2` and advances by
/// `max_value / nbins` (integer arithmetic) while below `max_value`. Its
/// length therefore depends on the rounding and may differ from `nbins`.
/// A zero step yields an empty sequence.
#[must_use]
pub fn bin_centers(nbins: usize, max_value: u32) -> Vec<u32> {
    if nbins == 0 {
        return Vec::new();
    }
    let step = max_value / nbins as u32;
    if step == 0 {
        return Vec::new();
    }
    let start = step / 2;
    (start..max_value).step_by(step as usize).collect()
}

/// Bin centers rebuilt over the range ending at `bin_centers(nbins, max_value)[index]`.
///
/// This narrows the bins to the occupied part of the intensity range.
pub fn refined_bin_centers(nbins: usize, max_value: u32, index: usize) -> Result<Vec<u32>> {
    let coarse = bin_centers(nbins, max_value);
    let upper = lookup(&coarse, index)?;
    Ok(bin_centers(nbins, upper))
}

/// Checked indexing into a bin-center sequence.
pub fn lookup(centers: &[u32], index: usize) -> Result<u32> {
    centers
        .get(index)
        .copied()
        .ok_or(PipelineError::BinOutOfRange {
            index,
            len: centers.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bin_centers_default_intensity_range() {
        let centers = bin_centers(20, 255);
        // step 12, start 6
        assert_eq!(centers[0], 6);
        assert_eq!(centers[1], 18);
        assert_eq!(*centers.last().unwrap(), 246);
        assert_eq!(centers.len(), 21);
    }

    #[test]
    fn test_bin_centers_short_when_rounding_overflows() {
        // 68 / 9 = 7, so ten centers fit below 68
        let centers = bin_centers(9, 68);
        assert!(centers.iter().all(|&c| c < 68));
        assert_eq!(centers, vec![3, 10, 17, 24, 31, 38, 45, 52, 59, 66]);
        let short = bin_centers(4, 10);
        assert_eq!(short, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_bin_centers_zero_step() {
        assert!(bin_centers(20, 6).is_empty());
        assert!(bin_centers(0, 255).is_empty());
    }

    #[test]
    fn test_zero_tail_start() {
        let h = Histogram::from_counts(vec![0, 5, 0, 3, 0, 0], 60);
        assert_eq!(h.zero_tail_start().unwrap(), 4);

        let full = Histogram::from_counts(vec![1, 0, 2], 30);
        assert!(matches!(
            full.zero_tail_start(),
            Err(PipelineError::NoZeroTail { nbins: 3 })
        ));

        let empty = Histogram::from_counts(vec![0, 0, 0], 30);
        assert!(matches!(
            empty.zero_tail_start(),
            Err(PipelineError::EmptyHistogram { .. })
        ));
    }

    #[test]
    fn test_bin_edges() {
        let hist = Histogram::from_counts(vec![0; 4], 200);
        assert_eq!(hist.bin_edges(), vec![0.0, 50.0, 100.0, 150.0]);
        assert!(Histogram::from_counts(Vec::new(), 200).bin_edges().is_empty());
    }

    #[test]
    fn test_first_rise() {
        let h = Histogram::from_counts(vec![50, 20, 10, 10, 15, 3], 60);
        assert_eq!(h.first_rise(), Some(4));
        let falling = Histogram::from_counts(vec![9, 7, 7, 1], 40);
        assert_eq!(falling.first_rise(), None);
        let rising = Histogram::from_counts(vec![0, 4], 20);
        assert_eq!(rising.first_rise(), Some(1));
    }

    #[test]
    fn test_compute_bins_and_exclusive_upper_bound() {
        let data = [0u8, 12, 13, 254, 255, 128];
        let img = ImageView::new(&data, 6, 1, 6).unwrap();
        let h = Histogram::compute(&img, 20, 255);
        assert_eq!(h.counts()[0], 2); // 0 and 12
        assert_eq!(h.counts()[1], 1); // 13
        assert_eq!(h.counts()[10], 1); // 128
        assert_eq!(h.counts()[19], 1); // 254
        assert_eq!(h.total(), 5); // 255 is outside [0, 255)
    }

    #[test]
    fn test_refined_bin_centers_out_of_range() {
        let err = refined_bin_centers(20, 255, 40).unwrap_err();
        assert!(matches!(err, PipelineError::BinOutOfRange { index: 40, len: 21 }));
        let refined = refined_bin_centers(20, 255, 16).unwrap();
        // coarse[16] = 198 -> step 9, start 4
        assert_eq!(&refined[..3], &[4, 13, 22]);
    }

    proptest! {
        #[test]
        fn prop_histogram_counts_every_pixel(
            width in 1..40usize,
            height in 1..40usize,
            nbins in 1..64usize,
            seed in prop::collection::vec(0..=254u8, 1600),
        ) {
            let data = &seed[..width * height];
            let img = ImageView::new(data, width, height, width).unwrap();
            let h = Histogram::compute(&img, nbins, 255);
            prop_assert_eq!(h.total(), (width * height) as u64);
            prop_assert_eq!(h.nbins(), nbins);
        }

        #[test]
        fn prop_bin_centers_below_max(nbins in 1..64usize, max_value in 1..4096u32) {
            let centers = bin_centers(nbins, max_value);
            prop_assert!(centers.iter().all(|&c| c < max_value));
            prop_assert!(centers.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

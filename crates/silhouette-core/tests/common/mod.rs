#![allow(dead_code)]

use std::path::Path;

use serde::{Deserialize, Serialize};
use silhouette_core::FeatureVector;
use silhouette_core::classifier::Classifier;
use silhouette_core::image::ImageBuffer;
use silhouette_core::test_utils::{Stance, person_crop};

#[derive(Debug, thiserror::Error)]
pub enum CentroidError {
    #[error("no samples")]
    Empty,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Assigns each vector the label of the closest class mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroid {
    centroids: Vec<(f32, Vec<f32>)>,
    feature_len: usize,
}

impl NearestCentroid {
    pub fn with_centroids(centroids: Vec<(f32, Vec<f32>)>, feature_len: usize) -> Self {
        Self {
            centroids,
            feature_len,
        }
    }
}

impl Classifier for NearestCentroid {
    type Error = CentroidError;

    fn train(samples: &[FeatureVector], labels: &[f32]) -> Result<Self, CentroidError> {
        let feature_len = samples.first().ok_or(CentroidError::Empty)?.len();
        let mut sums: Vec<(f32, Vec<f32>, usize)> = Vec::new();
        for (sample, &label) in samples.iter().zip(labels) {
            let idx = match sums.iter().position(|(l, _, _)| *l == label) {
                Some(idx) => idx,
                None => {
                    sums.push((label, vec![0.0; feature_len], 0));
                    sums.len() - 1
                }
            };
            let (_, sum, count) = &mut sums[idx];
            for (acc, &v) in sum.iter_mut().zip(sample.as_slice()) {
                *acc += v;
            }
            *count += 1;
        }
        let centroids = sums
            .into_iter()
            .map(|(label, sum, count)| {
                (label, sum.into_iter().map(|v| v / count as f32).collect())
            })
            .collect();
        Ok(Self {
            centroids,
            feature_len,
        })
    }

    fn predict(&self, features: &FeatureVector) -> f32 {
        let dist = |c: &[f32]| -> f32 {
            c.iter()
                .zip(features.as_slice())
                .map(|(a, b)| (a - b) * (a - b))
                .sum()
        };
        self.centroids
            .iter()
            .min_by(|a, b| dist(&a.1).total_cmp(&dist(&b.1)))
            .map_or(f32::NAN, |(label, _)| *label)
    }

    fn feature_len(&self) -> usize {
        self.feature_len
    }

    fn save(&self, path: &Path) -> Result<(), CentroidError> {
        std::fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self, CentroidError> {
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }
}

/// Crop sizes used to populate synthetic datasets.
pub const CROP_SIZES: [(usize, usize); 3] = [(30, 80), (32, 84), (34, 88)];

/// Write `per_class` crops of each stance to `dir`, named `<label>_<stance>_<n>.png`.
pub fn write_dataset(dir: &Path) -> Vec<(Stance, ImageBuffer)> {
    let mut written = Vec::new();
    for stance in [Stance::Front, Stance::Side] {
        for (i, &(w, h)) in CROP_SIZES.iter().enumerate() {
            let img = person_crop(stance, w, h);
            let name = format!("{}_{:?}_{i}.png", stance.label(), stance).to_lowercase();
            silhouette_core::dataset::save_grayscale(&img.as_view(), &dir.join(name)).unwrap();
            written.push((stance, img));
        }
    }
    written
}

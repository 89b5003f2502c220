//! The boundary between feature extraction and a learned model.
//!
//! Training algorithms and model file formats live outside this crate. A
//! backend implements [`Classifier`]; [`TrainedModel`] wraps it and makes
//! sure every vector it sees matches the length the model was trained on.

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::grid::HogLayout;
use crate::hog::{FeatureVector, check_feature_len};

/// A trainable, persistable classifier over fixed-length feature vectors.
pub trait Classifier: Sized + Send + Sync {
    /// Backend error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fit a model to `samples`, where `labels[i]` is the class of `samples[i]`.
    fn train(samples: &[FeatureVector], labels: &[f32]) -> std::result::Result<Self, Self::Error>;

    /// Predicted class of `features`.
    fn predict(&self, features: &FeatureVector) -> f32;

    /// Length of the vectors the model was trained on.
    fn feature_len(&self) -> usize;

    /// Persist the model to `path`.
    fn save(&self, path: &Path) -> std::result::Result<(), Self::Error>;

    /// Restore a model written by [`save`](Self::save).
    fn load(path: &Path) -> std::result::Result<Self, Self::Error>;
}

fn backend<E: std::error::Error + Send + Sync + 'static>(err: E) -> PipelineError {
    PipelineError::Classifier(Box::new(err))
}

/// A classifier bound to a feature length.
#[derive(Clone, Debug)]
pub struct TrainedModel<C> {
    inner: C,
    feature_len: usize,
}

impl<C: Classifier> TrainedModel<C> {
    /// Train on `samples`, all of which must have `layout.feature_len()` values.
    pub fn train(layout: &HogLayout, samples: &[FeatureVector], labels: &[f32]) -> Result<Self> {
        if samples.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        if samples.len() != labels.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }
        let expected = layout.feature_len();
        for sample in samples {
            check_feature_len(sample, expected)?;
        }
        let inner = C::train(samples, labels).map_err(backend)?;
        Self::wrap(inner, expected)
    }

    /// Load a model and reject it unless it was trained for `layout`.
    pub fn load(path: &Path, layout: &HogLayout) -> Result<Self> {
        let inner = C::load(path).map_err(backend)?;
        Self::wrap(inner, layout.feature_len())
    }

    fn wrap(inner: C, expected: usize) -> Result<Self> {
        let actual = inner.feature_len();
        if actual != expected {
            return Err(PipelineError::FeatureLengthMismatch { expected, actual });
        }
        Ok(Self {
            inner,
            feature_len: expected,
        })
    }

    /// Persist the wrapped model.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.inner.save(path).map_err(backend)
    }

    /// Predicted class of `features`, after checking its length.
    pub fn predict(&self, features: &FeatureVector) -> Result<f32> {
        check_feature_len(features, self.feature_len)?;
        Ok(self.inner.predict(features))
    }

    /// Length every input must have.
    #[must_use]
    pub fn feature_len(&self) -> usize {
        self.feature_len
    }

    /// The wrapped classifier.
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts the label of the first training sample whose first value is closest.
    #[derive(Debug)]
    struct FirstValue {
        keys: Vec<(f32, f32)>,
        len: usize,
    }

    impl Classifier for FirstValue {
        type Error = std::io::Error;

        fn train(samples: &[FeatureVector], labels: &[f32]) -> std::io::Result<Self> {
            Ok(Self {
                keys: samples
                    .iter()
                    .zip(labels)
                    .map(|(s, &l)| (s.as_slice()[0], l))
                    .collect(),
                len: samples[0].len(),
            })
        }

        fn predict(&self, features: &FeatureVector) -> f32 {
            let v = features.as_slice()[0];
            self.keys
                .iter()
                .min_by(|a, b| (a.0 - v).abs().total_cmp(&(b.0 - v).abs()))
                .map_or(0.0, |k| k.1)
        }

        fn feature_len(&self) -> usize {
            self.len
        }

        fn save(&self, _path: &Path) -> std::io::Result<()> {
            Err(std::io::Error::other("read-only"))
        }

        fn load(_path: &Path) -> std::io::Result<Self> {
            Ok(Self {
                keys: Vec::new(),
                len: 3,
            })
        }
    }

    fn layout() -> HogLayout {
        // 30x30, 6px cells, 2x2 blocks, 9 bins -> 36 values.
        HogLayout::new(30, 30, 6, 2, 9, 360.0).unwrap()
    }

    fn sample(first: f32) -> FeatureVector {
        let mut v = vec![0.0; 36];
        v[0] = first;
        FeatureVector::new(v)
    }

    #[test]
    fn test_train_and_predict() {
        let model = TrainedModel::<FirstValue>::train(
            &layout(),
            &[sample(0.1), sample(0.9)],
            &[1.0, 2.0],
        )
        .unwrap();
        assert_eq!(model.feature_len(), 36);
        assert_eq!(model.inner().keys, vec![(0.1, 1.0), (0.9, 2.0)]);
        assert_eq!(model.predict(&sample(0.8)).unwrap(), 2.0);
        let err = model.predict(&FeatureVector::new(vec![0.0; 35])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FeatureLengthMismatch { expected: 36, actual: 35 }
        ));
    }

    #[test]
    fn test_train_rejects_bad_input() {
        let empty = TrainedModel::<FirstValue>::train(&layout(), &[], &[]);
        assert!(matches!(empty, Err(PipelineError::EmptyTrainingSet)));

        let short = FeatureVector::new(vec![0.0; 4]);
        let err = TrainedModel::<FirstValue>::train(&layout(), &[short], &[1.0]).unwrap_err();
        assert!(matches!(err, PipelineError::FeatureLengthMismatch { .. }));

        let err = TrainedModel::<FirstValue>::train(&layout(), &[sample(0.0)], &[1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_rejects_other_layout() {
        let err = TrainedModel::<FirstValue>::load(Path::new("unused"), &layout()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FeatureLengthMismatch { expected: 36, actual: 3 }
        ));
    }

    #[test]
    fn test_backend_errors_are_wrapped() {
        let model =
            TrainedModel::<FirstValue>::train(&layout(), &[sample(0.5)], &[1.0]).unwrap();
        let err = model.save(Path::new("unused")).unwrap_err();
        assert!(matches!(err, PipelineError::Classifier(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}

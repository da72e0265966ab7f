//! Core traits for SVM implementation

use crate::core::{Prediction, Result, Sample};

/// Trained SVM model
pub trait SVMModel: Send + Sync {
    /// Raw decision value for a feature vector.
    ///
    /// Fails when the model is untrained or `x` has the wrong dimension.
    fn decision_function(&self, x: &[f64]) -> Result<f64>;

    /// Predict a single sample
    fn predict_sample(&self, sample: &Sample) -> Result<Prediction> {
        Ok(Prediction::from_score(
            self.decision_function(&sample.features)?,
        ))
    }

    /// Predict multiple samples, stopping at the first invalid one
    fn predict_batch(&self, samples: &[Sample]) -> Result<Vec<Prediction>> {
        samples.iter().map(|s| self.predict_sample(s)).collect()
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}

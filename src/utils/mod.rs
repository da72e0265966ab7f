//! Utility functions for SVM operations

/// Validation of training inputs at the API boundary
pub mod validation {
    use crate::core::{Result, SVMError};

    /// Check a training set before it reaches the solver.
    ///
    /// Rejects empty input, feature/label count mismatches, vectors of the
    /// wrong dimension, non-finite features and labels other than -1 and +1.
    pub fn validate_training_set<F: AsRef<[f64]>>(
        features: &[F],
        labels: &[i32],
        dimension: usize,
    ) -> Result<()> {
        if features.is_empty() || labels.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if features.len() != labels.len() {
            return Err(SVMError::InvalidDataset(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }
        for (i, row) in features.iter().enumerate() {
            let row = row.as_ref();
            validate_vector(row, dimension)?;
            if row.iter().any(|v| !v.is_finite()) {
                return Err(SVMError::InvalidDataset(format!(
                    "non-finite feature value in example {i}"
                )));
            }
        }
        validate_binary_labels(labels)
    }

    /// Labels must be -1 or +1
    pub fn validate_binary_labels(labels: &[i32]) -> Result<()> {
        match labels.iter().position(|&y| y != 1 && y != -1) {
            Some(index) => Err(SVMError::InvalidLabel {
                index,
                label: labels[index],
            }),
            None => Ok(()),
        }
    }

    /// A query or training vector must match the model dimension
    pub fn validate_vector(x: &[f64], dimension: usize) -> Result<()> {
        if x.len() != dimension {
            return Err(SVMError::DimensionMismatch {
                expected: dimension,
                actual: x.len(),
            });
        }
        Ok(())
    }

    /// Count of (+1, -1) labels
    pub fn label_balance(labels: &[i32]) -> (usize, usize) {
        let positive = labels.iter().filter(|&&y| y > 0).count();
        (positive, labels.len() - positive)
    }
}

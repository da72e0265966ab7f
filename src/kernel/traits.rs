//! Kernel trait definition

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
/// Implementations must be pure and symmetric: training and prediction both
/// call `compute` and rely on getting the same value for the same pair.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y) for two dense vectors of equal length
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;
}

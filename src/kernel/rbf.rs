//! Gaussian RBF (Radial Basis Function) kernel implementation
//!
//! The kernel is defined as: K(x, y) = exp(-||x - y||² / (2δ²))
//! where δ (delta) is the kernel width.

use crate::core::{Result, SVMError};
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};

/// Gaussian kernel: K(x, y) = exp(-||x - y||² / (2δ²))
///
/// The width δ controls the "reach" of each training example:
/// - Small delta: only close points are similar (potential overfitting)
/// - Large delta: distant points still influence each other (potential underfitting)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RBFKernel {
    delta: f64,
}

impl RBFKernel {
    /// Create a new Gaussian kernel with the given width
    ///
    /// # Errors
    /// Returns `InvalidParameter` if delta is not positive and finite
    pub fn new(delta: f64) -> Result<Self> {
        if !(delta.is_finite() && delta > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "delta must be positive and finite, got {delta}"
            )));
        }
        Ok(Self { delta })
    }

    /// Get the width parameter
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Equivalent gamma in the exp(-γ||x - y||²) parameterization
    pub fn gamma(&self) -> f64 {
        1.0 / (2.0 * self.delta * self.delta)
    }
}

impl Default for RBFKernel {
    /// Unit width
    fn default() -> Self {
        Self { delta: 1.0 }
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        let squared_distance = squared_euclidean_distance(x, y);
        (-self.gamma() * squared_distance).exp()
    }
}

/// ||x - y||² over the common prefix of two dense vectors
fn squared_euclidean_distance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y)
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}

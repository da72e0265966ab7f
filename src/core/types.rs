//! Core type definitions for SVM

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: i32,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Build a prediction from a raw score; a score of exactly zero is negative
    pub fn from_score(decision_value: f64) -> Self {
        Self {
            label: label_for_score(decision_value),
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Map a decision value to a class label. Zero belongs to the negative class.
pub fn label_for_score(score: f64) -> i32 {
    if score > 0.0 {
        1
    } else {
        -1
    }
}

/// Training example: a dense feature vector and its label
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Feature vector of the model dimension
    pub features: Vec<f64>,
    /// Class label (+1 or -1)
    pub label: i32,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: Vec<f64>, label: i32) -> Self {
        Self { features, label }
    }
}

/// Which examples count as "non-bound" when picking the partner with the
/// largest error gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonBoundRule {
    /// Only examples with `0 < alpha < C` are eligible partners
    Strict,
    /// Every example counts as non-bound and every example is scanned
    AllExamples,
}

/// Constant term of the dual objective used when `eta >= 0`.
///
/// The term is the same at both box endpoints, so it never changes which
/// endpoint is chosen. It only shifts the reported endpoint objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveConstant {
    /// `sum_{i != i1, i2} alpha_i - 1/2 sum_{i, j != i1, i2} y_i y_j K_ij alpha_i alpha_j`
    SumOthers,
    /// Same quadratic part, but the linear part adds `alpha_i1` once per
    /// other example
    RepeatFirst,
}

/// Hyperparameters of one trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Tolerance for the KKT violation test
    pub tol: f64,
    /// Minimum relative step and endpoint objective tolerance
    pub eps: f64,
    /// Width of the Gaussian kernel
    pub delta: f64,
    /// Maximum number of sweeps before giving up, `None` for no cap
    pub max_sweeps: Option<usize>,
    /// Seed of the random partner selection
    pub seed: u64,
    /// Non-bound eligibility used by the partner heuristic
    pub non_bound_rule: NonBoundRule,
    /// Constant term used in the degenerate endpoint objective
    pub objective_constant: ObjectiveConstant,
    /// Kernel cache size in bytes, 0 disables the cache
    pub cache_size: usize,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            c: 1.0,
            tol: 0.01,
            eps: 0.01,
            delta: 1.0,
            max_sweeps: Some(10_000),
            seed: 0,
            non_bound_rule: NonBoundRule::Strict,
            objective_constant: ObjectiveConstant::SumOthers,
            cache_size: 16 * 1024 * 1024,
        }
    }
}

impl Hyperparameters {
    /// Check every parameter, returning the first offending one
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive and finite, got {}",
                self.c
            )));
        }
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "delta must be positive and finite, got {}",
                self.delta
            )));
        }
        if !(self.tol.is_finite() && self.tol >= 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "tol must be non-negative and finite, got {}",
                self.tol
            )));
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "eps must be positive and finite, got {}",
                self.eps
            )));
        }
        if self.max_sweeps == Some(0) {
            return Err(SVMError::InvalidParameter(
                "max_sweeps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a training run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// A full sweep produced no change
    Converged,
    /// The sweep cap was hit before a clean full sweep
    MaxSweepsReached,
}

/// Summary of one sweep of the training loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// 1-based sweep number
    pub sweep: usize,
    /// Whether every example was examined
    pub examined_all: bool,
    /// Number of examples examined
    pub examined: usize,
    /// Number of examinations that produced a pair update
    pub changed: usize,
}

/// Result of a training call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub status: ConvergenceStatus,
    /// Number of completed sweeps
    pub sweeps: usize,
    /// Number of committed pair updates
    pub pair_updates: usize,
    /// Number of examples with nonzero alpha
    pub n_support_vectors: usize,
    /// Final dual objective value
    pub objective: f64,
}

impl TrainingReport {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

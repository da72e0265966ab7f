//! High-level API for Support Vector Machine operations
//!
//! [`SVM`] owns the whole model: hyperparameters, the Gaussian kernel, the
//! training set and the dual solution. It is created empty, filled by one
//! training call and then used read-only for prediction.
//!
//! # Quick Start
//!
//! ```rust
//! use rbf_smo::SVM;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let features = vec![[0.0, 0.0], [0.0, 1.0], [3.0, 3.0], [3.0, 4.0]];
//! let labels = vec![-1, -1, 1, 1];
//!
//! let mut svm = SVM::new(2, 1.0)?.with_delta(1.0).with_seed(42);
//! let report = svm.train(&features, &labels)?;
//! assert!(report.converged());
//!
//! assert!(svm.predict(&[3.0, 3.5])? > 0.0);
//! assert_eq!(svm.classify(&[0.0, 0.5])?, -1);
//! # Ok(())
//! # }
//! ```

use crate::core::{
    Hyperparameters, NonBoundRule, ObjectiveConstant, Prediction, Result, SVMError, SVMModel,
    Sample, SweepSummary, TrainingReport,
};
use crate::kernel::RBFKernel;
use crate::solver::{ModelState, SmoSolver};
use crate::utils::validation::{label_balance, validate_training_set, validate_vector};
use log::info;

/// Binary SVM with a Gaussian kernel, trained by SMO
#[derive(Debug, Clone)]
pub struct SVM {
    params: Hyperparameters,
    kernel: RBFKernel,
    state: ModelState,
    report: Option<TrainingReport>,
}

impl SVM {
    /// Create an untrained model for vectors of `dimension` features with
    /// regularization `c`. Other hyperparameters take their defaults
    /// (`tol = eps = 0.01`, `delta = 1`).
    pub fn new(dimension: usize, c: f64) -> Result<Self> {
        if dimension == 0 {
            return Err(SVMError::InvalidParameter(
                "dimension must be at least 1".to_string(),
            ));
        }
        let params = Hyperparameters {
            c,
            ..Hyperparameters::default()
        };
        params.validate()?;

        Ok(Self {
            kernel: RBFKernel::new(params.delta)?,
            params,
            state: ModelState::new(dimension),
            report: None,
        })
    }

    /// Create an untrained model with `C = 1`
    pub fn with_dimension(dimension: usize) -> Result<Self> {
        Self::new(dimension, 1.0)
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = c;
        self.reset();
        self
    }

    /// Set the KKT violation tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.params.tol = tol;
        self.reset();
        self
    }

    /// Set the minimum relative step
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.params.eps = eps;
        self.reset();
        self
    }

    /// Set the Gaussian kernel width
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.params.delta = delta;
        self.reset();
        self
    }

    /// Cap the number of sweeps, `None` lets training run until it converges
    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.params.max_sweeps = max_sweeps;
        self.reset();
        self
    }

    /// Seed the random partner selection
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self.reset();
        self
    }

    pub fn with_non_bound_rule(mut self, rule: NonBoundRule) -> Self {
        self.params.non_bound_rule = rule;
        self.reset();
        self
    }

    pub fn with_objective_constant(mut self, constant: ObjectiveConstant) -> Self {
        self.params.objective_constant = constant;
        self.reset();
        self
    }

    /// Set kernel cache size in bytes, 0 disables it
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.params.cache_size = cache_size;
        self.reset();
        self
    }

    /// Replace every hyperparameter at once
    pub fn with_hyperparameters(mut self, params: Hyperparameters) -> Self {
        self.params = params;
        self.reset();
        self
    }

    /// A changed hyperparameter invalidates any previous training
    fn reset(&mut self) {
        self.state.clear();
        self.report = None;
    }

    /// Train on `features[i]` labelled `labels[i]`.
    ///
    /// Every call starts from scratch: alpha = 0, bias = 0, E_i = -y_i.
    /// On error the model is left as it was.
    pub fn train<F: AsRef<[f64]>>(
        &mut self,
        features: &[F],
        labels: &[i32],
    ) -> Result<TrainingReport> {
        self.train_with_observer(features, labels, |_, _| {})
    }

    /// Train on samples
    pub fn train_samples(&mut self, samples: &[Sample]) -> Result<TrainingReport> {
        let features: Vec<&[f64]> = samples.iter().map(|s| s.features.as_slice()).collect();
        let labels: Vec<i32> = samples.iter().map(|s| s.label).collect();
        self.train(&features, &labels)
    }

    /// Train, calling `observer` with the solver state after every sweep
    pub fn train_with_observer<F, O>(
        &mut self,
        features: &[F],
        labels: &[i32],
        observer: O,
    ) -> Result<TrainingReport>
    where
        F: AsRef<[f64]>,
        O: FnMut(&SweepSummary, &ModelState),
    {
        self.params.validate()?;
        validate_training_set(features, labels, self.state.dimension())?;
        self.kernel = RBFKernel::new(self.params.delta)?;

        let (positive, negative) = label_balance(labels);
        info!(
            "Training SVM on {} examples ({positive} positive, {negative} negative), C={}, delta={}, tol={}, eps={}",
            labels.len(),
            self.params.c,
            self.params.delta,
            self.params.tol,
            self.params.eps
        );

        self.state.load(features, labels);
        let (report, cache) = {
            let mut solver = SmoSolver::new(&self.kernel, &self.params, &mut self.state);
            let report = solver.run_with_observer(observer);
            (report, solver.cache_stats())
        };

        info!(
            "Training finished: {:?} after {} sweeps, {} pair updates, {} support vectors, bias {:.6}",
            report.status,
            report.sweeps,
            report.pair_updates,
            report.n_support_vectors,
            self.state.bias()
        );
        info!(
            "Kernel cache: {} hits, {} misses ({:.1}% hit rate), {} entries",
            cache.hits,
            cache.misses,
            cache.hit_rate() * 100.0,
            cache.size
        );

        self.report = Some(report.clone());
        Ok(report)
    }

    pub fn is_trained(&self) -> bool {
        self.report.is_some()
    }

    fn check_query(&self, x: &[f64]) -> Result<()> {
        if !self.is_trained() {
            return Err(SVMError::ModelNotTrained);
        }
        validate_vector(x, self.state.dimension())
    }

    /// Raw decision value Σ α_i y_i K(x_i, x) - b. Its sign is the class and
    /// its magnitude the margin.
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        self.check_query(x)?;
        Ok(self.state.decision_function(&self.kernel, x))
    }

    /// Class label of `x`; a decision value of exactly zero is -1
    pub fn classify(&self, x: &[f64]) -> Result<i32> {
        Ok(Prediction::from_score(self.predict(x)?).label)
    }

    /// Stored training label at index `i`
    pub fn label(&self, i: usize) -> Option<i32> {
        self.state.label(i)
    }

    /// Evaluate accuracy and confusion counts on a labelled set
    pub fn evaluate<F: AsRef<[f64]>>(
        &self,
        features: &[F],
        labels: &[i32],
    ) -> Result<EvaluationMetrics> {
        validate_training_set(features, labels, self.state.dimension())?;

        let mut metrics = EvaluationMetrics::default();
        for (x, &actual) in features.iter().zip(labels) {
            let predicted = self.classify(x.as_ref())?;
            match (predicted > 0, actual > 0) {
                (true, true) => metrics.true_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        Ok(metrics)
    }

    /// Number of features per vector
    pub fn dimension(&self) -> usize {
        self.state.dimension()
    }

    /// Number of training examples currently loaded
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.params
    }

    /// Kernel used by the last training run
    pub fn kernel(&self) -> &RBFKernel {
        &self.kernel
    }

    /// Report of the last training run
    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    pub fn alphas(&self) -> &[f64] {
        self.state.alphas()
    }

    /// Incrementally maintained errors E_i = f(x_i) - y_i
    pub fn error_cache(&self) -> &[f64] {
        self.state.errors()
    }

    /// Errors recomputed from the decision function
    pub fn recompute_errors(&self) -> Vec<f64> {
        self.state.recompute_errors(&self.kernel)
    }

    pub fn support_vector_indices(&self) -> Vec<usize> {
        self.state.support_vector_indices()
    }

    /// Full optimization state
    pub fn state(&self) -> &ModelState {
        &self.state
    }
}

impl SVMModel for SVM {
    fn decision_function(&self, x: &[f64]) -> Result<f64> {
        self.predict(x)
    }

    fn n_support_vectors(&self) -> usize {
        self.state.support_vector_indices().len()
    }

    fn bias(&self) -> f64 {
        self.state.bias()
    }
}

/// Detailed evaluation metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Calculate specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(
            self.true_negatives,
            self.true_negatives + self.false_positives,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

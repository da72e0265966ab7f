//! Mutable optimization state shared by the SMO routines
//!
//! One owned aggregate holds the training points, their labels, the
//! Lagrange multipliers, the error cache and the bias. Only the pair update
//! in [`crate::solver::SmoSolver`] writes alpha, bias and errors.

use crate::kernel::Kernel;

/// Training data plus the dual variables of the SVM problem
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    dimension: usize,
    /// Row-major points, `len() * dimension` values
    points: Vec<f64>,
    labels: Vec<i32>,
    /// Labels as floats, used in every update
    pub(crate) targets: Vec<f64>,
    pub(crate) alpha: Vec<f64>,
    /// E_i = f(x_i) - y_i
    pub(crate) errors: Vec<f64>,
    pub(crate) b: f64,
}

impl ModelState {
    /// Empty state for vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: Vec::new(),
            labels: Vec::new(),
            targets: Vec::new(),
            alpha: Vec::new(),
            errors: Vec::new(),
            b: 0.0,
        }
    }

    /// Replace the training set and reset the dual variables.
    ///
    /// Alpha and bias start at zero, so f(x) = 0 and E_i = -y_i.
    /// Inputs must already be validated.
    pub(crate) fn load<F: AsRef<[f64]>>(&mut self, features: &[F], labels: &[i32]) {
        let n = labels.len();
        self.points.clear();
        self.points.reserve(n * self.dimension);
        for row in features {
            self.points.extend_from_slice(row.as_ref());
        }
        self.labels = labels.to_vec();
        self.targets = labels.iter().map(|&y| f64::from(y)).collect();
        self.alpha = vec![0.0; n];
        self.errors = self.targets.iter().map(|&y| -y).collect();
        self.b = 0.0;
    }

    /// Drop the training set
    pub(crate) fn clear(&mut self) {
        *self = Self::new(self.dimension);
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of training examples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Feature vector of example `i`
    ///
    /// # Panics
    /// Panics if `i >= len()`
    pub fn point(&self, i: usize) -> &[f64] {
        let start = i * self.dimension;
        &self.points[start..start + self.dimension]
    }

    /// Stored label of example `i`
    pub fn label(&self, i: usize) -> Option<i32> {
        self.labels.get(i).copied()
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn alphas(&self) -> &[f64] {
        &self.alpha
    }

    /// Incrementally maintained error cache
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub fn bias(&self) -> f64 {
        self.b
    }

    /// Strictly between the box bounds
    pub fn is_non_bound(&self, i: usize, c: f64) -> bool {
        let a = self.alpha[i];
        a > 0.0 && a < c
    }

    /// Indices with nonzero alpha
    pub fn support_vector_indices(&self) -> Vec<usize> {
        self.alpha
            .iter()
            .enumerate()
            .filter(|&(_, &a)| a != 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// f(x) = Σ α_i y_i K(x_i, x) - b
    pub fn decision_function<K: Kernel>(&self, kernel: &K, x: &[f64]) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.len() {
            let a = self.alpha[i];
            if a != 0.0 {
                sum += a * self.targets[i] * kernel.compute(self.point(i), x);
            }
        }
        sum - self.b
    }

    /// Error cache computed from scratch, for checking the incremental one
    pub fn recompute_errors<K: Kernel>(&self, kernel: &K) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.decision_function(kernel, self.point(i)) - self.targets[i])
            .collect()
    }

    /// Largest gap between the cached and the recomputed errors
    pub fn error_cache_drift<K: Kernel>(&self, kernel: &K) -> f64 {
        self.recompute_errors(kernel)
            .iter()
            .zip(&self.errors)
            .map(|(fresh, cached)| (fresh - cached).abs())
            .fold(0.0, f64::max)
    }

    /// Dual objective Σα - ½ ΣΣ y_i y_j K_ij α_i α_j
    pub fn objective<K: Kernel>(&self, kernel: &K) -> f64 {
        let support = self.support_vector_indices();
        let linear: f64 = support.iter().map(|&i| self.alpha[i]).sum();
        let mut quadratic = 0.0;
        for &i in &support {
            for &j in &support {
                quadratic += self.targets[i]
                    * self.targets[j]
                    * self.alpha[i]
                    * self.alpha[j]
                    * kernel.compute(self.point(i), self.point(j));
            }
        }
        linear - 0.5 * quadratic
    }
}

//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Platt's SMO for the soft-margin dual:
//!
//! max W(α) = Σ α_i - ½ ΣΣ y_i y_j K(x_i, x_j) α_i α_j
//! s.t. 0 <= α_i <= C, Σ y_i α_i = 0
//!
//! with decision function f(x) = Σ α_i y_i K(x_i, x) - b. Each step picks a
//! pair of multipliers, solves the two-variable problem analytically and
//! patches the error cache E_i = f(x_i) - y_i in place.

use crate::cache::{CacheStats, KernelCache};
use crate::core::{
    ConvergenceStatus, Hyperparameters, ObjectiveConstant, SweepSummary, TrainingReport,
};
use crate::kernel::Kernel;
use crate::solver::selection::{count_non_bound, max_error_gap_partner, violates_kkt};
use crate::solver::ModelState;
use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// Alphas this close to a bound are snapped onto it
const BOUND_SNAP: f64 = 1e-8;

/// SMO solver for one training run
///
/// Borrows the model state mutably for the whole run; nothing else can read
/// or write it until the solver is dropped.
pub struct SmoSolver<'a, K: Kernel> {
    kernel: &'a K,
    params: &'a Hyperparameters,
    state: &'a mut ModelState,
    cache: KernelCache,
    rng: Xoshiro256Plus,
    pair_updates: usize,
}

impl<'a, K: Kernel> SmoSolver<'a, K> {
    /// Create a solver over an already loaded state
    pub fn new(kernel: &'a K, params: &'a Hyperparameters, state: &'a mut ModelState) -> Self {
        Self {
            kernel,
            params,
            state,
            cache: KernelCache::with_memory_limit(params.cache_size),
            rng: Xoshiro256Plus::seed_from_u64(params.seed),
            pair_updates: 0,
        }
    }

    /// Current optimization state
    pub fn state(&self) -> &ModelState {
        &*self.state
    }

    /// Number of committed pair updates so far
    pub fn pair_updates(&self) -> usize {
        self.pair_updates
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// K(x_i, x_j) for two training indices
    fn kernel_at(&mut self, i: usize, j: usize) -> f64 {
        let kernel = self.kernel;
        let state = &*self.state;
        self.cache
            .get_or_compute(i, j, || kernel.compute(state.point(i), state.point(j)))
    }

    /// Run the two-loop heuristic until a full sweep changes nothing or the
    /// sweep cap is hit
    pub fn run(&mut self) -> TrainingReport {
        self.run_with_observer(|_, _| {})
    }

    /// Like [`run`](Self::run), calling `observer` after every sweep
    pub fn run_with_observer<F>(&mut self, mut observer: F) -> TrainingReport
    where
        F: FnMut(&SweepSummary, &ModelState),
    {
        let n = self.state.len();
        let c = self.params.c;
        let mut num_changed = 0;
        let mut examine_all = true;
        let mut sweeps = 0;

        let status = loop {
            if num_changed == 0 && !examine_all {
                break ConvergenceStatus::Converged;
            }
            if let Some(max_sweeps) = self.params.max_sweeps {
                if sweeps >= max_sweeps {
                    warn!(
                        "SMO stopped after {sweeps} sweeps without converging ({} pair updates)",
                        self.pair_updates
                    );
                    break ConvergenceStatus::MaxSweepsReached;
                }
            }

            num_changed = 0;
            let mut examined = 0;
            for i in 0..n {
                // Non-bound membership is read as the sweep goes, alphas
                // change under it
                if examine_all || self.state.is_non_bound(i, c) {
                    examined += 1;
                    if self.examine_example(i) {
                        num_changed += 1;
                    }
                }
            }
            sweeps += 1;

            let summary = SweepSummary {
                sweep: sweeps,
                examined_all: examine_all,
                examined,
                changed: num_changed,
            };
            debug!(
                "sweep {}: {} ({} examined, {} changed)",
                summary.sweep,
                if examine_all { "full" } else { "non-bound" },
                examined,
                num_changed
            );
            observer(&summary, &*self.state);

            if examine_all {
                examine_all = false;
            } else if num_changed == 0 {
                examine_all = true;
            }
        };

        TrainingReport {
            status,
            sweeps,
            pair_updates: self.pair_updates,
            n_support_vectors: self.state.support_vector_indices().len(),
            objective: self.state.objective(self.kernel),
        }
    }

    /// Examine example `i2` and try to optimize it together with a partner.
    ///
    /// Returns true if a pair update was committed. Out-of-range indices and
    /// examples that satisfy the KKT conditions are left alone.
    pub fn examine_example(&mut self, i2: usize) -> bool {
        let n = self.state.len();
        if i2 >= n {
            return false;
        }
        let c = self.params.c;
        let rule = self.params.non_bound_rule;
        let r2 = self.state.errors[i2] * self.state.targets[i2];

        if !violates_kkt(r2, self.state.alpha[i2], c, self.params.tol) {
            return false;
        }

        if count_non_bound(&*self.state, c, rule) > 1 {
            if let Some(i1) = max_error_gap_partner(&*self.state, i2, c, rule) {
                if self.take_step(i1, i2) {
                    return true;
                }
            }
        }

        let i1 = self.rng.gen_range(0..n);
        self.take_step(i1, i2)
    }

    /// Jointly optimize alpha[i1] and alpha[i2].
    ///
    /// Returns true if the pair moved by more than the `eps` threshold, in
    /// which case alpha, bias and the error cache have been updated. Equal or
    /// out-of-range indices are a no-op.
    pub fn take_step(&mut self, i1: usize, i2: usize) -> bool {
        let n = self.state.len();
        if i1 == i2 || i1 >= n || i2 >= n {
            return false;
        }
        let c = self.params.c;
        let eps = self.params.eps;

        let alpha1 = self.state.alpha[i1];
        let alpha2 = self.state.alpha[i2];
        let y1 = self.state.targets[i1];
        let y2 = self.state.targets[i2];
        let e1 = self.state.errors[i1];
        let e2 = self.state.errors[i2];
        let s = y1 * y2;

        let (low, high) = box_bounds(alpha1, alpha2, y1, y2, c);
        if low >= high {
            return false;
        }

        let k11 = self.kernel_at(i1, i1);
        let k12 = self.kernel_at(i1, i2);
        let k22 = self.kernel_at(i2, i2);
        let eta = 2.0 * k12 - k11 - k22;

        let mut a2 = if eta < 0.0 {
            (alpha2 - y2 * (e1 - e2) / eta).clamp(low, high)
        } else {
            // Objective is linear (or convex) along the constraint line, the
            // maximum sits on an endpoint
            let (low_obj, high_obj) = self.endpoint_objectives(i1, i2, low, high, k11, k12, k22);
            if low_obj > high_obj + eps {
                low
            } else if low_obj < high_obj - eps {
                high
            } else {
                alpha2
            }
        };

        if a2 < BOUND_SNAP {
            a2 = 0.0;
        } else if a2 > c - BOUND_SNAP {
            a2 = c;
        }

        if (a2 - alpha2).abs() < eps * (a2 + alpha2 + eps) {
            return false;
        }

        let a1 = alpha1 + s * (alpha2 - a2);
        let delta1 = a1 - alpha1;
        let delta2 = a2 - alpha2;

        let b_old = self.state.b;
        let b1 = e1 + y1 * delta1 * k11 + y2 * delta2 * k12 + b_old;
        let b2 = e2 + y1 * delta1 * k12 + y2 * delta2 * k22 + b_old;
        let b_new = if b1 == b2 { b1 } else { (b1 + b2) / 2.0 };

        self.state.alpha[i1] = a1;
        self.state.alpha[i2] = a2;
        self.state.b = b_new;

        let shift = b_old - b_new;
        for i in 0..n {
            let k1i = self.kernel_at(i1, i);
            let k2i = self.kernel_at(i2, i);
            self.state.errors[i] += y1 * delta1 * k1i + y2 * delta2 * k2i + shift;
        }

        self.pair_updates += 1;
        trace!(
            "step ({i1}, {i2}): alpha {alpha1:.6} -> {a1:.6}, {alpha2:.6} -> {a2:.6}, b {b_old:.6} -> {b_new:.6}"
        );
        true
    }

    /// Dual objective at alpha2 = low and alpha2 = high, with alpha1 moved
    /// along the equality constraint and every other multiplier fixed
    #[allow(clippy::too_many_arguments)]
    fn endpoint_objectives(
        &mut self,
        i1: usize,
        i2: usize,
        low: f64,
        high: f64,
        k11: f64,
        k12: f64,
        k22: f64,
    ) -> (f64, f64) {
        let alpha1 = self.state.alpha[i1];
        let alpha2 = self.state.alpha[i2];
        let y1 = self.state.targets[i1];
        let y2 = self.state.targets[i2];
        let b = self.state.b;
        let s = y1 * y2;

        // v_i = Σ_{j != i1, i2} y_j α_j K_ij, read off the error cache
        let v1 = self.state.errors[i1] + y1 + b - y1 * alpha1 * k11 - y2 * alpha2 * k12;
        let v2 = self.state.errors[i2] + y2 + b - y1 * alpha1 * k12 - y2 * alpha2 * k22;
        let w_const = self.objective_constant(i1, i2);

        let objective = |a2: f64| {
            let a1 = alpha1 + s * (alpha2 - a2);
            a1 + a2 - 0.5 * k11 * a1 * a1 - 0.5 * k22 * a2 * a2 - s * k12 * a1 * a2
                - y1 * a1 * v1
                - y2 * a2 * v2
                + w_const
        };

        (objective(low), objective(high))
    }

    /// Part of the dual objective that does not involve i1 or i2
    fn objective_constant(&mut self, i1: usize, i2: usize) -> f64 {
        let n = self.state.len();
        let others: Vec<usize> = (0..n)
            .filter(|&i| i != i1 && i != i2 && self.state.alpha[i] != 0.0)
            .collect();

        let linear = match self.params.objective_constant {
            ObjectiveConstant::SumOthers => others.iter().map(|&i| self.state.alpha[i]).sum::<f64>(),
            ObjectiveConstant::RepeatFirst => (n - 2) as f64 * self.state.alpha[i1],
        };

        let mut quadratic = 0.0;
        for &i in &others {
            for &j in &others {
                let k_ij = self.kernel_at(i, j);
                quadratic += self.state.targets[i]
                    * self.state.targets[j]
                    * self.state.alpha[i]
                    * self.state.alpha[j]
                    * k_ij;
            }
        }

        linear - 0.5 * quadratic
    }
}

/// Feasible range [L, H] for the new alpha2 under 0 <= α <= C and the
/// equality constraint y1 α1 + y2 α2 = const
pub fn box_bounds(alpha1: f64, alpha2: f64, y1: f64, y2: f64, c: f64) -> (f64, f64) {
    if y1 != y2 {
        let diff = alpha2 - alpha1;
        (0.0_f64.max(diff), c.min(c + diff))
    } else {
        let sum = alpha1 + alpha2;
        (0.0_f64.max(sum - c), c.min(sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NonBoundRule;
    use crate::kernel::RBFKernel;
    use approx::assert_relative_eq;

    fn load(features: &[[f64; 2]], labels: &[i32]) -> ModelState {
        let mut state = ModelState::new(2);
        state.load(features, labels);
        state
    }

    fn toy_state() -> ModelState {
        load(
            &[[0.0, 0.0], [0.0, 1.0], [3.0, 3.0], [3.0, 4.0]],
            &[-1, -1, 1, 1],
        )
    }

    #[test]
    fn test_box_bounds() {
        // Different labels: alpha2 - alpha1 is conserved
        assert_eq!(box_bounds(0.0, 0.0, 1.0, -1.0, 1.0), (0.0, 1.0));
        assert_eq!(box_bounds(0.2, 0.5, 1.0, -1.0, 1.0), (0.3, 1.0));
        assert_eq!(box_bounds(0.5, 0.2, 1.0, -1.0, 1.0), (0.0, 0.7));
        // Same labels: alpha1 + alpha2 is conserved
        assert_eq!(box_bounds(0.0, 0.0, 1.0, 1.0, 1.0), (0.0, 0.0));
        assert_eq!(box_bounds(0.6, 0.7, -1.0, -1.0, 1.0), (0.3, 1.0));
    }

    #[test]
    fn test_take_step_same_index_is_noop() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = toy_state();
        state.alpha = vec![0.5, 0.0, 0.25, 0.25];
        state.b = 0.3;
        let before = state.clone();

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        for i in 0..4 {
            assert!(!solver.take_step(i, i));
        }
        assert_eq!(solver.pair_updates(), 0);
        assert_eq!(solver.state(), &before);
    }

    #[test]
    fn test_take_step_out_of_range_is_noop() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = toy_state();
        let before = state.clone();

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        assert!(!solver.take_step(0, 4));
        assert!(!solver.examine_example(17));
        assert_eq!(solver.state(), &before);
    }

    #[test]
    fn test_take_step_same_labels_at_zero_has_empty_box() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = toy_state();
        let before = state.clone();

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        // Both negative with alpha = 0: L = H = 0
        assert!(!solver.take_step(0, 1));
        assert_eq!(solver.state(), &before);
    }

    #[test]
    fn test_first_step_matches_closed_form() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = toy_state();

        let k12 = kernel.compute(&[0.0, 0.0], &[3.0, 3.0]);
        let eta = 2.0 * k12 - 2.0;
        // E1 = 1 (y = -1), E2 = -1 (y = +1), alpha2 = 0 - (1 - (-1)) / eta
        let expected = (-2.0 / eta).clamp(0.0, 1.0);

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        assert!(solver.take_step(0, 2));

        let alphas = solver.state().alphas();
        assert_relative_eq!(alphas[2], expected, epsilon = 1e-12);
        // y1 != y2, so alpha1 moves by the same amount
        assert_relative_eq!(alphas[0], expected, epsilon = 1e-12);
        assert_relative_eq!(-alphas[0] + alphas[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_error_cache_tracks_recomputation_after_steps() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = toy_state();

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        solver.take_step(0, 2);
        solver.take_step(1, 3);
        solver.take_step(1, 2);
        assert!(solver.pair_updates() >= 1);

        assert!(solver.state().error_cache_drift(&kernel) < 1e-9);
    }

    #[test]
    fn test_examine_example_skips_satisfied_examples() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = toy_state();
        // r = E * y inside tolerance
        state.errors = vec![0.0, 0.005, -0.005, 0.0];
        let before = state.clone();

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        for i in 0..4 {
            assert!(!solver.examine_example(i));
        }
        assert_eq!(solver.state(), &before);
    }

    #[test]
    fn test_degenerate_eta_picks_better_endpoint() {
        // Duplicate points give k11 = k12 = k22 = 1 and eta = 0
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = load(&[[1.0, 1.0], [1.0, 1.0], [-2.0, -2.0]], &[1, -1, 1]);

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        let (low_obj, high_obj) = solver.endpoint_objectives(0, 1, 0.0, 1.0, 1.0, 1.0, 1.0);
        // Along alpha1 = alpha2 = t the pair contributes 2t - ½(t - t)² = 2t
        assert_relative_eq!(low_obj, 0.0, epsilon = 1e-12);
        assert_relative_eq!(high_obj, 2.0, epsilon = 1e-12);

        assert!(solver.take_step(0, 1));
        assert_eq!(solver.state().alphas()[1], 1.0);
        assert_eq!(solver.state().alphas()[0], 1.0);
        assert!(solver.state().error_cache_drift(&kernel) < 1e-9);
    }

    #[test]
    fn test_objective_constant_only_shifts_endpoints() {
        let kernel = RBFKernel::default();
        let features = [[1.0, 1.0], [1.0, 1.0], [-2.0, -2.0], [0.5, -1.0]];
        let labels = [1, -1, 1, -1];

        let mut gaps = Vec::new();
        for constant in [ObjectiveConstant::SumOthers, ObjectiveConstant::RepeatFirst] {
            let params = Hyperparameters {
                objective_constant: constant,
                ..Hyperparameters::default()
            };
            let mut state = load(&features, &labels);
            state.alpha = vec![0.2, 0.1, 0.3, 0.4];
            let mut solver = SmoSolver::new(&kernel, &params, &mut state);
            let (low_obj, high_obj) = solver.endpoint_objectives(0, 1, 0.1, 0.9, 1.0, 1.0, 1.0);
            gaps.push(high_obj - low_obj);
        }

        assert_relative_eq!(gaps[0], gaps[1], epsilon = 1e-12);
    }

    #[test]
    fn test_alpha_stays_in_box() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters {
            c: 0.05,
            ..Hyperparameters::default()
        };
        let mut state = toy_state();

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        solver.run();

        for &a in solver.state().alphas() {
            assert!(a >= -1e-6 && a <= 0.05 + 1e-6, "alpha {a} outside [0, C]");
        }
    }

    #[test]
    fn test_run_converges_on_toy_set() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = toy_state();

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        let report = solver.run();

        assert_eq!(report.status, ConvergenceStatus::Converged);
        assert!(report.pair_updates > 0);
        assert!(report.n_support_vectors > 0);
        assert!(report.objective > 0.0);

        let state = solver.state();
        assert!(state.decision_function(&kernel, &[3.0, 3.5]) > 0.0);
        assert!(state.decision_function(&kernel, &[0.0, 0.5]) < 0.0);
    }

    #[test]
    fn test_observer_sees_consistent_error_cache() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = load(
            &[
                [0.0, 0.0],
                [0.5, 0.2],
                [1.0, 1.5],
                [2.0, 2.0],
                [2.5, 1.0],
                [0.2, 2.2],
            ],
            &[-1, -1, 1, 1, 1, -1],
        );

        let mut sweeps = Vec::new();
        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        let report = solver.run_with_observer(|summary, state| {
            assert!(state.error_cache_drift(&kernel) < 1e-4);
            sweeps.push(*summary);
        });

        assert_eq!(sweeps.len(), report.sweeps);
        assert!(sweeps[0].examined_all);
        assert_eq!(sweeps[0].examined, 6);
        let last = sweeps.last().expect("at least one sweep");
        assert!(last.examined_all);
        assert_eq!(last.changed, 0);
    }

    #[test]
    fn test_single_class_terminates_without_updates() {
        let kernel = RBFKernel::default();
        let params = Hyperparameters::default();
        let mut state = load(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]], &[1, 1, 1]);

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        let report = solver.run();

        assert_eq!(report.status, ConvergenceStatus::Converged);
        assert_eq!(report.sweeps, 1);
        assert_eq!(report.pair_updates, 0);
        assert!(solver.state().alphas().iter().all(|&a| a == 0.0));
    }

    #[test]
    fn test_sweep_cap_reports_non_convergence() {
        let kernel = RBFKernel::default();
        // The largest-gap partner is always tried, so the first sweep moves
        let params = Hyperparameters {
            max_sweeps: Some(1),
            non_bound_rule: NonBoundRule::AllExamples,
            ..Hyperparameters::default()
        };
        let mut state = toy_state();

        let mut solver = SmoSolver::new(&kernel, &params, &mut state);
        let report = solver.run();

        assert_eq!(report.status, ConvergenceStatus::MaxSweepsReached);
        assert_eq!(report.sweeps, 1);
    }

    #[test]
    fn test_same_seed_same_solution() {
        let kernel = RBFKernel::default();
        let features = [
            [0.0, 0.0],
            [1.0, 0.2],
            [0.4, 1.1],
            [2.0, 2.1],
            [2.6, 1.7],
            [1.9, 3.0],
        ];
        let labels = [-1, -1, 1, 1, -1, 1];

        let solve = |rule: NonBoundRule| {
            let params = Hyperparameters {
                seed: 7,
                non_bound_rule: rule,
                ..Hyperparameters::default()
            };
            let mut state = load(&features, &labels);
            let report = SmoSolver::new(&kernel, &params, &mut state).run();
            (state, report)
        };

        for rule in [NonBoundRule::Strict, NonBoundRule::AllExamples] {
            let (first, first_report) = solve(rule);
            let (second, second_report) = solve(rule);
            assert_eq!(first.alphas(), second.alphas());
            assert_eq!(first.bias(), second.bias());
            assert_eq!(first_report, second_report);
        }
    }

    #[test]
    fn test_cache_disabled_gives_same_solution() {
        let kernel = RBFKernel::default();
        let cached = Hyperparameters::default();
        let uncached = Hyperparameters {
            cache_size: 0,
            ..Hyperparameters::default()
        };

        let mut with_cache = toy_state();
        let mut without_cache = toy_state();
        {
            let mut solver = SmoSolver::new(&kernel, &cached, &mut with_cache);
            solver.run();
            assert!(solver.cache_stats().hits > 0);
        }
        {
            let mut solver = SmoSolver::new(&kernel, &uncached, &mut without_cache);
            solver.run();
            assert_eq!(solver.cache_stats().hits, 0);
        }

        assert_eq!(with_cache.alphas(), without_cache.alphas());
        assert_eq!(with_cache.bias(), without_cache.bias());
    }
}

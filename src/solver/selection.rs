//! Working-set heuristics: the KKT violation test and the choice of the
//! second example.

use crate::core::NonBoundRule;
use crate::solver::ModelState;

/// KKT violation test for example `i` with `r = E_i * y_i`.
///
/// - r < -tol and alpha < C: alpha can still grow
/// - r > tol and alpha > 0: alpha can still shrink
pub fn violates_kkt(r: f64, alpha: f64, c: f64, tol: f64) -> bool {
    (r < -tol && alpha < c) || (r > tol && alpha > 0.0)
}

/// Number of examples the rule treats as non-bound
pub fn count_non_bound(state: &ModelState, c: f64, rule: NonBoundRule) -> usize {
    match rule {
        NonBoundRule::Strict => (0..state.len())
            .filter(|&i| state.is_non_bound(i, c))
            .count(),
        NonBoundRule::AllExamples => state.len(),
    }
}

/// Partner maximizing |E_i1 - E_i2| among the eligible examples.
///
/// Ties keep the lowest index. Returns `None` when no candidate has a
/// strictly positive gap.
pub fn max_error_gap_partner(
    state: &ModelState,
    i2: usize,
    c: f64,
    rule: NonBoundRule,
) -> Option<usize> {
    let e2 = state.errors()[i2];
    let mut best = None;
    let mut max_gap = 0.0;

    for (i, &e1) in state.errors().iter().enumerate() {
        if rule == NonBoundRule::Strict && !state.is_non_bound(i, c) {
            continue;
        }
        let gap = (e1 - e2).abs();
        if gap > max_gap {
            max_gap = gap;
            best = Some(i);
        }
    }

    best
}

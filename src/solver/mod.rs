//! SMO training components
//!
//! - [`ModelState`]: training points, multipliers, error cache and bias
//! - [`selection`]: KKT violation test and partner heuristics
//! - [`SmoSolver`]: pairwise step, example examination and the sweep loop

pub mod selection;
pub mod smo;
pub mod state;

pub use self::smo::*;
pub use self::state::*;

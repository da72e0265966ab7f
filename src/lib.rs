//! Soft-margin Support Vector Machine with a Gaussian kernel
//!
//! Trained by Sequential Minimal Optimization as described in "Fast Training
//! of Support Vector Machines using Sequential Minimal Optimization" by
//! John C. Platt.

pub mod api;
pub mod cache;
pub mod core;
pub mod kernel;
pub mod solver;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, SVM};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::error::{Result, SVMError};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::kernel::{Kernel, RBFKernel};
pub use crate::solver::{ModelState, SmoSolver};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Standard-curve fitting.
//!
//! Responsibilities:
//!
//! - select the standards inside the user's fit range
//! - fit an OLS line and classify its quality

pub mod fitter;

pub use fitter::*;

//! Mathematical utilities: simple linear regression and rounding.

pub mod ols;

pub use ols::*;

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - calibration inputs (`CalibrationPoint`, `CalibrationSet`, `FitRange`)
//! - the fitted line (`LinearFit`, `FitQuality`)
//! - unknown-sample rows and their estimates (`UnknownSample`, `Estimate`)
//! - dilution inputs and outcomes (`DilutionInput`, `DilutionOutcome`)

pub mod types;

pub use types::*;

//! Using the standard curve.
//!
//! - `inverse`: absorbance → concentration through the inverted line
//! - `dilution`: diluted-sample estimate → original-sample concentration

pub mod dilution;
pub mod inverse;

pub use dilution::*;
pub use inverse::*;

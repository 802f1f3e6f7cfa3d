//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - report export (`export`)
//! - JSON session snapshot (`session`)
//! - starter CSV templates (`template`)

pub mod export;
pub mod ingest;
pub mod session;
pub mod template;

pub use export::*;
pub use ingest::*;
pub use session::*;
pub use template::*;

//! Input/output helpers.
//!
//! - CSV table store (`ingest`)
//! - summary exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;

//! The computation core.
//!
//! Responsibilities:
//!
//! - select rows inside an inclusive date range (`filter`)
//! - derive the comparison range and resolve date presets (`comparison`)
//! - reduce rows to named scalars, optionally per group key (`aggregate`)
//! - current-vs-previous deltas (`change`)
//! - funnel step ratios (`funnel`) and trend series (`trend`)
//!
//! Everything here is pure: inputs are borrowed, outputs are fresh values.

pub mod aggregate;
pub mod change;
pub mod comparison;
pub mod filter;
pub mod funnel;
pub mod trend;

pub use aggregate::*;
pub use change::*;
pub use comparison::*;
pub use filter::*;
pub use funnel::*;
pub use trend::*;

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - selection enums (`DatePreset`, `ComparisonMode`, `Granularity`)
//! - the `DateRange` value type
//! - the metric vocabulary (`Metric`) and the `MetricSource` trait
//! - one typed row struct per CSV table
//! - computed outputs (`ChangeResult`, `FunnelStep`)

pub mod types;

pub use types::*;

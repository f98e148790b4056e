//! Data sources that are not user-supplied CSVs.

pub mod sample;

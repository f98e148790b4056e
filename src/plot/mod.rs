//! Terminal charts for the text reports.

pub mod ascii;

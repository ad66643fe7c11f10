//! Slurm waiting-time reports from sacct accounting data
//!
//! This library turns raw `sacct` output into a clean set of waiting-time
//! samples (Start minus Submit), summary statistics, and binned histogram
//! data, together with the CSV/SVG/JSON artifacts of a report run.

pub mod cli;
pub mod csv_output;
pub mod filter;
pub mod histogram;
pub mod json_output;
pub mod output;
pub mod record;
pub mod sacct;
pub mod stats;
pub mod svg_output;
pub mod time_utils;

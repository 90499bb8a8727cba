//! A module about the input and output files: the potential configuration, XYZ structures, and energy reports.

pub mod input;
pub mod xyz;
pub mod output;

//! Constants, chemical elements, errors, and logging shared by the whole crate.

pub mod constants;
pub mod error;
pub mod logging;

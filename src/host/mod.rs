//! The host-side data model the potential plugs into: topology, system, and forces.

pub mod topology;
pub mod force;
pub mod system;

pub use force::Force;
pub use system::{StepResult, System};
pub use topology::{Atom, Topology};

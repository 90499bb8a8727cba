//! A module about exposing a deployed model to a system as an energy and force contribution,
//! with the conversion between the model units and nm, kJ/mol.

pub mod units;
pub mod traits;
pub mod bound;
pub mod nequip;
pub mod registry;

pub use bound::{BoundForceSpec, NequipForce};
pub use nequip::{NequipPotentialImpl, NequipPotentialImplFactory};
pub use registry::{register_impl_factory, registered_names, MLPotential};
pub use traits::{AddForcesOptions, PotentialImpl, PotentialImplFactory};
pub use units::UnitConversion;

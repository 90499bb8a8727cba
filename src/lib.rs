//! nequip_mm
//!
//! Exposes a deployed NequIP-style machine-learning interatomic potential to a molecular
//! simulation system as an additional energy and force contribution. The model works in its own
//! units (e.g. Angstrom and eV); the system works in nm and kJ/mol. Every evaluation divides the
//! positions by `distance_to_nm`, runs the model, multiplies the energy by `energy_to_kJ_per_mol`
//! and the forces by `energy_to_kJ_per_mol / distance_to_nm`.
//!
//! ```no_run
//! use nequip_mm::io::input::PotentialConfig;
//! use nequip_mm::io::xyz::read_xyz;
//! use nequip_mm::potential::MLPotential;
//!
//! let config = PotentialConfig::from_file("potential.toml")?;
//! let (topology, positions) = read_xyz("water.xyz")?;
//! let system = MLPotential::from_config(&config)?.create_system(&topology)?;
//! let result = system.evaluate(&positions, None, None)?;
//! println!("E = {} kJ/mol", result.energy);
//! # Ok::<(), nequip_mm::common::error::Error>(())
//! ```

pub mod common;
pub mod io;
pub mod matrix;
pub mod nn;
pub mod host;
pub mod potential;

pub use crate::common::error::{Error, Result};
pub use crate::host::{Force, StepResult, System, Topology};
pub use crate::io::input::PotentialConfig;
pub use crate::potential::{AddForcesOptions, MLPotential, NequipForce};

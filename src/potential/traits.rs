//! About the traits
use crate::common::error::Result;
use crate::host::{System, Topology};
use crate::io::input::PotentialConfig;
use std::path::PathBuf;





/// Options for adding a potential to a system.
///
/// # Fields
/// ```text
/// atoms: indices of the atoms handled by the potential (None for all of them)
/// force_group: the force group of the added force
/// filename: if given, the description of the added force is written to this file
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AddForcesOptions
{
    pub atoms: Option< Vec<usize> >,
    pub force_group: usize,
    pub filename: Option<PathBuf>,
}



/// A family-specific potential that can add its forces to a system
pub trait PotentialImpl: Send + Sync
{
    fn add_forces(&self, topology: &Topology, system: &mut System, options: &AddForcesOptions) -> Result<()>;
}



/// Builds the [`PotentialImpl`] of a potential family from its configuration
pub trait PotentialImplFactory: Send + Sync
{
    fn create_impl(&self, name: &str, config: &PotentialConfig) -> Result< Box<dyn PotentialImpl> >;
}

//! Machine-learning potentials looked up by name.
//!
//! The registry maps the name of a potential family to the factory building it. `nequip` is
//! registered when the registry is first used; other families can be added at runtime with
//! [`register_impl_factory`].
use crate::common::error::*;
use crate::host::{System, Topology};
use crate::io::input::PotentialConfig;
use crate::potential::nequip::NequipPotentialImplFactory;
use crate::potential::traits::{AddForcesOptions, PotentialImpl, PotentialImplFactory};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};





lazy_static!
{
    static ref IMPL_FACTORIES: RwLock< HashMap< String, Arc<dyn PotentialImplFactory> > > =
    {
        let mut factories: HashMap< String, Arc<dyn PotentialImplFactory> > = HashMap::new();
        factories.insert(String::from("nequip"), Arc::new(NequipPotentialImplFactory));
        RwLock::new(factories)
    };
}



/// Register the factory of a potential family, replacing any factory already registered under the same name
pub fn register_impl_factory(name: &str, factory: Arc<dyn PotentialImplFactory>)
{
    let mut factories = IMPL_FACTORIES.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    if factories.insert(name.to_string(), factory).is_some()
    {
        log::warn!("the potential family '{}' was registered again", name);
    }
    else
    {
        log::debug!("registered the potential family '{}'", name);
    }
}

/// The names of the registered potential families, sorted
pub fn registered_names() -> Vec<String>
{
    let factories = IMPL_FACTORIES.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut names: Vec<String> = factories.keys().cloned().collect();
    names.sort();
    names
}

fn impl_factory(name: &str) -> Result< Arc<dyn PotentialImplFactory> >
{
    let factories = IMPL_FACTORIES.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    factories.get(name).cloned().ok_or_else(||
    {
        let mut known: Vec<&String> = factories.keys().collect();
        known.sort();
        Error::Config(format!("unknown potential '{}', the registered ones are {:?}", name, known))
    })
}





/// A machine-learning potential that builds systems for a topology.
///
/// # Examples
/// ```no_run
/// use nequip_mm::common::constants::Element;
/// use nequip_mm::host::Topology;
/// use nequip_mm::io::input::PotentialConfig;
/// use nequip_mm::potential::MLPotential;
///
/// let config = PotentialConfig::new("water-deployed.safetensors", 0.1, 96.485);
/// let potential = MLPotential::new("nequip", &config)?;
/// let system = potential.create_system(&Topology::from_elements(&[Element::O, Element::H, Element::H]))?;
/// # Ok::<(), nequip_mm::common::error::Error>(())
/// ```
pub struct MLPotential
{
    name: String,
    imp: Box<dyn PotentialImpl>,
}





impl MLPotential
{
    /// Build the potential registered under `name`. Configuration and load errors happen here.
    pub fn new(name: &str, config: &PotentialConfig) -> Result<Self>
    {
        let factory: Arc<dyn PotentialImplFactory> = impl_factory(name)?;
        let imp: Box<dyn PotentialImpl> = factory.create_impl(name, config)?;
        log::info!("created the '{}' potential", name);
        Ok(MLPotential { name: name.to_string(), imp })
    }

    /// Build the potential named in the configuration
    pub fn from_config(config: &PotentialConfig) -> Result<Self>
    {
        MLPotential::new(&config.name, config)
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Create a system for the topology whose only force is the model.
    pub fn create_system(&self, topology: &Topology) -> Result<System>
    {
        self.create_system_with(topology, &AddForcesOptions::default())
    }

    /// Create a system with one particle per atom (masses from the elements, 0 if unknown),
    /// the box of the topology, and the forces of the model.
    pub fn create_system_with(&self, topology: &Topology, options: &AddForcesOptions) -> Result<System>
    {
        if topology.num_atoms() == 0
        {
            return Err(Error::Shape(String::from("the topology contains no atom")));
        }

        let mut system: System = System::new();
        for atom in topology.atoms()
        {
            system.add_particle(atom.element.map_or(0.0, |e| e.atomic_mass()));
        }
        if let Some(box_vectors) = topology.periodic_box_vectors()
        {
            system.set_default_periodic_box_vectors(box_vectors.clone())?;
        }

        self.add_forces(topology, &mut system, options)?;
        Ok(system)
    }

    /// Add the forces of the model to an existing system
    pub fn add_forces(&self, topology: &Topology, system: &mut System, options: &AddForcesOptions) -> Result<()>
    {
        self.imp.add_forces(topology, system, options)
    }
}

//! The `nequip` potential family: a deployed NequIP-style model in its own units.
use crate::common::error::*;
use crate::host::{System, Topology};
use crate::io::input::PotentialConfig;
use crate::nn::cache::shared_model;
use crate::nn::deployed::load_deployed_model;
use crate::nn::metadata::ModelMetadata;
use crate::nn::model::InferenceModel;
use crate::potential::bound::{check_periodic_cell, BoundForceSpec, NequipForce};
use crate::potential::traits::{AddForcesOptions, PotentialImpl, PotentialImplFactory};
use crate::potential::units::UnitConversion;
use ndarray::Array2;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;





pub struct NequipPotentialImplFactory;

impl PotentialImplFactory for NequipPotentialImplFactory
{
    fn create_impl(&self, name: &str, config: &PotentialConfig) -> Result< Box<dyn PotentialImpl> >
    {
        log::debug!("creating the '{}' potential from '{}'", name, config.model_path.display());
        Ok(Box::new(NequipPotentialImpl::new(config)?))
    }
}





/// A loaded model together with its unit conversion.
///
/// # Fields
/// ```text
/// model_path: the artifact the model was loaded from
/// units: the unit conversion between the model and the host
/// atom_types: explicit model type index of each ML atom
/// model: the loaded model
/// ```
pub struct NequipPotentialImpl
{
    model_path: PathBuf,
    units: UnitConversion,
    atom_types: Option< Vec<usize> >,
    model: Arc<dyn InferenceModel>,
}





impl NequipPotentialImpl
{
    /// Validate the unit conversion factors, then load the model.
    ///
    /// The model path is made absolute, so a saved bound force does not depend on the working directory.
    pub fn new(config: &PotentialConfig) -> Result<Self>
    {
        let units: UnitConversion = config.units()?;
        let model: Arc<dyn InferenceModel> = if config.share_model
        {
            shared_model(&config.model_path)?
        }
        else
        {
            Arc::new(load_deployed_model(&config.model_path)?)
        };
        let model_path: PathBuf = fs::canonicalize(&config.model_path)
            .map_err(|e| Error::load(&config.model_path, e.to_string()))?;
        Ok(NequipPotentialImpl::with_model(model_path, units, config.atom_types.clone(), model))
    }

    /// Wrap an already loaded model
    pub fn with_model(model_path: PathBuf, units: UnitConversion, atom_types: Option< Vec<usize> >, model: Arc<dyn InferenceModel>) -> Self
    {
        NequipPotentialImpl { model_path, units, atom_types, model }
    }

    pub fn model_path(&self) -> &Path
    {
        &self.model_path
    }

    pub fn units(&self) -> UnitConversion
    {
        self.units
    }

    pub fn metadata(&self) -> &ModelMetadata
    {
        self.model.metadata()
    }

    /// Resolve the ML atoms, their types, and the periodicity of a topology.
    pub fn bind(&self, topology: &Topology, system: &System, options: &AddForcesOptions) -> Result<BoundForceSpec>
    {
        let natom: usize = topology.num_atoms();
        if natom == 0
        {
            return Err(Error::Shape(String::from("the topology contains no atom")));
        }
        if system.num_particles() != natom
        {
            return Err(Error::Shape(format!("the system has {} particles but the topology has {} atoms", system.num_particles(), natom)));
        }

        let ml_atoms: Vec<usize> = match &options.atoms
        {
            Some(atoms) =>
            {
                if atoms.is_empty()
                {
                    return Err(Error::Shape(String::from("the list of ML atoms is empty")));
                }
                let mut seen: HashSet<usize> = HashSet::with_capacity(atoms.len());
                for i in atoms
                {
                    if *i >= natom
                    {
                        return Err(Error::Shape(error_atom_index(*i, natom)));
                    }
                    if !seen.insert(*i)
                    {
                        return Err(Error::Shape(format!("atom {} is listed twice among the ML atoms", i)));
                    }
                }
                atoms.clone()
            },
            None => (0..natom).collect(),
        };

        let metadata: &ModelMetadata = self.model.metadata();
        let atomic_numbers: Vec<usize> = ml_atoms.iter()
            .map(|i| topology.atoms()[*i].element.map_or(0, |e| e.atomic_number()))
            .collect();
        let atom_types: Vec<usize> = match &self.atom_types
        {
            Some(types) =>
            {
                if types.len() != ml_atoms.len()
                {
                    return Err(Error::Shape(format!("{} atom types are given for {} ML atoms", types.len(), ml_atoms.len())));
                }
                if let Some(t) = types.iter().find(|t| **t >= metadata.n_species())
                {
                    return Err(Error::Shape(format!("atom type {} is out of range for a model of {} species", t, metadata.n_species())));
                }
                types.clone()
            },
            None => ml_atoms.iter().map(|i|
            {
                let atom = &topology.atoms()[*i];
                let element = atom.element
                    .ok_or_else(|| Error::Shape(format!("atom {} ('{}') has no element, so its model type is unknown", i, atom.name)))?;
                metadata.type_index(element.symbol())
                    .ok_or_else(|| Error::Shape(format!("the element {} of atom {} is not among the model species [{}]", element.symbol(), i, metadata.type_names.join(" "))))
            }).collect::<Result< Vec<usize> >>()?,
        };

        let periodic: bool = topology.periodic_box_vectors().is_some() || system.uses_periodic_boundary_conditions();
        if periodic
        {
            let box_vectors: &Array2<f64> = topology.periodic_box_vectors()
                .or(system.default_periodic_box_vectors())
                .ok_or_else(|| Error::Shape(String::from("periodic evaluation needs box vectors")))?;
            check_periodic_cell(&self.units.positions_to_model(box_vectors), metadata.r_max)?;
        }
        log::debug!("bound {} ML atoms of {} (periodic: {}, cutoff {} nm)", ml_atoms.len(), natom, periodic, self.units.distance_to_host(metadata.r_max));

        Ok(BoundForceSpec
        {
            model_path: self.model_path.to_string_lossy().into_owned(),
            atom_types,
            atomic_numbers,
            indices: options.atoms.clone(),
            num_particles: natom,
            periodic,
            distance_to_nm: self.units.distance_to_nm(),
            energy_to_kj_per_mol: self.units.energy_to_kj_per_mol(),
            force_group: options.force_group,
        })
    }
}





impl PotentialImpl for NequipPotentialImpl
{
    fn add_forces(&self, topology: &Topology, system: &mut System, options: &AddForcesOptions) -> Result<()>
    {
        let spec: BoundForceSpec = self.bind(topology, system, options)?;
        let force: NequipForce = NequipForce::new(Arc::clone(&self.model), spec)?;
        if let Some(filename) = &options.filename
        {
            force.save(filename)?;
        }
        let index: usize = system.add_force(Box::new(force));
        log::info!("added the model '{}' as force {} (group {})", self.model_path.display(), index, options.force_group);
        Ok(())
    }
}

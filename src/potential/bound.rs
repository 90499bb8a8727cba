//! The force a model contributes to a system once it is bound to a topology.
use crate::common::error::{self, error_array_shape, error_atom_index, error_non_finite, Error};
use crate::host::Force;
use crate::matrix::{check_box_vectors, is_orthorhombic};
use crate::nn::deployed::load_deployed_model;
use crate::nn::model::{InferenceModel, ModelInput, ModelOutput};
use crate::nn::neighbor::{simple_neighbor_list, NeighborList};
use crate::nn::metadata::ModelDtype;
use crate::potential::units::UnitConversion;
use ndarray::{Array2, Axis};
use savefile::{load_file, save_file};
use savefile_derive::Savefile;
use std::path::Path;
use std::sync::Arc;





const BOUND_FORCE_VERSION: u32 = 0;



/// Everything needed to rebuild a bound force.
///
/// # Fields
/// ```text
/// model_path: the deployed model artifact
/// atom_types: the model type index of each ML atom
/// atomic_numbers: the atomic number of each ML atom (0 if unknown)
/// indices: the system indices of the ML atoms (None if all atoms are ML atoms)
/// num_particles: the number of particles of the system
/// periodic: whether the model is evaluated with periodic boundary conditions
/// distance_to_nm, energy_to_kj_per_mol: the unit conversion factors
/// force_group: the force group of the force
/// ```
#[derive(Clone, Debug, PartialEq, Savefile)]
pub struct BoundForceSpec
{
    pub model_path: String,
    pub atom_types: Vec<usize>,
    pub atomic_numbers: Vec<usize>,
    pub indices: Option< Vec<usize> >,
    pub num_particles: usize,
    pub periodic: bool,
    pub distance_to_nm: f64,
    pub energy_to_kj_per_mol: f64,
    pub force_group: usize,
}





impl BoundForceSpec
{
    /// The number of atoms handled by the model
    pub fn num_ml_atoms(&self) -> usize
    {
        self.atom_types.len()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> error::Result<()>
    {
        let path: &Path = path.as_ref();
        save_file(path, BOUND_FORCE_VERSION, self)
            .map_err(|e| Error::io("writing", path, std::io::Error::new(std::io::ErrorKind::Other, format!("{:?}", e))))?;
        log::debug!("saved the bound force to '{}'", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> error::Result<Self>
    {
        let path: &Path = path.as_ref();
        load_file(path, BOUND_FORCE_VERSION).map_err(|e| Error::parse(path, format!("{:?}", e)))
    }
}



/// Check that a periodic cell (in model units) can be used with the minimum image convention,
/// i.e. it is orthorhombic and every side is at least twice the cutoff.
pub fn check_periodic_cell(cell: &Array2<f64>, r_max: f64) -> error::Result<()>
{
    check_box_vectors(cell)?;
    if !is_orthorhombic(cell)
    {
        return Err(Error::Shape(String::from("periodic evaluation needs orthorhombic box vectors")));
    }
    for a in 0..3
    {
        if cell[[a,a]].abs() < 2.0 * r_max
        {
            return Err(Error::Shape(format!("box side {} is {} model units, shorter than twice the model cutoff {}", a, cell[[a,a]].abs(), r_max)));
        }
    }
    Ok(())
}





/// The force of a deployed model in a system.
///
/// Each evaluation converts the positions (and the box) of the ML atoms to model units, builds
/// the neighbor list within the model cutoff, runs the model, and converts the energy and the
/// forces back to kJ/mol and kJ/mol/nm. Nothing is kept between evaluations.
pub struct NequipForce
{
    model: Arc<dyn InferenceModel>,
    units: UnitConversion,
    spec: BoundForceSpec,
}





impl NequipForce
{
    pub fn new(model: Arc<dyn InferenceModel>, spec: BoundForceSpec) -> error::Result<Self>
    {
        let units: UnitConversion = UnitConversion::new(spec.distance_to_nm, spec.energy_to_kj_per_mol)?;
        let n_species: usize = model.metadata().n_species();
        let n_ml: usize = spec.num_ml_atoms();

        if n_ml == 0
        {
            return Err(Error::Shape(String::from("the model has no atom to handle")));
        }
        if spec.atomic_numbers.len() != n_ml
        {
            return Err(Error::Shape(format!("{} atomic numbers for {} ML atoms", spec.atomic_numbers.len(), n_ml)));
        }
        if let Some(t) = spec.atom_types.iter().find(|t| **t >= n_species)
        {
            return Err(Error::Shape(format!("atom type {} is out of range for a model of {} species", t, n_species)));
        }
        match &spec.indices
        {
            Some(indices) =>
            {
                if indices.len() != n_ml
                {
                    return Err(Error::Shape(format!("{} atom indices for {} ML atoms", indices.len(), n_ml)));
                }
                if let Some(i) = indices.iter().find(|i| **i >= spec.num_particles)
                {
                    return Err(Error::Shape(error_atom_index(*i, spec.num_particles)));
                }
            },
            None =>
            {
                if spec.num_particles != n_ml
                {
                    return Err(Error::Shape(format!("{} ML atoms for a system of {} particles", n_ml, spec.num_particles)));
                }
            },
        }

        Ok(NequipForce { model, units, spec })
    }

    /// Rebuild a force from a description written by [`NequipForce::save`], loading its model again.
    pub fn from_file<P: AsRef<Path>>(path: P) -> error::Result<Self>
    {
        let spec: BoundForceSpec = BoundForceSpec::load(path)?;
        let model: Arc<dyn InferenceModel> = Arc::new(load_deployed_model(&spec.model_path)?);
        NequipForce::new(model, spec)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> error::Result<()>
    {
        self.spec.save(path)
    }

    pub fn spec(&self) -> &BoundForceSpec
    {
        &self.spec
    }

    pub fn model(&self) -> &Arc<dyn InferenceModel>
    {
        &self.model
    }

    fn model_input(&self, positions: &Array2<f64>, box_vectors: Option<&Array2<f64>>) -> error::Result<ModelInput>
    {
        let dtype: ModelDtype = self.model.metadata().model_dtype;
        let r_max: f64 = self.model.metadata().r_max;

        let ml_positions: Array2<f64> = match &self.spec.indices
        {
            Some(indices) => positions.select(Axis(0), indices),
            None => positions.to_owned(),
        };
        let pos: Array2<f64> = self.units.positions_to_model(&ml_positions).mapv(|x| dtype.round(x));

        let (cell, pbc): (Array2<f64>, [bool; 3]) = if self.spec.periodic
        {
            let box_vectors: &Array2<f64> = box_vectors
                .ok_or_else(|| Error::Shape(String::from("the periodic model force needs box vectors")))?;
            let cell: Array2<f64> = self.units.positions_to_model(box_vectors).mapv(|x| dtype.round(x));
            check_periodic_cell(&cell, r_max)?;
            (cell, [true; 3])
        }
        else
        {
            (Array2::eye(3), [false; 3])
        };

        let list: NeighborList = simple_neighbor_list(&pos, &cell, pbc, r_max, false);
        Ok(ModelInput
        {
            pos,
            cell,
            pbc,
            atom_types: self.spec.atom_types.clone(),
            atomic_numbers: self.spec.atomic_numbers.clone(),
            edge_index: list.edge_index,
            edge_cell_shift: list.edge_cell_shift,
        })
    }
}





impl Force for NequipForce
{
    fn evaluate(&self, positions: &Array2<f64>, box_vectors: Option<&Array2<f64>>) -> error::Result<(f64, Array2<f64>)>
    {
        let natom: usize = self.spec.num_particles;
        let n_ml: usize = self.spec.num_ml_atoms();
        if positions.dim() != (natom, 3)
        {
            return Err(Error::Shape(error_array_shape("positions", (natom, 3), positions.dim())));
        }
        if positions.iter().any(|x| !x.is_finite())
        {
            return Err(Error::Numerical(String::from("the positions contain non-finite values")));
        }

        let input: ModelInput = self.model_input(positions, box_vectors)?;
        let nedge: usize = input.edge_index.len();
        let output: ModelOutput = self.model.forward(&input)?;

        if output.forces.dim() != (n_ml, 3)
        {
            return Err(Error::Shape(error_array_shape("model forces", (n_ml, 3), output.forces.dim())));
        }
        if !output.total_energy.is_finite()
        {
            return Err(Error::Numerical(error_non_finite("energy", &format!("{} ML atoms, {} edges", n_ml, nedge))));
        }
        if output.forces.iter().any(|f| !f.is_finite())
        {
            return Err(Error::Numerical(error_non_finite("force", &format!("{} ML atoms, {} edges", n_ml, nedge))));
        }

        let energy: f64 = self.units.energy_to_host(output.total_energy);
        let ml_forces: Array2<f64> = self.units.forces_to_host(&output.forces);
        let forces: Array2<f64> = match &self.spec.indices
        {
            Some(indices) =>
            {
                let mut forces: Array2<f64> = Array2::zeros((natom, 3));
                for (k, i) in indices.iter().enumerate()
                {
                    forces.row_mut(*i).assign(&ml_forces.row(k));
                }
                forces
            },
            None => ml_forces,
        };

        log::trace!("model force: {} ML atoms, {} edges, energy = {} kJ/mol", n_ml, nedge, energy);
        Ok((energy, forces))
    }

    fn force_group(&self) -> usize
    {
        self.spec.force_group
    }

    fn uses_periodic_boundary_conditions(&self) -> bool
    {
        self.spec.periodic
    }
}










#[cfg(test)]
mod tests
{
    use super::*;
    use crate::nn::metadata::ModelMetadata;
    use ndarray::array;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Returns a fixed energy and a force on the first atom, in model units
    struct FixedModel
    {
        metadata: ModelMetadata,
        energy: f64,
    }

    impl InferenceModel for FixedModel
    {
        fn metadata(&self) -> &ModelMetadata
        {
            &self.metadata
        }

        fn forward(&self, input: &ModelInput) -> error::Result<ModelOutput>
        {
            let mut forces: Array2<f64> = Array2::zeros(input.pos.raw_dim());
            forces[[0,0]] = 1.0;
            Ok(ModelOutput { total_energy: self.energy, forces })
        }
    }

    fn fixed(energy: f64) -> Arc<dyn InferenceModel>
    {
        Arc::new(FixedModel
        {
            metadata: ModelMetadata
            {
                r_max: 5.0,
                type_names: vec!["H".to_string(), "O".to_string()],
                model_dtype: ModelDtype::Float64,
                n_basis: 8,
                p_cutoff: 6.0,
            },
            energy,
        })
    }

    fn spec(indices: Option<Vec<usize>>, num_particles: usize) -> BoundForceSpec
    {
        BoundForceSpec
        {
            model_path: String::from("fixed"),
            atom_types: vec![0, 1],
            atomic_numbers: vec![1, 8],
            indices,
            num_particles,
            periodic: false,
            distance_to_nm: 0.1,
            energy_to_kj_per_mol: 4.184,
            force_group: 2,
        }
    }

    #[test]
    fn forces_of_a_subset_are_scattered()
    {
        let force: NequipForce = NequipForce::new(fixed(-10.0), spec(Some(vec![3, 1]), 4)).unwrap();
        let (energy, forces): (f64, Array2<f64>) = force.evaluate(&Array2::zeros((4, 3)), None).unwrap();
        assert!((energy + 41.84).abs() < 1.0E-10);
        assert!((forces[[3,0]] - 41.84).abs() < 1.0E-10);
        assert_eq!(forces.iter().filter(|f| **f != 0.0).count(), 1);
        assert_eq!(force.force_group(), 2);
        assert!(!force.uses_periodic_boundary_conditions());
    }

    #[test]
    fn inconsistent_descriptions_are_rejected()
    {
        assert!(NequipForce::new(fixed(0.0), spec(None, 3)).is_err());
        assert!(NequipForce::new(fixed(0.0), spec(Some(vec![0, 5]), 4)).is_err());

        let mut bad_type: BoundForceSpec = spec(None, 2);
        bad_type.atom_types = vec![0, 2];
        assert!(matches!(NequipForce::new(fixed(0.0), bad_type), Err(Error::Shape(_))));

        let mut bad_units: BoundForceSpec = spec(None, 2);
        bad_units.distance_to_nm = 0.0;
        assert!(matches!(NequipForce::new(fixed(0.0), bad_units), Err(Error::Config(_))));
    }

    #[test]
    fn non_finite_output_is_a_numerical_error()
    {
        let force: NequipForce = NequipForce::new(fixed(f64::NAN), spec(None, 2)).unwrap();
        assert!(matches!(force.evaluate(&Array2::zeros((2, 3)), None), Err(Error::Numerical(_))));
        assert!(matches!(force.evaluate(&Array2::zeros((3, 3)), None), Err(Error::Shape(_))));
    }

    #[test]
    fn periodic_forces_need_a_large_orthorhombic_box()
    {
        let mut periodic: BoundForceSpec = spec(None, 2);
        periodic.periodic = true;
        let force: NequipForce = NequipForce::new(fixed(-1.0), periodic).unwrap();
        let positions: Array2<f64> = Array2::zeros((2, 3));

        assert!(matches!(force.evaluate(&positions, None), Err(Error::Shape(_))));
        // 0.8 nm = 8 model units < 2 * 5
        assert!(matches!(force.evaluate(&positions, Some(&(Array2::eye(3) * 0.8))), Err(Error::Shape(_))));
        let skewed: Array2<f64> = array![[2.0, 0.0, 0.0], [0.5, 2.0, 0.0], [0.0, 0.0, 2.0]];
        assert!(force.evaluate(&positions, Some(&skewed)).is_err());
        assert!(force.evaluate(&positions, Some(&(Array2::eye(3) * 2.0))).is_ok());
    }

    #[test]
    fn descriptions_round_trip_through_a_file()
    {
        let dir = tempdir().unwrap();
        let path = dir.path().join("force.bin");
        let original: BoundForceSpec = spec(Some(vec![0, 2]), 3);
        original.save(&path).unwrap();
        assert_eq!(BoundForceSpec::load(&path).unwrap(), original);
        assert!(matches!(BoundForceSpec::load(dir.path().join("none.bin")), Err(Error::Parse { .. })));
    }

    /// Keeps the last input it was given
    struct RecordingModel
    {
        metadata: ModelMetadata,
        last_input: Mutex< Option<ModelInput> >,
    }

    impl InferenceModel for RecordingModel
    {
        fn metadata(&self) -> &ModelMetadata
        {
            &self.metadata
        }

        fn forward(&self, input: &ModelInput) -> error::Result<ModelOutput>
        {
            *self.last_input.lock().unwrap() = Some(input.clone());
            Ok(ModelOutput { total_energy: 0.0, forces: Array2::zeros(input.pos.raw_dim()) })
        }
    }

    #[test]
    fn float32_models_see_rounded_positions_and_cell()
    {
        let model: Arc<RecordingModel> = Arc::new(RecordingModel
        {
            metadata: ModelMetadata
            {
                r_max: 5.0,
                type_names: vec!["H".to_string(), "O".to_string()],
                model_dtype: ModelDtype::Float32,
                n_basis: 8,
                p_cutoff: 6.0,
            },
            last_input: Mutex::new(None),
        });
        let mut periodic: BoundForceSpec = spec(None, 2);
        periodic.periodic = true;
        let force: NequipForce = NequipForce::new(model.clone(), periodic).unwrap();

        let positions: Array2<f64> = array![[0.123456789012, 0.0, 0.3], [0.2, 0.987654321098, 0.1]];
        let box_vectors: Array2<f64> = Array2::eye(3) * 1.23456789012345;
        force.evaluate(&positions, Some(&box_vectors)).unwrap();

        let input: ModelInput = model.last_input.lock().unwrap().clone().unwrap();
        let expected_pos: Array2<f64> = (&positions / 0.1).mapv(|x| x as f32 as f64);
        let expected_cell: Array2<f64> = (&box_vectors / 0.1).mapv(|x| x as f32 as f64);
        assert_eq!(input.pos, expected_pos);
        assert_eq!(input.cell, expected_cell);
        assert!(input.pos.iter().all(|x| *x == (*x as f32) as f64));
        assert_ne!(input.pos[[0,0]], positions[[0,0]] / 0.1);
        assert_eq!(input.pbc, [true; 3]);
    }

    /// A finite energy with an infinite force component
    struct InfiniteForceModel
    {
        metadata: ModelMetadata,
    }

    impl InferenceModel for InfiniteForceModel
    {
        fn metadata(&self) -> &ModelMetadata
        {
            &self.metadata
        }

        fn forward(&self, input: &ModelInput) -> error::Result<ModelOutput>
        {
            let mut forces: Array2<f64> = Array2::zeros(input.pos.raw_dim());
            forces[[1,2]] = f64::INFINITY;
            Ok(ModelOutput { total_energy: -3.0, forces })
        }
    }

    #[test]
    fn non_finite_forces_are_a_numerical_error()
    {
        let model: Arc<dyn InferenceModel> = Arc::new(InfiniteForceModel
        {
            metadata: ModelMetadata
            {
                r_max: 5.0,
                type_names: vec!["H".to_string(), "O".to_string()],
                model_dtype: ModelDtype::Float64,
                n_basis: 8,
                p_cutoff: 6.0,
            },
        });
        let force: NequipForce = NequipForce::new(model, spec(None, 2)).unwrap();
        assert!(matches!(force.evaluate(&Array2::zeros((2, 3)), None), Err(Error::Numerical(_))));
    }
}

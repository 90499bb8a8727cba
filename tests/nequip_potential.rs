use nequip_mm::common::constants::{Element, ANGSTROM_TO_NM, EV_TO_KJ_PER_MOL};
use nequip_mm::host::{Force, StepResult, System, Topology};
use nequip_mm::io::input::PotentialConfig;
use nequip_mm::nn::metadata::{ModelDtype, ModelMetadata};
use nequip_mm::nn::pair_network::{DenseLayer, PairNetwork};
use nequip_mm::nn::{save_deployed_model, InferenceModel, ModelInput, ModelOutput};
use nequip_mm::potential::{register_impl_factory, AddForcesOptions, MLPotential, NequipForce, NequipPotentialImpl, PotentialImpl, PotentialImplFactory, UnitConversion};
use nequip_mm::Error;
use ndarray::{array, s, Array1, Array2};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use tempfile::{tempdir, TempDir};





fn water_metadata() -> ModelMetadata
{
    ModelMetadata
    {
        r_max: 4.0,
        type_names: vec!["H".to_string(), "O".to_string()],
        model_dtype: ModelDtype::Float64,
        n_basis: 4,
        p_cutoff: 6.0,
    }
}

/// Writes a small H/O pair model (4 basis functions, one hidden layer of 5) into `dir`
fn write_water_model(dir: &Path) -> PathBuf
{
    let hidden: DenseLayer = DenseLayer
    {
        weight: Array2::from_shape_fn((5, 8), |(a, b)| 0.2 * ((3 * a + 2 * b) as f64).cos()),
        bias: array![0.1, 0.0, -0.1, 0.2, -0.05],
    };
    let output: DenseLayer = DenseLayer
    {
        weight: array![[0.6, -0.4, 0.9, 0.3, -0.7]],
        bias: array![0.05],
    };
    let network: PairNetwork = PairNetwork::new(vec![hidden, output], array![-13.6, -432.1], 4).unwrap();
    let path: PathBuf = dir.join("water.safetensors");
    save_deployed_model(&path, &water_metadata(), &network).unwrap();
    path
}

fn water_topology() -> Topology
{
    Topology::from_elements(&[Element::O, Element::H, Element::H])
}

/// Water in nm
fn water_positions() -> Array2<f64>
{
    array![
        [0.0, 0.0, 0.0],
        [0.09572, 0.0, 0.0],
        [-0.024, 0.0927, 0.003]
    ]
}

fn water_system(dir: &TempDir, energy_to_kj_per_mol: f64) -> System
{
    let path: PathBuf = write_water_model(dir.path());
    let config: PotentialConfig = PotentialConfig::new(path, ANGSTROM_TO_NM, energy_to_kj_per_mol);
    MLPotential::from_config(&config).unwrap().create_system(&water_topology()).unwrap()
}

fn evaluate_water(dir: &TempDir, energy_to_kj_per_mol: f64) -> StepResult
{
    water_system(dir, energy_to_kj_per_mol).evaluate(&water_positions(), None, None).unwrap()
}



/// Returns a fixed energy and a force of [1, 0, 0] on the first atom, in model units
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

    fn forward(&self, input: &ModelInput) -> nequip_mm::Result<ModelOutput>
    {
        let mut forces: Array2<f64> = Array2::zeros(input.pos.raw_dim());
        forces[[0, 0]] = 1.0;
        Ok(ModelOutput { total_energy: self.energy, forces })
    }
}

struct FixedFactory
{
    energy: f64,
}

impl PotentialImplFactory for FixedFactory
{
    fn create_impl(&self, _name: &str, config: &PotentialConfig) -> nequip_mm::Result<Box<dyn PotentialImpl>>
    {
        let model: Arc<dyn InferenceModel> = Arc::new(FixedModel { metadata: water_metadata(), energy: self.energy });
        Ok(Box::new(NequipPotentialImpl::with_model(config.model_path.clone(), config.units()?, config.atom_types.clone(), model)))
    }
}



#[test]
fn model_energy_and_forces_are_converted_to_kj_per_mol_and_nm()
{
    register_impl_factory("fixed-minus-ten", Arc::new(FixedFactory { energy: -10.0 }));
    let config: PotentialConfig = PotentialConfig::new("fixed", 0.1, 4.184);
    let potential: MLPotential = MLPotential::new("fixed-minus-ten", &config).unwrap();

    let topology: Topology = Topology::from_elements(&[Element::H]);
    let system: System = potential.create_system(&topology).unwrap();
    let result: StepResult = system.evaluate(&array![[0.0, 0.0, 0.0]], None, None).unwrap();

    assert!((result.energy - (-41.84)).abs() < 1.0E-10);
    assert!((result.forces[[0, 0]] - 41.84).abs() < 1.0E-10);
    assert_eq!(result.forces[[0, 1]], 0.0);
    assert_eq!(result.forces[[0, 2]], 0.0);
}

#[test]
fn configuration_errors_come_before_loading()
{
    let dir: TempDir = tempdir().unwrap();
    let missing: PathBuf = dir.path().join("missing.safetensors");

    for (d, e) in [(0.0, 4.184), (-0.1, 4.184), (0.1, 0.0), (0.1, -1.0)]
    {
        let config: PotentialConfig = PotentialConfig::new(&missing, d, e);
        assert!(matches!(MLPotential::new("nequip", &config), Err(Error::Config(_))));
    }

    let config: PotentialConfig = PotentialConfig::new(&missing, 0.1, 4.184);
    assert!(matches!(MLPotential::new("nequip", &config), Err(Error::Load { .. })));
}

#[test]
fn an_empty_topology_is_a_structural_error()
{
    let dir: TempDir = tempdir().unwrap();
    let path: PathBuf = write_water_model(dir.path());
    let config: PotentialConfig = PotentialConfig::new(path, ANGSTROM_TO_NM, EV_TO_KJ_PER_MOL);
    let potential: MLPotential = MLPotential::new("nequip", &config).unwrap();
    assert!(matches!(potential.create_system(&Topology::new()), Err(Error::Shape(_))));
}

#[test]
fn results_scale_with_the_energy_factor()
{
    let dir: TempDir = tempdir().unwrap();
    let ev: StepResult = evaluate_water(&dir, EV_TO_KJ_PER_MOL);
    let kcal: StepResult = evaluate_water(&dir, 4.184);

    let ratio: f64 = EV_TO_KJ_PER_MOL / 4.184;
    assert!((ev.energy - ratio * kcal.energy).abs() < 1.0E-8 * ev.energy.abs());
    for (a, b) in ev.forces.iter().zip(kcal.forces.iter())
    {
        assert!((a - ratio * b).abs() < 1.0E-8 * (1.0 + a.abs()));
    }
}

#[test]
fn host_forces_are_the_gradient_of_the_host_energy()
{
    let dir: TempDir = tempdir().unwrap();
    let system: System = water_system(&dir, EV_TO_KJ_PER_MOL);

    let positions: Array2<f64> = water_positions();
    let result: StepResult = system.evaluate(&positions, None, None).unwrap();
    assert!(result.forces.iter().any(|f| f.abs() > 1.0E-6));

    // nm
    let h: f64 = 1.0E-5;
    for i in 0..3
    {
        for a in 0..3
        {
            let mut plus: Array2<f64> = positions.clone();
            let mut minus: Array2<f64> = positions.clone();
            plus[[i, a]] += h;
            minus[[i, a]] -= h;
            let e_plus: f64 = system.evaluate(&plus, None, None).unwrap().energy;
            let e_minus: f64 = system.evaluate(&minus, None, None).unwrap().energy;
            let fd: f64 = -(e_plus - e_minus) / (2.0 * h);
            let tolerance: f64 = 1.0E-4 * (1.0 + fd.abs());
            assert!((result.forces[[i, a]] - fd).abs() < tolerance, "atom {} axis {}: {} vs {}", i, a, result.forces[[i, a]], fd);
        }
    }
}

#[test]
fn periodic_images_interact_across_the_boundary()
{
    let dir: TempDir = tempdir().unwrap();
    let path: PathBuf = write_water_model(dir.path());
    let config: PotentialConfig = PotentialConfig::new(path, ANGSTROM_TO_NM, EV_TO_KJ_PER_MOL);
    let potential: MLPotential = MLPotential::from_config(&config).unwrap();

    let mut topology: Topology = Topology::from_elements(&[Element::H, Element::H]);
    topology.set_periodic_box_vectors(Some(Array2::eye(3) * 1.0)).unwrap();
    let periodic: System = potential.create_system(&topology).unwrap();
    assert!(periodic.uses_periodic_boundary_conditions());
    let isolated: System = potential.create_system(&Topology::from_elements(&[Element::H, Element::H])).unwrap();

    // 0.1 nm apart through the boundary at x = 1
    let wrapped: Array2<f64> = array![[0.02, 0.5, 0.5], [0.92, 0.5, 0.5]];
    let unwrapped: Array2<f64> = array![[1.02, 0.5, 0.5], [0.92, 0.5, 0.5]];
    let a: StepResult = periodic.evaluate(&wrapped, None, None).unwrap();
    let b: StepResult = isolated.evaluate(&unwrapped, None, None).unwrap();

    assert!((a.energy - b.energy).abs() < 1.0E-8);
    for (fa, fb) in a.forces.iter().zip(b.forces.iter())
    {
        assert!((fa - fb).abs() < 1.0E-8);
    }
}

#[test]
fn a_subset_of_atoms_leaves_the_others_untouched()
{
    let dir: TempDir = tempdir().unwrap();
    let path: PathBuf = write_water_model(dir.path());
    let config: PotentialConfig = PotentialConfig::new(path, ANGSTROM_TO_NM, EV_TO_KJ_PER_MOL);
    let potential: MLPotential = MLPotential::from_config(&config).unwrap();

    // A sodium ion the model does not know about, far from the water
    let mut topology: Topology = water_topology();
    topology.add_atom("NA", Some(Element::Na));
    let mut positions: Array2<f64> = Array2::zeros((4, 3));
    positions.slice_mut(s![..3, ..]).assign(&water_positions());
    positions.row_mut(3).assign(&Array1::from_vec(vec![2.0, 2.0, 2.0]));

    assert!(potential.create_system(&topology).is_err());

    let options: AddForcesOptions = AddForcesOptions { atoms: Some(vec![0, 1, 2]), ..Default::default() };
    let system: System = potential.create_system_with(&topology, &options).unwrap();
    let mixed: StepResult = system.evaluate(&positions, None, None).unwrap();
    let water_only: StepResult = evaluate_water(&dir, EV_TO_KJ_PER_MOL);

    assert!((mixed.energy - water_only.energy).abs() < 1.0E-8);
    assert!(mixed.forces.row(3).iter().all(|f| *f == 0.0));
    assert!((mixed.forces[[1, 0]] - water_only.forces[[1, 0]]).abs() < 1.0E-8);
}

#[test]
fn a_saved_force_evaluates_like_the_original()
{
    let dir: TempDir = tempdir().unwrap();
    let path: PathBuf = write_water_model(dir.path());
    let config: PotentialConfig = PotentialConfig::new(path, ANGSTROM_TO_NM, EV_TO_KJ_PER_MOL);
    let potential: MLPotential = MLPotential::from_config(&config).unwrap();

    let force_file: PathBuf = dir.path().join("nequipmodel.bin");
    let options: AddForcesOptions = AddForcesOptions
    {
        force_group: 1,
        filename: Some(force_file.clone()),
        ..Default::default()
    };
    let system: System = potential.create_system_with(&water_topology(), &options).unwrap();
    let original: StepResult = system.evaluate(&water_positions(), None, Some(&[1][..])).unwrap();

    let restored: NequipForce = NequipForce::from_file(&force_file).unwrap();
    assert_eq!(restored.force_group(), 1);
    let (energy, forces): (f64, Array2<f64>) = restored.evaluate(&water_positions(), None).unwrap();
    assert!((energy - original.energy).abs() < 1.0E-12);
    assert!(forces.iter().zip(original.forces.iter()).all(|(a, b)| (a - b).abs() < 1.0E-12));
}

#[test]
fn replicas_can_share_one_model()
{
    let dir: TempDir = tempdir().unwrap();
    let path: PathBuf = write_water_model(dir.path());
    let config: PotentialConfig = PotentialConfig::new(path, ANGSTROM_TO_NM, EV_TO_KJ_PER_MOL).with_shared_model(true);

    let replicas: Vec<System> = (0..3)
        .map(|_| MLPotential::from_config(&config).unwrap().create_system(&water_topology()).unwrap())
        .collect();

    let handles: Vec< JoinHandle<f64> > = replicas
        .into_iter()
        .map(|system| std::thread::spawn(move || system.evaluate(&water_positions(), None, None).unwrap().energy))
        .collect();
    let energies: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(energies.windows(2).all(|w| w[0] == w[1]));

    let units: UnitConversion = UnitConversion::new(ANGSTROM_TO_NM, EV_TO_KJ_PER_MOL).unwrap();
    assert!((units.distance_to_host(water_metadata().r_max) - 0.4).abs() < 1.0E-12);
}

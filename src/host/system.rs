//! About the simulation system the host integrates: particles, periodic box, and forces.

use crate::common::error::*;
use crate::host::force::Force;
use crate::matrix;
use ndarray::Array2;





/// The result of evaluating a system at one step.
///
/// # Fields
/// ```text
/// energy: the total potential energy of the selected forces (Unit: kJ/mol)
/// forces: the total forces on the particles (natom*3, Unit: kJ/mol/nm)
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult
{
    pub energy: f64,
    pub forces: Array2<f64>,
}





/// The simulation system.
///
/// # Fields
/// ```text
/// masses: the particle masses (Unit: amu)
/// box_vectors: the default periodic box vectors (3*3 Array, Unit: nm)
/// forces: the energy/force contributions
/// ```
#[derive(Default)]
pub struct System
{
    masses: Vec<f64>,
    box_vectors: Option< Array2<f64> >,
    forces: Vec< Box<dyn Force> >,
}





impl System
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Append a particle and return its index
    pub fn add_particle(&mut self, mass: f64) -> usize
    {
        self.masses.push(mass);
        self.masses.len() - 1
    }

    pub fn num_particles(&self) -> usize
    {
        self.masses.len()
    }

    pub fn particle_mass(&self, index: usize) -> Option<f64>
    {
        self.masses.get(index).copied()
    }

    pub fn set_default_periodic_box_vectors(&mut self, box_vectors: Array2<f64>) -> Result<()>
    {
        matrix::check_box_vectors(&box_vectors)?;
        self.box_vectors = Some(box_vectors);
        Ok(())
    }

    pub fn default_periodic_box_vectors(&self) -> Option<&Array2<f64>>
    {
        self.box_vectors.as_ref()
    }

    /// Whether any force of the system uses periodic boundary conditions
    pub fn uses_periodic_boundary_conditions(&self) -> bool
    {
        self.forces.iter().any(|f| f.uses_periodic_boundary_conditions())
    }

    /// Add a force and return its index
    pub fn add_force(&mut self, force: Box<dyn Force>) -> usize
    {
        self.forces.push(force);
        self.forces.len() - 1
    }

    pub fn num_forces(&self) -> usize
    {
        self.forces.len()
    }

    pub fn force(&self, index: usize) -> Option<&dyn Force>
    {
        self.forces.get(index).map(|f| f.as_ref())
    }

    /// Evaluate the energy and forces of the system for one step.
    ///
    /// # Parameters
    /// ```text
    /// positions: the particle positions (natom*3, Unit: nm)
    /// box_vectors: the current box vectors; falls back to the default box when None
    /// groups: only evaluate the forces in these groups; all forces when None
    /// ```
    pub fn evaluate(&self, positions: &Array2<f64>, box_vectors: Option<&Array2<f64>>, groups: Option<&[usize]>) -> Result<StepResult>
    {
        let natom: usize = self.num_particles();
        if positions.dim() != (natom, 3)
        {
            return Err(Error::Shape(error_array_shape("positions", (natom, 3), positions.dim())));
        }

        let box_vectors: Option<&Array2<f64>> = box_vectors.or(self.box_vectors.as_ref());
        let mut energy: f64 = 0.0;
        let mut forces: Array2<f64> = Array2::zeros((natom, 3));
        for force in &self.forces
        {
            if let Some(groups) = groups
            {
                if !groups.contains(&force.force_group())
                {
                    continue;
                }
            }
            let (e, f): (f64, Array2<f64>) = force.evaluate(positions, box_vectors)?;
            if f.dim() != (natom, 3)
            {
                return Err(Error::Shape(error_array_shape("forces", (natom, 3), f.dim())));
            }
            energy += e;
            forces += &f;
        }

        Ok(StepResult { energy, forces })
    }
}

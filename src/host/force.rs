//! About the trait every energy/force contribution of a [`System`](super::System) implements.
use crate::common::error::Result;
use ndarray::Array2;





/// An energy/force contribution the host calls once per step.
///
/// Implementations must not accumulate state between calls: evaluating the same positions twice
/// gives the same result.
pub trait Force: Send + Sync
{
    /// Input the positions of all particles of the system (natom*3, Unit: nm) and the current box
    /// vectors (Unit: nm) if any, and output the potential energy (Unit: kJ/mol) and the forces
    /// on all particles (natom*3, Unit: kJ/mol/nm).
    fn evaluate(&self, positions: &Array2<f64>, box_vectors: Option<&Array2<f64>>) -> Result<(f64, Array2<f64>)>;

    /// The force group, used to select subsets of forces at evaluation time
    fn force_group(&self) -> usize
    {
        0
    }

    fn uses_periodic_boundary_conditions(&self) -> bool
    {
        false
    }
}

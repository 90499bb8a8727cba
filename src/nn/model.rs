//! About the inference interface of a deployed model.
use crate::common::error::Result;
use crate::nn::metadata::ModelMetadata;
use ndarray::Array2;





/// The graph input of a model, everything in model units.
///
/// # Fields
/// ```text
/// pos: the atomic positions (natom*3)
/// cell: the cell vectors (3*3, one vector per row), identity for aperiodic systems
/// pbc: whether each axis is periodic
/// atom_types: the model type index of each atom
/// atomic_numbers: the atomic number of each atom
/// edge_index: the (center, neighbor) atom indices of each edge
/// edge_cell_shift: the cell shift of each edge
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ModelInput
{
    pub pos: Array2<f64>,
    pub cell: Array2<f64>,
    pub pbc: [bool; 3],
    pub atom_types: Vec<usize>,
    pub atomic_numbers: Vec<usize>,
    pub edge_index: Vec<[usize; 2]>,
    pub edge_cell_shift: Vec<[f64; 3]>,
}





/// The output of a model, in model units.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelOutput
{
    pub total_energy: f64,
    pub forces: Array2<f64>,
}





/// A loaded model that maps an atomic graph to an energy and forces.
///
/// Implementations are immutable once loaded, so a model can be shared read-only between
/// several bound forces (e.g. replicas).
pub trait InferenceModel: Send + Sync
{
    fn metadata(&self) -> &ModelMetadata;

    fn forward(&self, input: &ModelInput) -> Result<ModelOutput>;
}

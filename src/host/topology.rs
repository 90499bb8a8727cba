//! About the topology of the simulated system: its atoms and, optionally, its periodic box.

use crate::common::constants::Element;
use crate::common::error::*;
use crate::matrix;
use ndarray::Array2;





/// One atom of the topology.
///
/// # Fields
/// ```text
/// name: the atom name (e.g. "OW", "HW1")
/// element: the chemical element, or None for virtual sites and unknown atoms
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Atom
{
    pub name: String,
    pub element: Option<Element>,
}





/// The topology consumed by the potential when it creates a system.
///
/// # Fields
/// ```text
/// atoms: the atoms in the order used by positions and forces
/// box_vectors: the periodic box vectors (3*3 Array, one vector per row, Unit: nm), None for aperiodic systems
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topology
{
    atoms: Vec<Atom>,
    box_vectors: Option< Array2<f64> >,
}





impl Topology
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Build a topology where every atom is named after its element.
    ///
    /// # Examples
    /// ```
    /// use nequip_mm::common::constants::Element;
    /// use nequip_mm::host::Topology;
    /// let water: Topology = Topology::from_elements(&[Element::O, Element::H, Element::H]);
    /// assert_eq!(water.num_atoms(), 3);
    /// ```
    pub fn from_elements(elements: &[Element]) -> Self
    {
        let mut topology: Topology = Topology::new();
        for element in elements
        {
            topology.add_atom(element.symbol(), Some(*element));
        }
        topology
    }

    /// Append an atom and return its index
    pub fn add_atom(&mut self, name: &str, element: Option<Element>) -> usize
    {
        self.atoms.push(Atom { name: name.to_string(), element });
        self.atoms.len() - 1
    }

    pub fn atoms(&self) -> &[Atom]
    {
        &self.atoms
    }

    pub fn num_atoms(&self) -> usize
    {
        self.atoms.len()
    }

    /// Set (or clear, with None) the periodic box vectors. A degenerate box is rejected.
    pub fn set_periodic_box_vectors(&mut self, box_vectors: Option< Array2<f64> >) -> Result<()>
    {
        if let Some(b) = &box_vectors
        {
            matrix::check_box_vectors(b)?;
        }
        self.box_vectors = box_vectors;
        Ok(())
    }

    pub fn periodic_box_vectors(&self) -> Option<&Array2<f64>>
    {
        self.box_vectors.as_ref()
    }
}

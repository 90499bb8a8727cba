//! About the neighbor list (graph edges) handed to the model.
//!
//! Every ordered pair (i, j) within the cutoff is an edge, so both (i, j) and (j, i) are present.
//! Periodic images are found with the minimum image convention along the diagonal of the cell:
//! the cell shift of an edge is S = round(d / L) per periodic axis, and the edge vector is
//! d_ij = x_i - x_j - S . cell. This is exact for orthorhombic cells whose sides are at least
//! twice the cutoff, which the caller has to check.
use ndarray::{Array1, Array2};





/// The edges of the atomic graph.
///
/// # Fields
/// ```text
/// edge_index: the (center, neighbor) atom indices of each edge
/// edge_cell_shift: the integer cell shift of each edge (stored as f64)
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NeighborList
{
    pub edge_index: Vec<[usize; 2]>,
    pub edge_cell_shift: Vec<[f64; 3]>,
}





impl NeighborList
{
    pub fn len(&self) -> usize
    {
        self.edge_index.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.edge_index.is_empty()
    }
}



/// The edge vector d_ij = x_i - x_j - S . cell of an edge.
pub fn edge_vector(pos: &Array2<f64>, cell: &Array2<f64>, edge: [usize; 2], shift: [f64; 3]) -> Array1<f64>
{
    let mut d: Array1<f64> = &pos.row(edge[0]) - &pos.row(edge[1]);
    for a in 0..3
    {
        if shift[a] != 0.0
        {
            d = d - &cell.row(a) * shift[a];
        }
    }
    d
}



/// Build the neighbor list of a configuration by checking all pairs.
///
/// # Parameters
/// ```text
/// pos: the atomic positions (natom*3, Unit: model distance)
/// cell: the cell vectors (3*3, one vector per row), only read along periodic axes
/// pbc: whether each axis is periodic
/// cutoff: pairs farther apart than the cutoff are dropped
/// self_interaction: whether (i, i) edges are kept
/// ```
pub fn simple_neighbor_list(pos: &Array2<f64>, cell: &Array2<f64>, pbc: [bool; 3], cutoff: f64, self_interaction: bool) -> NeighborList
{
    let natom: usize = pos.nrows();
    let cutoff2: f64 = cutoff * cutoff;
    let mut list: NeighborList = NeighborList::default();

    for i in 0..natom
    {
        for j in 0..natom
        {
            if i == j && !self_interaction
            {
                continue;
            }

            let mut shift: [f64; 3] = [0.0; 3];
            let mut d2: f64 = 0.0;
            for a in 0..3
            {
                let mut d: f64 = pos[[i,a]] - pos[[j,a]];
                if pbc[a]
                {
                    shift[a] = (d / cell[[a,a]]).round();
                    d -= shift[a] * cell[[a,a]];
                }
                d2 += d * d;
            }

            if d2 <= cutoff2
            {
                list.edge_index.push([i, j]);
                list.edge_cell_shift.push(shift);
            }
        }
    }

    log::trace!("neighbor list: {} atoms, {} edges within {}", natom, list.len(), cutoff);
    list
}

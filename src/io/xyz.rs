//! About the XYZ structure files.
use crate::common::constants::{Element, ANGSTROM_TO_NM};
use crate::common::error::*;
use crate::host::Topology;
use ndarray::Array2;
use std::fs;
use std::path::Path;





/// Read a structure from a XYZ file (in Angstrom).
///
/// # Parameters
/// ```text
/// path: the XYZ file to read from
/// topology: the atoms, named after the first column, and the box if the comment line has a Lattice="..." entry
/// positions: the atomic positions (natom*3, Unit: nm)
/// ```
pub fn read_xyz<P: AsRef<Path>>(path: P) -> Result<(Topology, Array2<f64>)>
{
    let path: &Path = path.as_ref();
    let content: String = fs::read_to_string(path).map_err(|e| Error::io("reading", path, e))?;
    parse_xyz(&content, path)
}



/// Parse the content of a XYZ file. `source` only names the content in error messages.
///
/// Symbols that are not chemical elements are kept as atom names without an element.
pub fn parse_xyz(content: &str, source: &Path) -> Result<(Topology, Array2<f64>)>
{
    let mut lines = content.lines();

    // Read the number of atom from the first line
    let natom: usize = lines.next()
        .ok_or_else(|| Error::parse(source, "the file is empty"))?
        .trim()
        .parse()
        .map_err(|_| Error::parse(source, "the first line should be the number of atoms"))?;
    let comment: &str = lines.next().unwrap_or("");

    // Rows are only stored for atom lines that are actually present
    let mut topology: Topology = Topology::new();
    let mut coords: Vec<f64> = Vec::new();
    for i in 0..natom
    {
        let fields: Vec<&str> = lines.next()
            .ok_or_else(|| Error::parse(source, format!("expected {} atoms, found {}", natom, i)))?
            .split_whitespace()
            .collect();
        if fields.len() < 4
        {
            return Err(Error::parse(source, format!("the line of atom {} should have a symbol and three coordinates", i + 1)));
        }

        topology.add_atom(fields[0], Element::from_symbol(fields[0]));
        for a in 0..3
        {
            let x: f64 = fields[a + 1].parse()
                .map_err(|_| Error::parse(source, format!("invalid coordinate '{}' of atom {}", fields[a + 1], i + 1)))?;
            coords.push(x);
        }
    }
    // Angstrom -> nm
    let positions: Array2<f64> = Array2::from_shape_vec((natom, 3), coords)
        .map_err(|e| Error::parse(source, e.to_string()))? * ANGSTROM_TO_NM;

    if let Some(lattice) = parse_lattice(comment, source)?
    {
        topology.set_periodic_box_vectors(Some(lattice * ANGSTROM_TO_NM))?;
    }

    Ok((topology, positions))
}



/// Read the `Lattice="ax ay az bx by bz cx cy cz"` entry of an extended XYZ comment line
fn parse_lattice(comment: &str, source: &Path) -> Result< Option< Array2<f64> > >
{
    let start: usize = match comment.find("Lattice=\"")
    {
        Some(start) => start + "Lattice=\"".len(),
        None => return Ok(None),
    };
    let end: usize = comment[start..].find('"')
        .ok_or_else(|| Error::parse(source, "the Lattice entry is not closed"))?;
    let values: Vec<f64> = comment[start..start + end]
        .split_whitespace()
        .map(|v| v.parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(|_| Error::parse(source, "the Lattice entry should contain numbers"))?;
    if values.len() != 9
    {
        return Err(Error::parse(source, format!("the Lattice entry should have 9 numbers, found {}", values.len())));
    }
    Array2::from_shape_vec((3, 3), values)
        .map(Some)
        .map_err(|e| Error::parse(source, e.to_string()))
}










#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn read_a_water_molecule()
    {
        let content: &str = "3\nwater\nO 0.0 0.0 0.0\nH 0.9572 0.0 0.0\nH -0.24 0.927 0.0\n";
        let (topology, positions): (Topology, Array2<f64>) = parse_xyz(content, Path::new("water.xyz")).unwrap();
        assert_eq!(topology.num_atoms(), 3);
        assert_eq!(topology.atoms()[0].element, Some(Element::O));
        assert!((positions[[1,0]] - 0.09572).abs() < 1.0E-12);
        assert!(topology.periodic_box_vectors().is_none());
    }

    #[test]
    fn lattice_sets_the_box()
    {
        let content: &str = "2\nLattice=\"12.0 0.0 0.0 0.0 12.0 0.0 0.0 0.0 12.0\" pbc=\"T T T\"\nAr 0 0 0\nXx 1 1 1\n";
        let (topology, _): (Topology, Array2<f64>) = parse_xyz(content, Path::new("argon.xyz")).unwrap();
        let box_vectors: &Array2<f64> = topology.periodic_box_vectors().unwrap();
        assert!((box_vectors[[1,1]] - 1.2).abs() < 1.0E-12);
        assert_eq!(topology.atoms()[1].element, None);
        assert_eq!(topology.atoms()[1].name, "Xx");
    }

    #[test]
    fn malformed_files_are_parse_errors()
    {
        let source: &Path = Path::new("bad.xyz");
        for content in ["", "two\n\n", "2\n\nH 0 0 0\n", "1\n\nH 0 zero 0\n", "1\nLattice=\"1 0 0\"\nH 0 0 0\n", "9223372036854775807\ncomment\nH 0 0 0\n"]
        {
            assert!(matches!(parse_xyz(content, source), Err(Error::Parse { .. })), "{:?}", content);
        }
    }
}

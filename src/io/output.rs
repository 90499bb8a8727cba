//! About the output files.
use crate::common::error::*;
use crate::host::{StepResult, Topology};
use std::fs::File;
use std::io::Write;
use std::path::Path;





/// Format the energy (kJ/mol) and the atomic forces (kJ/mol/nm) of a structure
///
/// # Parameters
/// ```text
/// topology: names the atoms
/// result: the energy and forces of one evaluation
/// ```
pub fn format_report(topology: &Topology, result: &StepResult) -> String
{
    let mut report: String = format!("Energy = {:20.10} kJ/mol\n", result.energy);
    report.push_str(&format!("{:>6} {:>6} {:>20} {:>20} {:>20}\n", "Index", "Atom", "Fx (kJ/mol/nm)", "Fy (kJ/mol/nm)", "Fz (kJ/mol/nm)"));
    for (i, atom) in topology.atoms().iter().enumerate()
    {
        report.push_str(&format!("{:>6} {:>6} {:20.10} {:20.10} {:20.10}\n",
            i, atom.name, result.forces[[i,0]], result.forces[[i,1]], result.forces[[i,2]]));
    }
    report
}



/// Write the report of [`format_report`] into a new file (truncated if it exists)
pub fn write_report<P: AsRef<Path>>(path: P, topology: &Topology, result: &StepResult) -> Result<()>
{
    let path: &Path = path.as_ref();
    let mut file: File = File::create(path).map_err(|e| Error::io("creating", path, e))?;
    file.write_all(format_report(topology, result).as_bytes()).map_err(|e| Error::io("writing", path, e))?;
    Ok(())
}

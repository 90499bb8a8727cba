//! About the conversion between the units of the model and the units of the host (nm, kJ/mol).
use crate::common::error::*;
use ndarray::Array2;





/// The unit conversion factors of a model.
///
/// # Fields
/// ```text
/// distance_to_nm: the length of one model distance unit in nm (e.g. 0.1 for Angstrom)
/// energy_to_kj_per_mol: the size of one model energy unit in kJ/mol (e.g. 96.485 for eV)
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitConversion
{
    distance_to_nm: f64,
    energy_to_kj_per_mol: f64,
}





impl UnitConversion
{
    /// Both factors have to be finite and strictly positive, otherwise a configuration error is returned.
    pub fn new(distance_to_nm: f64, energy_to_kj_per_mol: f64) -> Result<Self>
    {
        if !distance_to_nm.is_finite() || distance_to_nm <= 0.0
        {
            return Err(Error::Config(error_non_positive("distance_to_nm", distance_to_nm)));
        }
        if !energy_to_kj_per_mol.is_finite() || energy_to_kj_per_mol <= 0.0
        {
            return Err(Error::Config(error_non_positive("energy_to_kJ_per_mol", energy_to_kj_per_mol)));
        }
        Ok(UnitConversion { distance_to_nm, energy_to_kj_per_mol })
    }

    pub fn distance_to_nm(&self) -> f64
    {
        self.distance_to_nm
    }

    pub fn energy_to_kj_per_mol(&self) -> f64
    {
        self.energy_to_kj_per_mol
    }

    /// nm -> model distance
    pub fn positions_to_model(&self, positions: &Array2<f64>) -> Array2<f64>
    {
        positions / self.distance_to_nm
    }

    /// model distance -> nm
    pub fn positions_to_host(&self, positions: &Array2<f64>) -> Array2<f64>
    {
        positions * self.distance_to_nm
    }

    /// A model cutoff expressed in nm
    pub fn distance_to_host(&self, distance: f64) -> f64
    {
        distance * self.distance_to_nm
    }

    /// model energy -> kJ/mol
    pub fn energy_to_host(&self, energy: f64) -> f64
    {
        energy * self.energy_to_kj_per_mol
    }

    /// model energy/model distance -> kJ/mol/nm
    pub fn forces_to_host(&self, forces: &Array2<f64>) -> Array2<f64>
    {
        forces * (self.energy_to_kj_per_mol / self.distance_to_nm)
    }
}

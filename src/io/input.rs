//! About the input files.
use crate::common::error::*;
use crate::potential::units::UnitConversion;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};





fn default_name() -> String
{
    String::from("nequip")
}



/// The structure containing the configuration of a machine-learning potential.
///
/// # Fields
/// ```text
/// name: the potential family to look up in the registry (default "nequip")
/// model_path: the deployed model artifact
/// distance_to_nm: the length of one model distance unit in nm
/// energy_to_kj_per_mol: the size of one model energy unit in kJ/mol (key "energy_to_kJ_per_mol")
/// atom_types: explicit model type index of each ML atom, overriding the element lookup
/// share_model: load the model through the process-wide cache
/// ```
///
/// A TOML configuration looks like
/// ```text
/// model_path = "water-deployed.safetensors"
/// distance_to_nm = 0.1
/// energy_to_kJ_per_mol = 96.485
/// atom_types = [1, 0, 0]
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PotentialConfig
{
    #[serde(default = "default_name")]
    pub name: String,
    pub model_path: PathBuf,
    pub distance_to_nm: f64,
    #[serde(rename = "energy_to_kJ_per_mol")]
    pub energy_to_kj_per_mol: f64,
    #[serde(default)]
    pub atom_types: Option< Vec<usize> >,
    #[serde(default)]
    pub share_model: bool,
}





impl PotentialConfig
{
    /// A `nequip` configuration without atom type overrides
    pub fn new<P: Into<PathBuf>>(model_path: P, distance_to_nm: f64, energy_to_kj_per_mol: f64) -> Self
    {
        PotentialConfig
        {
            name: default_name(),
            model_path: model_path.into(),
            distance_to_nm,
            energy_to_kj_per_mol,
            atom_types: None,
            share_model: false,
        }
    }

    pub fn with_atom_types(mut self, atom_types: Vec<usize>) -> Self
    {
        self.atom_types = Some(atom_types);
        self
    }

    pub fn with_shared_model(mut self, share_model: bool) -> Self
    {
        self.share_model = share_model;
        self
    }

    /// Parse a TOML document. `source` only names the document in error messages.
    pub fn from_toml_str(text: &str, source: &Path) -> Result<Self>
    {
        toml::from_str(text).map_err(|e| Error::parse(source, e.to_string()))
    }

    /// Read a TOML configuration file. A relative `model_path` is resolved against the directory of the file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self>
    {
        let path: &Path = path.as_ref();
        let text: String = fs::read_to_string(path).map_err(|e| Error::io("reading", path, e))?;
        let mut config: PotentialConfig = PotentialConfig::from_toml_str(&text, path)?;
        if config.model_path.is_relative()
        {
            if let Some(dir) = path.parent()
            {
                config.model_path = dir.join(&config.model_path);
            }
        }
        log::debug!("read the configuration '{}': {:?}", path.display(), config);
        Ok(config)
    }

    /// The validated unit conversion factors
    pub fn units(&self) -> Result<UnitConversion>
    {
        UnitConversion::new(self.distance_to_nm, self.energy_to_kj_per_mol)
    }
}

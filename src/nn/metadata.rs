//! Metadata carried inside a deployed model artifact.
//!
//! The keys follow the ones written by the NequIP deploy tooling (`r_max`, `type_names`,
//! `n_species`, `model_dtype`), plus the radial basis settings of the pair network.
use crate::common::error::*;
use std::collections::HashMap;
use std::path::Path;





pub const R_MAX_KEY: &str = "r_max";
pub const TYPE_NAMES_KEY: &str = "type_names";
pub const N_SPECIES_KEY: &str = "n_species";
pub const MODEL_DTYPE_KEY: &str = "model_dtype";
pub const N_BASIS_KEY: &str = "n_basis";
pub const P_CUTOFF_KEY: &str = "p_cutoff";

pub const DEFAULT_N_BASIS: usize = 8;
pub const DEFAULT_P_CUTOFF: f64 = 6.0;





/// Floating point precision the model was deployed with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelDtype
{
    Float32,
    Float64,
}





impl ModelDtype
{
    pub fn from_name(name: &str) -> Option<Self>
    {
        match name.trim()
        {
            "float32" => Some(ModelDtype::Float32),
            "float64" => Some(ModelDtype::Float64),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str
    {
        match self
        {
            ModelDtype::Float32 => "float32",
            ModelDtype::Float64 => "float64",
        }
    }

    /// Round a value to the precision of the model
    pub fn round(&self, x: f64) -> f64
    {
        match self
        {
            ModelDtype::Float32 => x as f32 as f64,
            ModelDtype::Float64 => x,
        }
    }
}





/// The metadata of a deployed model.
///
/// # Fields
/// ```text
/// r_max: the cutoff radius of the model (Unit: model distance)
/// type_names: the species names, the position in the list is the model type index
/// model_dtype: the precision of the model
/// n_basis: the number of Bessel functions in the radial basis
/// p_cutoff: the exponent of the polynomial cutoff envelope
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ModelMetadata
{
    pub r_max: f64,
    pub type_names: Vec<String>,
    pub model_dtype: ModelDtype,
    pub n_basis: usize,
    pub p_cutoff: f64,
}





fn required<'a>(map: &'a HashMap<String, String>, key: &str, path: &Path) -> Result<&'a str>
{
    map.get(key)
        .map(|v| v.as_str())
        .ok_or_else(|| Error::load(path, error_missing_metadata(key)))
}

fn parse_value<T: std::str::FromStr>(value: &str, key: &str, path: &Path) -> Result<T>
{
    value.trim().parse::<T>().map_err(|_| Error::load(path, format!("the metadata key '{}' has an illegal value '{}'", key, value)))
}





impl ModelMetadata
{
    /// Parse the metadata of the artifact at `path` from its string map.
    pub fn from_map(map: &HashMap<String, String>, path: &Path) -> Result<Self>
    {
        let r_max: f64 = parse_value(required(map, R_MAX_KEY, path)?, R_MAX_KEY, path)?;
        if !(r_max.is_finite() && r_max > 0.0)
        {
            return Err(Error::load(path, error_non_positive(R_MAX_KEY, r_max)));
        }

        let type_names: Vec<String> = required(map, TYPE_NAMES_KEY, path)?
            .split_whitespace()
            .map(String::from)
            .collect();
        if type_names.is_empty()
        {
            return Err(Error::load(path, "the model declares no species"));
        }

        // n_species is redundant with type_names, but a disagreement means a corrupt artifact
        if let Some(n_species) = map.get(N_SPECIES_KEY)
        {
            let n_species: usize = parse_value(n_species, N_SPECIES_KEY, path)?;
            if n_species != type_names.len()
            {
                return Err(Error::load(path, format!("n_species is {} but {} type names are given", n_species, type_names.len())));
            }
        }

        let dtype_name: &str = required(map, MODEL_DTYPE_KEY, path)?;
        let model_dtype: ModelDtype = ModelDtype::from_name(dtype_name)
            .ok_or_else(|| Error::load(path, format!("unsupported model dtype '{}'", dtype_name)))?;

        let n_basis: usize = match map.get(N_BASIS_KEY)
        {
            Some(v) => parse_value(v, N_BASIS_KEY, path)?,
            None => DEFAULT_N_BASIS,
        };
        if n_basis == 0
        {
            return Err(Error::load(path, "the radial basis needs at least one function"));
        }

        let p_cutoff: f64 = match map.get(P_CUTOFF_KEY)
        {
            Some(v) => parse_value(v, P_CUTOFF_KEY, path)?,
            None => DEFAULT_P_CUTOFF,
        };
        if !(p_cutoff.is_finite() && p_cutoff >= 1.0)
        {
            return Err(Error::load(path, format!("the cutoff exponent should be at least 1, got {}", p_cutoff)));
        }

        Ok(ModelMetadata { r_max, type_names, model_dtype, n_basis, p_cutoff })
    }

    pub fn to_map(&self) -> HashMap<String, String>
    {
        let mut map: HashMap<String, String> = HashMap::new();
        map.insert(R_MAX_KEY.to_string(), self.r_max.to_string());
        map.insert(TYPE_NAMES_KEY.to_string(), self.type_names.join(" "));
        map.insert(N_SPECIES_KEY.to_string(), self.n_species().to_string());
        map.insert(MODEL_DTYPE_KEY.to_string(), self.model_dtype.name().to_string());
        map.insert(N_BASIS_KEY.to_string(), self.n_basis.to_string());
        map.insert(P_CUTOFF_KEY.to_string(), self.p_cutoff.to_string());
        map
    }

    pub fn n_species(&self) -> usize
    {
        self.type_names.len()
    }

    /// The model type index of a species name
    pub fn type_index(&self, name: &str) -> Option<usize>
    {
        self.type_names.iter().position(|t| t == name)
    }
}

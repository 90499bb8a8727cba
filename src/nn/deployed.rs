//! Loading, saving, and evaluating deployed pair-network models.
//!
//! A deployed model is a single safetensors file. Its header metadata carries the
//! [`ModelMetadata`] keys, and its tensors are the per-species energy shifts
//! (`per_species_energy`) and the dense layers of the pair network (`layers.{k}.weight`,
//! `layers.{k}.bias`, for k = 0, 1, ...).
//!
//! The energy of a configuration is
//! ```text
//! E = sum_i e0[t_i] + 1/2 sum_(i,j) u(r_ij) * phi(features(r_ij), onehot(t_i), onehot(t_j))
//! ```
//! where the second sum runs over the ordered edges of the neighbor list, and the forces are
//! the analytic negative gradient of E.
use crate::common::error::*;
use crate::nn::metadata::ModelMetadata;
use crate::nn::model::{InferenceModel, ModelInput, ModelOutput};
use crate::nn::neighbor::edge_vector;
use crate::nn::pair_network::{DenseLayer, PairNetwork};
use crate::nn::radial::{polynomial_cutoff, radial_features};
use ndarray::{Array1, Array2, s};
use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};





pub const PER_SPECIES_ENERGY: &str = "per_species_energy";

fn weight_name(k: usize) -> String
{
    format!("layers.{}.weight", k)
}

fn bias_name(k: usize) -> String
{
    format!("layers.{}.bias", k)
}





/// A model loaded from a deployed artifact.
///
/// # Fields
/// ```text
/// path: the artifact the model was loaded from
/// metadata: the model metadata
/// network: the pair network
/// ```
#[derive(Clone, Debug)]
pub struct DeployedModel
{
    path: PathBuf,
    metadata: ModelMetadata,
    network: PairNetwork,
}





impl DeployedModel
{
    /// Assemble a model, checking that the network matches the metadata.
    pub fn new(path: PathBuf, metadata: ModelMetadata, network: PairNetwork) -> Result<Self>
    {
        if network.n_species() != metadata.n_species()
        {
            return Err(Error::load(&path, format!("the network knows {} species but the metadata lists {}", network.n_species(), metadata.n_species())));
        }
        if network.n_input() != metadata.n_basis + 2 * metadata.n_species()
        {
            return Err(Error::load(&path, format!("the network takes {} inputs, expected {}", network.n_input(), metadata.n_basis + 2 * metadata.n_species())));
        }
        Ok(DeployedModel { path, metadata, network })
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn network(&self) -> &PairNetwork
    {
        &self.network
    }
}





fn tensor_values(view: &TensorView, name: &str, path: &Path) -> Result<Vec<f64>>
{
    match view.dtype()
    {
        Dtype::F64 => Ok(view.data().chunks_exact(8).map(|c|
        {
            let mut b: [u8; 8] = [0; 8];
            b.copy_from_slice(c);
            f64::from_le_bytes(b)
        }).collect()),
        Dtype::F32 => Ok(view.data().chunks_exact(4).map(|c|
        {
            let mut b: [u8; 4] = [0; 4];
            b.copy_from_slice(c);
            f32::from_le_bytes(b) as f64
        }).collect()),
        other => Err(Error::load(path, format!("the tensor '{}' has the unsupported dtype {:?}", name, other))),
    }
}

fn read_array1(tensors: &SafeTensors, name: &str, path: &Path) -> Result< Array1<f64> >
{
    let view: TensorView = tensors.tensor(name).map_err(|e| Error::load(path, format!("tensor '{}': {:?}", name, e)))?;
    if view.shape().len() != 1
    {
        return Err(Error::load(path, format!("the tensor '{}' should be 1-dimensional, got shape {:?}", name, view.shape())));
    }
    Ok(Array1::from_vec(tensor_values(&view, name, path)?))
}

fn read_array2(tensors: &SafeTensors, name: &str, path: &Path) -> Result< Array2<f64> >
{
    let view: TensorView = tensors.tensor(name).map_err(|e| Error::load(path, format!("tensor '{}': {:?}", name, e)))?;
    let shape: Vec<usize> = view.shape().to_vec();
    if shape.len() != 2
    {
        return Err(Error::load(path, format!("the tensor '{}' should be 2-dimensional, got shape {:?}", name, shape)));
    }
    Array2::from_shape_vec((shape[0], shape[1]), tensor_values(&view, name, path)?)
        .map_err(|e| Error::load(path, format!("tensor '{}': {}", name, e)))
}



/// Read a deployed model artifact.
///
/// Any problem with the file (missing, unreadable, bad header, missing metadata or tensors,
/// inconsistent shapes) is reported as a load error.
///
/// # Parameters
/// ```text
/// path: the safetensors artifact
/// ```
pub fn load_deployed_model<P: AsRef<Path>>(path: P) -> Result<DeployedModel>
{
    let path: &Path = path.as_ref();
    let bytes: Vec<u8> = fs::read(path).map_err(|e| Error::load(path, e.to_string()))?;

    let (_, header) = SafeTensors::read_metadata(&bytes).map_err(|e| Error::load(path, format!("bad header: {:?}", e)))?;
    let map: HashMap<String, String> = header.metadata().clone()
        .ok_or_else(|| Error::load(path, "the artifact carries no metadata"))?;
    let metadata: ModelMetadata = ModelMetadata::from_map(&map, path)?;

    let tensors: SafeTensors = SafeTensors::deserialize(&bytes).map_err(|e| Error::load(path, format!("bad tensors: {:?}", e)))?;
    let names: Vec<&String> = tensors.names();
    let per_species_energy: Array1<f64> = read_array1(&tensors, PER_SPECIES_ENERGY, path)?;

    let mut layers: Vec<DenseLayer> = Vec::new();
    let mut k: usize = 0;
    while names.iter().any(|n| **n == weight_name(k))
    {
        layers.push(DenseLayer
        {
            weight: read_array2(&tensors, &weight_name(k), path)?,
            bias: read_array1(&tensors, &bias_name(k), path)?,
        });
        k += 1;
    }

    let network: PairNetwork = PairNetwork::new(layers, per_species_energy, metadata.n_basis)
        .map_err(|e| Error::load(path, e.to_string()))?;
    let model: DeployedModel = DeployedModel::new(path.to_path_buf(), metadata, network)?;

    log::info!("loaded model '{}': species [{}], r_max = {}, {}, {} layers",
        path.display(), model.metadata.type_names.join(" "), model.metadata.r_max, model.metadata.model_dtype.name(), k);
    Ok(model)
}



fn le_bytes(values: impl Iterator<Item = f64>) -> Vec<u8>
{
    values.flat_map(|v| v.to_le_bytes()).collect()
}

/// Write a model artifact that [`load_deployed_model`] can read. The tensors are stored as f64.
pub fn save_deployed_model<P: AsRef<Path>>(path: P, metadata: &ModelMetadata, network: &PairNetwork) -> Result<()>
{
    let path: &Path = path.as_ref();

    let mut buffers: Vec<(String, Vec<usize>, Vec<u8>)> = Vec::new();
    buffers.push((PER_SPECIES_ENERGY.to_string(), vec![network.n_species()], le_bytes(network.per_species_energy().iter().copied())));
    for (k, layer) in network.layers().iter().enumerate()
    {
        buffers.push((weight_name(k), vec![layer.n_out(), layer.n_in()], le_bytes(layer.weight.iter().copied())));
        buffers.push((bias_name(k), vec![layer.n_out()], le_bytes(layer.bias.iter().copied())));
    }

    let mut views: Vec<(String, TensorView)> = Vec::with_capacity(buffers.len());
    for (name, shape, data) in &buffers
    {
        let view: TensorView = TensorView::new(Dtype::F64, shape.clone(), data)
            .map_err(|e| Error::Shape(format!("tensor '{}': {:?}", name, e)))?;
        views.push((name.clone(), view));
    }

    let bytes: Vec<u8> = safetensors::serialize(views.iter().map(|(n, v)| (n.clone(), v)), &Some(metadata.to_map()))
        .map_err(|e| Error::Shape(format!("cannot serialize the model: {:?}", e)))?;
    fs::write(path, bytes).map_err(|e| Error::io("writing", path, e))?;

    log::debug!("saved model '{}'", path.display());
    Ok(())
}





impl InferenceModel for DeployedModel
{
    fn metadata(&self) -> &ModelMetadata
    {
        &self.metadata
    }

    /// Input a graph, calculate and output the total energy and the atomic forces of the pair network
    fn forward(&self, input: &ModelInput) -> Result<ModelOutput>
    {
        let natom: usize = input.pos.nrows();
        let n_species: usize = self.metadata.n_species();
        let n_basis: usize = self.metadata.n_basis;
        let r_max: f64 = self.metadata.r_max;
        let p: f64 = self.metadata.p_cutoff;

        if input.atom_types.len() != natom
        {
            return Err(Error::Shape(format!("{} atom types for {} atoms", input.atom_types.len(), natom)));
        }
        if let Some(t) = input.atom_types.iter().find(|t| **t >= n_species)
        {
            return Err(Error::Shape(format!("atom type {} is out of range for a model of {} species", t, n_species)));
        }
        if input.edge_index.len() != input.edge_cell_shift.len()
        {
            return Err(Error::Shape(format!("{} edges but {} cell shifts", input.edge_index.len(), input.edge_cell_shift.len())));
        }
        if let Some(edge) = input.edge_index.iter().find(|e| e[0] >= natom || e[1] >= natom)
        {
            return Err(Error::Shape(error_atom_index(edge[0].max(edge[1]), natom)));
        }

        let e0: &Array1<f64> = self.network.per_species_energy();
        let mut energy: f64 = input.atom_types.iter().map(|t| e0[*t]).sum();
        let mut forces: Array2<f64> = Array2::zeros((natom, 3));
        let mut x: Array1<f64> = Array1::zeros(self.network.n_input());

        for (edge, shift) in input.edge_index.iter().zip(input.edge_cell_shift.iter())
        {
            let (i, j): (usize, usize) = (edge[0], edge[1]);
            if i == j && *shift == [0.0; 3]
            {
                continue;
            }
            let d: Array1<f64> = edge_vector(&input.pos, &input.cell, *edge, *shift);
            let r: f64 = d.dot(&d).sqrt();
            if r >= r_max
            {
                continue;
            }

            let (features, dfeatures): (Array1<f64>, Array1<f64>) = radial_features(r, r_max, n_basis, p);
            let (u, du): (f64, f64) = polynomial_cutoff(r, r_max, p);
            x.fill(0.0);
            x.slice_mut(s![..n_basis]).assign(&features);
            x[n_basis + input.atom_types[i]] = 1.0;
            x[n_basis + n_species + input.atom_types[j]] = 1.0;

            let (phi, grad): (f64, Array1<f64>) = self.network.value_and_grad(&x);
            let dphi_dr: f64 = grad.slice(s![..n_basis]).dot(&dfeatures);
            energy += 0.5 * u * phi;

            // dr/dx_i = d/r and dr/dx_j = -d/r
            let de_dr: f64 = 0.5 * (du * phi + u * dphi_dr);
            let g: Array1<f64> = &d * (de_dr / r);
            let mut fi = forces.row_mut(i);
            fi -= &g;
            let mut fj = forces.row_mut(j);
            fj += &g;
        }

        let dtype = self.metadata.model_dtype;
        Ok(ModelOutput
        {
            total_energy: dtype.round(energy),
            forces: forces.mapv(|f| dtype.round(f)),
        })
    }
}

//! Sharing loaded models between several bound forces.
//!
//! Loading an artifact once and handing out `Arc`s lets replicas of a system evaluate the same
//! read-only model. The process-wide cache is created lazily at the first [`shared_model`] call
//! and lives until [`clear_model_cache`] is called or the process exits. Forces that already hold
//! a model keep it alive after the cache is cleared.
use crate::common::error::*;
use crate::nn::deployed::{load_deployed_model, DeployedModel};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};





/// Loaded models keyed by the artifact path.
#[derive(Debug, Default)]
pub struct ModelCache
{
    models: Mutex< HashMap< PathBuf, Arc<DeployedModel> > >,
}





impl ModelCache
{
    pub fn new() -> Self
    {
        ModelCache::default()
    }

    // A panic while holding the lock cannot leave the map half-updated
    fn lock(&self) -> MutexGuard<'_, HashMap< PathBuf, Arc<DeployedModel> >>
    {
        self.models.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached model of the artifact, loading it on the first request.
    pub fn get_or_load(&self, path: &Path) -> Result< Arc<DeployedModel> >
    {
        let mut models = self.lock();
        if let Some(model) = models.get(path)
        {
            log::debug!("reusing the cached model '{}'", path.display());
            return Ok(Arc::clone(model));
        }

        let model: Arc<DeployedModel> = Arc::new(load_deployed_model(path)?);
        models.insert(path.to_path_buf(), Arc::clone(&model));
        Ok(model)
    }

    pub fn len(&self) -> usize
    {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.lock().is_empty()
    }

    /// Drop every cached model
    pub fn clear(&self)
    {
        self.lock().clear();
    }
}





lazy_static!
{
    static ref MODEL_CACHE: ModelCache = ModelCache::new();
}

/// Load a model through the process-wide cache
pub fn shared_model<P: AsRef<Path>>(path: P) -> Result< Arc<DeployedModel> >
{
    MODEL_CACHE.get_or_load(path.as_ref())
}

/// Release the models held by the process-wide cache
pub fn clear_model_cache()
{
    let n: usize = MODEL_CACHE.len();
    MODEL_CACHE.clear();
    log::debug!("released {} cached models", n);
}










#[cfg(test)]
mod tests
{
    use super::*;
    use crate::nn::deployed::save_deployed_model;
    use crate::nn::metadata::{ModelDtype, ModelMetadata};
    use crate::nn::pair_network::{DenseLayer, PairNetwork};
    use ndarray::{array, Array2};
    use tempfile::tempdir;

    fn write_model(path: &Path)
    {
        let metadata: ModelMetadata = ModelMetadata
        {
            r_max: 3.0,
            type_names: vec!["C".to_string()],
            model_dtype: ModelDtype::Float32,
            n_basis: 2,
            p_cutoff: 6.0,
        };
        let layer: DenseLayer = DenseLayer { weight: Array2::from_elem((1, 4), 0.25), bias: array![0.0] };
        let network: PairNetwork = PairNetwork::new(vec![layer], array![-1.0], 2).unwrap();
        save_deployed_model(path, &metadata, &network).unwrap();
    }

    #[test]
    fn a_model_is_loaded_once()
    {
        let dir = tempdir().unwrap();
        let path: PathBuf = dir.path().join("carbon.safetensors");
        write_model(&path);

        let cache: ModelCache = ModelCache::new();
        assert!(cache.is_empty());
        let first: Arc<DeployedModel> = cache.get_or_load(&path).unwrap();
        let second: Arc<DeployedModel> = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        // Holders keep their model alive
        assert_eq!(first.network().n_species(), 1);
    }

    #[test]
    fn failed_loads_are_not_cached()
    {
        let dir = tempdir().unwrap();
        let cache: ModelCache = ModelCache::new();
        assert!(matches!(cache.get_or_load(&dir.path().join("none.safetensors")), Err(Error::Load { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn the_shared_cache_hands_out_the_same_model()
    {
        let dir = tempdir().unwrap();
        let path: PathBuf = dir.path().join("shared.safetensors");
        write_model(&path);

        let first: Arc<DeployedModel> = shared_model(&path).unwrap();
        let second: Arc<DeployedModel> = shared_model(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}

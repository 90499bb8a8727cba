//! A module about the deployed machine-learning model: its metadata, the graph handed to it,
//! and the pair-network backend that evaluates it.

pub mod metadata;
pub mod radial;
pub mod pair_network;
pub mod neighbor;
pub mod model;
pub mod deployed;
pub mod cache;

pub use cache::{clear_model_cache, shared_model, ModelCache};
pub use deployed::{load_deployed_model, save_deployed_model, DeployedModel};
pub use metadata::{ModelDtype, ModelMetadata};
pub use model::{InferenceModel, ModelInput, ModelOutput};

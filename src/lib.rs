//! RBF Layer - trainable radial basis function layer for candle
//!
//! Maps every input vector to one activation per learned center:
//!
//! ```text
//! output[i, j] = exp(-gamma * sum_k (input[i, k] - mu[j, k])^2)
//! ```
//!
//! # Components
//!
//! - **Layer**: [`RbfLayer`] with configurable initializer, regularizers and constraint
//! - **Network**: [`RbfNetwork`], an RBF layer followed by a linear readout
//! - **Training**: AdamW trainer with cosine schedule and safetensors checkpoints
//!
//! # Example
//!
//! ```ignore
//! use rbf_layer::{RbfConfig, RbfLayer};
//!
//! let mut layer = RbfLayer::new(RbfConfig::new(16, 0.5))?;
//! layer.build(x.dims(), vb.pp("rbf"))?;
//! let phi = layer.forward(&x)?;
//! ```

pub mod config;
pub mod data;
pub mod layers;
pub mod models;
pub mod training;
pub mod utils;

// Re-export commonly used items
pub use config::{RbfConfig, RbfNetworkConfig};
pub use layers::RbfLayer;
pub use models::RbfNetwork;

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum RbfError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("You must build the layer before accessing `mu`.")]
    NotBuilt,

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NumPy error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),
}

pub type Result<T> = std::result::Result<T, RbfError>;

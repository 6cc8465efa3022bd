/// Model checkpointing with safetensors
///
/// A checkpoint named `<name>` is two files in one directory:
/// `<name>.safetensors` (all VarMap variables) and `<name>.json` (metadata).
use std::path::{Path, PathBuf};
use candle_nn::VarMap;
use safetensors::SafeTensors;

use crate::config::RbfNetworkConfig;
use crate::RbfError;

/// Checkpoint metadata
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct CheckpointMetadata {
    /// Training step
    pub step: usize,
    /// Learning rate at checkpoint
    pub lr: f64,
    /// Loss at checkpoint
    pub loss: Option<f64>,
    /// Network configuration
    pub config: Option<RbfNetworkConfig>,
}

/// Paths of the two checkpoint files
pub fn checkpoint_paths<P: AsRef<Path>>(dir: P, name: &str) -> (PathBuf, PathBuf) {
    let dir = dir.as_ref();
    (
        dir.join(format!("{}.safetensors", name)),
        dir.join(format!("{}.json", name)),
    )
}

/// Save all variables of `varmap` plus metadata
pub fn save_checkpoint<P: AsRef<Path>>(
    varmap: &VarMap,
    dir: P,
    name: &str,
    metadata: &CheckpointMetadata,
) -> crate::Result<()> {
    std::fs::create_dir_all(dir.as_ref())?;
    let (weights_path, metadata_path) = checkpoint_paths(dir, name);

    varmap.save(&weights_path)?;
    std::fs::write(&metadata_path, serde_json::to_string_pretty(metadata)?)?;

    log::info!(
        "Saved checkpoint '{}' at step {} to {:?}",
        name,
        metadata.step,
        weights_path
    );
    Ok(())
}

/// Names of all tensors stored in a safetensors file
pub fn tensor_names<P: AsRef<Path>>(weights_path: P) -> crate::Result<Vec<String>> {
    let bytes = std::fs::read(weights_path.as_ref())?;
    let tensors = SafeTensors::deserialize(&bytes)
        .map_err(|e| RbfError::Checkpoint(format!("invalid safetensors file: {}", e)))?;

    let mut names: Vec<String> = tensors.names().into_iter().cloned().collect();
    names.sort();
    Ok(names)
}

/// Load a checkpoint into an existing `varmap` and return its metadata
///
/// Every variable of `varmap` must be present in the checkpoint.
pub fn load_checkpoint<P: AsRef<Path>>(
    varmap: &mut VarMap,
    dir: P,
    name: &str,
) -> crate::Result<CheckpointMetadata> {
    let (weights_path, metadata_path) = checkpoint_paths(dir, name);

    let stored = tensor_names(&weights_path)?;
    let missing: Vec<String> = {
        let data = varmap
            .data()
            .lock()
            .map_err(|_| RbfError::Checkpoint("VarMap lock poisoned".to_string()))?;
        data.keys()
            .filter(|k| stored.binary_search(*k).is_err())
            .cloned()
            .collect()
    };
    if !missing.is_empty() {
        return Err(RbfError::Checkpoint(format!(
            "checkpoint '{}' is missing variables: {:?}",
            name, missing
        )));
    }

    varmap.load(&weights_path)?;

    let metadata: CheckpointMetadata = serde_json::from_slice(&std::fs::read(&metadata_path)?)?;
    log::info!("Loaded checkpoint '{}' at step {}", name, metadata.step);
    Ok(metadata)
}

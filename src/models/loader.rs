/// Network loading from a JSON config and a safetensors file
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use candle_core::{Device, DType};
use candle_nn::VarBuilder;
use crate::RbfNetworkConfig;
use super::RbfNetwork;

/// Read and validate a network config written by [`save_config`]
pub fn load_config<P: AsRef<Path>>(config_path: P) -> crate::Result<RbfNetworkConfig> {
    let reader = BufReader::new(File::open(config_path.as_ref())?);
    let config: RbfNetworkConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

/// Write a network config as pretty JSON
pub fn save_config<P: AsRef<Path>>(config: &RbfNetworkConfig, config_path: P) -> crate::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(config_path.as_ref(), json)?;
    Ok(())
}

/// Load network from config + safetensors weights
///
/// # Arguments
/// * `config_path` - JSON network config
/// * `weights_path` - Path to safetensors file
/// * `device` - Device to load model on
///
/// # Returns
/// Loaded RbfNetwork (weights are read-only, not backed by a VarMap)
pub fn load_network<P: AsRef<Path>, Q: AsRef<Path>>(
    config_path: P,
    weights_path: Q,
    device: &Device,
) -> crate::Result<RbfNetwork> {
    let config = load_config(config_path)?;

    log::info!("Loading RBF network weights from {:?}", weights_path.as_ref());

    // Load weights using Candle's built-in safetensors support
    let dtype = DType::F32;
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(
            &[weights_path.as_ref()],
            dtype,
            device,
        )?
    };

    RbfNetwork::new(config, vb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RbfConfig;
    use candle_core::Tensor;
    use candle_nn::VarMap;

    #[test]
    fn test_save_and_load_network() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("network.json");
        let weights_path = dir.path().join("network.safetensors");

        let device = Device::Cpu;
        let config = RbfNetworkConfig {
            input_dim: 2,
            output_dim: 1,
            rbf: RbfConfig::new(4, 1.5),
            readout_bias: true,
        };

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let original = RbfNetwork::new(config.clone(), vb)?;

        save_config(&config, &config_path)?;
        varmap.save(&weights_path)?;

        let loaded = load_network(&config_path, &weights_path, &device)?;
        assert_eq!(loaded.config(), &config);

        let x = Tensor::new(&[[0.1f32, -0.3], [1.0, 2.0]], &device)?;
        let a = original.forward(&x)?.flatten_all()?.to_vec1::<f32>()?;
        let b = loaded.forward(&x)?.flatten_all()?.to_vec1::<f32>()?;
        assert_eq!(a, b);

        Ok(())
    }

    #[test]
    fn test_missing_weights_fail() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("network.json");
        save_config(&RbfNetworkConfig::default(), &config_path)?;

        let result = load_network(&config_path, dir.path().join("absent.safetensors"), &Device::Cpu);
        assert!(result.is_err());

        Ok(())
    }
}

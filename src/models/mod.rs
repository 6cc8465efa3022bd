/// RBF network: RBF feature layer followed by a linear readout
use candle_core::{Module, Tensor};
use candle_nn::{Linear, VarBuilder, VarMap};

use crate::config::RbfNetworkConfig;
use crate::layers::RbfLayer;
use crate::Result;

pub mod loader;

/// Output of a forward pass that keeps the hidden activations
#[derive(Debug, Clone)]
pub struct NetworkOutput {
    /// RBF activations: [batch, units]
    pub features: Tensor,
    /// Readout: [batch, output_dim]
    pub output: Tensor,
}

/// Two-stage RBF network
///
/// Variables are laid out as `<rbf.name>.mu`, `readout.weight` and
/// (optionally) `readout.bias`.
pub struct RbfNetwork {
    config: RbfNetworkConfig,
    rbf: RbfLayer,
    readout: Linear,
}

impl RbfNetwork {
    /// Create new network
    pub fn new(config: RbfNetworkConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;

        let rbf = RbfLayer::load(config.rbf.clone(), config.input_dim, vb.pp(&config.rbf.name))?;

        let readout = if config.readout_bias {
            candle_nn::linear(config.rbf.units, config.output_dim, vb.pp("readout"))?
        } else {
            candle_nn::linear_no_bias(config.rbf.units, config.output_dim, vb.pp("readout"))?
        };

        log::debug!(
            "Created RBF network: {} -> {} centers -> {} outputs",
            config.input_dim,
            config.rbf.units,
            config.output_dim
        );

        Ok(Self { config, rbf, readout })
    }

    /// Forward pass keeping the RBF features
    ///
    /// # Arguments
    /// * `x` - Input tensor [batch, input_dim]
    pub fn forward_with_features(&self, x: &Tensor) -> Result<NetworkOutput> {
        let features = self.rbf.forward(x)?;
        let output = self.readout.forward(&features)?;
        Ok(NetworkOutput { features, output })
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor [batch, input_dim]
    ///
    /// # Returns
    /// Output tensor [batch, output_dim]
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        Ok(self.forward_with_features(x)?.output)
    }

    /// Sum of all weight and activity penalties for a forward pass
    ///
    /// Returns `None` when no regularizer is configured.
    pub fn penalty(&self, features: &Tensor) -> Result<Option<Tensor>> {
        let terms = [
            self.rbf.regularization_loss()?,
            self.rbf.activity_loss(features)?,
        ];

        let mut total: Option<Tensor> = None;
        for term in terms.into_iter().flatten() {
            total = Some(match total {
                Some(acc) => (acc + term)?,
                None => term,
            });
        }
        Ok(total)
    }

    /// Project constrained weights after an optimizer step
    pub fn apply_constraints(&self, varmap: &VarMap) -> Result<()> {
        self.rbf.apply_constraint(varmap)
    }

    pub fn rbf(&self) -> &RbfLayer {
        &self.rbf
    }

    pub fn config(&self) -> &RbfNetworkConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{Constraint, Regularizer};
    use crate::RbfConfig;
    use candle_core::{DType, Device};

    fn config() -> RbfNetworkConfig {
        RbfNetworkConfig {
            input_dim: 3,
            output_dim: 2,
            rbf: RbfConfig::new(6, 0.5),
            readout_bias: true,
        }
    }

    #[test]
    fn test_network_shapes() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let net = RbfNetwork::new(config(), vb)?;

        let x = Tensor::randn(0f32, 1.0, (5, 3), &device)?;
        let out = net.forward_with_features(&x)?;
        assert_eq!(out.features.dims(), &[5, 6]);
        assert_eq!(out.output.dims(), &[5, 2]);

        Ok(())
    }

    #[test]
    fn test_variable_names() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let net = RbfNetwork::new(config(), vb)?;
        assert_eq!(net.rbf().mu_path(), "rbf.mu");

        let data = varmap.data().lock().unwrap();
        let mut names: Vec<_> = data.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["rbf.mu", "readout.bias", "readout.weight"]);

        let total: usize = data.values().map(|v| v.as_tensor().elem_count()).sum();
        assert_eq!(total, config().num_parameters());

        Ok(())
    }

    #[test]
    fn test_penalty_combines_terms() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let x = Tensor::randn(0f32, 1.0, (4, 3), &device)?;

        let plain = RbfNetwork::new(config(), vb.pp("plain"))?;
        let out = plain.forward_with_features(&x)?;
        assert!(plain.penalty(&out.features)?.is_none());

        let mut cfg = config();
        cfg.rbf = cfg
            .rbf
            .with_regularizer(Regularizer::L2 { l2: 0.1 })
            .with_activity_regularizer(Regularizer::L1 { l1: 0.1 });
        let net = RbfNetwork::new(cfg, vb.pp("regularized"))?;
        let out = net.forward_with_features(&x)?;

        let total = net.penalty(&out.features)?.expect("penalty").to_scalar::<f32>()?;
        let weight = net.rbf().regularization_loss()?.expect("l2").to_scalar::<f32>()?;
        let activity = net.rbf().activity_loss(&out.features)?.expect("l1").to_scalar::<f32>()?;
        approx::assert_relative_eq!(total, weight + activity, epsilon = 1e-6);

        Ok(())
    }

    #[test]
    fn test_apply_constraints() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let mut cfg = config();
        cfg.rbf = cfg.rbf.with_constraint(Constraint::NonNeg);
        let net = RbfNetwork::new(cfg, vb)?;

        net.apply_constraints(&varmap)?;
        let min = net.rbf().mu()?.flatten_all()?.min(0)?.to_scalar::<f32>()?;
        assert!(min >= 0.0);

        Ok(())
    }
}

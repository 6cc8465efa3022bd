/// Radial basis function layer
///
/// For each input row `x` and each learned center `mu[j]`:
/// `out[j] = exp(-gamma * ||x - mu[j]||^2)`
use candle_core::{Module, Tensor};
use candle_nn::{VarBuilder, VarMap};

use crate::config::RbfConfig;
use crate::utils::{count_parameters, gaussian_kernel, pairwise_squared_distances};
use crate::{RbfError, Result};

/// Trainable RBF layer
///
/// The layer is created unbuilt; [`RbfLayer::build`] allocates the centers
/// once the input dimension is known.
#[derive(Debug, Clone)]
pub struct RbfLayer {
    config: RbfConfig,
    mu: Option<Tensor>,
    /// Variable name of `mu` in the backing store
    mu_path: String,
    input_dim: Option<usize>,
}

impl RbfLayer {
    /// Create an unbuilt layer
    pub fn new(config: RbfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mu: None,
            mu_path: "mu".to_string(),
            input_dim: None,
        })
    }

    /// Create and build in one go
    pub fn load(config: RbfConfig, input_dim: usize, vb: VarBuilder) -> Result<Self> {
        let mut layer = Self::new(config)?;
        layer.build(&[input_dim], vb)?;
        Ok(layer)
    }

    /// Rebuild an unbuilt layer from a serialized config
    pub fn from_config(config: RbfConfig) -> Result<Self> {
        Self::new(config)
    }

    /// Allocate `mu` with shape `(units, input_dim)`, `input_dim = input_shape[-1]`
    ///
    /// # Arguments
    /// * `input_shape` - Shape of the inputs the layer will see; only the last dim matters
    /// * `vb` - VarBuilder the weight is created or loaded through
    pub fn build(&mut self, input_shape: &[usize], vb: VarBuilder) -> Result<()> {
        if self.mu.is_some() {
            return Err(RbfError::Config(format!(
                "layer '{}' is already built",
                self.config.name
            )));
        }

        let input_dim = *input_shape
            .last()
            .ok_or_else(|| RbfError::Shape("input shape must have at least one dimension".to_string()))?;
        if input_dim == 0 {
            return Err(RbfError::Shape("input dimension must be > 0".to_string()));
        }

        if let Some(ref constraint) = self.config.mu_constraint {
            constraint.check_rank(2)?;
        }

        let units = self.config.units;
        let init = self.config.mu_initializer.to_init(units, input_dim);
        let mu = vb.get_with_hints((units, input_dim), "mu", init)?;

        let prefix = vb.prefix();
        self.mu_path = if prefix.is_empty() {
            "mu".to_string()
        } else {
            format!("{}.mu", prefix)
        };

        log::debug!(
            "Built RBF layer '{}': mu shape ({}, {}), gamma={}",
            self.config.name,
            units,
            input_dim,
            self.config.gamma
        );

        self.mu = Some(mu);
        self.input_dim = Some(input_dim);
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.mu.is_some()
    }

    /// Centers matrix `(units, input_dim)`
    pub fn mu(&self) -> Result<&Tensor> {
        self.mu.as_ref().ok_or(RbfError::NotBuilt)
    }

    /// Name of `mu` inside the VarMap it was built from
    pub fn mu_path(&self) -> &str {
        &self.mu_path
    }

    pub fn units(&self) -> usize {
        self.config.units
    }

    pub fn gamma(&self) -> f64 {
        self.config.gamma
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.input_dim
    }

    pub fn config(&self) -> &RbfConfig {
        &self.config
    }

    /// Serializable snapshot of the layer configuration
    pub fn get_config(&self) -> RbfConfig {
        self.config.clone()
    }

    /// Output shape for a given input shape: last dim replaced by `units`
    pub fn compute_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        match input_shape.split_last() {
            Some((_, leading)) => {
                let mut shape = leading.to_vec();
                shape.push(self.config.units);
                Ok(shape)
            }
            None => Err(RbfError::Shape(
                "input shape must have at least one dimension".to_string(),
            )),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor [..., input_dim]
    ///
    /// # Returns
    /// RBF activations [..., units], same dtype as the input
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mu = self.mu()?;
        let input_dim = mu.dim(1)?;

        let dims = x.dims();
        let (last, leading) = dims
            .split_last()
            .ok_or_else(|| RbfError::Shape("RBF input must have at least one dimension".to_string()))?;
        if *last != input_dim {
            return Err(RbfError::Shape(format!(
                "expected input last dim {}, got {} (shape {:?})",
                input_dim, last, dims
            )));
        }

        let mu = if mu.dtype() != x.dtype() {
            mu.to_dtype(x.dtype())?
        } else {
            mu.clone()
        };

        // Flatten leading dims to a single batch axis
        let rows: usize = leading.iter().product();
        let flat = x.reshape((rows, input_dim))?;

        let l2 = pairwise_squared_distances(&flat, &mu)?;
        let out = gaussian_kernel(&l2, self.config.gamma)?;

        let out_shape = self.compute_output_shape(dims)?;
        Ok(out.reshape(out_shape)?)
    }

    /// Penalty of `mu_regularizer` on the centers, if configured
    pub fn regularization_loss(&self) -> Result<Option<Tensor>> {
        match self.config.mu_regularizer {
            Some(ref r) => Ok(Some(r.penalty(self.mu()?)?)),
            None => Ok(None),
        }
    }

    /// Penalty of `activity_regularizer` on a layer output, summed over the whole batch
    pub fn activity_loss(&self, output: &Tensor) -> Result<Option<Tensor>> {
        match self.config.activity_regularizer {
            Some(ref r) => Ok(Some(r.penalty(output)?)),
            None => Ok(None),
        }
    }

    /// Project the stored `mu` variable with `mu_constraint`
    ///
    /// `varmap` must be the map the layer was built from.
    pub fn apply_constraint(&self, varmap: &VarMap) -> Result<()> {
        let Some(ref constraint) = self.config.mu_constraint else {
            return Ok(());
        };
        if !self.is_built() {
            return Err(RbfError::NotBuilt);
        }

        let data = varmap
            .data()
            .lock()
            .map_err(|_| RbfError::Training("VarMap lock poisoned".to_string()))?;
        let var = data.get(&self.mu_path).ok_or_else(|| {
            RbfError::Training(format!("variable '{}' not found in VarMap", self.mu_path))
        })?;

        let projected = constraint.apply(&var.as_tensor().detach())?;
        var.set(&projected)?;
        Ok(())
    }

    /// Number of trainable scalars (0 until built)
    pub fn num_parameters(&self) -> usize {
        self.mu.as_ref().map(count_parameters).unwrap_or(0)
    }
}

impl Module for RbfLayer {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        RbfLayer::forward(self, xs).map_err(|e| match e {
            RbfError::Candle(inner) => inner,
            other => candle_core::Error::Msg(other.to_string()),
        })
    }
}

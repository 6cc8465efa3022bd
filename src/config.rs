/// Configuration for the RBF layer and the RBF network built on it
///
/// Both structs round-trip through JSON, which is how layer configs are
/// stored next to safetensors checkpoints.
use crate::layers::{Constraint, Initializer, Regularizer};

/// Configuration for [`crate::RbfLayer`]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RbfConfig {
    /// Number of centers (output features)
    pub units: usize,

    /// Kernel width: output = exp(-gamma * ||x - mu||^2)
    pub gamma: f64,

    /// Initializer for the centers matrix `mu`
    #[serde(default)]
    pub mu_initializer: Initializer,

    /// Penalty on `mu`, added to the training loss
    #[serde(default)]
    pub mu_regularizer: Option<Regularizer>,

    /// Projection applied to `mu` after every optimizer step
    #[serde(default)]
    pub mu_constraint: Option<Constraint>,

    /// Penalty on the layer output, added to the training loss
    #[serde(default)]
    pub activity_regularizer: Option<Regularizer>,

    /// Variable prefix used when the layer is placed inside a larger model
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    "rbf".to_string()
}

impl Default for RbfConfig {
    fn default() -> Self {
        Self {
            units: 10,
            gamma: 1.0,
            mu_initializer: Initializer::default(),
            mu_regularizer: None,
            mu_constraint: None,
            activity_regularizer: None,
            name: default_name(),
        }
    }
}

impl RbfConfig {
    /// Config with the given units and gamma, everything else default
    pub fn new(units: usize, gamma: f64) -> Self {
        Self {
            units,
            gamma,
            ..Default::default()
        }
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.mu_initializer = initializer;
        self
    }

    pub fn with_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.mu_regularizer = Some(regularizer);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.mu_constraint = Some(constraint);
        self
    }

    pub fn with_activity_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.activity_regularizer = Some(regularizer);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.units == 0 {
            return Err(crate::RbfError::Config("units must be > 0".to_string()));
        }

        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(crate::RbfError::Config(format!(
                "gamma must be finite and >= 0, got {}",
                self.gamma
            )));
        }

        if self.gamma == 0.0 {
            log::warn!("gamma is 0: every RBF output will be constant 1.0");
        }

        if self.name.is_empty() {
            return Err(crate::RbfError::Config("name must not be empty".to_string()));
        }

        self.mu_initializer.validate()?;
        if let Some(ref r) = self.mu_regularizer {
            r.validate()?;
        }
        if let Some(ref r) = self.activity_regularizer {
            r.validate()?;
        }
        if let Some(ref c) = self.mu_constraint {
            c.validate()?;
        }

        Ok(())
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a JSON string
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration for [`crate::RbfNetwork`]: RBF features followed by a linear readout
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RbfNetworkConfig {
    /// Input feature dimension
    pub input_dim: usize,

    /// Number of regression targets / logits
    pub output_dim: usize,

    /// Hidden RBF layer
    pub rbf: RbfConfig,

    /// Whether the readout has a bias term
    #[serde(default = "default_readout_bias")]
    pub readout_bias: bool,
}

fn default_readout_bias() -> bool {
    true
}

impl Default for RbfNetworkConfig {
    fn default() -> Self {
        Self {
            input_dim: 1,
            output_dim: 1,
            rbf: RbfConfig::default(),
            readout_bias: true,
        }
    }
}

impl RbfNetworkConfig {
    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.input_dim == 0 || self.output_dim == 0 {
            return Err(crate::RbfError::Config(
                "input_dim and output_dim must be > 0".to_string(),
            ));
        }

        self.rbf.validate()
    }

    /// Number of trainable scalars in the network
    pub fn num_parameters(&self) -> usize {
        let centers = self.rbf.units * self.input_dim;
        let readout = self.rbf.units * self.output_dim;
        let bias = if self.readout_bias { self.output_dim } else { 0 };
        centers + readout + bias
    }
}

/// Weight initializers for the RBF centers
///
/// Each variant maps onto a `candle_nn::Init` so the weight can be created
/// through `VarBuilder::get_with_hints`.
use candle_nn::Init;
use std::str::FromStr;

/// Initializer for a 2-D weight
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "class_name", rename_all = "snake_case")]
pub enum Initializer {
    /// Uniform on `[minval, maxval)`; requires `minval < maxval`
    Uniform { minval: f64, maxval: f64 },
    /// Gaussian with the given mean and standard deviation
    Normal { mean: f64, stddev: f64 },
    Zeros,
    Ones,
    Constant { value: f64 },
    /// Uniform on `[-limit, limit)` with `limit = sqrt(6 / (fan_in + fan_out))`
    GlorotUniform,
    /// Gaussian with `stddev = sqrt(2 / fan_in)`
    ///
    /// Samples a plain normal. Unlike the truncated normal other frameworks
    /// use for He init, draws beyond two standard deviations are kept.
    HeNormal,
}

impl Default for Initializer {
    fn default() -> Self {
        Initializer::Uniform {
            minval: -0.05,
            maxval: 0.05,
        }
    }
}

impl Initializer {
    /// Check that the parameters describe a usable distribution
    pub fn validate(&self) -> crate::Result<()> {
        match *self {
            Initializer::Uniform { minval, maxval } => {
                if !minval.is_finite() || !maxval.is_finite() || minval >= maxval {
                    return Err(crate::RbfError::Config(format!(
                        "invalid uniform bounds [{}, {})",
                        minval, maxval
                    )));
                }
            }
            Initializer::Normal { mean, stddev } => {
                if !mean.is_finite() || !stddev.is_finite() || stddev < 0.0 {
                    return Err(crate::RbfError::Config(format!(
                        "invalid normal parameters mean={} stddev={}",
                        mean, stddev
                    )));
                }
            }
            Initializer::Constant { value } if !value.is_finite() => {
                return Err(crate::RbfError::Config(format!(
                    "constant initializer must be finite, got {}",
                    value
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// Convert to a candle init hint for a weight of shape `(rows, cols)`
    ///
    /// Fans follow the 2-D convention `fan_in = rows`, `fan_out = cols`.
    pub fn to_init(&self, rows: usize, cols: usize) -> Init {
        let fan_in = rows.max(1) as f64;
        let fan_out = cols.max(1) as f64;

        match *self {
            Initializer::Uniform { minval, maxval } => Init::Uniform {
                lo: minval,
                up: maxval,
            },
            Initializer::Normal { mean, stddev } => Init::Randn { mean, stdev: stddev },
            Initializer::Zeros => Init::Const(0.0),
            Initializer::Ones => Init::Const(1.0),
            Initializer::Constant { value } => Init::Const(value),
            Initializer::GlorotUniform => {
                let limit = (6.0 / (fan_in + fan_out)).sqrt();
                Init::Uniform { lo: -limit, up: limit }
            }
            Initializer::HeNormal => Init::Randn {
                mean: 0.0,
                stdev: (2.0 / fan_in).sqrt(),
            },
        }
    }
}

impl FromStr for Initializer {
    type Err = crate::RbfError;

    /// Shorthand names with default parameters
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" | "random_uniform" => Ok(Initializer::default()),
            "normal" | "random_normal" => Ok(Initializer::Normal {
                mean: 0.0,
                stddev: 0.05,
            }),
            "zeros" => Ok(Initializer::Zeros),
            "ones" => Ok(Initializer::Ones),
            "glorot_uniform" => Ok(Initializer::GlorotUniform),
            "he_normal" => Ok(Initializer::HeNormal),
            other => Err(crate::RbfError::Config(format!(
                "unknown initializer: {}",
                other
            ))),
        }
    }
}

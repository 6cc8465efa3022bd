/// Weight constraints, applied as projections after each optimizer step
use candle_core::{Result, Tensor};
use std::str::FromStr;

const NORM_EPSILON: f64 = 1e-7;

fn default_axis() -> usize {
    1
}

fn default_rate() -> f64 {
    1.0
}

/// Projection onto a constraint set
///
/// Norm-based variants measure the L2 norm along `axis`. For the RBF centers
/// `mu` of shape `(units, input_dim)`, axis 1 constrains each center.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "class_name", rename_all = "snake_case")]
pub enum Constraint {
    /// Clamp negative entries to zero
    NonNeg,
    /// Rescale slices whose norm exceeds `max_value`
    MaxNorm {
        max_value: f64,
        #[serde(default = "default_axis")]
        axis: usize,
    },
    /// Rescale slices to unit norm
    UnitNorm {
        #[serde(default = "default_axis")]
        axis: usize,
    },
    /// Pull slice norms into `[min_value, max_value]` at the given rate
    MinMaxNorm {
        min_value: f64,
        max_value: f64,
        #[serde(default = "default_rate")]
        rate: f64,
        #[serde(default = "default_axis")]
        axis: usize,
    },
}

impl Constraint {
    pub fn validate(&self) -> crate::Result<()> {
        match *self {
            Constraint::MaxNorm { max_value, .. } if !(max_value >= 0.0) => {
                Err(crate::RbfError::Config(format!(
                    "max_norm max_value must be >= 0, got {}",
                    max_value
                )))
            }
            Constraint::MinMaxNorm {
                min_value,
                max_value,
                rate,
                ..
            } => {
                if !(min_value >= 0.0) || !(max_value >= min_value) {
                    return Err(crate::RbfError::Config(format!(
                        "min_max_norm requires 0 <= min_value <= max_value, got [{}, {}]",
                        min_value, max_value
                    )));
                }
                if !(0.0..=1.0).contains(&rate) {
                    return Err(crate::RbfError::Config(format!(
                        "min_max_norm rate must be in [0, 1], got {}",
                        rate
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Axis the norm is measured along, `None` for elementwise constraints
    pub fn axis(&self) -> Option<usize> {
        match *self {
            Constraint::NonNeg => None,
            Constraint::MaxNorm { axis, .. }
            | Constraint::UnitNorm { axis }
            | Constraint::MinMaxNorm { axis, .. } => Some(axis),
        }
    }

    /// Check that the constraint can be applied to a weight of the given rank
    pub fn check_rank(&self, rank: usize) -> crate::Result<()> {
        match self.axis() {
            Some(axis) if axis >= rank => Err(crate::RbfError::Shape(format!(
                "constraint axis {} is out of range for a rank-{} weight",
                axis, rank
            ))),
            _ => Ok(()),
        }
    }

    /// Project `w` onto the constraint set
    pub fn apply(&self, w: &Tensor) -> Result<Tensor> {
        match *self {
            Constraint::NonNeg => w.relu(),
            Constraint::MaxNorm { max_value, axis } => {
                let norms = l2_norms(w, axis)?;
                let desired = norms.clamp(0.0, max_value)?;
                rescale(w, &norms, &desired)
            }
            Constraint::UnitNorm { axis } => {
                let norms = l2_norms(w, axis)?;
                w.broadcast_div(&(norms + NORM_EPSILON)?)
            }
            Constraint::MinMaxNorm {
                min_value,
                max_value,
                rate,
                axis,
            } => {
                let norms = l2_norms(w, axis)?;
                let clipped = norms.clamp(min_value, max_value)?;
                let desired = ((clipped * rate)? + (norms.clone() * (1.0 - rate))?)?;
                rescale(w, &norms, &desired)
            }
        }
    }
}

/// L2 norm along `axis`, keeping the reduced dimension
fn l2_norms(w: &Tensor, axis: usize) -> Result<Tensor> {
    w.sqr()?.sum_keepdim(axis)?.sqrt()
}

/// `w * desired / (eps + norms)`
fn rescale(w: &Tensor, norms: &Tensor, desired: &Tensor) -> Result<Tensor> {
    let scale = desired.div(&(norms + NORM_EPSILON)?)?;
    w.broadcast_mul(&scale)
}

impl FromStr for Constraint {
    type Err = crate::RbfError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "non_neg" | "nonneg" => Ok(Constraint::NonNeg),
            "max_norm" => Ok(Constraint::MaxNorm {
                max_value: 2.0,
                axis: default_axis(),
            }),
            "unit_norm" => Ok(Constraint::UnitNorm { axis: default_axis() }),
            "min_max_norm" => Ok(Constraint::MinMaxNorm {
                min_value: 0.0,
                max_value: 1.0,
                rate: default_rate(),
                axis: default_axis(),
            }),
            other => Err(crate::RbfError::Config(format!(
                "unknown constraint: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn row_norms(w: &Tensor) -> Result<Vec<f32>> {
        w.sqr()?.sum(1)?.sqrt()?.to_vec1::<f32>()
    }

    #[test]
    fn test_non_neg() -> Result<()> {
        let w = Tensor::new(&[[1.0f32, -2.0], [-3.0, 4.0]], &Device::Cpu)?;
        let out = Constraint::NonNeg.apply(&w)?;
        assert_eq!(out.to_vec2::<f32>()?, vec![vec![1.0, 0.0], vec![0.0, 4.0]]);
        Ok(())
    }

    #[test]
    fn test_max_norm_only_shrinks_long_rows() -> Result<()> {
        // Row norms: 5 and 0.5
        let w = Tensor::new(&[[3.0f32, 4.0], [0.3, 0.4]], &Device::Cpu)?;
        let out = Constraint::MaxNorm { max_value: 1.0, axis: 1 }.apply(&w)?;

        let norms = row_norms(&out)?;
        approx::assert_relative_eq!(norms[0], 1.0, epsilon = 1e-5);
        approx::assert_relative_eq!(norms[1], 0.5, epsilon = 1e-5);

        // Direction is preserved
        let first = out.get(0)?.to_vec1::<f32>()?;
        approx::assert_relative_eq!(first[0] / first[1], 0.75, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn test_unit_norm() -> Result<()> {
        let w = Tensor::new(&[[3.0f32, 4.0], [0.0, 2.0]], &Device::Cpu)?;
        let out = Constraint::UnitNorm { axis: 1 }.apply(&w)?;

        for n in row_norms(&out)? {
            approx::assert_relative_eq!(n, 1.0, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_min_max_norm_partial_rate() -> Result<()> {
        // Norm 5 clipped to 2, rate 0.5 -> desired 3.5
        let w = Tensor::new(&[[3.0f32, 4.0]], &Device::Cpu)?;
        let out = Constraint::MinMaxNorm {
            min_value: 0.0,
            max_value: 2.0,
            rate: 0.5,
            axis: 1,
        }
        .apply(&w)?;

        approx::assert_relative_eq!(row_norms(&out)?[0], 3.5, epsilon = 1e-4);
        Ok(())
    }

    #[test]
    fn test_invalid_constraints_rejected() {
        assert!(Constraint::MaxNorm { max_value: -1.0, axis: 1 }.validate().is_err());
        assert!(Constraint::MinMaxNorm {
            min_value: 2.0,
            max_value: 1.0,
            rate: 1.0,
            axis: 1
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_check_rank() {
        assert!(Constraint::MaxNorm { max_value: 1.0, axis: 1 }.check_rank(2).is_ok());
        assert!(matches!(
            Constraint::MaxNorm { max_value: 1.0, axis: 2 }.check_rank(2),
            Err(crate::RbfError::Shape(_))
        ));
        assert!(Constraint::NonNeg.check_rank(2).is_ok());
    }

    #[test]
    fn test_axis_defaults_when_missing() -> crate::Result<()> {
        let c: Constraint = serde_json::from_str(r#"{"class_name":"max_norm","max_value":3.0}"#)?;
        assert_eq!(c, Constraint::MaxNorm { max_value: 3.0, axis: 1 });
        Ok(())
    }
}

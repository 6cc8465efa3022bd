/// Weight and activity regularizers
use candle_core::{Result, Tensor};
use std::str::FromStr;

const DEFAULT_COEFFICIENT: f64 = 0.01;

/// Additive penalty on a tensor
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "class_name", rename_all = "snake_case")]
pub enum Regularizer {
    /// `l1 * sum(|w|)`
    L1 { l1: f64 },
    /// `l2 * sum(w^2)`
    L2 { l2: f64 },
    /// `l1 * sum(|w|) + l2 * sum(w^2)`
    L1L2 { l1: f64, l2: f64 },
}

impl Regularizer {
    pub fn validate(&self) -> crate::Result<()> {
        let (l1, l2) = self.coefficients();
        if !l1.is_finite() || !l2.is_finite() || l1 < 0.0 || l2 < 0.0 {
            return Err(crate::RbfError::Config(format!(
                "regularizer coefficients must be finite and >= 0, got l1={} l2={}",
                l1, l2
            )));
        }
        Ok(())
    }

    /// `(l1, l2)` coefficients, zero where a term is absent
    pub fn coefficients(&self) -> (f64, f64) {
        match *self {
            Regularizer::L1 { l1 } => (l1, 0.0),
            Regularizer::L2 { l2 } => (0.0, l2),
            Regularizer::L1L2 { l1, l2 } => (l1, l2),
        }
    }

    /// Scalar penalty, same dtype as `w`
    pub fn penalty(&self, w: &Tensor) -> Result<Tensor> {
        let (l1, l2) = self.coefficients();
        let mut total = Tensor::zeros((), w.dtype(), w.device())?;

        if l1 > 0.0 {
            total = (total + (w.abs()?.sum_all()? * l1)?)?;
        }
        if l2 > 0.0 {
            total = (total + (w.sqr()?.sum_all()? * l2)?)?;
        }

        Ok(total)
    }
}

impl FromStr for Regularizer {
    type Err = crate::RbfError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l1" => Ok(Regularizer::L1 { l1: DEFAULT_COEFFICIENT }),
            "l2" => Ok(Regularizer::L2 { l2: DEFAULT_COEFFICIENT }),
            "l1_l2" | "l1l2" => Ok(Regularizer::L1L2 {
                l1: DEFAULT_COEFFICIENT,
                l2: DEFAULT_COEFFICIENT,
            }),
            other => Err(crate::RbfError::Config(format!(
                "unknown regularizer: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn sample() -> Result<Tensor> {
        Tensor::new(&[[1.0f32, -2.0], [3.0, -4.0]], &Device::Cpu)
    }

    #[test]
    fn test_l1_penalty() -> Result<()> {
        let p = Regularizer::L1 { l1: 0.5 }.penalty(&sample()?)?;
        approx::assert_relative_eq!(p.to_scalar::<f32>()?, 5.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_l2_penalty() -> Result<()> {
        let p = Regularizer::L2 { l2: 0.1 }.penalty(&sample()?)?;
        approx::assert_relative_eq!(p.to_scalar::<f32>()?, 3.0, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn test_l1_l2_penalty_is_sum() -> Result<()> {
        let p = Regularizer::L1L2 { l1: 0.5, l2: 0.1 }.penalty(&sample()?)?;
        approx::assert_relative_eq!(p.to_scalar::<f32>()?, 8.0, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn test_shorthand_uses_default_coefficient() -> crate::Result<()> {
        assert_eq!("l2".parse::<Regularizer>()?, Regularizer::L2 { l2: 0.01 });
        assert!("dropout".parse::<Regularizer>().is_err());
        Ok(())
    }

    #[test]
    fn test_negative_coefficient_rejected() {
        assert!(Regularizer::L1 { l1: -1.0 }.validate().is_err());
    }
}

/// Utility functions for RBF computations
use candle_core::{Result, Tensor, D};

/// Calculate the number of parameters in a tensor
pub fn count_parameters(tensor: &Tensor) -> usize {
    tensor.dims().iter().product()
}

/// Squared Euclidean distance between every row of `x` and every row of `centers`
///
/// # Arguments
/// * `x` - Points [n, dim]
/// * `centers` - Centers [units, dim]
///
/// # Returns
/// Distances [n, units]
pub fn pairwise_squared_distances(x: &Tensor, centers: &Tensor) -> Result<Tensor> {
    // [n, 1, dim] - [1, units, dim] -> [n, units, dim]
    let diff = x.unsqueeze(1)?.broadcast_sub(&centers.unsqueeze(0)?)?;
    diff.sqr()?.sum(D::Minus1)
}

/// Gaussian kernel `exp(-gamma * d2)` applied elementwise to squared distances
pub fn gaussian_kernel(squared_distances: &Tensor, gamma: f64) -> Result<Tensor> {
    (squared_distances * (-gamma))?.exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_count_parameters() -> Result<()> {
        let t = Tensor::zeros((4, 3), candle_core::DType::F32, &Device::Cpu)?;
        assert_eq!(count_parameters(&t), 12);
        Ok(())
    }

    #[test]
    fn test_pairwise_squared_distances() -> Result<()> {
        let device = Device::Cpu;
        let x = Tensor::new(&[[0.0f32, 0.0], [1.0, 1.0]], &device)?;
        let c = Tensor::new(&[[0.0f32, 0.0], [1.0, 0.0], [2.0, 2.0]], &device)?;

        let d = pairwise_squared_distances(&x, &c)?;
        assert_eq!(d.dims(), &[2, 3]);
        assert_eq!(
            d.to_vec2::<f32>()?,
            vec![vec![0.0, 1.0, 8.0], vec![2.0, 1.0, 2.0]]
        );
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_at_zero_is_one() -> Result<()> {
        let d = Tensor::zeros(3, candle_core::DType::F64, &Device::Cpu)?;
        let k = gaussian_kernel(&d, 7.0)?;
        assert_eq!(k.to_vec1::<f64>()?, vec![1.0, 1.0, 1.0]);
        Ok(())
    }
}

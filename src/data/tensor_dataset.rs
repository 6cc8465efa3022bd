/// In-memory regression dataset backed by `ndarray`, loadable from `.npy` files
use candle_core::{Result, Tensor, Device};
use ndarray::{Array2, ArrayView1};
use ndarray_npy::ReadNpyExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::File;
use std::path::Path;

/// Dataset of `f32` feature rows and target rows
pub struct TensorDataset {
    inputs: Array2<f32>,  // [N, input_dim]
    targets: Array2<f32>, // [N, output_dim]
}

impl TensorDataset {
    /// Build from arrays with the same number of rows
    pub fn from_arrays(inputs: Array2<f32>, targets: Array2<f32>) -> crate::Result<Self> {
        if inputs.nrows() != targets.nrows() {
            return Err(crate::RbfError::Shape(format!(
                "Row mismatch: inputs {:?} vs targets {:?}",
                inputs.shape(),
                targets.shape()
            )));
        }

        Ok(Self { inputs, targets })
    }

    /// Load from two 2-D `f32` `.npy` files
    pub fn from_npy<P: AsRef<Path>, Q: AsRef<Path>>(inputs_path: P, targets_path: Q) -> crate::Result<Self> {
        log::info!("Loading inputs from: {:?}", inputs_path.as_ref());
        let inputs = Array2::<f32>::read_npy(File::open(inputs_path.as_ref())?)?;

        log::info!("Loading targets from: {:?}", targets_path.as_ref());
        let targets = Array2::<f32>::read_npy(File::open(targets_path.as_ref())?)?;

        let dataset = Self::from_arrays(inputs, targets)?;
        log::info!(
            "Dataset loaded: {} examples, input_dim={}, output_dim={}",
            dataset.len(),
            dataset.input_dim(),
            dataset.output_dim()
        );
        Ok(dataset)
    }

    /// Get number of examples
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inputs.nrows() == 0
    }

    pub fn input_dim(&self) -> usize {
        self.inputs.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.targets.ncols()
    }

    /// Get input at index
    pub fn get_input(&self, idx: usize) -> ArrayView1<f32> {
        self.inputs.row(idx)
    }

    /// Get target at index
    pub fn get_target(&self, idx: usize) -> ArrayView1<f32> {
        self.targets.row(idx)
    }
}

/// Mini-batch loader over a [`TensorDataset`]
pub struct TensorDataLoader {
    dataset: TensorDataset,
    batch_size: usize,
    current_idx: usize,
    indices: Vec<usize>,
    shuffle: bool,
    rng: StdRng,
}

impl TensorDataLoader {
    /// Create new data loader with an entropy-seeded shuffle
    pub fn new(dataset: TensorDataset, batch_size: usize, shuffle: bool) -> Self {
        Self::with_rng(dataset, batch_size, shuffle, StdRng::from_entropy())
    }

    /// Create new data loader with a reproducible shuffle order
    pub fn with_seed(dataset: TensorDataset, batch_size: usize, shuffle: bool, seed: u64) -> Self {
        Self::with_rng(dataset, batch_size, shuffle, StdRng::seed_from_u64(seed))
    }

    fn with_rng(dataset: TensorDataset, batch_size: usize, shuffle: bool, mut rng: StdRng) -> Self {
        let batch_size = batch_size.max(1);
        let mut indices: Vec<usize> = (0..dataset.len()).collect();

        if shuffle {
            indices.shuffle(&mut rng);
        }

        Self {
            dataset,
            batch_size,
            current_idx: 0,
            indices,
            shuffle,
            rng,
        }
    }

    /// Get next batch (inputs, targets)
    pub fn next_batch(&mut self, device: &Device) -> Result<Option<(Tensor, Tensor)>> {
        if self.current_idx >= self.indices.len() {
            return Ok(None);
        }

        let end_idx = (self.current_idx + self.batch_size).min(self.indices.len());
        let batch_indices = &self.indices[self.current_idx..end_idx];
        let actual_batch_size = batch_indices.len();

        let mut input_data = Vec::with_capacity(actual_batch_size * self.dataset.input_dim());
        let mut target_data = Vec::with_capacity(actual_batch_size * self.dataset.output_dim());

        for &idx in batch_indices {
            input_data.extend(self.dataset.get_input(idx).iter().copied());
            target_data.extend(self.dataset.get_target(idx).iter().copied());
        }

        self.current_idx = end_idx;

        let input_tensor = Tensor::from_vec(
            input_data,
            (actual_batch_size, self.dataset.input_dim()),
            device,
        )?;
        let target_tensor = Tensor::from_vec(
            target_data,
            (actual_batch_size, self.dataset.output_dim()),
            device,
        )?;

        Ok(Some((input_tensor, target_tensor)))
    }

    /// Reset loader for new epoch
    pub fn reset(&mut self) {
        self.current_idx = 0;

        if self.shuffle {
            self.indices.shuffle(&mut self.rng);
        }
    }

    /// Get number of batches
    pub fn num_batches(&self) -> usize {
        (self.dataset.len() + self.batch_size - 1) / self.batch_size
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Get dataset reference
    pub fn dataset(&self) -> &TensorDataset {
        &self.dataset
    }
}

impl super::BatchDataLoader for TensorDataLoader {
    fn next_batch(&mut self, device: &Device) -> Result<Option<(Tensor, Tensor)>> {
        TensorDataLoader::next_batch(self, device)
    }

    fn reset(&mut self) {
        TensorDataLoader::reset(self)
    }

    fn num_batches(&self) -> usize {
        TensorDataLoader::num_batches(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;
    use ndarray_npy::WriteNpyExt;

    fn dataset(n: usize) -> TensorDataset {
        let inputs = Array::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f32);
        let targets = Array::from_shape_fn((n, 1), |(i, _)| i as f32);
        TensorDataset::from_arrays(inputs, targets).unwrap()
    }

    #[test]
    fn test_row_mismatch_rejected() {
        let inputs = Array2::<f32>::zeros((3, 2));
        let targets = Array2::<f32>::zeros((4, 1));
        assert!(TensorDataset::from_arrays(inputs, targets).is_err());
    }

    #[test]
    fn test_batches_cover_dataset_in_order() -> Result<()> {
        let device = Device::Cpu;
        let mut loader = TensorDataLoader::new(dataset(5), 2, false);
        assert_eq!(loader.num_batches(), 3);

        let mut targets = Vec::new();
        let mut sizes = Vec::new();
        while let Some((x, y)) = loader.next_batch(&device)? {
            assert_eq!(x.dim(1)?, 2);
            sizes.push(x.dim(0)?);
            targets.extend(y.flatten_all()?.to_vec1::<f32>()?);
        }

        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(targets, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        Ok(())
    }

    #[test]
    fn test_shuffle_is_a_permutation_and_reset_restarts() -> Result<()> {
        let device = Device::Cpu;
        let mut loader = TensorDataLoader::with_seed(dataset(10), 4, true, 7);

        for _ in 0..2 {
            let mut seen = Vec::new();
            while let Some((x, y)) = loader.next_batch(&device)? {
                // Inputs stay paired with their targets
                let xs = x.to_vec2::<f32>()?;
                let ys = y.flatten_all()?.to_vec1::<f32>()?;
                for (row, t) in xs.iter().zip(ys.iter()) {
                    assert_eq!(row[0], t * 2.0);
                }
                seen.extend(ys);
            }
            seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(seen, (0..10).map(|i| i as f32).collect::<Vec<_>>());
            loader.reset();
        }

        Ok(())
    }

    #[test]
    fn test_from_npy() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let inputs_path = dir.path().join("inputs.npy");
        let targets_path = dir.path().join("targets.npy");

        let inputs = Array::from_shape_fn((6, 3), |(i, j)| (i + j) as f32);
        let targets = Array::from_shape_fn((6, 2), |(i, j)| (i * j) as f32);
        inputs.write_npy(File::create(&inputs_path)?).unwrap();
        targets.write_npy(File::create(&targets_path)?).unwrap();

        let ds = TensorDataset::from_npy(&inputs_path, &targets_path)?;
        assert_eq!(ds.len(), 6);
        assert_eq!(ds.input_dim(), 3);
        assert_eq!(ds.output_dim(), 2);
        assert_eq!(ds.get_input(2).to_vec(), vec![2.0, 3.0, 4.0]);

        Ok(())
    }
}

/// Training loop for RbfNetwork
use candle_core::{Device, DType, Tensor};
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};

use crate::config::RbfNetworkConfig;
use crate::data::{BatchDataLoader, TensorDataLoader, TensorDataset};
use crate::models::RbfNetwork;
use crate::RbfError;
use super::checkpoint::{load_checkpoint, save_checkpoint, CheckpointMetadata};
use super::scheduler::{CosineScheduler, CosineSchedulerConfig};

/// Training configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub num_epochs: usize,
    /// Batch size of loaders built with [`TrainingConfig::dataloader`]
    pub batch_size: usize,
    /// Learning rate (peak)
    pub learning_rate: f64,
    /// Minimum learning rate
    pub lr_min: f64,
    /// Warmup steps
    pub warmup_steps: usize,
    /// Total training steps (for scheduler)
    pub total_steps: usize,
    /// Decoupled AdamW weight decay
    pub weight_decay: f64,
    /// Log a step summary every N steps
    pub log_every: usize,
    /// Save checkpoint every N steps (0 disables step checkpoints)
    pub save_every: usize,
    /// Checkpoint directory; no checkpoints are written when unset
    pub checkpoint_dir: Option<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_epochs: 100,
            batch_size: 32,
            learning_rate: 1e-2,
            lr_min: 1e-4,
            warmup_steps: 0,
            total_steps: 10_000,
            weight_decay: 0.0,
            log_every: 100,
            save_every: 0,
            checkpoint_dir: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.batch_size == 0 {
            return Err(RbfError::Config("batch_size must be > 0".to_string()));
        }
        if !(self.learning_rate > 0.0) || self.lr_min < 0.0 || self.lr_min > self.learning_rate {
            return Err(RbfError::Config(format!(
                "expected 0 <= lr_min <= learning_rate and learning_rate > 0, got lr={} lr_min={}",
                self.learning_rate, self.lr_min
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(RbfError::Config("weight_decay must be >= 0".to_string()));
        }
        Ok(())
    }

    /// Mini-batch loader over `dataset` with this config's batch size
    pub fn dataloader(&self, dataset: TensorDataset, shuffle: bool) -> TensorDataLoader {
        TensorDataLoader::new(dataset, self.batch_size, shuffle)
    }
}

/// Trainer for RbfNetwork
///
/// Each step minimizes `mse(output, target) + penalties`, then projects
/// constrained weights back onto their constraint set.
pub struct Trainer {
    network: RbfNetwork,
    varmap: VarMap,
    optimizer: AdamW,
    scheduler: CosineScheduler,
    config: TrainingConfig,
    device: Device,
    step: usize,
}

impl Trainer {
    /// Create new trainer with freshly initialized weights
    pub fn new(
        network_config: RbfNetworkConfig,
        training_config: TrainingConfig,
        device: Device,
    ) -> crate::Result<Self> {
        training_config.validate()?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let network = RbfNetwork::new(network_config, vb)?;

        let optimizer_params = ParamsAdamW {
            lr: training_config.learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: training_config.weight_decay,
        };
        let optimizer = AdamW::new(varmap.all_vars(), optimizer_params)?;

        let scheduler = CosineScheduler::new(CosineSchedulerConfig {
            lr_init: training_config.learning_rate,
            lr_min: training_config.lr_min,
            warmup_steps: training_config.warmup_steps,
            total_steps: training_config.total_steps,
        });

        // Initial weights may violate the constraint
        network.apply_constraints(&varmap)?;

        Ok(Self {
            network,
            varmap,
            optimizer,
            scheduler,
            config: training_config,
            device,
            step: 0,
        })
    }

    /// Loss for a batch: MSE plus configured penalties
    fn compute_loss(&self, inputs: &Tensor, targets: &Tensor) -> crate::Result<(Tensor, f32)> {
        let out = self.network.forward_with_features(inputs)?;

        if out.output.dims() != targets.dims() {
            return Err(RbfError::Shape(format!(
                "output shape {:?} does not match target shape {:?}",
                out.output.dims(),
                targets.dims()
            )));
        }

        let mse = loss::mse(&out.output, targets)?;
        let mse_val = mse.to_scalar::<f32>()?;

        let total = match self.network.penalty(&out.features)? {
            Some(penalty) => (mse + penalty)?,
            None => mse,
        };
        Ok((total, mse_val))
    }

    /// Training step
    ///
    /// # Returns
    /// Batch MSE (without penalties)
    pub fn train_step(&mut self, inputs: &Tensor, targets: &Tensor) -> crate::Result<f32> {
        let (loss, mse) = self.compute_loss(inputs, targets)?;

        if !mse.is_finite() {
            return Err(RbfError::Training(format!(
                "loss diverged at step {}: {}",
                self.step, mse
            )));
        }

        let lr = self.scheduler.get_lr();
        self.optimizer.set_learning_rate(lr);

        // Computes gradients and updates the VarMap variables in place
        self.optimizer.backward_step(&loss)?;
        self.network.apply_constraints(&self.varmap)?;

        self.scheduler.step();
        self.step += 1;

        if self.config.log_every > 0 && self.step % self.config.log_every == 0 {
            log::debug!("Step {}: mse={:.6}, lr={:.6}", self.step, mse, lr);
        }

        Ok(mse)
    }

    /// Mean MSE over every example the loader yields, without updating weights
    pub fn evaluate(&self, dataloader: &mut impl BatchDataLoader) -> crate::Result<f32> {
        dataloader.reset();

        let mut total = 0.0f64;
        let mut count = 0usize;
        while let Some((inputs, targets)) = dataloader.next_batch(&self.device)? {
            let output = self.network.forward(&inputs)?;
            let mse = loss::mse(&output, &targets)?.to_scalar::<f32>()?;
            let n = inputs.dim(0)?;
            total += mse as f64 * n as f64;
            count += n;
        }

        if count == 0 {
            return Err(RbfError::Training("evaluation loader yielded no examples".to_string()));
        }
        Ok((total / count as f64) as f32)
    }

    /// Train for one epoch, returning the mean batch MSE
    pub fn train_epoch(&mut self, dataloader: &mut impl BatchDataLoader) -> crate::Result<f32> {
        let mut total_loss = 0.0;
        let mut num_batches = 0;

        dataloader.reset();

        while let Some((inputs, targets)) = dataloader.next_batch(&self.device)? {
            let loss = self.train_step(&inputs, &targets)?;
            total_loss += loss;
            num_batches += 1;

            if self.config.save_every > 0 && self.step % self.config.save_every == 0 {
                self.save_checkpoint(&format!("checkpoint_step_{}", self.step), Some(loss as f64))?;
            }
        }

        if num_batches == 0 {
            return Err(RbfError::Training("training loader yielded no batches".to_string()));
        }
        Ok(total_loss / num_batches as f32)
    }

    /// Full training loop
    ///
    /// # Returns
    /// Mean MSE of the last epoch
    pub fn train(&mut self, dataloader: &mut impl BatchDataLoader) -> crate::Result<f32> {
        log::info!("Starting training for {} epochs", self.config.num_epochs);
        log::info!("Total batches per epoch: {}", dataloader.num_batches());

        let mut last_loss = f32::NAN;
        for epoch in 0..self.config.num_epochs {
            last_loss = self.train_epoch(dataloader)?;

            log::info!(
                "Epoch {}/{} complete: avg_mse={:.6}, step={}, lr={:.6}",
                epoch + 1,
                self.config.num_epochs,
                last_loss,
                self.step,
                self.scheduler.get_lr()
            );
        }

        log::info!("Training complete!");
        self.save_checkpoint("final_model", Some(last_loss as f64))?;

        Ok(last_loss)
    }

    /// Save a checkpoint into `checkpoint_dir` (no-op when unset)
    pub fn save_checkpoint(&self, name: &str, loss: Option<f64>) -> crate::Result<()> {
        let Some(ref dir) = self.config.checkpoint_dir else {
            return Ok(());
        };

        let metadata = CheckpointMetadata {
            step: self.step,
            lr: self.scheduler.get_lr(),
            loss,
            config: Some(self.network.config().clone()),
        };
        save_checkpoint(&self.varmap, dir, name, &metadata)
    }

    /// Restore weights and step counter from a checkpoint in `checkpoint_dir`
    ///
    /// Optimizer moments are not stored and restart from zero.
    pub fn resume(&mut self, name: &str) -> crate::Result<CheckpointMetadata> {
        let dir = self
            .config
            .checkpoint_dir
            .clone()
            .ok_or_else(|| RbfError::Config("checkpoint_dir is not set".to_string()))?;

        let metadata = load_checkpoint(&mut self.varmap, &dir, name)?;
        if let Some(ref stored) = metadata.config {
            if stored != self.network.config() {
                log::warn!("Checkpoint '{}' was written with a different network config", name);
            }
        }

        self.step = metadata.step;
        self.scheduler.set_step(metadata.step);
        Ok(metadata)
    }

    pub fn network(&self) -> &RbfNetwork {
        &self.network
    }

    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn learning_rate(&self) -> f64 {
        self.scheduler.get_lr()
    }
}

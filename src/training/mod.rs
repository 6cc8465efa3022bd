/// Training infrastructure for RBF networks
pub mod scheduler;
pub mod checkpoint;
pub mod trainer;

pub use scheduler::{CosineScheduler, CosineSchedulerConfig};
pub use checkpoint::{load_checkpoint, save_checkpoint, CheckpointMetadata};
pub use trainer::{Trainer, TrainingConfig};

/// Fit a sum of two Gaussian bumps with a small RBF network
use candle_core::{Device, Tensor};
use ndarray::Array;
use rbf_layer::data::TensorDataset;
use rbf_layer::layers::{Constraint, Initializer, Regularizer};
use rbf_layer::training::{Trainer, TrainingConfig};
use rbf_layer::{RbfConfig, RbfNetworkConfig};

fn target(x: f32) -> f32 {
    (-4.0 * (x - 1.0).powi(2)).exp() - 0.5 * (-2.0 * (x + 1.5).powi(2)).exp()
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== RBF network - Gaussian bump regression ===");

    let device = if candle_core::utils::cuda_is_available() {
        Device::new_cuda(0)?
    } else {
        Device::Cpu
    };
    log::info!("Using device: {:?}", device);

    let n = 256;
    let xs = Array::linspace(-3.0f32, 3.0, n).into_shape((n, 1))?;
    let ys = xs.mapv(target);
    let dataset = TensorDataset::from_arrays(xs, ys)?;

    let network_config = RbfNetworkConfig {
        input_dim: 1,
        output_dim: 1,
        rbf: RbfConfig::new(16, 2.0)
            .with_initializer(Initializer::Uniform { minval: -3.0, maxval: 3.0 })
            .with_regularizer(Regularizer::L2 { l2: 1e-4 })
            .with_constraint(Constraint::MaxNorm { max_value: 3.5, axis: 1 }),
        readout_bias: true,
    };
    log::info!("Network configuration: {}", serde_json::to_string_pretty(&network_config)?);
    log::info!("Parameters: {}", network_config.num_parameters());

    let num_epochs = 200;
    let batch_size = 32;
    let training_config = TrainingConfig {
        num_epochs,
        batch_size,
        learning_rate: 3e-2,
        lr_min: 1e-3,
        warmup_steps: 20,
        total_steps: num_epochs * ((n + batch_size - 1) / batch_size),
        checkpoint_dir: Some("checkpoints_rbf".to_string()),
        ..Default::default()
    };
    let mut dataloader = training_config.dataloader(dataset, true);

    let mut trainer = Trainer::new(network_config, training_config, device.clone())?;

    let initial = trainer.evaluate(&mut dataloader)?;
    log::info!("Initial MSE: {:.6}", initial);

    let final_loss = trainer.train(&mut dataloader)?;
    log::info!("Final epoch MSE: {:.6}", final_loss);

    let probe = [-1.5f32, 0.0, 1.0];
    let x = Tensor::new(&probe, &device)?.reshape((probe.len(), 1))?;
    let pred = trainer.network().forward(&x)?.flatten_all()?.to_vec1::<f32>()?;
    for (x, p) in probe.iter().zip(pred.iter()) {
        log::info!("f({:+.2}) = {:+.4} (target {:+.4})", x, p, target(*x));
    }

    Ok(())
}

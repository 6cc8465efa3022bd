/// Cosine learning rate scheduler with warmup
use std::f64::consts::PI;

/// Cosine annealing learning rate scheduler configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CosineSchedulerConfig {
    /// Peak learning rate (reached at the end of warmup)
    pub lr_init: f64,
    /// Minimum learning rate (at end of schedule)
    pub lr_min: f64,
    /// Number of warmup steps
    pub warmup_steps: usize,
    /// Total number of training steps
    pub total_steps: usize,
}

impl Default for CosineSchedulerConfig {
    fn default() -> Self {
        Self {
            lr_init: 1e-2,
            lr_min: 1e-4,
            warmup_steps: 0,
            total_steps: 10_000,
        }
    }
}

/// Cosine learning rate scheduler
///
/// - Linear warmup from 0 to lr_init over warmup_steps
/// - Cosine annealing from lr_init to lr_min until total_steps, then flat
pub struct CosineScheduler {
    config: CosineSchedulerConfig,
    current_step: usize,
}

impl CosineScheduler {
    pub fn new(config: CosineSchedulerConfig) -> Self {
        Self {
            config,
            current_step: 0,
        }
    }

    /// Get learning rate for current step
    pub fn get_lr(&self) -> f64 {
        self.get_lr_at_step(self.current_step)
    }

    /// Get learning rate for a specific step
    pub fn get_lr_at_step(&self, step: usize) -> f64 {
        let CosineSchedulerConfig {
            lr_init,
            lr_min,
            warmup_steps,
            total_steps,
        } = self.config;

        if step < warmup_steps {
            return lr_init * (step as f64 / warmup_steps as f64);
        }

        let decay_steps = total_steps.saturating_sub(warmup_steps);
        if decay_steps == 0 {
            return lr_init;
        }

        let progress = ((step - warmup_steps) as f64 / decay_steps as f64).clamp(0.0, 1.0);
        let cosine_factor = 0.5 * (1.0 + (PI * progress).cos());
        lr_min + (lr_init - lr_min) * cosine_factor
    }

    /// Step the scheduler (increment step counter)
    pub fn step(&mut self) {
        self.current_step += 1;
    }

    pub fn get_step(&self) -> usize {
        self.current_step
    }

    /// Jump to a step, e.g. when resuming from a checkpoint
    pub fn set_step(&mut self, step: usize) {
        self.current_step = step;
    }

    pub fn config(&self) -> &CosineSchedulerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(warmup_steps: usize, total_steps: usize) -> CosineScheduler {
        CosineScheduler::new(CosineSchedulerConfig {
            lr_init: 1.0,
            lr_min: 0.0,
            warmup_steps,
            total_steps,
        })
    }

    #[test]
    fn test_warmup_is_linear() {
        let s = scheduler(10, 100);
        approx::assert_abs_diff_eq!(s.get_lr_at_step(0), 0.0);
        approx::assert_abs_diff_eq!(s.get_lr_at_step(5), 0.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(s.get_lr_at_step(10), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cosine_midpoint_and_end() {
        let s = scheduler(0, 100);
        approx::assert_abs_diff_eq!(s.get_lr_at_step(50), 0.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(s.get_lr_at_step(100), 0.0, epsilon = 1e-12);
        // Flat after the schedule ends
        approx::assert_abs_diff_eq!(s.get_lr_at_step(500), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_schedule_holds_peak() {
        let s = scheduler(20, 10);
        approx::assert_abs_diff_eq!(s.get_lr_at_step(25), 1.0);
    }

    #[test]
    fn test_step_and_resume() {
        let mut s = scheduler(0, 100);
        s.step();
        s.step();
        assert_eq!(s.get_step(), 2);

        s.set_step(50);
        approx::assert_abs_diff_eq!(s.get_lr(), 0.5, epsilon = 1e-12);
    }
}

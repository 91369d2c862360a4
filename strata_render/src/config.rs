/// Engine configuration

use crate::bindless::BindlessCapacities;
use crate::descriptor::{default_frame_ratios, PoolSizeRatio};
use crate::descriptor::dynamic_pool::{DEFAULT_INITIAL_SETS_PER_POOL, DEFAULT_MAX_SETS_PER_POOL};
use crate::error::{Error, Result};

/// Configuration the render context and frame slots are built from
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (reported to the backend)
    pub app_name: String,
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Number of frames the CPU may record ahead of the GPU
    pub frames_in_flight: usize,
    /// Size of the first pool each per-frame descriptor allocator creates
    pub initial_sets_per_pool: u32,
    /// Cap on per-frame descriptor pool growth
    pub max_sets_per_pool: u32,
    /// Descriptor type ratios for per-frame pools
    pub frame_pool_ratios: Vec<PoolSizeRatio>,
    /// Array sizes of the bindless set
    pub bindless: BindlessCapacities,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Strata Application".to_string(),
            enable_validation: cfg!(debug_assertions),
            frames_in_flight: 2,
            initial_sets_per_pool: DEFAULT_INITIAL_SETS_PER_POOL,
            max_sets_per_pool: DEFAULT_MAX_SETS_PER_POOL,
            frame_pool_ratios: default_frame_ratios(),
            bindless: BindlessCapacities::default(),
        }
    }
}

impl Config {
    /// Reject configurations the core cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InitializationFailed("frames_in_flight must be at least 1".to_string()));
        }
        if self.initial_sets_per_pool == 0 || self.initial_sets_per_pool > self.max_sets_per_pool {
            return Err(Error::InitializationFailed(format!(
                "initial_sets_per_pool ({}) must be in 1..={}",
                self.initial_sets_per_pool, self.max_sets_per_pool
            )));
        }
        if self.frame_pool_ratios.iter().any(|r| !(r.ratio > 0.0)) {
            return Err(Error::InitializationFailed("pool size ratios must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

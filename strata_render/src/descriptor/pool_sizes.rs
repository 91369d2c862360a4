//! Ratio-based descriptor pool sizing

use crate::device::{DescriptorPoolSize, DescriptorType};

/// Descriptors of one type to reserve per set
///
/// A pool of `max_sets` sets reserves `ceil(ratio * max_sets)` descriptors of
/// `descriptor_type` (at least one).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSizeRatio {
    pub descriptor_type: DescriptorType,
    pub ratio: f32,
}

impl PoolSizeRatio {
    pub const fn new(descriptor_type: DescriptorType, ratio: f32) -> Self {
        Self { descriptor_type, ratio }
    }
}

/// Per-type descriptor counts for a pool of `max_sets` sets
pub fn pool_sizes(ratios: &[PoolSizeRatio], max_sets: u32) -> Vec<DescriptorPoolSize> {
    ratios
        .iter()
        .map(|r| DescriptorPoolSize {
            descriptor_type: r.descriptor_type,
            count: ((r.ratio * max_sets as f32).ceil() as u32).max(1),
        })
        .collect()
}

/// Ratios for per-frame transient sets (uniforms, samplers, storage)
pub fn default_frame_ratios() -> Vec<PoolSizeRatio> {
    vec![
        PoolSizeRatio::new(DescriptorType::UniformBuffer, 3.0),
        PoolSizeRatio::new(DescriptorType::UniformBufferDynamic, 1.0),
        PoolSizeRatio::new(DescriptorType::StorageBuffer, 3.0),
        PoolSizeRatio::new(DescriptorType::StorageImage, 3.0),
        PoolSizeRatio::new(DescriptorType::CombinedImageSampler, 4.0),
        PoolSizeRatio::new(DescriptorType::SampledImage, 2.0),
        PoolSizeRatio::new(DescriptorType::Sampler, 1.0),
    ]
}

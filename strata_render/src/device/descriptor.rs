//! Descriptor types shared by the layout cache, the pools and the backends

use bitflags::bitflags;
use crate::device::handles::{
    BufferHandle, DescriptorSetHandle, ImageViewHandle, SamplerHandle,
};
use crate::device::image::ImageLayout;

/// Kind of resource a descriptor binding holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
}

bitflags! {
    /// Shader stages (values match `VkShaderStageFlags`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x1;
        const FRAGMENT = 0x10;
        const COMPUTE = 0x20;
        const ALL_GRAPHICS = 0x1F;
        const ALL = 0x7FFF_FFFF;
    }
}

bitflags! {
    /// Per-binding flags (values match `VkDescriptorBindingFlags`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DescriptorBindingFlags: u32 {
        const UPDATE_AFTER_BIND = 0x1;
        const PARTIALLY_BOUND = 0x4;
        const VARIABLE_DESCRIPTOR_COUNT = 0x8;
    }
}

bitflags! {
    /// Layout creation flags (values match `VkDescriptorSetLayoutCreateFlags`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DescriptorSetLayoutFlags: u32 {
        const PUSH_DESCRIPTOR = 0x1;
        const UPDATE_AFTER_BIND_POOL = 0x2;
    }
}

bitflags! {
    /// Pool creation flags (values match `VkDescriptorPoolCreateFlags`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DescriptorPoolFlags: u32 {
        const FREE_DESCRIPTOR_SET = 0x1;
        const UPDATE_AFTER_BIND = 0x2;
    }
}

/// One binding slot of a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBinding {
    /// Binding index in the shader
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    /// Array length (1 for non-arrays)
    pub count: u32,
    pub flags: DescriptorBindingFlags,
}

impl DescriptorBinding {
    /// Plain single-descriptor binding with no extra flags
    pub fn new(binding: u32, descriptor_type: DescriptorType) -> Self {
        Self {
            binding,
            descriptor_type,
            count: 1,
            flags: DescriptorBindingFlags::empty(),
        }
    }
}

/// Everything the device needs to build a descriptor set layout
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSetLayoutDesc<'a> {
    pub stages: ShaderStageFlags,
    pub bindings: &'a [DescriptorBinding],
    pub flags: DescriptorSetLayoutFlags,
}

/// Descriptor count of one type in a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorPoolSize {
    pub descriptor_type: DescriptorType,
    pub count: u32,
}

/// Everything the device needs to build a descriptor pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorPoolDesc {
    pub max_sets: u32,
    pub flags: DescriptorPoolFlags,
    pub sizes: Vec<DescriptorPoolSize>,
}

/// Resource written into a descriptor slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorResource {
    /// Sampled, storage or input-attachment image
    Image {
        view: ImageViewHandle,
        layout: ImageLayout,
    },
    /// Image and sampler in one combined descriptor
    CombinedImageSampler {
        view: ImageViewHandle,
        layout: ImageLayout,
        sampler: SamplerHandle,
    },
    Sampler(SamplerHandle),
    Buffer {
        buffer: BufferHandle,
        offset: u64,
        range: u64,
    },
}

/// One descriptor update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorWrite {
    pub set: DescriptorSetHandle,
    pub binding: u32,
    pub array_element: u32,
    pub descriptor_type: DescriptorType,
    pub resource: DescriptorResource,
}

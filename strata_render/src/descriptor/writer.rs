/// Batched descriptor writes
///
/// Collects image, sampler and buffer writes and applies them with one
/// `update_descriptor_sets` call.

use crate::error::Result;
use crate::device::{
    BufferHandle, DescriptorResource, DescriptorSetHandle, DescriptorType, DescriptorWrite,
    GraphicsDevice, ImageLayout, ImageViewHandle, SamplerHandle,
};

#[derive(Debug, Default)]
pub struct DescriptorWriter {
    writes: Vec<DescriptorWrite>,
}

impl DescriptorWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sampled, storage or input-attachment image
    pub fn write_image(
        &mut self,
        set: DescriptorSetHandle,
        binding: u32,
        array_element: u32,
        descriptor_type: DescriptorType,
        view: ImageViewHandle,
        layout: ImageLayout,
    ) -> &mut Self {
        self.writes.push(DescriptorWrite {
            set,
            binding,
            array_element,
            descriptor_type,
            resource: DescriptorResource::Image { view, layout },
        });
        self
    }

    /// Queue an image + sampler pair
    pub fn write_combined_image_sampler(
        &mut self,
        set: DescriptorSetHandle,
        binding: u32,
        array_element: u32,
        view: ImageViewHandle,
        layout: ImageLayout,
        sampler: SamplerHandle,
    ) -> &mut Self {
        self.writes.push(DescriptorWrite {
            set,
            binding,
            array_element,
            descriptor_type: DescriptorType::CombinedImageSampler,
            resource: DescriptorResource::CombinedImageSampler { view, layout, sampler },
        });
        self
    }

    pub fn write_sampler(
        &mut self,
        set: DescriptorSetHandle,
        binding: u32,
        array_element: u32,
        sampler: SamplerHandle,
    ) -> &mut Self {
        self.writes.push(DescriptorWrite {
            set,
            binding,
            array_element,
            descriptor_type: DescriptorType::Sampler,
            resource: DescriptorResource::Sampler(sampler),
        });
        self
    }

    /// Queue a uniform or storage buffer range
    pub fn write_buffer(
        &mut self,
        set: DescriptorSetHandle,
        binding: u32,
        descriptor_type: DescriptorType,
        buffer: BufferHandle,
        offset: u64,
        range: u64,
    ) -> &mut Self {
        self.writes.push(DescriptorWrite {
            set,
            binding,
            array_element: 0,
            descriptor_type,
            resource: DescriptorResource::Buffer { buffer, offset, range },
        });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Drop queued writes without applying them
    pub fn clear(&mut self) {
        self.writes.clear();
    }

    /// Apply every queued write in one device call and empty the queue
    ///
    /// Does nothing when the queue is empty.
    pub fn flush(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.writes.is_empty() {
            return Ok(());
        }
        device.update_descriptor_sets(&self.writes)?;
        self.writes.clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;

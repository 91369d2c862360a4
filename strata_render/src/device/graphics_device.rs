/// GraphicsDevice trait - the device capability the core is built on
///
/// Implemented by backend-specific devices (e.g. `VulkanGraphicsDevice`).
/// Every object crosses this boundary as a `u64` newtype handle; the core
/// never sees backend types. Shared as `Arc<Mutex<dyn GraphicsDevice>>`.

use std::sync::{Arc, Mutex};
use crate::error::Result;
use crate::device::command_list::CommandList;
use crate::device::descriptor::{DescriptorPoolDesc, DescriptorSetLayoutDesc, DescriptorWrite};
use crate::device::handles::*;
use crate::device::image::PipelineStages;
use crate::device::pipeline::{ComputePipelineDesc, GraphicsPipelineDesc, PipelineLayoutDesc};

/// Semaphore a submission waits on, and the stages that wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaphoreWait {
    pub semaphore: SemaphoreHandle,
    pub stages: PipelineStages,
}

/// Main device trait
///
/// Factory for pipelines, layouts, pools, command lists and sync objects.
pub trait GraphicsDevice: Send + Sync {
    // ===== SHADERS & PIPELINES =====

    /// Create a shader module from SPIR-V words produced by the shader compiler
    fn create_shader_module(&mut self, code: &[u32]) -> Result<ShaderHandle>;

    /// Create a descriptor set layout
    fn create_descriptor_set_layout(&mut self, desc: &DescriptorSetLayoutDesc) -> Result<DescriptorSetLayoutHandle>;

    /// Create a pipeline layout from set layouts and push constant ranges
    fn create_pipeline_layout(&mut self, desc: &PipelineLayoutDesc) -> Result<PipelineLayoutHandle>;

    /// Create a graphics pipeline (dynamic rendering, viewport/scissor dynamic)
    fn create_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc) -> Result<PipelineHandle>;

    /// Create a compute pipeline
    fn create_compute_pipeline(&mut self, desc: &ComputePipelineDesc) -> Result<PipelineHandle>;

    // ===== DESCRIPTORS =====

    /// Create a descriptor pool
    fn create_descriptor_pool(&mut self, desc: &DescriptorPoolDesc) -> Result<DescriptorPoolHandle>;

    /// Allocate one set per layout from `pool`
    ///
    /// # Returns
    ///
    /// The sets in layout order, or `Error::OutOfPoolMemory` /
    /// `Error::FragmentedPool` when the pool cannot satisfy the request.
    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>>;

    /// Return every set allocated from `pool` to it
    fn reset_descriptor_pool(&mut self, pool: DescriptorPoolHandle) -> Result<()>;

    /// Apply a batch of descriptor writes
    fn update_descriptor_sets(&mut self, writes: &[DescriptorWrite]) -> Result<()>;

    // ===== COMMANDS & SYNC =====

    /// Create a primary command list
    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>>;

    /// Create a fence, optionally already signalled
    fn create_fence(&mut self, signaled: bool) -> Result<FenceHandle>;

    /// Create a binary semaphore
    fn create_semaphore(&mut self) -> Result<SemaphoreHandle>;

    /// Return a fence to the unsignalled state
    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()>;

    /// Block until `fence` is signalled or `timeout_ns` elapses
    fn wait_fence(&self, fence: FenceHandle, timeout_ns: u64) -> Result<()>;

    /// Submit recorded command lists
    ///
    /// # Arguments
    ///
    /// * `commands` - Command lists in submission order
    /// * `waits` - Semaphores to wait on before execution
    /// * `signals` - Semaphores to signal on completion
    /// * `fence` - Fence to signal on completion
    fn submit(
        &mut self,
        commands: &[&dyn CommandList],
        waits: &[SemaphoreWait],
        signals: &[SemaphoreHandle],
        fence: Option<FenceHandle>,
    ) -> Result<()>;

    /// Wait for all GPU work to finish
    fn wait_idle(&self) -> Result<()>;

    // ===== DESTRUCTION =====

    fn destroy_shader_module(&mut self, shader: ShaderHandle);
    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutHandle);
    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutHandle);
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);
    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolHandle);
    fn destroy_fence(&mut self, fence: FenceHandle);
    fn destroy_semaphore(&mut self, semaphore: SemaphoreHandle);
}

/// How the core shares one device between its components
pub type SharedDevice = Arc<Mutex<dyn GraphicsDevice>>;

/// Mock graphics device for unit tests (no GPU required)
///
/// Hands out sequential handles, counts every call, models descriptor pool
/// capacity per descriptor type, and lets tests inject allocation and
/// pipeline-creation failures. Command lists record their commands as strings
/// and keep every barrier they receive.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::device::{
    BufferHandle, CommandList, ComputePipelineDesc, DescriptorBinding, DescriptorPoolDesc,
    DescriptorPoolHandle, DescriptorSetHandle, DescriptorSetLayoutDesc,
    DescriptorSetLayoutHandle, DescriptorType, DescriptorWrite, FenceHandle, GraphicsDevice,
    GraphicsPipelineDesc, ImageBarrier, IndexType, PipelineHandle, PipelineLayoutDesc,
    PipelineLayoutHandle, Rect2D, RenderingInfo, SemaphoreHandle, SemaphoreWait, ShaderHandle,
    ShaderStageFlags, Viewport,
};
use crate::pipeline::PipelineBinding;

/// Shared, ordered record of device and command list calls
pub type EventLog = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Debug)]
pub struct MockCommandList {
    pub commands: Vec<String>,
    pub barriers: Vec<ImageBarrier>,
    pub bound_pipelines: Vec<PipelineBinding>,
    pub recording: bool,
    handle: u64,
    events: Option<EventLog>,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            barriers: Vec::new(),
            bound_pipelines: Vec::new(),
            recording: false,
            handle: 0xC0FFEE,
            events: None,
        }
    }

    fn with_events(handle: u64, events: EventLog) -> Self {
        Self { handle, events: Some(events), ..Self::new() }
    }

    fn push(&mut self, command: String) {
        if let Some(events) = &self.events {
            if let Ok(mut events) = events.lock() {
                events.push(format!("cmd.{}", command));
            }
        }
        self.commands.push(command);
    }

    /// Commands whose name starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl Default for MockCommandList {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.recording = true;
        self.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError("end() without begin()".to_string()));
        }
        self.recording = false;
        self.push("end".to_string());
        Ok(())
    }

    fn native_handle(&self) -> u64 {
        self.handle
    }

    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier]) -> Result<()> {
        self.barriers.extend_from_slice(barriers);
        self.push(format!("pipeline_barrier({})", barriers.len()));
        Ok(())
    }

    fn begin_rendering(&mut self, info: &RenderingInfo) -> Result<()> {
        self.push(format!(
            "begin_rendering(color={}, depth={})",
            info.color_attachments.len(),
            info.depth_attachment.is_some()
        ));
        Ok(())
    }

    fn end_rendering(&mut self) -> Result<()> {
        self.push("end_rendering".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.push(format!("set_viewport({}x{})", viewport.width, viewport.height));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.push(format!("set_scissor({}x{})", scissor.width, scissor.height));
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &PipelineBinding) -> Result<()> {
        self.bound_pipelines.push(*pipeline);
        self.push(format!("bind_pipeline({})", pipeline.pipeline.as_raw()));
        Ok(())
    }

    fn bind_descriptor_sets(
        &mut self,
        _pipeline: &PipelineBinding,
        first_set: u32,
        sets: &[DescriptorSetHandle],
    ) -> Result<()> {
        self.push(format!("bind_descriptor_sets(first={}, count={})", first_set, sets.len()));
        Ok(())
    }

    fn push_constants(
        &mut self,
        _pipeline: &PipelineBinding,
        _stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        self.push(format!("push_constants(offset={}, size={})", offset, data.len()));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()> {
        self.push(format!("bind_vertex_buffer({}, {})", buffer.as_raw(), offset));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()> {
        self.push(format!("bind_index_buffer({}, {}, {:?})", buffer.as_raw(), offset, index_type));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.push(format!("draw({}, {})", vertex_count, first_vertex));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.push(format!("draw_indexed({}, {}, {})", index_count, first_index, vertex_offset));
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.push(format!("dispatch({}, {}, {})", x, y, z));
        Ok(())
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Number of calls per device method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCallCounts {
    pub create_shader_module: u32,
    pub create_descriptor_set_layout: u32,
    pub create_pipeline_layout: u32,
    pub create_graphics_pipeline: u32,
    pub create_compute_pipeline: u32,
    pub create_descriptor_pool: u32,
    pub allocate_descriptor_sets: u32,
    pub reset_descriptor_pool: u32,
    pub update_descriptor_sets: u32,
    pub descriptor_writes: u32,
    pub create_command_list: u32,
    pub create_fence: u32,
    pub create_semaphore: u32,
    pub reset_fence: u32,
    pub submit: u32,
    pub destroy_descriptor_set_layout: u32,
    pub destroy_pipeline_layout: u32,
    pub destroy_pipeline: u32,
    pub destroy_descriptor_pool: u32,
    pub destroy_fence: u32,
}

#[derive(Debug)]
struct MockPool {
    desc: DescriptorPoolDesc,
    allocated_sets: u32,
    used: FxHashMap<DescriptorType, u32>,
}

/// One `submit` call
#[derive(Debug, Clone)]
pub struct MockSubmit {
    pub command_lists: Vec<u64>,
    pub waits: Vec<SemaphoreWait>,
    pub signals: Vec<SemaphoreHandle>,
    pub fence: Option<FenceHandle>,
}

pub struct MockGraphicsDevice {
    pub counts: MockCallCounts,
    /// Every descriptor write applied, in order
    pub writes: Vec<DescriptorWrite>,
    pub submits: Vec<MockSubmit>,
    /// Pool descriptors in creation order
    pub created_pools: Vec<DescriptorPoolDesc>,
    /// Errors returned by the next `allocate_descriptor_sets` calls, in order
    pub allocation_failures: VecDeque<Error>,
    /// When set, pipeline creation fails with this error
    pub pipeline_failure: Option<Error>,
    /// Error returned by the next `reset_descriptor_pool` call
    pub pool_reset_failure: Option<Error>,
    /// Error returned by the next `reset_fence` call
    pub fence_reset_failure: Option<Error>,
    pub events: EventLog,
    next_handle: u64,
    pools: FxHashMap<DescriptorPoolHandle, MockPool>,
    layouts: FxHashMap<DescriptorSetLayoutHandle, Vec<DescriptorBinding>>,
    fences: Mutex<FxHashMap<FenceHandle, bool>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            counts: MockCallCounts::default(),
            writes: Vec::new(),
            submits: Vec::new(),
            created_pools: Vec::new(),
            allocation_failures: VecDeque::new(),
            pipeline_failure: None,
            pool_reset_failure: None,
            fence_reset_failure: None,
            events: Arc::new(Mutex::new(Vec::new())),
            next_handle: 1,
            pools: FxHashMap::default(),
            layouts: FxHashMap::default(),
            fences: Mutex::new(FxHashMap::default()),
        }
    }

    /// Make the next `allocate_descriptor_sets` call fail with `error`
    pub fn fail_next_allocation(&mut self, error: Error) {
        self.allocation_failures.push_back(error);
    }

    /// Recorded events (device calls and command list commands)
    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn live_pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Sets currently allocated from `pool`
    pub fn allocated_sets(&self, pool: DescriptorPoolHandle) -> u32 {
        self.pools.get(&pool).map(|p| p.allocated_sets).unwrap_or(0)
    }

    pub fn is_fence_signaled(&self, fence: FenceHandle) -> bool {
        self.fences
            .lock()
            .map(|f| f.get(&fence).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Force a fence state (simulates GPU progress)
    pub fn set_fence_signaled(&self, fence: FenceHandle, signaled: bool) {
        if let Ok(mut fences) = self.fences.lock() {
            fences.insert(fence, signaled);
        }
    }

    fn next(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn event(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_shader_module(&mut self, code: &[u32]) -> Result<ShaderHandle> {
        if code.is_empty() {
            return Err(Error::InvalidResource("empty SPIR-V".to_string()));
        }
        self.counts.create_shader_module += 1;
        Ok(ShaderHandle::from_raw(self.next()))
    }

    fn create_descriptor_set_layout(&mut self, desc: &DescriptorSetLayoutDesc) -> Result<DescriptorSetLayoutHandle> {
        self.counts.create_descriptor_set_layout += 1;
        let handle = DescriptorSetLayoutHandle::from_raw(self.next());
        self.layouts.insert(handle, desc.bindings.to_vec());
        Ok(handle)
    }

    fn create_pipeline_layout(&mut self, _desc: &PipelineLayoutDesc) -> Result<PipelineLayoutHandle> {
        self.counts.create_pipeline_layout += 1;
        Ok(PipelineLayoutHandle::from_raw(self.next()))
    }

    fn create_graphics_pipeline(&mut self, _desc: &GraphicsPipelineDesc) -> Result<PipelineHandle> {
        self.counts.create_graphics_pipeline += 1;
        if let Some(error) = &self.pipeline_failure {
            return Err(error.clone());
        }
        Ok(PipelineHandle::from_raw(self.next()))
    }

    fn create_compute_pipeline(&mut self, _desc: &ComputePipelineDesc) -> Result<PipelineHandle> {
        self.counts.create_compute_pipeline += 1;
        if let Some(error) = &self.pipeline_failure {
            return Err(error.clone());
        }
        Ok(PipelineHandle::from_raw(self.next()))
    }

    fn create_descriptor_pool(&mut self, desc: &DescriptorPoolDesc) -> Result<DescriptorPoolHandle> {
        self.counts.create_descriptor_pool += 1;
        let handle = DescriptorPoolHandle::from_raw(self.next());
        self.created_pools.push(desc.clone());
        self.pools.insert(handle, MockPool {
            desc: desc.clone(),
            allocated_sets: 0,
            used: FxHashMap::default(),
        });
        self.event(format!("create_descriptor_pool({})", desc.max_sets));
        Ok(handle)
    }

    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>> {
        self.counts.allocate_descriptor_sets += 1;
        self.event(format!("allocate_descriptor_sets({})", pool.as_raw()));

        if let Some(error) = self.allocation_failures.pop_front() {
            return Err(error);
        }

        // Descriptors needed per type
        let mut needed: FxHashMap<DescriptorType, u32> = FxHashMap::default();
        for layout in layouts {
            let bindings = self.layouts.get(layout).ok_or_else(|| {
                Error::InvalidResource(format!("unknown layout {}", layout.as_raw()))
            })?;
            for binding in bindings {
                *needed.entry(binding.descriptor_type).or_insert(0) += binding.count;
            }
        }

        let state = self.pools.get_mut(&pool).ok_or_else(|| {
            Error::InvalidResource(format!("unknown pool {}", pool.as_raw()))
        })?;

        if state.allocated_sets + layouts.len() as u32 > state.desc.max_sets {
            return Err(Error::OutOfPoolMemory);
        }
        for (ty, count) in &needed {
            let capacity = state.desc.sizes.iter()
                .filter(|s| s.descriptor_type == *ty)
                .map(|s| s.count)
                .sum::<u32>();
            let used = state.used.get(ty).copied().unwrap_or(0);
            if used + count > capacity {
                return Err(Error::OutOfPoolMemory);
            }
        }

        state.allocated_sets += layouts.len() as u32;
        for (ty, count) in needed {
            *state.used.entry(ty).or_insert(0) += count;
        }

        let sets = (0..layouts.len())
            .map(|_| {
                let raw = self.next_handle;
                self.next_handle += 1;
                DescriptorSetHandle::from_raw(raw)
            })
            .collect();
        Ok(sets)
    }

    fn reset_descriptor_pool(&mut self, pool: DescriptorPoolHandle) -> Result<()> {
        self.counts.reset_descriptor_pool += 1;
        self.event(format!("reset_descriptor_pool({})", pool.as_raw()));
        if let Some(error) = self.pool_reset_failure.take() {
            return Err(error);
        }
        let state = self.pools.get_mut(&pool).ok_or_else(|| {
            Error::InvalidResource(format!("unknown pool {}", pool.as_raw()))
        })?;
        state.allocated_sets = 0;
        state.used.clear();
        Ok(())
    }

    fn update_descriptor_sets(&mut self, writes: &[DescriptorWrite]) -> Result<()> {
        self.counts.update_descriptor_sets += 1;
        self.counts.descriptor_writes += writes.len() as u32;
        self.writes.extend_from_slice(writes);
        Ok(())
    }

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        self.counts.create_command_list += 1;
        let handle = self.next();
        Ok(Box::new(MockCommandList::with_events(handle, self.events.clone())))
    }

    fn create_fence(&mut self, signaled: bool) -> Result<FenceHandle> {
        self.counts.create_fence += 1;
        let fence = FenceHandle::from_raw(self.next());
        self.set_fence_signaled(fence, signaled);
        Ok(fence)
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreHandle> {
        self.counts.create_semaphore += 1;
        Ok(SemaphoreHandle::from_raw(self.next()))
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        self.counts.reset_fence += 1;
        self.event(format!("reset_fence({})", fence.as_raw()));
        if let Some(error) = self.fence_reset_failure.take() {
            return Err(error);
        }
        self.set_fence_signaled(fence, false);
        Ok(())
    }

    fn wait_fence(&self, fence: FenceHandle, _timeout_ns: u64) -> Result<()> {
        self.event(format!("wait_fence({})", fence.as_raw()));
        if self.is_fence_signaled(fence) {
            Ok(())
        } else {
            // A real device would block here until the GPU signals
            Err(Error::BackendError(format!("fence {} never signalled", fence.as_raw())))
        }
    }

    fn submit(
        &mut self,
        commands: &[&dyn CommandList],
        waits: &[SemaphoreWait],
        signals: &[SemaphoreHandle],
        fence: Option<FenceHandle>,
    ) -> Result<()> {
        self.counts.submit += 1;
        self.event("submit".to_string());
        self.submits.push(MockSubmit {
            command_lists: commands.iter().map(|c| c.native_handle()).collect(),
            waits: waits.to_vec(),
            signals: signals.to_vec(),
            fence,
        });
        // The mock GPU finishes instantly
        if let Some(fence) = fence {
            self.set_fence_signaled(fence, true);
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }

    fn destroy_shader_module(&mut self, _shader: ShaderHandle) {}

    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutHandle) {
        self.counts.destroy_descriptor_set_layout += 1;
        self.layouts.remove(&layout);
    }

    fn destroy_pipeline_layout(&mut self, _layout: PipelineLayoutHandle) {
        self.counts.destroy_pipeline_layout += 1;
    }

    fn destroy_pipeline(&mut self, _pipeline: PipelineHandle) {
        self.counts.destroy_pipeline += 1;
    }

    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolHandle) {
        self.counts.destroy_descriptor_pool += 1;
        self.pools.remove(&pool);
    }

    fn destroy_fence(&mut self, fence: FenceHandle) {
        self.counts.destroy_fence += 1;
        if let Ok(mut fences) = self.fences.lock() {
            fences.remove(&fence);
        }
    }

    fn destroy_semaphore(&mut self, _semaphore: SemaphoreHandle) {}
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;

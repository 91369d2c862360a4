/// Pass action trait and implementations.
///
/// Defines what a pass records once the graph has emitted its barriers
/// (and, for render passes, opened the rendering scope).

use bytemuck::Pod;

use crate::context::RenderContext;
use crate::device::{CommandList, DescriptorSetHandle, DescriptorSetLayoutHandle};
use crate::error::Result;
use crate::pipeline::{ComputePipelineDefinition, GraphicsPipelineDefinition, PipelineBinding, TargetInfo};

/// What a pass action gets to record with
pub struct PassContext<'a> {
    /// Command list the frame is recorded into
    pub cmd: &'a mut dyn CommandList,
    context: &'a RenderContext,
    target: &'a TargetInfo,
    extent: (u32, u32),
}

impl<'a> PassContext<'a> {
    pub(crate) fn new(
        cmd: &'a mut dyn CommandList,
        context: &'a RenderContext,
        target: &'a TargetInfo,
        extent: (u32, u32),
    ) -> Self {
        Self { cmd, context, target, extent }
    }

    pub fn context(&self) -> &RenderContext {
        self.context
    }

    /// Formats of the attachments this pass renders into (empty for compute)
    pub fn target(&self) -> &TargetInfo {
        self.target
    }

    /// Render area of the pass, `(0, 0)` for compute
    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    /// Cached pipeline for `definition` against this pass's attachments
    pub fn fetch_graphics_pipeline(&self, definition: &GraphicsPipelineDefinition) -> Result<PipelineBinding> {
        self.context.fetch_graphics_pipeline(definition, self.target)
    }

    pub fn fetch_compute_pipeline(&self, definition: &ComputePipelineDefinition) -> Result<PipelineBinding> {
        self.context.fetch_compute_pipeline(definition)
    }

    /// The bindless descriptor set and its layout
    pub fn bindless_set(&self) -> Result<(DescriptorSetHandle, DescriptorSetLayoutHandle)> {
        self.context.bindless_set()
    }
}

/// Action executed by a pass
///
/// Determines what commands are recorded for the pass.
pub trait PassAction: Send + Sync {
    /// Record commands for the pass
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<()>;
}

/// Fullscreen pass action (data-driven, no closure)
///
/// Fetches its pipeline, binds it with one descriptor set at set 0, then
/// draws a fullscreen triangle (3 vertices). Used for post-processing passes
/// (bloom, blur, tone mapping, etc.).
pub struct FullscreenAction {
    definition: GraphicsPipelineDefinition,
    descriptor_set: DescriptorSetHandle,
    push_constants: Vec<u8>,
}

impl FullscreenAction {
    pub fn new(definition: GraphicsPipelineDefinition, descriptor_set: DescriptorSetHandle) -> Self {
        Self { definition, descriptor_set, push_constants: Vec::new() }
    }

    /// Push `data` before drawing; the pipeline layout is sized to match
    pub fn with_push_constants<T: Pod>(mut self, data: &T) -> Self {
        self.push_constants = bytemuck::bytes_of(data).to_vec();
        self.definition.push_constant_size = self.push_constants.len() as u32;
        self
    }
}

impl PassAction for FullscreenAction {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let binding = ctx.fetch_graphics_pipeline(&self.definition)?;
        ctx.cmd.bind_pipeline(&binding)?;
        ctx.cmd.bind_descriptor_sets(&binding, 0, &[self.descriptor_set])?;
        if !self.push_constants.is_empty() {
            ctx.cmd.push_constants(&binding, self.definition.shader_stages(), 0, &self.push_constants)?;
        }
        ctx.cmd.draw(3, 0)
    }
}

/// Compute dispatch action (data-driven, no closure)
///
/// Fetches its pipeline, binds the given sets starting at set 0 and
/// dispatches a fixed group count.
pub struct DispatchAction {
    definition: ComputePipelineDefinition,
    descriptor_sets: Vec<DescriptorSetHandle>,
    push_constants: Vec<u8>,
    groups: [u32; 3],
}

impl DispatchAction {
    pub fn new(
        definition: ComputePipelineDefinition,
        descriptor_sets: Vec<DescriptorSetHandle>,
        groups: [u32; 3],
    ) -> Self {
        Self { definition, descriptor_sets, push_constants: Vec::new(), groups }
    }

    pub fn with_push_constants<T: Pod>(mut self, data: &T) -> Self {
        self.push_constants = bytemuck::bytes_of(data).to_vec();
        self.definition.push_constant_size = self.push_constants.len() as u32;
        self
    }
}

impl PassAction for DispatchAction {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let binding = ctx.fetch_compute_pipeline(&self.definition)?;
        ctx.cmd.bind_pipeline(&binding)?;
        if !self.descriptor_sets.is_empty() {
            ctx.cmd.bind_descriptor_sets(&binding, 0, &self.descriptor_sets)?;
        }
        if !self.push_constants.is_empty() {
            ctx.cmd.push_constants(&binding, self.definition.shader_stages(), 0, &self.push_constants)?;
        }
        let [x, y, z] = self.groups;
        ctx.cmd.dispatch(x, y, z)
    }
}

/// Custom pass action (closure-based)
///
/// Executes a user-provided closure for full control over command
/// recording. Used for scene rendering passes (geometry, shadows, etc.).
pub struct CustomAction {
    callback: Box<dyn FnMut(&mut PassContext<'_>) -> Result<()> + Send + Sync>,
}

impl CustomAction {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&mut PassContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self { callback: Box::new(callback) }
    }
}

impl PassAction for CustomAction {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        (self.callback)(ctx)
    }
}

/// CommandList trait - records one GPU command stream
///
/// Commands are recorded and later submitted to the GPU via
/// `GraphicsDevice::submit()`. Render passes use dynamic rendering:
/// attachments are given to `begin_rendering` directly, no render pass or
/// framebuffer objects exist.

use crate::error::Result;
use crate::device::buffer::IndexType;
use crate::device::descriptor::ShaderStageFlags;
use crate::device::handles::{BufferHandle, DescriptorSetHandle, ImageViewHandle};
use crate::device::image::{ImageBarrier, ImageLayout};
use crate::pipeline::PipelineBinding;

/// Command list for recording rendering commands
pub trait CommandList: Send + Sync {
    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Backend command buffer handle
    fn native_handle(&self) -> u64;

    /// Record image state transitions as one barrier batch
    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier]) -> Result<()>;

    /// Begin a dynamic rendering scope
    ///
    /// # Arguments
    ///
    /// * `info` - Render area, colour attachments and optional depth attachment
    fn begin_rendering(&mut self, info: &RenderingInfo) -> Result<()>;

    /// End the current rendering scope
    fn end_rendering(&mut self) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind a graphics or compute pipeline at its bind point
    fn bind_pipeline(&mut self, pipeline: &PipelineBinding) -> Result<()>;

    /// Bind descriptor sets starting at `first_set`
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline whose layout the sets are bound against
    /// * `first_set` - Set index of `sets[0]` (0 = per-frame, 1 = per-material, etc.)
    /// * `sets` - Descriptor sets to bind
    fn bind_descriptor_sets(
        &mut self,
        pipeline: &PipelineBinding,
        first_set: u32,
        sets: &[DescriptorSetHandle],
    ) -> Result<()>;

    /// Push constants to the pipeline
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline whose layout declares the range
    /// * `stages` - Shader stages that will access the push constants
    /// * `offset` - Offset in bytes into push constant range
    /// * `data` - Data to push
    fn push_constants(
        &mut self,
        pipeline: &PipelineBinding,
        stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()>;

    /// Bind a vertex buffer at binding 0
    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw vertices
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Number of vertices to draw
    /// * `first_vertex` - Index of first vertex
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Dispatch compute work groups
    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) -> Result<()>;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with depth range [0, 1]
    pub fn from_extent(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_extent(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// What happens to attachment contents when rendering begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

/// What happens to attachment contents when rendering ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// Multisample resolve destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveTarget {
    pub view: ImageViewHandle,
    pub layout: ImageLayout,
}

/// One attachment of a dynamic rendering scope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderingAttachment {
    pub view: ImageViewHandle,
    pub layout: ImageLayout,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear: ClearValue,
    pub resolve: Option<ResolveTarget>,
}

/// Arguments of `CommandList::begin_rendering`
#[derive(Debug, Clone, PartialEq)]
pub struct RenderingInfo {
    pub render_area: Rect2D,
    pub color_attachments: Vec<RenderingAttachment>,
    pub depth_attachment: Option<RenderingAttachment>,
}

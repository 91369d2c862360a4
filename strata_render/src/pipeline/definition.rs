//! Pipeline definitions: the declared state a pipeline is built from
//!
//! Definitions are transient values. Only the GPU objects created from them
//! are cached, keyed by a content hash of the definition.

use crate::device::{
    ColorBlendState, DepthStencilState, DescriptorSetLayoutHandle, MultisampleState,
    PipelineBindPoint, PipelineHandle, PipelineLayoutHandle, PrimitiveTopology,
    PushConstantRange, RasterizationState, SampleCount, ShaderEntry, ShaderStageFlags,
    TextureFormat, VertexLayout,
};

/// Desired state of a graphics pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsPipelineDefinition {
    pub vertex_shader: ShaderEntry,
    /// None for depth-only passes
    pub fragment_shader: Option<ShaderEntry>,
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub rasterization: RasterizationState,
    pub depth_stencil: DepthStencilState,
    pub color_blend: ColorBlendState,
    pub multisample: MultisampleState,
    /// Bytes of push constants visible to every stage (0 = none)
    pub push_constant_size: u32,
    /// Set layouts in set-index order
    pub descriptor_set_layouts: Vec<DescriptorSetLayoutHandle>,
}

impl GraphicsPipelineDefinition {
    /// Definition with default fixed-function state and no vertex input
    pub fn new(vertex_shader: ShaderEntry, fragment_shader: Option<ShaderEntry>) -> Self {
        Self {
            vertex_shader,
            fragment_shader,
            vertex_layout: VertexLayout::default(),
            topology: PrimitiveTopology::TriangleList,
            rasterization: RasterizationState::default(),
            depth_stencil: DepthStencilState::default(),
            color_blend: ColorBlendState::default(),
            multisample: MultisampleState::default(),
            push_constant_size: 0,
            descriptor_set_layouts: Vec::new(),
        }
    }

    /// Stages present in this pipeline
    pub fn shader_stages(&self) -> ShaderStageFlags {
        if self.fragment_shader.is_some() {
            ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT
        } else {
            ShaderStageFlags::VERTEX
        }
    }

    pub fn push_constant_ranges(&self) -> Vec<PushConstantRange> {
        push_constant_ranges(self.shader_stages(), self.push_constant_size)
    }
}

/// Desired state of a compute pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputePipelineDefinition {
    pub shader: ShaderEntry,
    pub push_constant_size: u32,
    pub descriptor_set_layouts: Vec<DescriptorSetLayoutHandle>,
}

impl ComputePipelineDefinition {
    pub fn new(shader: ShaderEntry) -> Self {
        Self {
            shader,
            push_constant_size: 0,
            descriptor_set_layouts: Vec::new(),
        }
    }

    pub fn shader_stages(&self) -> ShaderStageFlags {
        ShaderStageFlags::COMPUTE
    }

    pub fn push_constant_ranges(&self) -> Vec<PushConstantRange> {
        push_constant_ranges(self.shader_stages(), self.push_constant_size)
    }
}

fn push_constant_ranges(stages: ShaderStageFlags, size: u32) -> Vec<PushConstantRange> {
    if size == 0 {
        Vec::new()
    } else {
        vec![PushConstantRange { stages, offset: 0, size }]
    }
}

/// Formats and sample count of the attachments a pipeline renders into
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetInfo {
    /// Colour attachment formats in attachment order
    pub color_formats: Vec<TextureFormat>,
    pub depth_format: Option<TextureFormat>,
    pub sample_count: SampleCount,
}

impl TargetInfo {
    /// Single-sampled colour targets, no depth
    pub fn color(formats: &[TextureFormat]) -> Self {
        Self {
            color_formats: formats.to_vec(),
            depth_format: None,
            sample_count: SampleCount::S1,
        }
    }

    pub fn with_depth(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_samples(mut self, sample_count: SampleCount) -> Self {
        self.sample_count = sample_count;
        self
    }
}

impl Default for TargetInfo {
    fn default() -> Self {
        Self {
            color_formats: Vec::new(),
            depth_format: None,
            sample_count: SampleCount::S1,
        }
    }
}

/// A cached pipeline together with the layout it was built against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineBinding {
    pub pipeline: PipelineHandle,
    pub layout: PipelineLayoutHandle,
    pub bind_point: PipelineBindPoint,
}

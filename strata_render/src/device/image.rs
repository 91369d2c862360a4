//! Image formats, layouts and tracked resource state
//!
//! `ResourceState` is the unit the render graph tracks per image: where in
//! the pipeline the image was last touched, how, and in which layout.
//! Stage and access bit values match Vulkan's `*Flags2` so backends can
//! convert with a raw cast.

use bitflags::bitflags;
use crate::device::handles::ImageHandle;

/// Image formats used for attachments and sampled textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,
    R32_SFLOAT,
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

impl TextureFormat {
    /// Whether this format carries a depth component
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM
                | TextureFormat::D32_FLOAT
                | TextureFormat::D24_UNORM_S8_UINT
                | TextureFormat::D32_FLOAT_S8_UINT
        )
    }

    /// Whether this format carries a stencil component
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT)
    }

    /// Aspects a barrier on an image of this format must cover
    pub fn aspect(&self) -> ImageAspect {
        if self.has_stencil() {
            ImageAspect::DEPTH | ImageAspect::STENCIL
        } else if self.is_depth() {
            ImageAspect::DEPTH
        } else {
            ImageAspect::COLOR
        }
    }
}

/// Image memory layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    ColorAttachment,
    DepthStencilAttachment,
    DepthStencilReadOnly,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

bitflags! {
    /// Pipeline stages (values match `VkPipelineStageFlags2`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u64 {
        const TOP_OF_PIPE = 0x1;
        const DRAW_INDIRECT = 0x2;
        const VERTEX_INPUT = 0x4;
        const VERTEX_SHADER = 0x8;
        const FRAGMENT_SHADER = 0x80;
        const EARLY_FRAGMENT_TESTS = 0x100;
        const LATE_FRAGMENT_TESTS = 0x200;
        const COLOR_ATTACHMENT_OUTPUT = 0x400;
        const COMPUTE_SHADER = 0x800;
        const TRANSFER = 0x1000;
        const BOTTOM_OF_PIPE = 0x2000;
        const ALL_GRAPHICS = 0x8000;
        const ALL_COMMANDS = 0x10000;
    }
}

bitflags! {
    /// Memory access kinds (values match `VkAccessFlags2`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u64 {
        const INPUT_ATTACHMENT_READ = 0x10;
        const SHADER_READ = 0x20;
        const SHADER_WRITE = 0x40;
        const COLOR_ATTACHMENT_READ = 0x80;
        const COLOR_ATTACHMENT_WRITE = 0x100;
        const DEPTH_STENCIL_ATTACHMENT_READ = 0x200;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 0x400;
        const TRANSFER_READ = 0x800;
        const TRANSFER_WRITE = 0x1000;
        const MEMORY_READ = 0x8000;
        const MEMORY_WRITE = 0x10000;
        const SHADER_SAMPLED_READ = 0x1_0000_0000;
        const SHADER_STORAGE_READ = 0x2_0000_0000;
        const SHADER_STORAGE_WRITE = 0x4_0000_0000;
    }
}

impl AccessFlags {
    /// Every access kind that writes memory
    pub const ANY_WRITE: Self = Self::SHADER_WRITE
        .union(Self::COLOR_ATTACHMENT_WRITE)
        .union(Self::DEPTH_STENCIL_ATTACHMENT_WRITE)
        .union(Self::TRANSFER_WRITE)
        .union(Self::MEMORY_WRITE)
        .union(Self::SHADER_STORAGE_WRITE);
}

bitflags! {
    /// Image aspects covered by a barrier (values match `VkImageAspectFlags`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageAspect: u32 {
        const COLOR = 0x1;
        const DEPTH = 0x2;
        const STENCIL = 0x4;
    }
}

/// Where and how an image was last used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceState {
    pub layout: ImageLayout,
    pub stages: PipelineStages,
    pub access: AccessFlags,
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl ResourceState {
    pub const fn new(layout: ImageLayout, stages: PipelineStages, access: AccessFlags) -> Self {
        Self { layout, stages, access }
    }

    /// Initial state, contents may be discarded
    pub const UNDEFINED: Self = Self::new(
        ImageLayout::Undefined,
        PipelineStages::TOP_OF_PIPE,
        AccessFlags::empty(),
    );

    /// Written as a colour attachment (read for blending)
    pub const COLOR_ATTACHMENT: Self = Self::new(
        ImageLayout::ColorAttachment,
        PipelineStages::COLOR_ATTACHMENT_OUTPUT,
        AccessFlags::COLOR_ATTACHMENT_READ.union(AccessFlags::COLOR_ATTACHMENT_WRITE),
    );

    /// Written as a depth/stencil attachment
    pub const DEPTH_ATTACHMENT: Self = Self::new(
        ImageLayout::DepthStencilAttachment,
        PipelineStages::EARLY_FRAGMENT_TESTS.union(PipelineStages::LATE_FRAGMENT_TESTS),
        AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ.union(AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE),
    );

    /// Sampled by fragment or compute shaders
    pub const SHADER_READ_ONLY: Self = Self::new(
        ImageLayout::ShaderReadOnly,
        PipelineStages::FRAGMENT_SHADER.union(PipelineStages::COMPUTE_SHADER),
        AccessFlags::SHADER_SAMPLED_READ,
    );

    /// Depth image sampled by shaders while depth tests may still read it
    pub const DEPTH_READ_ONLY: Self = Self::new(
        ImageLayout::DepthStencilReadOnly,
        PipelineStages::FRAGMENT_SHADER
            .union(PipelineStages::COMPUTE_SHADER)
            .union(PipelineStages::EARLY_FRAGMENT_TESTS),
        AccessFlags::SHADER_SAMPLED_READ.union(AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ),
    );

    /// Storage image read and written by compute shaders
    pub const GENERAL: Self = Self::new(
        ImageLayout::General,
        PipelineStages::COMPUTE_SHADER,
        AccessFlags::SHADER_STORAGE_READ.union(AccessFlags::SHADER_STORAGE_WRITE),
    );

    pub const TRANSFER_SRC: Self = Self::new(
        ImageLayout::TransferSrc,
        PipelineStages::TRANSFER,
        AccessFlags::TRANSFER_READ,
    );

    pub const TRANSFER_DST: Self = Self::new(
        ImageLayout::TransferDst,
        PipelineStages::TRANSFER,
        AccessFlags::TRANSFER_WRITE,
    );

    /// Handed to the presentation engine
    pub const PRESENT: Self = Self::new(
        ImageLayout::PresentSrc,
        PipelineStages::BOTTOM_OF_PIPE,
        AccessFlags::empty(),
    );

    /// Whether this state writes the image
    pub fn is_write(&self) -> bool {
        self.access.intersects(AccessFlags::ANY_WRITE)
    }

    pub fn is_read_only(&self) -> bool {
        !self.is_write()
    }

    /// Access to make available in a barrier's source scope (writes only)
    pub fn src_access(&self) -> AccessFlags {
        self.access & AccessFlags::ANY_WRITE
    }

    /// Whether moving from `self` to `next` needs a barrier
    ///
    /// Only an identical read-only state can be skipped. Write-after-write in
    /// the same layout still needs the execution and memory dependency.
    pub fn needs_barrier_to(&self, next: &ResourceState) -> bool {
        !(self == next && self.is_read_only())
    }
}

/// One image layout/state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBarrier {
    pub image: ImageHandle,
    pub aspect: ImageAspect,
    pub old_state: ResourceState,
    pub new_state: ResourceState,
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;

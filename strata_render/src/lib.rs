/*!
# Strata Render

Backend-agnostic resource core of a real-time renderer.

This crate turns a frame's declared passes into a synchronized command
stream and caches the expensive GPU objects those passes need. It talks to
the GPU only through the `GraphicsDevice` and `CommandList` traits; a
backend crate (for example `strata_render_vulkan`) implements them.

## Architecture

- **RenderGraph**: declared passes, image state tracking, barrier insertion
- **PipelineCache**: content-hashed graphics/compute pipelines and layouts
- **DescriptorLayoutCache**: content-hashed descriptor set layouts
- **StaticDescriptorPool / DynamicDescriptorPool**: descriptor set allocation
- **BindlessRegistry**: stable indices into one shared descriptor set
- **FrameSlots**: frames in flight, each with its own fence and descriptor pool
- **RenderContext**: owns the caches and the bindless registry, shared by `Arc`
*/

// Internal modules
mod error;
pub mod log;
pub mod device;
pub mod descriptor;
pub mod pipeline;
pub mod bindless;
pub mod render_graph;
pub mod frame;
pub mod config;
pub mod context;
pub mod utils;

// Main strata namespace module
pub mod strata {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration and engine context
    pub use crate::config::Config;
    pub use crate::context::RenderContext;
    pub use crate::frame::{Frame, FrameSlots};

    // Logging sub-module (types and sink control)
    pub mod log {
        pub use crate::log::{
            min_severity, reset_logger, set_logger, set_min_severity, DefaultLogger, LogEntry,
            LogSeverity, Logger,
        };
    }

    // Device traits, handles and state types
    pub mod device {
        pub use crate::device::*;
    }

    // Caches, pools and registries
    pub use crate::bindless::{BindlessCapacities, BindlessCategory, BindlessHandle, BindlessRegistry};
    pub use crate::descriptor::{
        DescriptorLayoutCache, DescriptorWriter, DynamicDescriptorPool, PoolSizeRatio,
        StaticDescriptorPool,
    };
    pub use crate::pipeline::{
        ComputePipelineDefinition, GraphicsPipelineDefinition, PipelineBinding, PipelineCache,
        PipelineCacheStats, TargetInfo,
    };

    // Render graph
    pub use crate::render_graph::{
        Attachment, CustomAction, DispatchAction, FullscreenAction, ImageResource, PassAction,
        PassContext, PassHandle, PassKind, RenderGraph, RenderPassDesc,
    };
}

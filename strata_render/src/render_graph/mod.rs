//! Render graph module
//!
//! Per-frame pass declarations, image state tracking and barrier insertion.

pub mod image_resource;
pub mod pass;
pub mod pass_action;
pub mod render_graph;

pub use image_resource::ImageResource;
pub use pass::{Attachment, PassHandle, PassKind, RenderPassDesc};
pub use pass_action::{CustomAction, DispatchAction, FullscreenAction, PassAction, PassContext};
pub use render_graph::RenderGraph;

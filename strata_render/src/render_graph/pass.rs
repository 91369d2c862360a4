/// Pass declarations
///
/// A frame is declared as render passes (attachments + sampled inputs) and
/// compute tasks (storage images). Both are consumed by the next
/// `RenderGraph::record_to`.

use std::sync::Arc;

use crate::device::{ClearValue, LoadOp, StoreOp};
use super::image_resource::ImageResource;

/// One colour or depth attachment of a render pass
#[derive(Debug, Clone)]
pub struct Attachment {
    pub image: Arc<ImageResource>,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear: ClearValue,
    /// Single-sampled image the attachment resolves into
    pub resolve: Option<Arc<ImageResource>>,
}

impl Attachment {
    /// Cleared to `color` and stored
    pub fn clear_color(image: Arc<ImageResource>, color: [f32; 4]) -> Self {
        Self {
            image,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            clear: ClearValue::Color(color),
            resolve: None,
        }
    }

    /// Cleared to `depth` (stencil 0) and stored
    pub fn clear_depth(image: Arc<ImageResource>, depth: f32) -> Self {
        Self {
            image,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            clear: ClearValue::DepthStencil { depth, stencil: 0 },
            resolve: None,
        }
    }

    /// Previous contents kept and stored
    pub fn load(image: Arc<ImageResource>) -> Self {
        Self {
            image,
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
            clear: ClearValue::Color([0.0; 4]),
            resolve: None,
        }
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }

    pub fn with_resolve(mut self, target: Arc<ImageResource>) -> Self {
        self.resolve = Some(target);
        self
    }
}

/// Attachments of a render pass
#[derive(Debug, Clone, Default)]
pub struct RenderPassDesc {
    pub color_attachments: Vec<Attachment>,
    pub depth_attachment: Option<Attachment>,
}

impl RenderPassDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, attachment: Attachment) -> Self {
        self.color_attachments.push(attachment);
        self
    }

    pub fn depth(mut self, attachment: Attachment) -> Self {
        self.depth_attachment = Some(attachment);
        self
    }

    /// Every attachment, colour first, depth last
    pub(crate) fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.color_attachments.iter().chain(self.depth_attachment.iter())
    }

    /// Extent of the first attachment
    pub(crate) fn extent(&self) -> Option<(u32, u32)> {
        self.attachments().next().map(|a| a.image.extent())
    }
}

/// Kind of a declared pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Render,
    Compute,
}

/// Identifies a declared pass for the current frame
///
/// `index` points into the array of its kind. Handles are only meaningful
/// until the next `record_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassHandle {
    pub kind: PassKind,
    pub index: usize,
}

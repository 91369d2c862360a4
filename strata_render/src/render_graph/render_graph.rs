/// Render graph: the passes of one frame, in declaration order.
///
/// Passes are declared with `add_pass` / `add_task`, then `record_to` walks
/// them in exactly that order. For every image a pass touches, the graph
/// compares the state the image was left in with the state the pass needs
/// and emits the barriers, then runs the pass action. There is no dependency
/// analysis and no reordering: the caller declares passes in a valid order.
/// Recording drains the declarations, so each frame declares its passes again.

use std::sync::Arc;

use crate::context::RenderContext;
use crate::device::{
    CommandList, ImageBarrier, ImageLayout, ImageViewHandle, Rect2D, RenderingAttachment,
    RenderingInfo, ResolveTarget, ResourceState, Viewport,
};
use crate::error::{Error, Result};
use crate::pipeline::TargetInfo;
use crate::{engine_error, engine_trace};

use super::image_resource::ImageResource;
use super::pass::{Attachment, PassHandle, PassKind, RenderPassDesc};
use super::pass_action::{PassAction, PassContext};

struct RenderPassNode {
    name: String,
    desc: RenderPassDesc,
    inputs: Vec<Arc<ImageResource>>,
    action: Box<dyn PassAction>,
}

struct ComputeTaskNode {
    name: String,
    storage: Vec<Arc<ImageResource>>,
    action: Box<dyn PassAction>,
}

pub struct RenderGraph {
    context: Arc<RenderContext>,
    render_passes: Vec<RenderPassNode>,
    compute_tasks: Vec<ComputeTaskNode>,
    /// Declaration order across both kinds
    order: Vec<PassHandle>,
}

impl RenderGraph {
    pub fn new(context: Arc<RenderContext>) -> Self {
        Self {
            context,
            render_passes: Vec::new(),
            compute_tasks: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn context(&self) -> &Arc<RenderContext> {
        &self.context
    }

    /// Declare a render pass
    ///
    /// Colour attachments (and their resolve targets) are made colour-writable,
    /// the depth attachment depth-writable (it may not resolve), and every input shader-readable
    /// (depth-read-only for depth formats) before `action` runs.
    pub fn add_pass<A: PassAction + 'static>(
        &mut self,
        name: &str,
        attachments: RenderPassDesc,
        inputs: Vec<Arc<ImageResource>>,
        action: A,
    ) -> PassHandle {
        let handle = PassHandle { kind: PassKind::Render, index: self.render_passes.len() };
        self.render_passes.push(RenderPassNode {
            name: name.to_string(),
            desc: attachments,
            inputs,
            action: Box::new(action),
        });
        self.order.push(handle);
        handle
    }

    /// Declare a compute task; every storage image is moved to `GENERAL`
    pub fn add_task<A: PassAction + 'static>(
        &mut self,
        name: &str,
        storage: Vec<Arc<ImageResource>>,
        action: A,
    ) -> PassHandle {
        let handle = PassHandle { kind: PassKind::Compute, index: self.compute_tasks.len() };
        self.compute_tasks.push(ComputeTaskNode {
            name: name.to_string(),
            storage,
            action: Box::new(action),
        });
        self.order.push(handle);
        handle
    }

    /// Declared passes in execution order
    pub fn passes(&self) -> &[PassHandle] {
        &self.order
    }

    pub fn pass_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check the declared frame before anything is recorded
    ///
    /// Rejects render passes without attachments, attachments whose extents
    /// differ, depth resolves, inputs that are also written by the same pass,
    /// and any image declared without a view.
    pub fn validate(&self) -> Result<()> {
        for pass in &self.render_passes {
            let extent = pass.desc.extent().ok_or_else(|| {
                Error::ValidationFailed(format!("render pass '{}' has no attachments", pass.name))
            })?;
            for attachment in pass.desc.attachments() {
                check_view(&pass.name, &attachment.image)?;
                if attachment.image.extent() != extent {
                    return Err(Error::ValidationFailed(format!(
                        "render pass '{}': attachment '{}' is {:?}, expected {:?}",
                        pass.name, attachment.image.name(), attachment.image.extent(), extent
                    )));
                }
                if let Some(resolve) = &attachment.resolve {
                    check_view(&pass.name, resolve)?;
                }
            }
            if let Some(resolve) = pass.desc.depth_attachment.as_ref().and_then(|d| d.resolve.as_ref()) {
                return Err(Error::ValidationFailed(format!(
                    "render pass '{}': depth attachment cannot resolve into '{}'",
                    pass.name, resolve.name()
                )));
            }
            for input in &pass.inputs {
                check_view(&pass.name, input)?;
                let written = pass.desc.attachments()
                    .flat_map(|a| std::iter::once(&a.image).chain(a.resolve.iter()))
                    .any(|image| image.image() == input.image());
                if written {
                    return Err(Error::ValidationFailed(format!(
                        "render pass '{}' reads '{}' while rendering into it",
                        pass.name, input.name()
                    )));
                }
            }
        }
        for task in &self.compute_tasks {
            for image in &task.storage {
                check_view(&task.name, image)?;
            }
        }
        Ok(())
    }

    /// Record every declared pass into `cmd`, then forget them
    ///
    /// A frame that fails validation records nothing. The declarations are
    /// drained whether recording succeeds or not.
    pub fn record_to(&mut self, cmd: &mut dyn CommandList) -> Result<()> {
        if self.order.is_empty() {
            return Ok(());
        }

        let validation = self.validate();
        let order = std::mem::take(&mut self.order);
        let mut render_passes = std::mem::take(&mut self.render_passes);
        let mut compute_tasks = std::mem::take(&mut self.compute_tasks);

        if let Err(e) = validation {
            engine_error!("strata::RenderGraph", "Frame skipped, {} passes dropped: {}", order.len(), e);
            return Err(e);
        }

        let mut barrier_count = 0;
        for handle in &order {
            barrier_count += match handle.kind {
                PassKind::Render => self.record_render_pass(&mut render_passes[handle.index], cmd)?,
                PassKind::Compute => self.record_compute_task(&mut compute_tasks[handle.index], cmd)?,
            };
        }

        engine_trace!(
            "strata::RenderGraph",
            "Recorded {} passes with {} barriers",
            order.len(), barrier_count
        );
        Ok(())
    }

    fn record_render_pass(&self, pass: &mut RenderPassNode, cmd: &mut dyn CommandList) -> Result<usize> {
        let mut barriers = Vec::new();
        for attachment in &pass.desc.color_attachments {
            barriers.extend(attachment.image.transition_to(ResourceState::COLOR_ATTACHMENT));
            if let Some(resolve) = &attachment.resolve {
                barriers.extend(resolve.transition_to(ResourceState::COLOR_ATTACHMENT));
            }
        }
        if let Some(depth) = &pass.desc.depth_attachment {
            barriers.extend(depth.image.transition_to(ResourceState::DEPTH_ATTACHMENT));
        }
        for input in &pass.inputs {
            let required = if input.format().is_depth() {
                ResourceState::DEPTH_READ_ONLY
            } else {
                ResourceState::SHADER_READ_ONLY
            };
            barriers.extend(input.transition_to(required));
        }
        emit_barriers(cmd, &barriers)?;

        let (width, height) = pass.desc.extent().unwrap_or_default();
        let info = RenderingInfo {
            render_area: Rect2D::from_extent(width, height),
            color_attachments: pass.desc.color_attachments.iter()
                .map(|a| rendering_attachment(&pass.name, a, ImageLayout::ColorAttachment))
                .collect::<Result<Vec<_>>>()?,
            depth_attachment: pass.desc.depth_attachment.as_ref()
                .map(|a| rendering_attachment(&pass.name, a, ImageLayout::DepthStencilAttachment))
                .transpose()?,
        };
        let target = target_info(&pass.desc);

        cmd.begin_rendering(&info)?;
        let executed = self.execute_in_rendering(pass, &mut *cmd, &target, (width, height));
        // The rendering scope is closed even when the action failed
        let ended = cmd.end_rendering();
        executed.map_err(|e| {
            engine_error!("strata::RenderGraph", "Render pass '{}' failed: {}", pass.name, e);
            e
        })?;
        ended?;
        Ok(barriers.len())
    }

    fn execute_in_rendering(
        &self,
        pass: &mut RenderPassNode,
        cmd: &mut dyn CommandList,
        target: &TargetInfo,
        (width, height): (u32, u32),
    ) -> Result<()> {
        cmd.set_viewport(Viewport::from_extent(width, height))?;
        cmd.set_scissor(Rect2D::from_extent(width, height))?;
        let mut ctx = PassContext::new(cmd, &self.context, target, (width, height));
        pass.action.execute(&mut ctx)
    }

    fn record_compute_task(&self, task: &mut ComputeTaskNode, cmd: &mut dyn CommandList) -> Result<usize> {
        let barriers: Vec<ImageBarrier> = task.storage.iter()
            .filter_map(|image| image.transition_to(ResourceState::GENERAL))
            .collect();
        emit_barriers(cmd, &barriers)?;

        let target = TargetInfo::default();
        let mut ctx = PassContext::new(cmd, &self.context, &target, (0, 0));
        task.action.execute(&mut ctx).map_err(|e| {
            engine_error!("strata::RenderGraph", "Compute task '{}' failed: {}", task.name, e);
            e
        })?;
        Ok(barriers.len())
    }
}

fn check_view(pass: &str, image: &ImageResource) -> Result<ImageViewHandle> {
    image.view().ok_or_else(|| {
        Error::ValidationFailed(format!("pass '{}' references image '{}' without a view", pass, image.name()))
    })
}

fn emit_barriers(cmd: &mut dyn CommandList, barriers: &[ImageBarrier]) -> Result<()> {
    if barriers.is_empty() {
        return Ok(());
    }
    cmd.pipeline_barrier(barriers)
}

fn rendering_attachment(pass: &str, attachment: &Attachment, layout: ImageLayout) -> Result<RenderingAttachment> {
    let resolve = match &attachment.resolve {
        Some(target) => Some(ResolveTarget {
            view: check_view(pass, target)?,
            layout: ImageLayout::ColorAttachment,
        }),
        None => None,
    };
    Ok(RenderingAttachment {
        view: check_view(pass, &attachment.image)?,
        layout,
        load_op: attachment.load_op,
        store_op: attachment.store_op,
        clear: attachment.clear,
        resolve,
    })
}

fn target_info(desc: &RenderPassDesc) -> TargetInfo {
    let color_formats: Vec<_> = desc.color_attachments.iter().map(|a| a.image.format()).collect();
    let mut target = TargetInfo::color(&color_formats);
    if let Some(depth) = &desc.depth_attachment {
        target = target.with_depth(depth.image.format());
    }
    if let Some(first) = desc.attachments().next() {
        target = target.with_samples(first.image.samples());
    }
    target
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;

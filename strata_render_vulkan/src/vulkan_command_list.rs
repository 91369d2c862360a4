//! VulkanCommandList - Vulkan implementation of the CommandList trait
//!
//! Records through dynamic rendering and synchronization2; there are no
//! render pass or framebuffer objects.

use strata_render::strata::{Error, Result};
use strata_render::strata::device::{
    BufferHandle, ClearValue, CommandList, DescriptorSetHandle, ImageBarrier, IndexType,
    Rect2D, RenderingAttachment, RenderingInfo, ShaderStageFlags, Viewport,
};
use strata_render::strata::PipelineBinding;
use strata_render::engine_error;
use ash::vk;
use ash::vk::Handle;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{
    access_to_vk, aspect_to_vk, bind_point_to_vk, image_layout_to_vk, index_type_to_vk,
    load_op_to_vk, shader_stages_to_vk, stages_to_vk, store_op_to_vk, vk_handle,
};

/// Vulkan command list implementation
///
/// Owns its command pool and a single primary command buffer.
pub struct VulkanCommandList {
    /// Shared device context
    context: Arc<GpuContext>,
    /// Command pool for allocating the command buffer
    command_pool: vk::CommandPool,
    /// Command buffer for recording
    command_buffer: vk::CommandBuffer,
    /// Whether the command list is currently recording
    is_recording: bool,
    /// Whether we're inside a dynamic rendering scope
    in_rendering: bool,
}

impl VulkanCommandList {
    /// Create a new command list
    ///
    /// # Arguments
    ///
    /// * `context` - Shared device context; the pool is created on its graphics queue family
    pub fn new(context: Arc<GpuContext>) -> Result<Self> {
        let device = &context.device;
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(context.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| {
                    engine_error!("strata::vulkan", "Failed to create command pool: {:?}", e);
                    Error::BackendError(format!("Failed to create command pool: {:?}", e))
                })?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) if !buffers.is_empty() => buffers[0],
                Ok(_) => {
                    device.destroy_command_pool(command_pool, None);
                    engine_error!("strata::vulkan", "vkAllocateCommandBuffers returned no buffer");
                    return Err(Error::BackendError("No command buffer allocated".to_string()));
                }
                Err(e) => {
                    device.destroy_command_pool(command_pool, None);
                    engine_error!("strata::vulkan", "Failed to allocate command buffer: {:?}", e);
                    return Err(Error::BackendError(format!("Failed to allocate command buffers: {:?}", e)));
                }
            };

            Ok(Self {
                context: Arc::clone(&context),
                command_pool,
                command_buffer,
                is_recording: false,
                in_rendering: false,
            })
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn recording(&self) -> Result<vk::CommandBuffer> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        Ok(self.command_buffer)
    }
}

fn clear_value_to_vk(clear: ClearValue) -> vk::ClearValue {
    match clear {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
    }
}

fn attachment_to_vk(attachment: &RenderingAttachment) -> vk::RenderingAttachmentInfo<'static> {
    let mut info = vk::RenderingAttachmentInfo::default()
        .image_view(vk_handle(attachment.view.as_raw()))
        .image_layout(image_layout_to_vk(attachment.layout))
        .load_op(load_op_to_vk(attachment.load_op))
        .store_op(store_op_to_vk(attachment.store_op))
        .clear_value(clear_value_to_vk(attachment.clear));

    if let Some(resolve) = attachment.resolve {
        info = info
            .resolve_mode(vk::ResolveModeFlags::AVERAGE)
            .resolve_image_view(vk_handle(resolve.view.as_raw()))
            .resolve_image_layout(image_layout_to_vk(resolve.layout));
    }

    info
}

fn image_barrier_to_vk(barrier: &ImageBarrier) -> vk::ImageMemoryBarrier2<'static> {
    let old = &barrier.old_state;
    let new = &barrier.new_state;

    vk::ImageMemoryBarrier2::default()
        .src_stage_mask(stages_to_vk(old.stages))
        .src_access_mask(access_to_vk(old.src_access()))
        .dst_stage_mask(stages_to_vk(new.stages))
        .dst_access_mask(access_to_vk(new.access))
        .old_layout(image_layout_to_vk(old.layout))
        .new_layout(image_layout_to_vk(new.layout))
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(vk_handle(barrier.image.as_raw()))
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect_to_vk(barrier.aspect),
            base_mip_level: 0,
            level_count: vk::REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
        })
}

impl CommandList for VulkanCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command list already recording".to_string()));
        }

        unsafe {
            self.context.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.context.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;
        }

        self.is_recording = true;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let cmd = self.recording()?;
        if self.in_rendering {
            return Err(Error::BackendError("Cannot end command list inside rendering".to_string()));
        }

        unsafe {
            self.context.device
                .end_command_buffer(cmd)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;
        }

        self.is_recording = false;
        Ok(())
    }

    fn native_handle(&self) -> u64 {
        self.command_buffer.as_raw()
    }

    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier]) -> Result<()> {
        let cmd = self.recording()?;
        if barriers.is_empty() {
            return Ok(());
        }

        let image_barriers: Vec<vk::ImageMemoryBarrier2> =
            barriers.iter().map(image_barrier_to_vk).collect();
        let dependency_info = vk::DependencyInfo::default().image_memory_barriers(&image_barriers);

        unsafe {
            self.context.device.cmd_pipeline_barrier2(cmd, &dependency_info);
        }
        Ok(())
    }

    fn begin_rendering(&mut self, info: &RenderingInfo) -> Result<()> {
        let cmd = self.recording()?;
        if self.in_rendering {
            return Err(Error::BackendError("Already inside rendering".to_string()));
        }

        let color_attachments: Vec<vk::RenderingAttachmentInfo> =
            info.color_attachments.iter().map(attachment_to_vk).collect();
        let depth_attachment = info.depth_attachment.as_ref().map(attachment_to_vk);

        let area = info.render_area;
        let mut rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: area.x, y: area.y },
                extent: vk::Extent2D { width: area.width, height: area.height },
            })
            .layer_count(1)
            .color_attachments(&color_attachments);

        if let Some(depth) = depth_attachment.as_ref() {
            rendering_info = rendering_info.depth_attachment(depth);
        }

        unsafe {
            self.context.device.cmd_begin_rendering(cmd, &rendering_info);
        }

        self.in_rendering = true;
        Ok(())
    }

    fn end_rendering(&mut self) -> Result<()> {
        let cmd = self.recording()?;
        if !self.in_rendering {
            return Err(Error::BackendError("Not inside rendering".to_string()));
        }

        unsafe {
            self.context.device.cmd_end_rendering(cmd);
        }

        self.in_rendering = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        let cmd = self.recording()?;

        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };

        unsafe {
            self.context.device.cmd_set_viewport(cmd, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        let cmd = self.recording()?;

        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };

        unsafe {
            self.context.device.cmd_set_scissor(cmd, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &PipelineBinding) -> Result<()> {
        let cmd = self.recording()?;

        unsafe {
            self.context.device.cmd_bind_pipeline(
                cmd,
                bind_point_to_vk(pipeline.bind_point),
                vk_handle(pipeline.pipeline.as_raw()),
            );
        }
        Ok(())
    }

    fn bind_descriptor_sets(
        &mut self,
        pipeline: &PipelineBinding,
        first_set: u32,
        sets: &[DescriptorSetHandle],
    ) -> Result<()> {
        let cmd = self.recording()?;
        if sets.is_empty() {
            return Ok(());
        }

        let vk_sets: Vec<vk::DescriptorSet> = sets.iter().map(|s| vk_handle(s.as_raw())).collect();

        unsafe {
            self.context.device.cmd_bind_descriptor_sets(
                cmd,
                bind_point_to_vk(pipeline.bind_point),
                vk_handle(pipeline.layout.as_raw()),
                first_set,
                &vk_sets,
                &[], // dynamic_offsets
            );
        }
        Ok(())
    }

    fn push_constants(
        &mut self,
        pipeline: &PipelineBinding,
        stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        let cmd = self.recording()?;

        unsafe {
            self.context.device.cmd_push_constants(
                cmd,
                vk_handle(pipeline.layout.as_raw()),
                shader_stages_to_vk(stages),
                offset,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()> {
        let cmd = self.recording()?;

        unsafe {
            self.context.device.cmd_bind_vertex_buffers(cmd, 0, &[vk_handle(buffer.as_raw())], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()> {
        let cmd = self.recording()?;

        unsafe {
            self.context.device.cmd_bind_index_buffer(
                cmd,
                vk_handle(buffer.as_raw()),
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        let cmd = self.recording()?;

        unsafe {
            self.context.device.cmd_draw(cmd, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        let cmd = self.recording()?;

        unsafe {
            self.context.device.cmd_draw_indexed(cmd, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) -> Result<()> {
        let cmd = self.recording()?;
        if self.in_rendering {
            return Err(Error::BackendError("Cannot dispatch inside rendering".to_string()));
        }

        unsafe {
            self.context.device.cmd_dispatch(cmd, group_count_x, group_count_y, group_count_z);
        }
        Ok(())
    }
}

impl Drop for VulkanCommandList {
    fn drop(&mut self) {
        unsafe {
            // Command buffer is freed with its pool
            self.context.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

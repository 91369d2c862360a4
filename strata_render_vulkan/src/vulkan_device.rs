//! VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
//!
//! Headless: no surface or swapchain. The device requires Vulkan 1.3 for
//! dynamic rendering and synchronization2, plus the descriptor indexing
//! features the bindless set relies on.

use strata_render::strata::{Config, Error, Result};
use strata_render::strata::device::{
    CommandList, ComputePipelineDesc, DescriptorPoolDesc, DescriptorPoolHandle,
    DescriptorResource, DescriptorSetHandle, DescriptorSetLayoutDesc, DescriptorSetLayoutHandle,
    DescriptorType, DescriptorWrite, FenceHandle, GraphicsDevice, GraphicsPipelineDesc,
    PipelineHandle, PipelineLayoutDesc, PipelineLayoutHandle, SemaphoreHandle, SemaphoreWait,
    ShaderHandle,
};
use strata_render::{engine_debug, engine_error, engine_info, engine_warn};
use ash::vk;
use ash::vk::Handle;
use std::ffi::{CStr, CString};
use std::sync::Arc;

use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::*;

/// Vulkan graphics device
///
/// Every created object is returned as an engine handle carrying the raw
/// Vulkan handle; ownership stays with the caller, which destroys it
/// through the matching `destroy_*` method.
pub struct VulkanGraphicsDevice {
    /// Physical device the context was created on
    physical_device: vk::PhysicalDevice,
    /// Device name reported by the driver
    device_name: String,
    /// Shared context (device, queue, instance)
    context: Arc<GpuContext>,
}

/// Requirements a physical device must meet
fn supports_required_features(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> bool {
    let mut features12 = vk::PhysicalDeviceVulkan12Features::default();
    let mut features13 = vk::PhysicalDeviceVulkan13Features::default();
    {
        let mut features = vk::PhysicalDeviceFeatures2::default()
            .push_next(&mut features12)
            .push_next(&mut features13);
        unsafe {
            instance.get_physical_device_features2(physical_device, &mut features);
        }
    }

    features13.dynamic_rendering == vk::TRUE
        && features13.synchronization2 == vk::TRUE
        && features12.runtime_descriptor_array == vk::TRUE
        && features12.descriptor_binding_partially_bound == vk::TRUE
        && features12.descriptor_binding_sampled_image_update_after_bind == vk::TRUE
        && features12.shader_sampled_image_array_non_uniform_indexing == vk::TRUE
}

/// Pick the first physical device that meets the requirements
///
/// Returns the device and its graphics queue family.
fn select_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32)> {
    let physical_devices = unsafe { instance.enumerate_physical_devices() }
        .map_err(|e| {
            engine_error!("strata::vulkan", "Failed to enumerate physical devices: {:?}", e);
            Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
        })?;

    for physical_device in physical_devices {
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let name = properties
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        if properties.api_version < vk::API_VERSION_1_3 {
            engine_debug!("strata::vulkan", "Skipping {}: Vulkan 1.3 not supported", name);
            continue;
        }
        if !supports_required_features(instance, physical_device) {
            engine_debug!("strata::vulkan", "Skipping {}: missing required features", name);
            continue;
        }

        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
        let graphics_family = queue_families
            .iter()
            .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE));

        if let Some(index) = graphics_family {
            return Ok((physical_device, index as u32));
        }
        engine_debug!("strata::vulkan", "Skipping {}: no graphics queue family", name);
    }

    engine_error!("strata::vulkan", "No suitable Vulkan 1.3 GPU found");
    Err(Error::InitializationFailed("No suitable Vulkan 1.3 GPU found".to_string()))
}

fn create_logical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    graphics_family: u32,
) -> Result<ash::Device> {
    let queue_priorities = [1.0];
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(graphics_family)
        .queue_priorities(&queue_priorities)];

    let mut features12 = vk::PhysicalDeviceVulkan12Features::default()
        .descriptor_indexing(true)
        .runtime_descriptor_array(true)
        .descriptor_binding_partially_bound(true)
        .descriptor_binding_sampled_image_update_after_bind(true)
        .shader_sampled_image_array_non_uniform_indexing(true);
    let mut features13 = vk::PhysicalDeviceVulkan13Features::default()
        .dynamic_rendering(true)
        .synchronization2(true);

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .push_next(&mut features12)
        .push_next(&mut features13);

    unsafe { instance.create_device(physical_device, &device_create_info, None) }
        .map_err(|e| {
            engine_error!("strata::vulkan", "Failed to create logical device: {:?}", e);
            Error::InitializationFailed(format!("Failed to create device: {:?}", e))
        })
}

impl VulkanGraphicsDevice {
    /// Create a headless Vulkan device
    ///
    /// Validation layers are enabled when `config.enable_validation` is set
    /// and the crate is built with the `vulkan-validation` feature.
    pub fn new(config: &Config) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

        let app_name = CString::new(config.app_name.as_str())
            .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"Strata")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_3);

        let validation = config.enable_validation && cfg!(feature = "vulkan-validation");
        if config.enable_validation && !validation {
            engine_warn!(
                "strata::vulkan",
                "Validation requested but the crate was built without the vulkan-validation feature"
            );
        }

        let mut extension_names: Vec<*const std::os::raw::c_char> = Vec::new();
        let mut layer_names: Vec<*const std::os::raw::c_char> = Vec::new();
        if validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            layer_names.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

        let device_result = select_physical_device(&instance).and_then(|(physical_device, family)| {
            create_logical_device(&instance, physical_device, family)
                .map(|device| (physical_device, family, device))
        });
        let (physical_device, graphics_family, device) = match device_result {
            Ok(created) => created,
            Err(e) => {
                unsafe { instance.destroy_instance(None) };
                return Err(e);
            }
        };

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let device_name = properties
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };

        #[allow(unused_mut)]
        let mut context = GpuContext::new(entry, instance, device, graphics_queue, graphics_family);

        #[cfg(feature = "vulkan-validation")]
        if validation {
            Self::attach_debug_messenger(&mut context)?;
        }

        engine_info!(
            "strata::vulkan",
            "Vulkan device created on {} (queue family {}, validation {})",
            device_name, graphics_family, validation
        );

        Ok(Self {
            physical_device,
            device_name,
            context: Arc::new(context),
        })
    }

    #[cfg(feature = "vulkan-validation")]
    fn attach_debug_messenger(context: &mut GpuContext) -> Result<()> {
        let debug_utils = ash::ext::debug_utils::Instance::new(context.entry(), context.instance());

        crate::debug::init_debug_state();

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(crate::debug::messenger_severity())
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&debug_info, None) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create debug messenger: {:?}", e);
                Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
            })?;

        context.debug_utils_loader = Some(debug_utils);
        context.debug_messenger = Some(messenger);
        Ok(())
    }

    /// Name of the GPU this device runs on
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Underlying physical device
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Shared Vulkan context
    pub fn context(&self) -> &Arc<GpuContext> {
        &self.context
    }

    fn device(&self) -> &ash::Device {
        &self.context.device
    }

    fn create_pipeline_stage<'a>(
        stage: vk::ShaderStageFlags,
        module: ShaderHandle,
        entry_point: &'a CStr,
    ) -> vk::PipelineShaderStageCreateInfo<'a> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(stage)
            .module(vk_handle(module.as_raw()))
            .name(entry_point)
    }
}

fn entry_point_name(entry_point: &str) -> Result<CString> {
    CString::new(entry_point).map_err(|e| {
        engine_error!("strata::vulkan", "Invalid shader entry point '{}': {}", entry_point, e);
        Error::InvalidResource(format!("Invalid shader entry point '{}'", entry_point))
    })
}

/// Image or buffer info a descriptor write points at
enum WriteInfo {
    Image(usize),
    Buffer(usize),
}

fn resource_matches(descriptor_type: DescriptorType, resource: &DescriptorResource) -> bool {
    match resource {
        DescriptorResource::Image { .. } => matches!(
            descriptor_type,
            DescriptorType::SampledImage | DescriptorType::StorageImage | DescriptorType::InputAttachment
        ),
        DescriptorResource::CombinedImageSampler { .. } => {
            descriptor_type == DescriptorType::CombinedImageSampler
        }
        DescriptorResource::Sampler(_) => descriptor_type == DescriptorType::Sampler,
        DescriptorResource::Buffer { .. } => matches!(
            descriptor_type,
            DescriptorType::UniformBuffer
                | DescriptorType::StorageBuffer
                | DescriptorType::UniformBufferDynamic
                | DescriptorType::StorageBufferDynamic
        ),
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    // ===== SHADERS & PIPELINES =====

    fn create_shader_module(&mut self, code: &[u32]) -> Result<ShaderHandle> {
        let create_info = vk::ShaderModuleCreateInfo::default().code(code);

        let module = unsafe { self.device().create_shader_module(&create_info, None) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create shader module: {:?}", e);
                vk_result_to_error(e, "vkCreateShaderModule")
            })?;

        Ok(ShaderHandle::from_raw(module.as_raw()))
    }

    fn create_descriptor_set_layout(&mut self, desc: &DescriptorSetLayoutDesc) -> Result<DescriptorSetLayoutHandle> {
        let stage_flags = shader_stages_to_vk(desc.stages);

        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_type_to_vk(b.descriptor_type))
                    .descriptor_count(b.count)
                    .stage_flags(stage_flags)
            })
            .collect();

        let binding_flags: Vec<vk::DescriptorBindingFlags> =
            desc.bindings.iter().map(|b| binding_flags_to_vk(b.flags)).collect();
        let mut binding_flags_info =
            vk::DescriptorSetLayoutBindingFlagsCreateInfo::default().binding_flags(&binding_flags);

        let mut create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(layout_flags_to_vk(desc.flags))
            .bindings(&bindings);
        if binding_flags.iter().any(|f| !f.is_empty()) {
            create_info = create_info.push_next(&mut binding_flags_info);
        }

        let layout = unsafe { self.device().create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create descriptor set layout: {:?}", e);
                vk_result_to_error(e, "vkCreateDescriptorSetLayout")
            })?;

        Ok(DescriptorSetLayoutHandle::from_raw(layout.as_raw()))
    }

    fn create_pipeline_layout(&mut self, desc: &PipelineLayoutDesc) -> Result<PipelineLayoutHandle> {
        let set_layouts: Vec<vk::DescriptorSetLayout> =
            desc.set_layouts.iter().map(|l| vk_handle(l.as_raw())).collect();

        let push_constant_ranges: Vec<vk::PushConstantRange> = desc
            .push_constant_ranges
            .iter()
            .map(|r| vk::PushConstantRange {
                stage_flags: shader_stages_to_vk(r.stages),
                offset: r.offset,
                size: r.size,
            })
            .collect();

        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        let layout = unsafe { self.device().create_pipeline_layout(&create_info, None) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create pipeline layout: {:?}", e);
                vk_result_to_error(e, "vkCreatePipelineLayout")
            })?;

        Ok(PipelineLayoutHandle::from_raw(layout.as_raw()))
    }

    fn create_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc) -> Result<PipelineHandle> {
        let def = desc.definition;
        let target = desc.target;

        // Shader stages
        let vertex_entry = entry_point_name(&def.vertex_shader.entry_point)?;
        let fragment_entry = match def.fragment_shader.as_ref() {
            Some(fs) => Some((fs.module, entry_point_name(&fs.entry_point)?)),
            None => None,
        };

        let mut stages = vec![Self::create_pipeline_stage(
            vk::ShaderStageFlags::VERTEX,
            def.vertex_shader.module,
            &vertex_entry,
        )];
        if let Some((module, entry)) = fragment_entry.as_ref() {
            stages.push(Self::create_pipeline_stage(vk::ShaderStageFlags::FRAGMENT, *module, entry));
        }

        // Vertex input
        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = def
            .vertex_layout
            .bindings
            .iter()
            .map(|b| vk::VertexInputBindingDescription {
                binding: b.binding,
                stride: b.stride,
                input_rate: input_rate_to_vk(b.input_rate),
            })
            .collect();
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = def
            .vertex_layout
            .attributes
            .iter()
            .map(|a| vk::VertexInputAttributeDescription {
                location: a.location,
                binding: a.binding,
                format: buffer_format_to_vk(a.format),
                offset: a.offset,
            })
            .collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(def.topology))
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let raster = &def.rasterization;
        let mut rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(polygon_mode_to_vk(raster.polygon_mode))
            .cull_mode(cull_mode_to_vk(raster.cull_mode))
            .front_face(front_face_to_vk(raster.front_face))
            .line_width(1.0);
        if let Some(bias) = raster.depth_bias {
            rasterization = rasterization
                .depth_bias_enable(true)
                .depth_bias_constant_factor(bias.constant_factor)
                .depth_bias_slope_factor(bias.slope_factor)
                .depth_bias_clamp(bias.clamp);
        }

        let mut multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(sample_count_to_vk(target.sample_count))
            .alpha_to_coverage_enable(def.multisample.alpha_to_coverage);
        if let Some(min_sample_shading) = def.multisample.sample_shading {
            multisample = multisample
                .sample_shading_enable(true)
                .min_sample_shading(min_sample_shading);
        }

        let ds = &def.depth_stencil;
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(ds.depth_test_enable)
            .depth_write_enable(ds.depth_write_enable)
            .depth_compare_op(compare_op_to_vk(ds.depth_compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(ds.stencil_test_enable)
            .front(stencil_op_state_to_vk(&ds.front))
            .back(stencil_op_state_to_vk(&ds.back));

        // One blend attachment per color target, all sharing the same state
        let blend = &def.color_blend;
        let blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(blend.blend_enable)
            .src_color_blend_factor(blend_factor_to_vk(blend.src_color_factor))
            .dst_color_blend_factor(blend_factor_to_vk(blend.dst_color_factor))
            .color_blend_op(blend_op_to_vk(blend.color_blend_op))
            .src_alpha_blend_factor(blend_factor_to_vk(blend.src_alpha_factor))
            .dst_alpha_blend_factor(blend_factor_to_vk(blend.dst_alpha_factor))
            .alpha_blend_op(blend_op_to_vk(blend.alpha_blend_op))
            .color_write_mask(color_write_mask_to_vk(&blend.color_write_mask));
        let blend_attachments = vec![blend_attachment; target.color_formats.len()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // Dynamic rendering target formats
        let color_formats: Vec<vk::Format> =
            target.color_formats.iter().map(|f| format_to_vk(*f)).collect();
        let mut rendering = vk::PipelineRenderingCreateInfo::default().color_attachment_formats(&color_formats);
        if let Some(depth) = target.depth_format {
            rendering = rendering.depth_attachment_format(format_to_vk(depth));
            if depth.has_stencil() {
                rendering = rendering.stencil_attachment_format(format_to_vk(depth));
            }
        }

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(vk_handle(desc.layout.as_raw()))
            .push_next(&mut rendering);

        let pipelines = unsafe {
            self.device()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        }
        .map_err(|(_, e)| {
            engine_error!("strata::vulkan", "Failed to create graphics pipeline: {:?}", e);
            vk_result_to_error(e, "vkCreateGraphicsPipelines")
        })?;

        let pipeline = pipelines.into_iter().next().ok_or_else(|| {
            engine_error!("strata::vulkan", "vkCreateGraphicsPipelines returned no pipeline");
            Error::BackendError("No graphics pipeline created".to_string())
        })?;

        Ok(PipelineHandle::from_raw(pipeline.as_raw()))
    }

    fn create_compute_pipeline(&mut self, desc: &ComputePipelineDesc) -> Result<PipelineHandle> {
        let shader = &desc.definition.shader;
        let entry = entry_point_name(&shader.entry_point)?;
        let stage = Self::create_pipeline_stage(vk::ShaderStageFlags::COMPUTE, shader.module, &entry);

        let create_info = vk::ComputePipelineCreateInfo::default()
            .stage(stage)
            .layout(vk_handle(desc.layout.as_raw()));

        let pipelines = unsafe {
            self.device()
                .create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None)
        }
        .map_err(|(_, e)| {
            engine_error!("strata::vulkan", "Failed to create compute pipeline: {:?}", e);
            vk_result_to_error(e, "vkCreateComputePipelines")
        })?;

        let pipeline = pipelines.into_iter().next().ok_or_else(|| {
            engine_error!("strata::vulkan", "vkCreateComputePipelines returned no pipeline");
            Error::BackendError("No compute pipeline created".to_string())
        })?;

        Ok(PipelineHandle::from_raw(pipeline.as_raw()))
    }

    // ===== DESCRIPTORS =====

    fn create_descriptor_pool(&mut self, desc: &DescriptorPoolDesc) -> Result<DescriptorPoolHandle> {
        let pool_sizes: Vec<vk::DescriptorPoolSize> = desc
            .sizes
            .iter()
            .filter(|s| s.count > 0)
            .map(|s| vk::DescriptorPoolSize {
                ty: descriptor_type_to_vk(s.descriptor_type),
                descriptor_count: s.count,
            })
            .collect();

        let create_info = vk::DescriptorPoolCreateInfo::default()
            .flags(pool_flags_to_vk(desc.flags))
            .max_sets(desc.max_sets)
            .pool_sizes(&pool_sizes);

        let pool = unsafe { self.device().create_descriptor_pool(&create_info, None) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create descriptor pool: {:?}", e);
                vk_result_to_error(e, "vkCreateDescriptorPool")
            })?;

        engine_debug!(
            "strata::vulkan",
            "Created descriptor pool (max {} sets, {} pool sizes)",
            desc.max_sets, pool_sizes.len()
        );

        Ok(DescriptorPoolHandle::from_raw(pool.as_raw()))
    }

    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>> {
        if layouts.is_empty() {
            return Ok(Vec::new());
        }

        let vk_layouts: Vec<vk::DescriptorSetLayout> =
            layouts.iter().map(|l| vk_handle(l.as_raw())).collect();
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(vk_handle(pool.as_raw()))
            .set_layouts(&vk_layouts);

        let sets = unsafe { self.device().allocate_descriptor_sets(&allocate_info) }
            .map_err(|e| {
                let err = vk_result_to_error(e, "vkAllocateDescriptorSets");
                // Pool capacity is recoverable, the caller decides what to do
                if err.is_pool_capacity() {
                    engine_debug!("strata::vulkan", "Descriptor set allocation hit pool capacity: {:?}", e);
                } else {
                    engine_error!("strata::vulkan", "Failed to allocate descriptor sets: {:?}", e);
                }
                err
            })?;

        Ok(sets.into_iter().map(|s| DescriptorSetHandle::from_raw(s.as_raw())).collect())
    }

    fn reset_descriptor_pool(&mut self, pool: DescriptorPoolHandle) -> Result<()> {
        unsafe {
            self.device()
                .reset_descriptor_pool(vk_handle(pool.as_raw()), vk::DescriptorPoolResetFlags::empty())
        }
        .map_err(|e| {
            engine_error!("strata::vulkan", "Failed to reset descriptor pool: {:?}", e);
            vk_result_to_error(e, "vkResetDescriptorPool")
        })
    }

    fn update_descriptor_sets(&mut self, writes: &[DescriptorWrite]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }

        // Infos are collected first so the writes can borrow them
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::new();
        let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::new();
        let mut slots: Vec<WriteInfo> = Vec::with_capacity(writes.len());

        for write in writes {
            if !resource_matches(write.descriptor_type, &write.resource) {
                engine_error!(
                    "strata::vulkan",
                    "Descriptor write to binding {} mixes {:?} with {:?}",
                    write.binding, write.descriptor_type, write.resource
                );
                return Err(Error::InvalidResource(format!(
                    "descriptor type {:?} does not accept this resource",
                    write.descriptor_type
                )));
            }

            match write.resource {
                DescriptorResource::Image { view, layout } => {
                    image_infos.push(vk::DescriptorImageInfo {
                        sampler: vk::Sampler::null(),
                        image_view: vk_handle(view.as_raw()),
                        image_layout: image_layout_to_vk(layout),
                    });
                    slots.push(WriteInfo::Image(image_infos.len() - 1));
                }
                DescriptorResource::CombinedImageSampler { view, layout, sampler } => {
                    image_infos.push(vk::DescriptorImageInfo {
                        sampler: vk_handle(sampler.as_raw()),
                        image_view: vk_handle(view.as_raw()),
                        image_layout: image_layout_to_vk(layout),
                    });
                    slots.push(WriteInfo::Image(image_infos.len() - 1));
                }
                DescriptorResource::Sampler(sampler) => {
                    image_infos.push(vk::DescriptorImageInfo {
                        sampler: vk_handle(sampler.as_raw()),
                        image_view: vk::ImageView::null(),
                        image_layout: vk::ImageLayout::UNDEFINED,
                    });
                    slots.push(WriteInfo::Image(image_infos.len() - 1));
                }
                DescriptorResource::Buffer { buffer, offset, range } => {
                    buffer_infos.push(vk::DescriptorBufferInfo {
                        buffer: vk_handle(buffer.as_raw()),
                        offset,
                        range,
                    });
                    slots.push(WriteInfo::Buffer(buffer_infos.len() - 1));
                }
            }
        }

        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .zip(slots.iter())
            .map(|(write, slot)| {
                let base = vk::WriteDescriptorSet::default()
                    .dst_set(vk_handle(write.set.as_raw()))
                    .dst_binding(write.binding)
                    .dst_array_element(write.array_element)
                    .descriptor_type(descriptor_type_to_vk(write.descriptor_type));
                match slot {
                    WriteInfo::Image(i) => base.image_info(std::slice::from_ref(&image_infos[*i])),
                    WriteInfo::Buffer(i) => base.buffer_info(std::slice::from_ref(&buffer_infos[*i])),
                }
            })
            .collect();

        unsafe {
            self.device().update_descriptor_sets(&vk_writes, &[]);
        }
        Ok(())
    }

    // ===== COMMANDS & SYNC =====

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(VulkanCommandList::new(Arc::clone(&self.context))?))
    }

    fn create_fence(&mut self, signaled: bool) -> Result<FenceHandle> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { self.device().create_fence(&create_info, None) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create fence: {:?}", e);
                vk_result_to_error(e, "vkCreateFence")
            })?;

        Ok(FenceHandle::from_raw(fence.as_raw()))
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreHandle> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { self.device().create_semaphore(&create_info, None) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create semaphore: {:?}", e);
                vk_result_to_error(e, "vkCreateSemaphore")
            })?;

        Ok(SemaphoreHandle::from_raw(semaphore.as_raw()))
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        let fences = [vk_handle::<vk::Fence>(fence.as_raw())];
        unsafe { self.device().reset_fences(&fences) }
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to reset fence: {:?}", e);
                vk_result_to_error(e, "vkResetFences")
            })
    }

    fn wait_fence(&self, fence: FenceHandle, timeout_ns: u64) -> Result<()> {
        let fences = [vk_handle::<vk::Fence>(fence.as_raw())];
        match unsafe { self.device().wait_for_fences(&fences, true, timeout_ns) } {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => {
                engine_warn!("strata::vulkan", "Fence wait timed out after {} ns", timeout_ns);
                Err(Error::BackendError(format!("Fence wait timed out after {} ns", timeout_ns)))
            }
            Err(e) => {
                engine_error!("strata::vulkan", "Failed to wait for fence: {:?}", e);
                Err(vk_result_to_error(e, "vkWaitForFences"))
            }
        }
    }

    fn submit(
        &mut self,
        commands: &[&dyn CommandList],
        waits: &[SemaphoreWait],
        signals: &[SemaphoreHandle],
        fence: Option<FenceHandle>,
    ) -> Result<()> {
        let command_infos: Vec<vk::CommandBufferSubmitInfo> = commands
            .iter()
            .map(|cmd| vk::CommandBufferSubmitInfo::default().command_buffer(vk_handle(cmd.native_handle())))
            .collect();

        let wait_infos: Vec<vk::SemaphoreSubmitInfo> = waits
            .iter()
            .map(|w| {
                vk::SemaphoreSubmitInfo::default()
                    .semaphore(vk_handle(w.semaphore.as_raw()))
                    .stage_mask(stages_to_vk(w.stages))
            })
            .collect();

        let signal_infos: Vec<vk::SemaphoreSubmitInfo> = signals
            .iter()
            .map(|s| {
                vk::SemaphoreSubmitInfo::default()
                    .semaphore(vk_handle(s.as_raw()))
                    .stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
            })
            .collect();

        let submit_info = vk::SubmitInfo2::default()
            .wait_semaphore_infos(&wait_infos)
            .command_buffer_infos(&command_infos)
            .signal_semaphore_infos(&signal_infos);

        let fence = fence
            .map(|f| vk_handle::<vk::Fence>(f.as_raw()))
            .unwrap_or_else(vk::Fence::null);

        unsafe {
            self.device()
                .queue_submit2(self.context.graphics_queue, &[submit_info], fence)
        }
        .map_err(|e| {
            engine_error!("strata::vulkan", "Failed to submit command buffers: {:?}", e);
            vk_result_to_error(e, "vkQueueSubmit2")
        })
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.device().device_wait_idle() }.map_err(|e| {
            engine_error!("strata::vulkan", "Failed to wait for device idle: {:?}", e);
            vk_result_to_error(e, "vkDeviceWaitIdle")
        })
    }

    // ===== DESTRUCTION =====

    fn destroy_shader_module(&mut self, shader: ShaderHandle) {
        if shader.is_null() {
            return;
        }
        unsafe { self.device().destroy_shader_module(vk_handle(shader.as_raw()), None) };
    }

    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutHandle) {
        if layout.is_null() {
            return;
        }
        unsafe { self.device().destroy_descriptor_set_layout(vk_handle(layout.as_raw()), None) };
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutHandle) {
        if layout.is_null() {
            return;
        }
        unsafe { self.device().destroy_pipeline_layout(vk_handle(layout.as_raw()), None) };
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        if pipeline.is_null() {
            return;
        }
        unsafe { self.device().destroy_pipeline(vk_handle(pipeline.as_raw()), None) };
    }

    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolHandle) {
        if pool.is_null() {
            return;
        }
        // Sets allocated from the pool are freed with it
        unsafe { self.device().destroy_descriptor_pool(vk_handle(pool.as_raw()), None) };
    }

    fn destroy_fence(&mut self, fence: FenceHandle) {
        if fence.is_null() {
            return;
        }
        unsafe { self.device().destroy_fence(vk_handle(fence.as_raw()), None) };
    }

    fn destroy_semaphore(&mut self, semaphore: SemaphoreHandle) {
        if semaphore.is_null() {
            return;
        }
        unsafe { self.device().destroy_semaphore(vk_handle(semaphore.as_raw()), None) };
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        if let Err(e) = self.wait_idle() {
            engine_warn!("strata::vulkan", "wait_idle failed while dropping device: {}", e);
        }
        // The context (device, instance) goes with the last Arc holder
        if Arc::strong_count(&self.context) > 1 {
            engine_debug!(
                "strata::vulkan",
                "{} command list(s) still alive, device teardown deferred",
                Arc::strong_count(&self.context) - 1
            );
        }
    }
}

//! Shared Vulkan context (device, queue, instance)
//!
//! Owned by `Arc` by the graphics device and by every command list, so the
//! logical device outlives the last object that records into it.

use ash::vk;
use strata_render::engine_debug;

pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// Graphics queue (submission and idle waits)
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Vulkan instance (destroyed after the device)
    instance: ash::Instance,

    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,

    /// Loader library, must outlive the instance
    entry: ash::Entry,
}

impl GpuContext {
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        device: ash::Device,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
    ) -> Self {
        Self {
            device,
            graphics_queue,
            graphics_queue_family,
            instance,
            #[cfg(feature = "vulkan-validation")]
            debug_utils_loader: None,
            #[cfg(feature = "vulkan-validation")]
            debug_messenger: None,
            entry,
        }
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub(crate) fn entry(&self) -> &ash::Entry {
        &self.entry
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            // Nothing may still execute when the device goes away
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);

            #[cfg(feature = "vulkan-validation")]
            if let (Some(loader), Some(messenger)) =
                (self.debug_utils_loader.as_ref(), self.debug_messenger.take())
            {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }

        engine_debug!("strata::vulkan", "Vulkan device and instance destroyed");
    }
}

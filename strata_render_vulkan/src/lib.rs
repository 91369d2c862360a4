/*!
# Strata Render - Vulkan Backend

Vulkan implementation of the `GraphicsDevice` and `CommandList` traits of
`strata_render`, built on Ash.

The device is headless and targets Vulkan 1.3: passes record through
dynamic rendering, barriers go through synchronization2 and the bindless
set uses descriptor indexing.

# Example

```no_run
use std::sync::{Arc, Mutex};
use strata_render::strata::{Config, FrameSlots, RenderContext};
use strata_render_vulkan::VulkanGraphicsDevice;

let config = Config::default();
let device = Arc::new(Mutex::new(VulkanGraphicsDevice::new(&config)?));
let context = RenderContext::new(device.clone(), config.clone())?;
let frames = FrameSlots::new(device, &config)?;
# Ok::<(), strata_render::strata::Error>(())
```
*/

mod vulkan_convert;
mod vulkan_context;
mod vulkan_command_list;
mod vulkan_device;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_context::GpuContext;
pub use vulkan_command_list::VulkanCommandList;
pub use vulkan_device::VulkanGraphicsDevice;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};

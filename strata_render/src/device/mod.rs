//! Device module - handles, state types and the traits a backend implements

pub mod handles;
pub mod image;
pub mod buffer;
pub mod descriptor;
pub mod pipeline;
pub mod command_list;
pub mod graphics_device;

pub use handles::*;
pub use image::*;
pub use buffer::*;
pub use descriptor::*;
pub use pipeline::*;
pub use command_list::*;
pub use graphics_device::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;

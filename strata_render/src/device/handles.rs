//! Opaque device object handles
//!
//! Every object the device creates crosses the trait boundary as a `Copy`
//! newtype over `u64`. Backends pack their native handle into the raw value
//! (Vulkan: `vk::Handle::as_raw`). `0` is the null handle.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(u64);

        impl $name {
            /// The null handle
            pub const NULL: Self = Self(0);

            /// Wrap a raw backend handle
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw backend handle
            pub const fn as_raw(self) -> u64 {
                self.0
            }

            /// Whether this is the null handle
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

define_handle!(
    /// Image (texture or attachment) owned outside the core
    ImageHandle
);
define_handle!(
    /// View onto an image
    ImageViewHandle
);
define_handle!(
    /// GPU buffer
    BufferHandle
);
define_handle!(
    /// Sampler object
    SamplerHandle
);
define_handle!(
    /// Compiled shader module
    ShaderHandle
);
define_handle!(
    /// Graphics or compute pipeline
    PipelineHandle
);
define_handle!(PipelineLayoutHandle);
define_handle!(DescriptorSetLayoutHandle);
define_handle!(DescriptorPoolHandle);
define_handle!(DescriptorSetHandle);
define_handle!(
    /// CPU-waitable completion fence
    FenceHandle
);
define_handle!(
    /// GPU-GPU semaphore
    SemaphoreHandle
);

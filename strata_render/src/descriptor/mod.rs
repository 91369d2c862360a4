//! Descriptor management: layout cache, pools and batched writes

pub mod pool_sizes;
pub mod static_pool;
pub mod dynamic_pool;
pub mod layout_cache;
pub mod writer;

pub use pool_sizes::{default_frame_ratios, pool_sizes, PoolSizeRatio};
pub use static_pool::StaticDescriptorPool;
pub use dynamic_pool::DynamicDescriptorPool;
pub use layout_cache::DescriptorLayoutCache;
pub use writer::DescriptorWriter;

//! Pipeline definitions and the pipeline cache

pub mod definition;
pub mod pipeline_cache;

pub use definition::{ComputePipelineDefinition, GraphicsPipelineDefinition, PipelineBinding, TargetInfo};
pub use pipeline_cache::{PipelineCache, PipelineCacheStats};

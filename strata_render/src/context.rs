/// Render context: the services the render graph and its passes use
///
/// Built once from a device and a `Config`, then shared by `Arc`. Owns the
/// descriptor layout cache, the pipeline cache and the bindless registry.
/// Nothing here is global; whatever needs these services is handed the
/// context explicitly.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::engine_info;
use crate::error::Result;
use crate::bindless::BindlessRegistry;
use crate::config::Config;
use crate::descriptor::DescriptorLayoutCache;
use crate::device::{
    DescriptorBinding, DescriptorSetHandle, DescriptorSetLayoutFlags, DescriptorSetLayoutHandle,
    ShaderStageFlags, SharedDevice,
};
use crate::pipeline::{
    ComputePipelineDefinition, GraphicsPipelineDefinition, PipelineBinding, PipelineCache, TargetInfo,
};
use crate::utils::lock;

pub struct RenderContext {
    config: Config,
    // Field order is teardown order: the bindless pool and cached pipelines
    // go before the layouts they were built from
    bindless: Mutex<BindlessRegistry>,
    pipelines: Mutex<PipelineCache>,
    layouts: Mutex<DescriptorLayoutCache>,
    device: SharedDevice,
}

impl RenderContext {
    /// Build the caches and the bindless set on `device`
    pub fn new(device: SharedDevice, config: Config) -> Result<Arc<Self>> {
        config.validate()?;

        let mut layouts = DescriptorLayoutCache::new(device.clone());
        let bindless = BindlessRegistry::new(device.clone(), &mut layouts, config.bindless)?;
        let pipelines = PipelineCache::new(device.clone());

        engine_info!(
            "strata::RenderContext",
            "Render context ready for '{}' ({} frames in flight)",
            config.app_name, config.frames_in_flight
        );

        Ok(Arc::new(Self {
            config,
            bindless: Mutex::new(bindless),
            pipelines: Mutex::new(pipelines),
            layouts: Mutex::new(layouts),
            device,
        }))
    }

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Exclusive access to the descriptor layout cache
    pub fn layout_cache(&self) -> Result<MutexGuard<'_, DescriptorLayoutCache>> {
        lock(&self.layouts, "layout cache")
    }

    /// Exclusive access to the pipeline cache
    pub fn pipeline_cache(&self) -> Result<MutexGuard<'_, PipelineCache>> {
        lock(&self.pipelines, "pipeline cache")
    }

    /// Exclusive access to the bindless registry
    pub fn bindless(&self) -> Result<MutexGuard<'_, BindlessRegistry>> {
        lock(&self.bindless, "bindless registry")
    }

    /// Shortcut for `layout_cache()?.fetch_layout(..)`
    pub fn fetch_layout(
        &self,
        stages: ShaderStageFlags,
        bindings: &[DescriptorBinding],
        flags: DescriptorSetLayoutFlags,
    ) -> Result<DescriptorSetLayoutHandle> {
        self.layout_cache()?.fetch_layout(stages, bindings, flags)
    }

    /// Shortcut for `pipeline_cache()?.fetch_graphics_pipeline(..)`
    pub fn fetch_graphics_pipeline(
        &self,
        definition: &GraphicsPipelineDefinition,
        target: &TargetInfo,
    ) -> Result<PipelineBinding> {
        self.pipeline_cache()?.fetch_graphics_pipeline(definition, target)
    }

    /// Shortcut for `pipeline_cache()?.fetch_compute_pipeline(..)`
    pub fn fetch_compute_pipeline(&self, definition: &ComputePipelineDefinition) -> Result<PipelineBinding> {
        self.pipeline_cache()?.fetch_compute_pipeline(definition)
    }

    /// The bindless descriptor set and its layout
    pub fn bindless_set(&self) -> Result<(DescriptorSetHandle, DescriptorSetLayoutHandle)> {
        let bindless = self.bindless()?;
        Ok((bindless.descriptor_set(), bindless.layout()))
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

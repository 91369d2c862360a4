//! Unit tests for pipeline_cache.rs
//!
//! Determinism, discrimination and layout sharing, observed through the
//! mock device's call counters.

use std::sync::{Arc, Mutex};
use crate::device::mock_graphics_device::MockGraphicsDevice;
use crate::device::*;
use crate::error::Error;
use crate::pipeline::*;

fn setup() -> (Arc<Mutex<MockGraphicsDevice>>, PipelineCache) {
    let mock = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let device: SharedDevice = mock.clone();
    (mock, PipelineCache::new(device))
}

fn opaque_definition() -> GraphicsPipelineDefinition {
    let mut def = GraphicsPipelineDefinition::new(
        ShaderEntry::main(ShaderHandle::from_raw(100)),
        Some(ShaderEntry::main(ShaderHandle::from_raw(101))),
    );
    def.vertex_layout = VertexLayout {
        bindings: vec![VertexBinding { binding: 0, stride: 32, input_rate: VertexInputRate::Vertex }],
        attributes: vec![
            VertexAttribute { location: 0, binding: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 0 },
            VertexAttribute { location: 1, binding: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 12 },
            VertexAttribute { location: 2, binding: 0, format: BufferFormat::R32G32_SFLOAT, offset: 24 },
        ],
    };
    def.push_constant_size = 64;
    def.descriptor_set_layouts = vec![DescriptorSetLayoutHandle::from_raw(7)];
    def
}

fn hdr_target() -> TargetInfo {
    TargetInfo::color(&[TextureFormat::R16G16B16A16_SFLOAT]).with_depth(TextureFormat::D32_FLOAT)
}

// ============================================================================
// DETERMINISM
// ============================================================================

#[test]
fn test_field_equal_definitions_hit_cache() {
    let (mock, mut cache) = setup();

    let first = cache.fetch_graphics_pipeline(&opaque_definition(), &hdr_target()).unwrap();
    let calls_after_first = mock.lock().unwrap().counts;

    // Separately built but field-equal inputs
    let second = cache.fetch_graphics_pipeline(&opaque_definition(), &hdr_target()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.bind_point, PipelineBindPoint::Graphics);
    assert_eq!(mock.lock().unwrap().counts, calls_after_first);
    assert_eq!(calls_after_first.create_graphics_pipeline, 1);
    assert_eq!(calls_after_first.create_pipeline_layout, 1);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.pipelines, 1);
    assert_eq!(stats.layouts, 1);
}

// ============================================================================
// DISCRIMINATION
// ============================================================================

#[test]
fn test_cull_mode_changes_pipeline() {
    let (_mock, mut cache) = setup();
    let base = opaque_definition();
    let mut changed = opaque_definition();
    changed.rasterization.cull_mode = CullMode::None;

    let a = cache.fetch_graphics_pipeline(&base, &hdr_target()).unwrap();
    let b = cache.fetch_graphics_pipeline(&changed, &hdr_target()).unwrap();
    assert_ne!(a.pipeline, b.pipeline);
}

#[test]
fn test_depth_compare_op_changes_pipeline() {
    let (_mock, mut cache) = setup();
    let base = opaque_definition();
    let mut changed = opaque_definition();
    changed.depth_stencil.depth_compare_op = CompareOp::GreaterOrEqual;

    let a = cache.fetch_graphics_pipeline(&base, &hdr_target()).unwrap();
    let b = cache.fetch_graphics_pipeline(&changed, &hdr_target()).unwrap();
    assert_ne!(a.pipeline, b.pipeline);
}

#[test]
fn test_single_blend_factor_changes_pipeline() {
    let (_mock, mut cache) = setup();
    let base = opaque_definition();
    let mut changed = opaque_definition();
    changed.color_blend.dst_alpha_factor = BlendFactor::One;

    let a = cache.fetch_graphics_pipeline(&base, &hdr_target()).unwrap();
    let b = cache.fetch_graphics_pipeline(&changed, &hdr_target()).unwrap();
    assert_ne!(a.pipeline, b.pipeline);
}

#[test]
fn test_sample_shading_changes_pipeline() {
    let (_mock, mut cache) = setup();
    let base = opaque_definition();
    let mut changed = opaque_definition();
    changed.multisample.sample_shading = Some(1.0);

    let a = cache.fetch_graphics_pipeline(&base, &hdr_target()).unwrap();
    let b = cache.fetch_graphics_pipeline(&changed, &hdr_target()).unwrap();
    assert_ne!(a.pipeline, b.pipeline);
}

#[test]
fn test_target_formats_and_samples_change_pipeline() {
    let (_mock, mut cache) = setup();
    let def = opaque_definition();

    let hdr = cache.fetch_graphics_pipeline(&def, &hdr_target()).unwrap();
    let ldr = cache.fetch_graphics_pipeline(
        &def,
        &TargetInfo::color(&[TextureFormat::B8G8R8A8_SRGB]).with_depth(TextureFormat::D32_FLOAT),
    ).unwrap();
    let msaa = cache.fetch_graphics_pipeline(&def, &hdr_target().with_samples(SampleCount::S4)).unwrap();

    assert_ne!(hdr.pipeline, ldr.pipeline);
    assert_ne!(hdr.pipeline, msaa.pipeline);
    // Targets do not affect the layout
    assert_eq!(hdr.layout, ldr.layout);
    assert_eq!(hdr.layout, msaa.layout);
}

// ============================================================================
// LAYOUT SHARING
// ============================================================================

#[test]
fn test_rasterizer_variants_share_layout() {
    let (mock, mut cache) = setup();
    let solid = opaque_definition();
    let mut wireframe = opaque_definition();
    wireframe.rasterization.polygon_mode = PolygonMode::Line;

    let a = cache.fetch_graphics_pipeline(&solid, &hdr_target()).unwrap();
    let b = cache.fetch_graphics_pipeline(&wireframe, &hdr_target()).unwrap();

    assert_eq!(a.layout, b.layout);
    assert_ne!(a.pipeline, b.pipeline);
    let counts = mock.lock().unwrap().counts;
    assert_eq!(counts.create_pipeline_layout, 1);
    assert_eq!(counts.create_graphics_pipeline, 2);
}

#[test]
fn test_layout_shape_changes_create_new_layout() {
    let (_mock, mut cache) = setup();
    let base = opaque_definition();

    let mut more_push = opaque_definition();
    more_push.push_constant_size = 128;

    let mut other_sets = opaque_definition();
    other_sets.descriptor_set_layouts.push(DescriptorSetLayoutHandle::from_raw(8));

    let mut depth_only = opaque_definition();
    depth_only.fragment_shader = None;

    let a = cache.fetch_graphics_pipeline(&base, &hdr_target()).unwrap();
    let b = cache.fetch_graphics_pipeline(&more_push, &hdr_target()).unwrap();
    let c = cache.fetch_graphics_pipeline(&other_sets, &hdr_target()).unwrap();
    let d = cache.fetch_graphics_pipeline(&depth_only, &hdr_target()).unwrap();

    assert_ne!(a.layout, b.layout);
    assert_ne!(a.layout, c.layout);
    assert_ne!(a.layout, d.layout);
    assert_eq!(cache.stats().layouts, 4);
}

// ============================================================================
// COMPUTE
// ============================================================================

#[test]
fn test_compute_pipeline_cached_by_shader_identity() {
    let (mock, mut cache) = setup();
    let mut blur = ComputePipelineDefinition::new(ShaderEntry::main(ShaderHandle::from_raw(200)));
    blur.descriptor_set_layouts = vec![DescriptorSetLayoutHandle::from_raw(9)];
    blur.push_constant_size = 16;

    let mut blur_vertical = blur.clone();
    blur_vertical.shader.entry_point = "vertical".to_string();

    let a = cache.fetch_compute_pipeline(&blur).unwrap();
    let again = cache.fetch_compute_pipeline(&blur.clone()).unwrap();
    let b = cache.fetch_compute_pipeline(&blur_vertical).unwrap();

    assert_eq!(a, again);
    assert_eq!(a.bind_point, PipelineBindPoint::Compute);
    assert_ne!(a.pipeline, b.pipeline);
    assert_eq!(a.layout, b.layout);
    assert_eq!(mock.lock().unwrap().counts.create_compute_pipeline, 2);
}

// ============================================================================
// FAILURE / TEARDOWN
// ============================================================================

#[test]
fn test_creation_failure_is_returned_and_not_cached() {
    let (mock, mut cache) = setup();
    mock.lock().unwrap().pipeline_failure = Some(Error::BackendError("rejected".to_string()));

    let result = cache.fetch_graphics_pipeline(&opaque_definition(), &hdr_target());
    assert_eq!(result, Err(Error::BackendError("rejected".to_string())));
    assert_eq!(cache.stats().pipelines, 0);

    mock.lock().unwrap().pipeline_failure = None;
    assert!(cache.fetch_graphics_pipeline(&opaque_definition(), &hdr_target()).is_ok());
    assert_eq!(mock.lock().unwrap().counts.create_graphics_pipeline, 2);
}

#[test]
fn test_drop_destroys_pipelines_and_layouts() {
    let (mock, mut cache) = setup();
    cache.fetch_graphics_pipeline(&opaque_definition(), &hdr_target()).unwrap();
    cache.fetch_compute_pipeline(&ComputePipelineDefinition::new(ShaderEntry::main(ShaderHandle::from_raw(5)))).unwrap();

    drop(cache);

    let counts = mock.lock().unwrap().counts;
    assert_eq!(counts.destroy_pipeline, 2);
    assert_eq!(counts.destroy_pipeline_layout, 2);
}

//! Unit tests for image.rs

use crate::device::image::*;

#[test]
fn test_depth_format_classification() {
    assert!(TextureFormat::D32_FLOAT.is_depth());
    assert!(TextureFormat::D24_UNORM_S8_UINT.is_depth());
    assert!(!TextureFormat::R8G8B8A8_UNORM.is_depth());

    assert!(TextureFormat::D24_UNORM_S8_UINT.has_stencil());
    assert!(!TextureFormat::D16_UNORM.has_stencil());
}

#[test]
fn test_format_aspect() {
    assert_eq!(TextureFormat::B8G8R8A8_SRGB.aspect(), ImageAspect::COLOR);
    assert_eq!(TextureFormat::D32_FLOAT.aspect(), ImageAspect::DEPTH);
    assert_eq!(
        TextureFormat::D32_FLOAT_S8_UINT.aspect(),
        ImageAspect::DEPTH | ImageAspect::STENCIL
    );
}

#[test]
fn test_default_state_is_undefined() {
    assert_eq!(ResourceState::default(), ResourceState::UNDEFINED);
    assert_eq!(ResourceState::UNDEFINED.layout, ImageLayout::Undefined);
}

#[test]
fn test_read_only_classification() {
    assert!(ResourceState::SHADER_READ_ONLY.is_read_only());
    assert!(ResourceState::DEPTH_READ_ONLY.is_read_only());
    assert!(ResourceState::TRANSFER_SRC.is_read_only());
    assert!(ResourceState::PRESENT.is_read_only());

    assert!(ResourceState::COLOR_ATTACHMENT.is_write());
    assert!(ResourceState::DEPTH_ATTACHMENT.is_write());
    assert!(ResourceState::GENERAL.is_write());
    assert!(ResourceState::TRANSFER_DST.is_write());
}

#[test]
fn test_src_access_drops_reads() {
    let src = ResourceState::COLOR_ATTACHMENT.src_access();
    assert_eq!(src, AccessFlags::COLOR_ATTACHMENT_WRITE);
    assert!(ResourceState::SHADER_READ_ONLY.src_access().is_empty());
}

#[test]
fn test_barrier_skipped_only_for_same_read_only_state() {
    let read = ResourceState::SHADER_READ_ONLY;
    assert!(!read.needs_barrier_to(&read));

    // write after write in the same layout
    let write = ResourceState::COLOR_ATTACHMENT;
    assert!(write.needs_barrier_to(&write));

    assert!(read.needs_barrier_to(&write));
    assert!(write.needs_barrier_to(&read));
}

#[test]
fn test_stage_bits_match_vulkan() {
    assert_eq!(PipelineStages::COLOR_ATTACHMENT_OUTPUT.bits(), 0x400);
    assert_eq!(PipelineStages::COMPUTE_SHADER.bits(), 0x800);
    assert_eq!(AccessFlags::SHADER_SAMPLED_READ.bits(), 0x1_0000_0000);
}

//! Unit tests for layout_cache.rs

use std::sync::{Arc, Mutex};
use crate::descriptor::DescriptorLayoutCache;
use crate::device::mock_graphics_device::MockGraphicsDevice;
use crate::device::*;

fn setup() -> (Arc<Mutex<MockGraphicsDevice>>, DescriptorLayoutCache) {
    let mock = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let device: SharedDevice = mock.clone();
    (mock, DescriptorLayoutCache::new(device))
}

fn material_bindings() -> Vec<DescriptorBinding> {
    vec![
        DescriptorBinding::new(0, DescriptorType::UniformBuffer),
        DescriptorBinding::new(1, DescriptorType::CombinedImageSampler),
    ]
}

#[test]
fn test_field_equal_requests_share_one_layout() {
    let (mock, mut cache) = setup();

    let a = cache.fetch_layout(ShaderStageFlags::ALL_GRAPHICS, &material_bindings(), DescriptorSetLayoutFlags::empty()).unwrap();
    let b = cache.fetch_layout(ShaderStageFlags::ALL_GRAPHICS, &material_bindings(), DescriptorSetLayoutFlags::empty()).unwrap();

    assert_eq!(a, b);
    assert_eq!(cache.len(), 1);
    assert_eq!(mock.lock().unwrap().counts.create_descriptor_set_layout, 1);
}

#[test]
fn test_changed_count_yields_new_layout() {
    let (_mock, mut cache) = setup();
    let base = material_bindings();
    let mut arrayed = material_bindings();
    arrayed[1].count = 4;

    let a = cache.fetch_layout(ShaderStageFlags::FRAGMENT, &base, DescriptorSetLayoutFlags::empty()).unwrap();
    let b = cache.fetch_layout(ShaderStageFlags::FRAGMENT, &arrayed, DescriptorSetLayoutFlags::empty()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_changed_binding_flag_yields_new_layout() {
    let (_mock, mut cache) = setup();
    let base = material_bindings();
    let mut partial = material_bindings();
    partial[1].flags = DescriptorBindingFlags::PARTIALLY_BOUND;

    let a = cache.fetch_layout(ShaderStageFlags::FRAGMENT, &base, DescriptorSetLayoutFlags::empty()).unwrap();
    let b = cache.fetch_layout(ShaderStageFlags::FRAGMENT, &partial, DescriptorSetLayoutFlags::empty()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_stages_and_create_flags_are_part_of_key() {
    let (_mock, mut cache) = setup();
    let bindings = material_bindings();

    let a = cache.fetch_layout(ShaderStageFlags::FRAGMENT, &bindings, DescriptorSetLayoutFlags::empty()).unwrap();
    let b = cache.fetch_layout(ShaderStageFlags::COMPUTE, &bindings, DescriptorSetLayoutFlags::empty()).unwrap();
    let c = cache.fetch_layout(ShaderStageFlags::FRAGMENT, &bindings, DescriptorSetLayoutFlags::UPDATE_AFTER_BIND_POOL).unwrap();

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(cache.len(), 3);
}

#[test]
fn test_binding_type_is_part_of_key() {
    let (_mock, mut cache) = setup();
    let a = cache.fetch_layout(
        ShaderStageFlags::COMPUTE,
        &[DescriptorBinding::new(0, DescriptorType::StorageImage)],
        DescriptorSetLayoutFlags::empty(),
    ).unwrap();
    let b = cache.fetch_layout(
        ShaderStageFlags::COMPUTE,
        &[DescriptorBinding::new(0, DescriptorType::StorageBuffer)],
        DescriptorSetLayoutFlags::empty(),
    ).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_destroy_all_and_drop() {
    let (mock, mut cache) = setup();
    cache.fetch_layout(ShaderStageFlags::VERTEX, &material_bindings(), DescriptorSetLayoutFlags::empty()).unwrap();
    cache.fetch_layout(ShaderStageFlags::FRAGMENT, &material_bindings(), DescriptorSetLayoutFlags::empty()).unwrap();

    cache.destroy_all();
    assert!(cache.is_empty());
    assert_eq!(mock.lock().unwrap().counts.destroy_descriptor_set_layout, 2);

    cache.fetch_layout(ShaderStageFlags::VERTEX, &material_bindings(), DescriptorSetLayoutFlags::empty()).unwrap();
    drop(cache);
    assert_eq!(mock.lock().unwrap().counts.destroy_descriptor_set_layout, 3);
}

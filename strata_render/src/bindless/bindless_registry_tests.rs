//! Unit tests for bindless_registry.rs

use std::sync::{Arc, Mutex};
use crate::bindless::*;
use crate::descriptor::DescriptorLayoutCache;
use crate::device::mock_graphics_device::MockGraphicsDevice;
use crate::device::*;
use crate::error::Error;

struct Fixture {
    mock: Arc<Mutex<MockGraphicsDevice>>,
    // Keeps the bindless layout alive
    _layouts: DescriptorLayoutCache,
    registry: BindlessRegistry,
}

fn setup_with(capacities: BindlessCapacities) -> Fixture {
    let mock = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let device: SharedDevice = mock.clone();
    let mut layouts = DescriptorLayoutCache::new(device.clone());
    let registry = BindlessRegistry::new(device, &mut layouts, capacities).unwrap();
    Fixture { mock, _layouts: layouts, registry }
}

fn setup() -> Fixture {
    setup_with(BindlessCapacities { samplers: 4, textures_2d: 8, cubemaps: 2 })
}

fn writes(fixture: &Fixture) -> Vec<DescriptorWrite> {
    fixture.mock.lock().unwrap().writes.clone()
}

// ============================================================================
// CREATION
// ============================================================================

#[test]
fn test_overflowing_image_capacity_is_rejected() {
    let mock = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let device: SharedDevice = mock.clone();
    let mut layouts = DescriptorLayoutCache::new(device.clone());
    let capacities = BindlessCapacities { samplers: 1, textures_2d: u32::MAX, cubemaps: 1 };

    let result = BindlessRegistry::new(device, &mut layouts, capacities);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    let counts = mock.lock().unwrap().counts;
    assert_eq!(counts.create_descriptor_set_layout, 0);
    assert_eq!(counts.create_descriptor_pool, 0);
}

#[test]
fn test_set_uses_update_after_bind_pool_and_partial_layout() {
    let fixture = setup();
    let mock = fixture.mock.lock().unwrap();

    assert_eq!(mock.created_pools.len(), 1);
    let pool = &mock.created_pools[0];
    assert_eq!(pool.max_sets, 1);
    assert!(pool.flags.contains(DescriptorPoolFlags::UPDATE_AFTER_BIND));
    assert_eq!(pool.sizes, vec![
        DescriptorPoolSize { descriptor_type: DescriptorType::Sampler, count: 4 },
        DescriptorPoolSize { descriptor_type: DescriptorType::SampledImage, count: 10 },
    ]);

    assert!(!fixture.registry.descriptor_set().is_null());
    assert!(!fixture.registry.layout().is_null());
    // Nothing written until something registers
    assert!(mock.writes.is_empty());
}

#[test]
fn test_bindings_per_category() {
    assert_eq!(BindlessCategory::Sampler.binding(), 0);
    assert_eq!(BindlessCategory::Texture2D.binding(), 1);
    assert_eq!(BindlessCategory::Cubemap.binding(), 2);
    assert_eq!(BindlessCategory::Cubemap.descriptor_type(), DescriptorType::SampledImage);
}

#[test]
fn test_default_capacities() {
    let caps = BindlessCapacities::default();
    assert_eq!((caps.samplers, caps.textures_2d, caps.cubemaps), (64, 1024, 64));
}

// ============================================================================
// IDEMPOTENCE
// ============================================================================

#[test]
fn test_registering_twice_returns_same_handle_with_one_write() {
    let mut fixture = setup();
    let view = ImageViewHandle::from_raw(42);

    let a = fixture.registry.from_texture_2d(view).unwrap();
    let b = fixture.registry.from_texture_2d(view).unwrap();

    assert_eq!(a, b);
    assert_eq!(fixture.registry.len(BindlessCategory::Texture2D), 1);
    let writes = writes(&fixture);
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].binding, 1);
    assert_eq!(writes[0].array_element, a.index());
    assert_eq!(writes[0].set, fixture.registry.descriptor_set());
}

#[test]
fn test_categories_have_independent_indices() {
    let mut fixture = setup();
    let view = ImageViewHandle::from_raw(42);

    let tex = fixture.registry.from_texture_2d(view).unwrap();
    let cube = fixture.registry.from_cubemap(view).unwrap();
    let sampler = fixture.registry.from_sampler(SamplerHandle::from_raw(42)).unwrap();

    assert_eq!(tex.index(), 0);
    assert_eq!(cube.index(), 0);
    assert_eq!(sampler.index(), 0);
    assert_ne!(tex, cube);

    let bindings: Vec<u32> = writes(&fixture).iter().map(|w| w.binding).collect();
    assert_eq!(bindings, vec![1, 2, 0]);
}

#[test]
fn test_sampler_write_shape() {
    let mut fixture = setup();
    fixture.registry.from_sampler(SamplerHandle::from_raw(9)).unwrap();

    let write = writes(&fixture)[0];
    assert_eq!(write.descriptor_type, DescriptorType::Sampler);
    assert_eq!(write.resource, DescriptorResource::Sampler(SamplerHandle::from_raw(9)));
}

#[test]
fn test_texture_write_is_shader_read_only() {
    let mut fixture = setup();
    fixture.registry.from_cubemap(ImageViewHandle::from_raw(3)).unwrap();

    let write = writes(&fixture)[0];
    assert_eq!(
        write.resource,
        DescriptorResource::Image { view: ImageViewHandle::from_raw(3), layout: ImageLayout::ShaderReadOnly }
    );
}

// ============================================================================
// INDEX REUSE / STALE HANDLES
// ============================================================================

#[test]
fn test_unregister_then_register_reuses_index() {
    let mut fixture = setup();
    let a = fixture.registry.from_texture_2d(ImageViewHandle::from_raw(1)).unwrap();
    let _keep = fixture.registry.from_texture_2d(ImageViewHandle::from_raw(2)).unwrap();

    assert!(fixture.registry.unregister(a));
    let b = fixture.registry.from_texture_2d(ImageViewHandle::from_raw(3)).unwrap();

    assert_eq!(b.index(), a.index());
    assert_ne!(a, b);
    assert!(!fixture.registry.is_valid(a));
    assert!(fixture.registry.is_valid(b));
}

#[test]
fn test_stale_handle_never_equals_live_handle() {
    let mut fixture = setup();
    let a = fixture.registry.from_texture_2d(ImageViewHandle::from_raw(1)).unwrap();
    fixture.registry.unregister(a);

    let live: Vec<BindlessHandle> = (10..18)
        .map(|raw| fixture.registry.from_texture_2d(ImageViewHandle::from_raw(raw)).unwrap())
        .collect();

    assert!(live.iter().all(|h| *h != a));
}

#[test]
fn test_stale_unregister_is_noop() {
    let mut fixture = setup();
    let a = fixture.registry.from_texture_2d(ImageViewHandle::from_raw(1)).unwrap();
    assert!(fixture.registry.unregister(a));
    let b = fixture.registry.from_texture_2d(ImageViewHandle::from_raw(2)).unwrap();

    assert!(!fixture.registry.unregister(a));
    assert!(fixture.registry.is_valid(b));
    assert_eq!(fixture.registry.len(BindlessCategory::Texture2D), 1);
}

#[test]
fn test_reregistering_after_unregister_writes_again() {
    let mut fixture = setup();
    let view = ImageViewHandle::from_raw(5);
    let a = fixture.registry.from_texture_2d(view).unwrap();
    fixture.registry.unregister(a);

    let b = fixture.registry.from_texture_2d(view).unwrap();
    assert_ne!(a, b);
    assert_eq!(writes(&fixture).len(), 2);
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_full_category_is_exhausted() {
    let mut fixture = setup();
    fixture.registry.from_cubemap(ImageViewHandle::from_raw(1)).unwrap();
    fixture.registry.from_cubemap(ImageViewHandle::from_raw(2)).unwrap();

    let result = fixture.registry.from_cubemap(ImageViewHandle::from_raw(3));
    assert!(matches!(result, Err(Error::PoolExhausted(_))));

    // Other categories are unaffected
    assert!(fixture.registry.from_texture_2d(ImageViewHandle::from_raw(3)).is_ok());
    assert_eq!(fixture.registry.capacity(BindlessCategory::Cubemap), 2);
}

#[test]
fn test_null_resources_are_rejected() {
    let mut fixture = setup();
    assert!(matches!(
        fixture.registry.from_texture_2d(ImageViewHandle::NULL),
        Err(Error::InvalidResource(_))
    ));
    assert!(matches!(
        fixture.registry.from_sampler(SamplerHandle::NULL),
        Err(Error::InvalidResource(_))
    ));
}

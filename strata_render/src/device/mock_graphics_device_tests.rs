//! Unit tests for the mock device itself

use crate::device::mock_graphics_device::*;
use crate::device::*;
use crate::error::Error;

fn pool_desc(max_sets: u32, samplers: u32) -> DescriptorPoolDesc {
    DescriptorPoolDesc {
        max_sets,
        flags: DescriptorPoolFlags::empty(),
        sizes: vec![DescriptorPoolSize { descriptor_type: DescriptorType::CombinedImageSampler, count: samplers }],
    }
}

fn sampler_layout(device: &mut MockGraphicsDevice) -> DescriptorSetLayoutHandle {
    let bindings = [DescriptorBinding::new(0, DescriptorType::CombinedImageSampler)];
    device
        .create_descriptor_set_layout(&DescriptorSetLayoutDesc {
            stages: ShaderStageFlags::FRAGMENT,
            bindings: &bindings,
            flags: DescriptorSetLayoutFlags::empty(),
        })
        .unwrap()
}

#[test]
fn test_handles_are_unique_and_non_null() {
    let mut device = MockGraphicsDevice::new();
    let a = device.create_semaphore().unwrap();
    let b = device.create_semaphore().unwrap();
    assert!(!a.is_null());
    assert_ne!(a, b);
}

#[test]
fn test_pool_capacity_is_enforced_per_set_and_per_type() {
    let mut device = MockGraphicsDevice::new();
    let layout = sampler_layout(&mut device);

    let pool = device.create_descriptor_pool(&pool_desc(2, 10)).unwrap();
    assert_eq!(device.allocate_descriptor_sets(pool, &[layout, layout]).unwrap().len(), 2);
    assert_eq!(device.allocate_descriptor_sets(pool, &[layout]), Err(Error::OutOfPoolMemory));

    let small = device.create_descriptor_pool(&pool_desc(10, 1)).unwrap();
    assert!(device.allocate_descriptor_sets(small, &[layout]).is_ok());
    assert_eq!(device.allocate_descriptor_sets(small, &[layout]), Err(Error::OutOfPoolMemory));
}

#[test]
fn test_reset_restores_pool_capacity() {
    let mut device = MockGraphicsDevice::new();
    let layout = sampler_layout(&mut device);
    let pool = device.create_descriptor_pool(&pool_desc(1, 1)).unwrap();

    device.allocate_descriptor_sets(pool, &[layout]).unwrap();
    assert_eq!(device.allocated_sets(pool), 1);
    device.reset_descriptor_pool(pool).unwrap();
    assert_eq!(device.allocated_sets(pool), 0);
    assert!(device.allocate_descriptor_sets(pool, &[layout]).is_ok());
}

#[test]
fn test_injected_allocation_failures_come_first() {
    let mut device = MockGraphicsDevice::new();
    let layout = sampler_layout(&mut device);
    let pool = device.create_descriptor_pool(&pool_desc(8, 8)).unwrap();

    device.fail_next_allocation(Error::FragmentedPool);
    assert_eq!(device.allocate_descriptor_sets(pool, &[layout]), Err(Error::FragmentedPool));
    assert!(device.allocate_descriptor_sets(pool, &[layout]).is_ok());
}

#[test]
fn test_fences_signal_on_submit() {
    let mut device = MockGraphicsDevice::new();
    let fence = device.create_fence(false).unwrap();
    assert!(device.wait_fence(fence, u64::MAX).is_err());

    let cmd = MockCommandList::new();
    let recorded: &dyn CommandList = &cmd;
    device.submit(&[recorded], &[], &[], Some(fence)).unwrap();
    assert!(device.wait_fence(fence, u64::MAX).is_ok());
    assert_eq!(device.submits[0].command_lists, vec![cmd.native_handle()]);

    device.reset_fence(fence).unwrap();
    assert!(!device.is_fence_signaled(fence));
}

#[test]
fn test_command_list_records_commands() {
    let mut cmd = MockCommandList::new();
    cmd.begin().unwrap();
    cmd.draw(3, 0).unwrap();
    cmd.dispatch(8, 8, 1).unwrap();
    cmd.end().unwrap();

    assert_eq!(cmd.commands, vec!["begin", "draw(3, 0)", "dispatch(8, 8, 1)", "end"]);
    assert_eq!(cmd.count("draw"), 1);
    assert!(cmd.end().is_err());
}

#[test]
fn test_device_command_lists_share_event_log() {
    let mut device = MockGraphicsDevice::new();
    let mut cmd = device.create_command_list().unwrap();
    cmd.begin().unwrap();
    assert_eq!(device.events(), vec!["cmd.begin".to_string()]);
}

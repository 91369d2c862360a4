//! Unit tests for config.rs

use crate::config::Config;
use crate::descriptor::PoolSizeRatio;
use crate::device::DescriptorType;
use crate::error::Error;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.frames_in_flight, 2);
    assert_eq!(config.initial_sets_per_pool, 1000);
    assert_eq!(config.max_sets_per_pool, 4092);
    assert_eq!(config.bindless.textures_2d, 1024);
    assert_eq!(config.enable_validation, cfg!(debug_assertions));
    assert!(!config.frame_pool_ratios.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_frames_in_flight_rejected() {
    let config = Config { frames_in_flight: 0, ..Config::default() };
    assert!(matches!(config.validate(), Err(Error::InitializationFailed(_))));
}

#[test]
fn test_initial_above_cap_rejected() {
    let config = Config { initial_sets_per_pool: 5000, ..Config::default() };
    assert!(config.validate().is_err());
}

#[test]
fn test_non_positive_ratio_rejected() {
    let config = Config {
        frame_pool_ratios: vec![PoolSizeRatio::new(DescriptorType::UniformBuffer, 0.0)],
        ..Config::default()
    };
    assert!(config.validate().is_err());

    let config = Config {
        frame_pool_ratios: vec![PoolSizeRatio::new(DescriptorType::UniformBuffer, f32::NAN)],
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

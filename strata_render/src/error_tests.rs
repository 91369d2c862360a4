//! Unit tests for error.rs
//!
//! Covers Display output, pool-capacity classification and propagation.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkCreateGraphicsPipelines returned -3".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("vkCreateGraphicsPipelines"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_pool_errors_display() {
    assert_eq!(format!("{}", Error::OutOfPoolMemory), "Descriptor pool out of memory");
    assert_eq!(format!("{}", Error::FragmentedPool), "Descriptor pool fragmented");

    let err = Error::PoolExhausted("retry against fresh pool failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("exhausted"));
    assert!(display.contains("fresh pool"));
}

#[test]
fn test_validation_failed_display() {
    let err = Error::ValidationFailed("pass 2 references an absent view".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Validation failed"));
    assert!(display.contains("pass 2"));
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_is_pool_capacity() {
    assert!(Error::OutOfPoolMemory.is_pool_capacity());
    assert!(Error::FragmentedPool.is_pool_capacity());

    assert!(!Error::OutOfMemory.is_pool_capacity());
    assert!(!Error::PoolExhausted("x".to_string()).is_pool_capacity());
    assert!(!Error::BackendError("x".to_string()).is_pool_capacity());
}

#[test]
fn test_error_is_std_error() {
    let err = Error::FragmentedPool;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InvalidResource("stale bindless handle".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(Error::OutOfPoolMemory, Error::FragmentedPool);
}

// ============================================================================
// PROPAGATION
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn allocate() -> Result<u32> {
        Err(Error::OutOfPoolMemory)
    }

    fn frame() -> Result<u32> {
        let sets = allocate()?;
        Ok(sets + 1)
    }

    assert_eq!(frame(), Err(Error::OutOfPoolMemory));
}

//! Bindless resource registry

pub mod bindless_registry;

pub use bindless_registry::{BindlessCapacities, BindlessCategory, BindlessHandle, BindlessRegistry};

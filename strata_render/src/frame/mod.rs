//! Frames in flight

pub mod frame_slots;

pub use frame_slots::{Frame, FrameSlots};

//! Domain models for the device

pub mod event;

// Re-exports
pub use event::{DeviceEvent, EventLog};

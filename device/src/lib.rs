//! Xoroshiro Device - Rust core
//!
//! A pseudorandom byte stream behind an exclusive-access session interface.
//!
//! # Architecture
//!
//! - **rng**: xoroshiro128+ generator with 2^64 and 2^96 jumps
//! - **gateway**: single-session lock and the open/read/close protocol
//! - **transport**: file-operations boundary and errno mapping
//! - **host**: registration boundary and an in-memory host
//! - **device**: init/exit with reverse-order backout
//! - **models** / **diagnostics**: device events, logged through `tracing`
//! - **config**: device names and seed
//!
//! # Critical Invariants
//!
//! 1. At most one session is open at any instant; a losing open fails
//!    immediately with `Busy`
//! 2. Every session starts one jump past the previous one
//! 3. Each read consumes exactly one word and delivers `min(len, 8)` bytes

// Module declarations
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod gateway;
pub mod host;
pub mod models;
pub mod rng;
pub mod transport;

// Re-exports for convenience
pub use config::{ConfigError, DeviceConfig};
pub use device::{InitError, InitStep, XoroDevice};
pub use diagnostics::{Diagnostics, RecordingDiagnostics, TracingDiagnostics};
pub use gateway::{GatewayError, ReadChunk, Session, SessionGateway, UserBuffer, MAX_BYTES_PER_READ};
pub use host::{ClassHandle, DevNum, HostError, HostRegistry, HostStep, InMemoryHost, OpenFile};
pub use models::{DeviceEvent, EventLog};
pub use rng::{GeneratorState, SeedError, Xoroshiro128Plus};
pub use transport::{Errno, FileOperations};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn xoroshiro_device(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::device::PyXoroDevice>()?;
    Ok(())
}

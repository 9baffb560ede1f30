//! Registration boundary with the hosting environment
//!
//! A host hands out three kinds of resources, acquired in this order and
//! released in the reverse order:
//!
//! 1. a character device registration (allocates a major number)
//! 2. a device class
//! 3. a device node `(major, minor)` inside that class
//!
//! [`InMemoryHost`] implements the boundary in-process and routes opens on
//! node paths to the registered [`FileOperations`].

mod memory;

pub use memory::{HostStep, InMemoryHost, OpenFile};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::transport::FileOperations;

/// Device number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DevNum {
    pub major: u32,
    pub minor: u32,
}

impl DevNum {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DevNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Opaque handle to a class created by a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassHandle(u64);

impl ClassHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Errors reported by a host
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("No free major number for '{0}'")]
    NoMajorNumber(String),

    #[error("Name already registered: {0}")]
    AlreadyExists(String),

    #[error("Unknown device class {0}")]
    UnknownClass(u64),

    #[error("Host refused to {0}")]
    Refused(String),
}

/// Resource registration provided by a host
pub trait HostRegistry {
    /// Register a character device and allocate its major number
    fn register_chrdev(
        &self,
        name: &str,
        fops: Arc<dyn FileOperations>,
    ) -> Result<u32, HostError>;

    fn unregister_chrdev(&self, major: u32, name: &str);

    fn create_class(&self, name: &str) -> Result<ClassHandle, HostError>;

    fn destroy_class(&self, class: ClassHandle);

    /// Create the node `name` for `devnum` inside `class`
    fn create_device(&self, class: ClassHandle, devnum: DevNum, name: &str)
        -> Result<(), HostError>;

    fn destroy_device(&self, class: ClassHandle, devnum: DevNum);
}

//! File-operations boundary between a host and the gateway
//!
//! A host drives the device only through [`FileOperations`], and sees
//! failures only as [`Errno`] codes:
//!
//! | Gateway result           | Host sees |
//! |--------------------------|-----------|
//! | `open` → `Busy`          | `EBUSY`   |
//! | `read` → `Fault`         | `EFAULT`  |
//! | `release`                | always ok |

use std::fmt;
use std::io;

use crate::gateway::{GatewayError, SessionGateway};

/// Error codes surfaced to callers of a device node
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Errno {
    /// No such device node
    ENOENT,
    /// Node exists but its driver is gone
    ENXIO,
    /// Bad address: delivery to the caller's buffer failed
    EFAULT,
    /// Device or resource busy; try again later
    EBUSY,
}

impl Errno {
    /// Linux numeric value
    pub fn code(self) -> i32 {
        match self {
            Errno::ENOENT => 2,
            Errno::ENXIO => 6,
            Errno::EFAULT => 14,
            Errno::EBUSY => 16,
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Errno::ENOENT => "No such file or directory",
            Errno::ENXIO => "No such device or address",
            Errno::EFAULT => "Bad address",
            Errno::EBUSY => "Device or resource busy",
        };
        write!(f, "{} (errno {})", text, self.code())
    }
}

impl std::error::Error for Errno {}

impl From<GatewayError> for Errno {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Busy => Errno::EBUSY,
            GatewayError::Fault { .. } => Errno::EFAULT,
        }
    }
}

impl From<Errno> for io::Error {
    fn from(errno: Errno) -> Self {
        let kind = match errno {
            Errno::ENOENT => io::ErrorKind::NotFound,
            Errno::EBUSY => io::ErrorKind::WouldBlock,
            Errno::ENXIO | Errno::EFAULT => io::ErrorKind::Other,
        };
        io::Error::new(kind, errno)
    }
}

/// Callbacks a host invokes on behalf of a device node
pub trait FileOperations: Send + Sync {
    fn open(&self) -> Result<(), Errno>;

    /// Deliver up to `len` bytes into `buf`; returns the count delivered
    ///
    /// `len` is what the caller asked for and may exceed `buf.len()`.
    fn read(&self, buf: &mut [u8], len: usize) -> Result<usize, Errno>;

    fn release(&self);
}

impl FileOperations for SessionGateway {
    fn open(&self) -> Result<(), Errno> {
        SessionGateway::open(self).map_err(Errno::from)
    }

    fn read(&self, buf: &mut [u8], len: usize) -> Result<usize, Errno> {
        SessionGateway::read(self, len, buf).map_err(Errno::from)
    }

    fn release(&self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Xoroshiro128Plus;

    fn fops() -> SessionGateway {
        SessionGateway::with_tracing("test", Xoroshiro128Plus::seed(5, 8).unwrap())
    }

    #[test]
    fn test_busy_is_ebusy() {
        let gateway = fops();
        assert_eq!(FileOperations::open(&gateway), Ok(()));
        assert_eq!(FileOperations::open(&gateway), Err(Errno::EBUSY));

        gateway.release();
        assert_eq!(FileOperations::open(&gateway), Ok(()));
    }

    #[test]
    fn test_fault_is_efault() {
        let gateway = fops();
        FileOperations::open(&gateway).unwrap();

        let mut buf = [0u8; 1];
        let result = FileOperations::read(&gateway, &mut buf, 4);
        assert_eq!(result, Err(Errno::EFAULT));
    }

    #[test]
    fn test_errno_io_kinds() {
        assert_eq!(io::Error::from(Errno::EBUSY).kind(), io::ErrorKind::WouldBlock);
        assert_eq!(io::Error::from(Errno::ENOENT).kind(), io::ErrorKind::NotFound);
        assert_eq!(Errno::EFAULT.code(), 14);
    }
}

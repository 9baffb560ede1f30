//! PyO3 wrapper for the device
//!
//! # Example (from Python)
//!
//! ```python
//! from xoroshiro_device import XoroDevice
//!
//! dev = XoroDevice()
//! dev.open()
//! word = int.from_bytes(dev.read(8), "little")
//! dev.close()
//! ```

use pyo3::exceptions::{PyBlockingIOError, PyFileNotFoundError, PyOSError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::config::DeviceConfig;
use crate::device::XoroDevice;
use crate::gateway::MAX_BYTES_PER_READ;
use crate::host::{InMemoryHost, OpenFile};
use crate::transport::Errno;

fn errno_to_py(errno: Errno) -> PyErr {
    match errno {
        Errno::EBUSY => PyBlockingIOError::new_err(errno.to_string()),
        Errno::ENOENT => PyFileNotFoundError::new_err(errno.to_string()),
        Errno::EFAULT | Errno::ENXIO => PyOSError::new_err(errno.to_string()),
    }
}

/// Python wrapper owning one device and at most one open handle
#[pyclass(name = "XoroDevice")]
pub struct PyXoroDevice {
    file: Option<OpenFile>,
    inner: XoroDevice<InMemoryHost>,
}

#[pymethods]
impl PyXoroDevice {
    /// Create and initialize a device
    ///
    /// # Arguments
    ///
    /// * `config_json` - Optional JSON configuration; defaults otherwise
    ///
    /// # Errors
    ///
    /// Raises ValueError for a bad configuration and RuntimeError if
    /// initialization fails.
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => DeviceConfig::from_json(json)
                .map_err(|e| PyValueError::new_err(e.to_string()))?,
            None => DeviceConfig::default(),
        };

        let inner = XoroDevice::init(config, InMemoryHost::new()).map_err(|e| {
            PyRuntimeError::new_err(format!("Failed to initialize device: {}", e))
        })?;

        Ok(Self { file: None, inner })
    }

    /// Open a session; raises BlockingIOError when one is already open
    fn open(&mut self) -> PyResult<()> {
        let file = self.inner.open().map_err(errno_to_py)?;
        self.file = Some(file);
        Ok(())
    }

    /// Read up to 8 bytes of one fresh word
    fn read<'py>(&mut self, py: Python<'py>, n: usize) -> PyResult<Bound<'py, PyBytes>> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| PyValueError::new_err("device is not open"))?;

        let mut buf = [0u8; MAX_BYTES_PER_READ];
        let count = file.read_len(&mut buf, n).map_err(errno_to_py)?;
        Ok(PyBytes::new_bound(py, &buf[..count]))
    }

    /// Close the session, if any
    fn close(&mut self) {
        self.file = None;
    }

    /// Number of successful opens so far
    fn open_count(&self) -> u64 {
        self.inner.gateway().open_count()
    }

    fn node_path(&self) -> String {
        self.inner.node_path()
    }
}

//! Device module lifecycle
//!
//! [`XoroDevice::init`] brings the device up:
//!
//! ```text
//! 1. Validate config and seed the generator
//! 2. Register the character device   (allocates the major number)
//! 3. Create the device class
//! 4. Create the device node (major, 0)
//! ```
//!
//! If step 2, 3 or 4 fails, everything acquired before it is released in
//! reverse order and the error is returned; no partial device survives.
//! Dropping the device (or calling [`XoroDevice::exit`]) tears it down in
//! the same reverse order.
//!
//! The generator is seeded before the character device is registered, so
//! the first open can never observe an unseeded state.

mod registration;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, DeviceConfig};
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::gateway::SessionGateway;
use crate::host::{DevNum, HostError, HostRegistry, InMemoryHost, OpenFile};
use crate::models::DeviceEvent;
use crate::transport::{Errno, FileOperations};
use registration::{release_all, Registration, RegistrationGuard};

/// Registration step during initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    RegisterChrdev,
    CreateClass,
    CreateDevice,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InitStep::RegisterChrdev => "register major number",
            InitStep::CreateClass => "create device class",
            InitStep::CreateDevice => "create device node",
        };
        f.write_str(text)
    }
}

/// Initialization failure; the device did not become active
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to {step}: {source}")]
    Host {
        step: InitStep,
        #[source]
        source: HostError,
    },
}

impl InitError {
    fn host(step: InitStep) -> impl FnOnce(HostError) -> InitError {
        move |source| InitError::Host { step, source }
    }

    fn step_name(&self) -> String {
        match self {
            InitError::Config(_) => "validate config".to_string(),
            InitError::Host { step, .. } => step.to_string(),
        }
    }
}

/// An active device registered with a host
pub struct XoroDevice<H: HostRegistry> {
    config: DeviceConfig,
    host: H,
    gateway: Arc<SessionGateway>,
    devnum: DevNum,
    registrations: Vec<Registration>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<H: HostRegistry> XoroDevice<H> {
    /// Bring the device up, reporting through `tracing`
    pub fn init(config: DeviceConfig, host: H) -> Result<Self, InitError> {
        Self::init_with_diagnostics(config, host, Arc::new(TracingDiagnostics))
    }

    /// Bring the device up, reporting to `diagnostics`
    pub fn init_with_diagnostics(
        config: DeviceConfig,
        host: H,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, InitError> {
        diagnostics.record(DeviceEvent::InitStarted {
            device: config.device_name.clone(),
        });

        let (gateway, devnum, registrations) = match register(&config, &host, &diagnostics) {
            Ok(registered) => registered,
            Err(err) => {
                diagnostics.record(DeviceEvent::InitFailed {
                    step: err.step_name(),
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        diagnostics.record(DeviceEvent::Initialized {
            device: config.device_name.clone(),
        });

        Ok(Self {
            config,
            host,
            gateway,
            devnum,
            registrations,
            diagnostics,
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<SessionGateway> {
        &self.gateway
    }

    pub fn devnum(&self) -> DevNum {
        self.devnum
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Path of the device node
    pub fn node_path(&self) -> String {
        self.config.node_path()
    }

    /// Tear the device down
    pub fn exit(self) {
        // Drop does the work.
    }
}

impl XoroDevice<InMemoryHost> {
    /// Open this device's node through the host
    pub fn open(&self) -> Result<OpenFile, Errno> {
        self.host.open(&self.node_path())
    }
}

impl<H: HostRegistry> Drop for XoroDevice<H> {
    fn drop(&mut self) {
        release_all(&self.host, &mut self.registrations);
        self.diagnostics.record(DeviceEvent::Exited {
            device: self.config.device_name.clone(),
        });
    }
}

impl<H: HostRegistry> fmt::Debug for XoroDevice<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XoroDevice")
            .field("config", &self.config)
            .field("devnum", &self.devnum)
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

fn register<H: HostRegistry>(
    config: &DeviceConfig,
    host: &H,
    diagnostics: &Arc<dyn Diagnostics>,
) -> Result<(Arc<SessionGateway>, DevNum, Vec<Registration>), InitError> {
    config.validate()?;
    let generator = config.generator()?;
    let gateway = Arc::new(SessionGateway::new(
        config.device_name.clone(),
        generator,
        Arc::clone(diagnostics),
    ));

    let mut guard = RegistrationGuard::new(host);

    let fops: Arc<dyn FileOperations> = gateway.clone();
    let major = host
        .register_chrdev(&config.device_name, fops)
        .map_err(InitError::host(InitStep::RegisterChrdev))?;
    guard.push(Registration::Chrdev {
        major,
        name: config.device_name.clone(),
    });
    diagnostics.record(DeviceEvent::ChrdevRegistered {
        device: config.device_name.clone(),
        major,
    });

    let class = host
        .create_class(&config.class_name)
        .map_err(InitError::host(InitStep::CreateClass))?;
    guard.push(Registration::Class { class });
    diagnostics.record(DeviceEvent::ClassCreated {
        class: config.class_name.clone(),
    });

    let devnum = DevNum::new(major, 0);
    host.create_device(class, devnum, &config.device_name)
        .map_err(InitError::host(InitStep::CreateDevice))?;
    guard.push(Registration::Node { class, devnum });
    diagnostics.record(DeviceEvent::NodeCreated {
        device: config.device_name.clone(),
        major: devnum.major,
        minor: devnum.minor,
    });

    Ok((gateway, devnum, guard.commit()))
}

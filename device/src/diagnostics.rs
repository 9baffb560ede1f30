//! Diagnostic sinks
//!
//! The gateway and the module report every [`DeviceEvent`] to a
//! [`Diagnostics`] sink. [`TracingDiagnostics`] forwards them to `tracing`;
//! [`RecordingDiagnostics`] does the same and also keeps them in an
//! [`EventLog`] for later inspection.

use std::sync::{Mutex, PoisonError};

use crate::models::{DeviceEvent, EventLog};

/// Receiver of device events
pub trait Diagnostics: Send + Sync {
    fn record(&self, event: DeviceEvent);
}

/// Forward events to `tracing` and keep nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: DeviceEvent) {
        emit(&event);
    }
}

/// Forward events to `tracing` and keep them in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    log: Mutex<EventLog>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> EventLog {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: DeviceEvent) {
        emit(&event);
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .log(event);
    }
}

fn emit(event: &DeviceEvent) {
    match event {
        DeviceEvent::InitStarted { device } => {
            tracing::info!(device = %device, "initializing");
        }
        DeviceEvent::ChrdevRegistered { device, major } => {
            tracing::info!(device = %device, major, "registered character device");
        }
        DeviceEvent::ClassCreated { class } => {
            tracing::info!(class = %class, "created device class");
        }
        DeviceEvent::NodeCreated {
            device,
            major,
            minor,
        } => {
            tracing::info!(device = %device, major, minor, "created device node");
        }
        DeviceEvent::Initialized { device } => {
            tracing::info!(device = %device, "initialized");
        }
        DeviceEvent::InitFailed { step, reason } => {
            tracing::error!(step = %step, reason = %reason, "initialization failed");
        }
        DeviceEvent::Opened { device, n_opens } => {
            tracing::info!(device = %device, n_opens, "opened");
        }
        DeviceEvent::Busy { device } => {
            tracing::warn!(device = %device, "busy");
        }
        DeviceEvent::Read {
            device,
            requested,
            delivered,
        } => {
            tracing::info!(device = %device, requested, delivered, "read");
        }
        DeviceEvent::ReadFault {
            device,
            requested,
            not_copied,
        } => {
            tracing::warn!(device = %device, requested, not_copied, "failed to deliver read");
        }
        DeviceEvent::Closed { device } => {
            tracing::info!(device = %device, "closed");
        }
        DeviceEvent::Exited { device } => {
            tracing::info!(device = %device, "exit");
        }
    }
}

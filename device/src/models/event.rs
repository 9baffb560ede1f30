//! Device events for diagnostics and auditing.
//!
//! Every observable step of the device lifecycle is a [`DeviceEvent`]:
//! - **Init**: registration steps and their failure
//! - **Session**: open, busy, close
//! - **Transfer**: reads and read faults
//! - **Exit**: teardown
//!
//! Events are purely observational. No device logic reads them back.
//!
//! # Example
//!
//! ```rust
//! use xoroshiro_device::models::{DeviceEvent, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(DeviceEvent::Opened {
//!     device: "xoroshiro128p".to_string(),
//!     n_opens: 0,
//! });
//!
//! assert_eq!(log.events_of_type("Opened").len(), 1);
//! ```

use serde::Serialize;

/// Device event capturing a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type")]
pub enum DeviceEvent {
    /// Module initialization started
    InitStarted { device: String },

    /// Character device registered with the host
    ChrdevRegistered { device: String, major: u32 },

    /// Device class created
    ClassCreated { class: String },

    /// Device node created
    NodeCreated {
        device: String,
        major: u32,
        minor: u32,
    },

    /// Generator seeded and module active
    Initialized { device: String },

    /// A registration step failed; acquired resources were released
    InitFailed { step: String, reason: String },

    /// Session opened
    ///
    /// `n_opens` is the number of successful opens before this one.
    Opened { device: String, n_opens: u64 },

    /// Open denied because a session is already held
    Busy { device: String },

    /// Bytes delivered to the reader
    Read {
        device: String,
        requested: usize,
        delivered: usize,
    },

    /// Delivery to the reader's buffer failed after a word was generated
    ReadFault {
        device: String,
        requested: usize,
        not_copied: usize,
    },

    /// Session closed
    Closed { device: String },

    /// Module torn down
    Exited { device: String },
}

impl DeviceEvent {
    /// Variant name, used for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            DeviceEvent::InitStarted { .. } => "InitStarted",
            DeviceEvent::ChrdevRegistered { .. } => "ChrdevRegistered",
            DeviceEvent::ClassCreated { .. } => "ClassCreated",
            DeviceEvent::NodeCreated { .. } => "NodeCreated",
            DeviceEvent::Initialized { .. } => "Initialized",
            DeviceEvent::InitFailed { .. } => "InitFailed",
            DeviceEvent::Opened { .. } => "Opened",
            DeviceEvent::Busy { .. } => "Busy",
            DeviceEvent::Read { .. } => "Read",
            DeviceEvent::ReadFault { .. } => "ReadFault",
            DeviceEvent::Closed { .. } => "Closed",
            DeviceEvent::Exited { .. } => "Exited",
        }
    }

    /// Alert-level events signal a failure the operator should see
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            DeviceEvent::InitFailed { .. } | DeviceEvent::ReadFault { .. }
        )
    }
}

/// Append-only log of device events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<DeviceEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: DeviceEvent) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&DeviceEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Export the log as a JSON array
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.events)
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

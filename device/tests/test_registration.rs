//! Tests for device init/exit against a host
//!
//! Every failed init MUST leave the host exactly as it found it.

use std::sync::{Arc, Mutex};

use xoroshiro_device::{
    ClassHandle, DevNum, DeviceConfig, Errno, FileOperations, HostError, HostRegistry, HostStep,
    InMemoryHost, InitError, InitStep, RecordingDiagnostics, XoroDevice,
};

/// Wraps an in-memory host and records every call in order
#[derive(Clone, Default)]
struct CallRecorder {
    inner: InMemoryHost,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl CallRecorder {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn note(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl HostRegistry for CallRecorder {
    fn register_chrdev(
        &self,
        name: &str,
        fops: Arc<dyn FileOperations>,
    ) -> Result<u32, HostError> {
        self.note("register_chrdev");
        self.inner.register_chrdev(name, fops)
    }

    fn unregister_chrdev(&self, major: u32, name: &str) {
        self.note("unregister_chrdev");
        self.inner.unregister_chrdev(major, name);
    }

    fn create_class(&self, name: &str) -> Result<ClassHandle, HostError> {
        self.note("create_class");
        self.inner.create_class(name)
    }

    fn destroy_class(&self, class: ClassHandle) {
        self.note("destroy_class");
        self.inner.destroy_class(class);
    }

    fn create_device(
        &self,
        class: ClassHandle,
        devnum: DevNum,
        name: &str,
    ) -> Result<(), HostError> {
        self.note("create_device");
        self.inner.create_device(class, devnum, name)
    }

    fn destroy_device(&self, class: ClassHandle, devnum: DevNum) {
        self.note("destroy_device");
        self.inner.destroy_device(class, devnum);
    }
}

#[test]
fn test_exit_tears_down_in_reverse() {
    let host = CallRecorder::default();
    let device = XoroDevice::init(DeviceConfig::default(), host.clone()).unwrap();
    assert_eq!(
        host.calls(),
        vec!["register_chrdev", "create_class", "create_device"]
    );

    device.exit();
    assert_eq!(
        host.calls()[3..],
        ["destroy_device", "destroy_class", "unregister_chrdev"]
    );
    assert!(host.inner.is_empty());
}

#[test]
fn test_chrdev_failure_acquires_nothing() {
    let host = CallRecorder::default();
    host.inner.fail_on(HostStep::RegisterChrdev);

    let err = XoroDevice::init(DeviceConfig::default(), host.clone()).unwrap_err();
    assert!(matches!(
        err,
        InitError::Host {
            step: InitStep::RegisterChrdev,
            ..
        }
    ));
    assert_eq!(host.calls(), vec!["register_chrdev"]);
    assert!(host.inner.is_empty());
}

#[test]
fn test_class_failure_unregisters_chrdev() {
    let host = CallRecorder::default();
    host.inner.fail_on(HostStep::CreateClass);

    let err = XoroDevice::init(DeviceConfig::default(), host.clone()).unwrap_err();
    assert!(matches!(
        err,
        InitError::Host {
            step: InitStep::CreateClass,
            ..
        }
    ));
    assert_eq!(
        host.calls(),
        vec!["register_chrdev", "create_class", "unregister_chrdev"]
    );
    assert!(host.inner.is_empty());
}

#[test]
fn test_device_failure_backs_out_in_reverse() {
    let host = CallRecorder::default();
    host.inner.fail_on(HostStep::CreateDevice);

    let err = XoroDevice::init(DeviceConfig::default(), host.clone()).unwrap_err();
    assert!(matches!(
        err,
        InitError::Host {
            step: InitStep::CreateDevice,
            ..
        }
    ));
    assert_eq!(
        host.calls(),
        vec![
            "register_chrdev",
            "create_class",
            "create_device",
            "destroy_class",
            "unregister_chrdev",
        ]
    );
    assert!(host.inner.is_empty());
}

#[test]
fn test_retry_after_failure_succeeds() {
    let host = InMemoryHost::new();
    host.fail_on(HostStep::CreateDevice);
    assert!(XoroDevice::init(DeviceConfig::default(), host.clone()).is_err());

    host.clear_failure();
    let device = XoroDevice::init(DeviceConfig::default(), host.clone()).unwrap();
    assert_eq!(host.node_paths(), vec![device.node_path()]);
}

#[test]
fn test_duplicate_device_name_fails_cleanly() {
    let host = InMemoryHost::new();
    let _first = XoroDevice::init(DeviceConfig::default(), host.clone()).unwrap();

    let second = DeviceConfig {
        class_name: "xoro2".to_string(),
        ..Default::default()
    };
    let err = XoroDevice::init(second, host.clone()).unwrap_err();
    assert_eq!(
        err,
        InitError::Host {
            step: InitStep::RegisterChrdev,
            source: HostError::AlreadyExists("xoroshiro128p".to_string()),
        }
    );

    // The first device is untouched.
    assert_eq!(host.chrdev_count(), 1);
    assert_eq!(host.class_names(), vec!["xoro".to_string()]);
}

#[test]
fn test_two_devices_get_distinct_majors() {
    let host = InMemoryHost::new();
    let a = XoroDevice::init(DeviceConfig::default(), host.clone()).unwrap();
    let b = XoroDevice::init(
        DeviceConfig {
            device_name: "xoroshiro128p_b".to_string(),
            class_name: "xoro_b".to_string(),
            ..Default::default()
        },
        host.clone(),
    )
    .unwrap();

    assert_ne!(a.devnum().major, b.devnum().major);
    assert_eq!(host.devnum_of("/dev/xoroshiro128p_b"), Some(b.devnum()));
}

#[test]
fn test_node_gone_after_exit() {
    let host = InMemoryHost::new();
    let device = XoroDevice::init(DeviceConfig::default(), host.clone()).unwrap();
    let path = device.node_path();
    assert!(host.open(&path).is_ok());

    drop(device);
    assert_eq!(host.open(&path).unwrap_err(), Errno::ENOENT);
}

#[test]
fn test_init_events_in_order() {
    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let device = XoroDevice::init_with_diagnostics(
        DeviceConfig::default(),
        InMemoryHost::new(),
        diagnostics.clone(),
    )
    .unwrap();
    device.exit();

    let log = diagnostics.snapshot();
    let types: Vec<&str> = log.events().iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "InitStarted",
            "ChrdevRegistered",
            "ClassCreated",
            "NodeCreated",
            "Initialized",
            "Exited",
        ]
    );
}

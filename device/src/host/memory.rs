//! In-process host
//!
//! Keeps character devices, classes and device nodes in a shared table.
//! Cloning an [`InMemoryHost`] yields another handle onto the same table,
//! so a test can hand one clone to the device and inspect through another.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{ClassHandle, DevNum, HostError, HostRegistry};
use crate::transport::{Errno, FileOperations};

/// Dynamic major numbers are handed out from the top of this range down.
const DYNAMIC_MAJOR_HIGH: u32 = 254;
const DYNAMIC_MAJOR_LOW: u32 = 234;

/// Registration steps that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStep {
    RegisterChrdev,
    CreateClass,
    CreateDevice,
}

struct Chrdev {
    name: String,
    fops: Arc<dyn FileOperations>,
}

struct Node {
    class: ClassHandle,
    devnum: DevNum,
}

#[derive(Default)]
struct HostTable {
    chrdevs: BTreeMap<u32, Chrdev>,
    classes: BTreeMap<ClassHandle, String>,
    nodes: BTreeMap<String, Node>,
    next_class: u64,
    fail_on: Option<HostStep>,
}

impl HostTable {
    fn refuse(&self, step: HostStep) -> Result<(), HostError> {
        if self.fail_on == Some(step) {
            let what = match step {
                HostStep::RegisterChrdev => "register character device",
                HostStep::CreateClass => "create class",
                HostStep::CreateDevice => "create device",
            };
            return Err(HostError::Refused(what.to_string()));
        }
        Ok(())
    }
}

/// Host that lives entirely in memory
#[derive(Clone, Default)]
pub struct InMemoryHost {
    table: Arc<Mutex<HostTable>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later attempt at `step` fail
    pub fn fail_on(&self, step: HostStep) {
        self.table().fail_on = Some(step);
    }

    /// Stop injecting failures
    pub fn clear_failure(&self) {
        self.table().fail_on = None;
    }

    /// Open the node at `path` (e.g. `/dev/xoroshiro128p`)
    ///
    /// # Errors
    /// - `ENOENT` if no node exists at `path`
    /// - `ENXIO` if the node's driver was unregistered
    /// - whatever the driver's `open` returns
    pub fn open(&self, path: &str) -> Result<OpenFile, Errno> {
        let fops = {
            let table = self.table();
            let node = path
                .strip_prefix("/dev/")
                .and_then(|name| table.nodes.get(name))
                .ok_or(Errno::ENOENT)?;
            let chrdev = table.chrdevs.get(&node.devnum.major).ok_or(Errno::ENXIO)?;
            Arc::clone(&chrdev.fops)
        };

        // Call into the driver without holding the table lock.
        fops.open()?;
        Ok(OpenFile { fops })
    }

    /// Major number registered under `name`
    pub fn major_of(&self, name: &str) -> Option<u32> {
        self.table()
            .chrdevs
            .iter()
            .find(|(_, chrdev)| chrdev.name == name)
            .map(|(major, _)| *major)
    }

    pub fn chrdev_count(&self) -> usize {
        self.table().chrdevs.len()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.table().classes.values().cloned().collect()
    }

    /// Paths of all device nodes, sorted
    pub fn node_paths(&self) -> Vec<String> {
        self.table()
            .nodes
            .keys()
            .map(|name| format!("/dev/{}", name))
            .collect()
    }

    /// Device number behind the node at `path`
    pub fn devnum_of(&self, path: &str) -> Option<DevNum> {
        let table = self.table();
        path.strip_prefix("/dev/")
            .and_then(|name| table.nodes.get(name))
            .map(|node| node.devnum)
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        let table = self.table();
        table.chrdevs.is_empty() && table.classes.is_empty() && table.nodes.is_empty()
    }

    fn table(&self) -> MutexGuard<'_, HostTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table();
        f.debug_struct("InMemoryHost")
            .field("chrdevs", &table.chrdevs.keys().collect::<Vec<_>>())
            .field("classes", &table.classes.values().collect::<Vec<_>>())
            .field("nodes", &table.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HostRegistry for InMemoryHost {
    fn register_chrdev(
        &self,
        name: &str,
        fops: Arc<dyn FileOperations>,
    ) -> Result<u32, HostError> {
        let mut table = self.table();
        table.refuse(HostStep::RegisterChrdev)?;

        if table.chrdevs.values().any(|chrdev| chrdev.name == name) {
            return Err(HostError::AlreadyExists(name.to_string()));
        }

        let major = (DYNAMIC_MAJOR_LOW..=DYNAMIC_MAJOR_HIGH)
            .rev()
            .find(|major| !table.chrdevs.contains_key(major))
            .ok_or_else(|| HostError::NoMajorNumber(name.to_string()))?;

        table.chrdevs.insert(
            major,
            Chrdev {
                name: name.to_string(),
                fops,
            },
        );
        Ok(major)
    }

    fn unregister_chrdev(&self, major: u32, name: &str) {
        let mut table = self.table();
        if table
            .chrdevs
            .get(&major)
            .is_some_and(|chrdev| chrdev.name == name)
        {
            table.chrdevs.remove(&major);
        }
    }

    fn create_class(&self, name: &str) -> Result<ClassHandle, HostError> {
        let mut table = self.table();
        table.refuse(HostStep::CreateClass)?;

        if table.classes.values().any(|class| class == name) {
            return Err(HostError::AlreadyExists(name.to_string()));
        }

        table.next_class += 1;
        let handle = ClassHandle::new(table.next_class);
        table.classes.insert(handle, name.to_string());
        Ok(handle)
    }

    fn destroy_class(&self, class: ClassHandle) {
        let mut table = self.table();
        table.classes.remove(&class);
        table.nodes.retain(|_, node| node.class != class);
    }

    fn create_device(
        &self,
        class: ClassHandle,
        devnum: DevNum,
        name: &str,
    ) -> Result<(), HostError> {
        let mut table = self.table();
        table.refuse(HostStep::CreateDevice)?;

        if !table.classes.contains_key(&class) {
            return Err(HostError::UnknownClass(class.id()));
        }
        if table.nodes.contains_key(name) {
            return Err(HostError::AlreadyExists(name.to_string()));
        }

        table.nodes.insert(name.to_string(), Node { class, devnum });
        Ok(())
    }

    fn destroy_device(&self, class: ClassHandle, devnum: DevNum) {
        self.table()
            .nodes
            .retain(|_, node| !(node.class == class && node.devnum == devnum));
    }
}

/// An open device node
///
/// Releases the driver's session when dropped.
pub struct OpenFile {
    fops: Arc<dyn FileOperations>,
}

impl OpenFile {
    /// Read into `buf`, requesting `buf.len()` bytes
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
        let len = buf.len();
        self.fops.read(buf, len)
    }

    /// Read requesting `len` bytes, whatever the size of `buf`
    ///
    /// A `len` larger than `buf` models a caller passing a bad address.
    pub fn read_len(&mut self, buf: &mut [u8], len: usize) -> Result<usize, Errno> {
        self.fops.read(buf, len)
    }

    pub fn close(self) {
        // Drop does the work.
    }
}

impl std::io::Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        OpenFile::read(self, buf).map_err(std::io::Error::from)
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        self.fops.release();
    }
}

impl std::fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenFile").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SessionGateway;
    use crate::rng::Xoroshiro128Plus;

    fn fops() -> Arc<dyn FileOperations> {
        Arc::new(SessionGateway::with_tracing(
            "test",
            Xoroshiro128Plus::seed(1, 1).unwrap(),
        ))
    }

    #[test]
    fn test_majors_allocated_from_top() {
        let host = InMemoryHost::new();
        assert_eq!(host.register_chrdev("a", fops()), Ok(254));
        assert_eq!(host.register_chrdev("b", fops()), Ok(253));

        host.unregister_chrdev(254, "a");
        assert_eq!(host.register_chrdev("c", fops()), Ok(254));
    }

    #[test]
    fn test_duplicate_chrdev_rejected() {
        let host = InMemoryHost::new();
        host.register_chrdev("a", fops()).unwrap();
        assert_eq!(
            host.register_chrdev("a", fops()),
            Err(HostError::AlreadyExists("a".to_string()))
        );
    }

    #[test]
    fn test_major_range_exhausted() {
        let host = InMemoryHost::new();
        for i in DYNAMIC_MAJOR_LOW..=DYNAMIC_MAJOR_HIGH {
            host.register_chrdev(&format!("dev{}", i), fops()).unwrap();
        }
        assert_eq!(
            host.register_chrdev("one_too_many", fops()),
            Err(HostError::NoMajorNumber("one_too_many".to_string()))
        );
    }

    #[test]
    fn test_device_needs_class() {
        let host = InMemoryHost::new();
        let result = host.create_device(ClassHandle::new(99), DevNum::new(254, 0), "x");
        assert_eq!(result, Err(HostError::UnknownClass(99)));
    }

    #[test]
    fn test_open_routes_to_fops() {
        let host = InMemoryHost::new();
        let major = host.register_chrdev("x", fops()).unwrap();
        let class = host.create_class("c").unwrap();
        host.create_device(class, DevNum::new(major, 0), "x").unwrap();

        let mut file = host.open("/dev/x").unwrap();
        assert_eq!(host.open("/dev/x").unwrap_err(), Errno::EBUSY);

        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf), Ok(8));
        file.close();

        assert!(host.open("/dev/x").is_ok());
    }

    #[test]
    fn test_open_missing_node() {
        let host = InMemoryHost::new();
        assert_eq!(host.open("/dev/nothing").unwrap_err(), Errno::ENOENT);
        assert_eq!(host.open("nothing").unwrap_err(), Errno::ENOENT);
    }

    #[test]
    fn test_injected_failure() {
        let host = InMemoryHost::new();
        host.fail_on(HostStep::CreateClass);
        assert!(matches!(host.create_class("c"), Err(HostError::Refused(_))));

        host.clear_failure();
        assert!(host.create_class("c").is_ok());
    }

    #[test]
    fn test_destroy_class_removes_its_nodes() {
        let host = InMemoryHost::new();
        let class = host.create_class("c").unwrap();
        host.create_device(class, DevNum::new(254, 0), "x").unwrap();

        host.destroy_class(class);
        assert!(host.is_empty());
    }
}

//! Acquired host resources and their release

use std::fmt;

use crate::host::{ClassHandle, DevNum, HostRegistry};

/// One resource acquired from a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Registration {
    Chrdev { major: u32, name: String },
    Class { class: ClassHandle },
    Node { class: ClassHandle, devnum: DevNum },
}

impl Registration {
    fn release<H: HostRegistry>(self, host: &H) {
        match self {
            Registration::Chrdev { major, name } => host.unregister_chrdev(major, &name),
            Registration::Class { class } => host.destroy_class(class),
            Registration::Node { class, devnum } => host.destroy_device(class, devnum),
        }
    }
}

/// Release `registrations` newest first
pub(crate) fn release_all<H: HostRegistry>(host: &H, registrations: &mut Vec<Registration>) {
    while let Some(registration) = registrations.pop() {
        registration.release(host);
    }
}

/// Resources acquired so far during initialization
///
/// Dropping the guard releases them in reverse order. [`commit`] hands them
/// over instead, once every step has succeeded.
///
/// [`commit`]: RegistrationGuard::commit
pub(crate) struct RegistrationGuard<'h, H: HostRegistry> {
    host: &'h H,
    acquired: Vec<Registration>,
}

impl<'h, H: HostRegistry> RegistrationGuard<'h, H> {
    pub(crate) fn new(host: &'h H) -> Self {
        Self {
            host,
            acquired: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, registration: Registration) {
        self.acquired.push(registration);
    }

    pub(crate) fn commit(mut self) -> Vec<Registration> {
        std::mem::take(&mut self.acquired)
    }
}

impl<H: HostRegistry> Drop for RegistrationGuard<'_, H> {
    fn drop(&mut self) {
        release_all(self.host, &mut self.acquired);
    }
}

impl<H: HostRegistry> fmt::Debug for RegistrationGuard<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationGuard")
            .field("acquired", &self.acquired)
            .finish_non_exhaustive()
    }
}

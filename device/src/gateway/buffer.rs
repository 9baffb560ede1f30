//! Reader-side destinations for device reads

/// Destination buffer owned by the reader
///
/// Mirrors a user-space copy: the device hands over bytes and learns how
/// many could not be delivered.
pub trait UserBuffer {
    /// Copy `bytes` to the start of the buffer
    ///
    /// Returns the number of bytes that were NOT copied; `0` means the whole
    /// slice was delivered.
    fn copy_to_user(&mut self, bytes: &[u8]) -> usize;
}

/// Fixed-size buffers deliver as much as fits and report the rest.
impl UserBuffer for [u8] {
    fn copy_to_user(&mut self, bytes: &[u8]) -> usize {
        let copied = bytes.len().min(self.len());
        self[..copied].copy_from_slice(&bytes[..copied]);
        bytes.len() - copied
    }
}

impl<const N: usize> UserBuffer for [u8; N] {
    fn copy_to_user(&mut self, bytes: &[u8]) -> usize {
        self.as_mut_slice().copy_to_user(bytes)
    }
}

/// Growable buffers replace their contents and never fault.
impl UserBuffer for Vec<u8> {
    fn copy_to_user(&mut self, bytes: &[u8]) -> usize {
        self.clear();
        self.extend_from_slice(bytes);
        0
    }
}

//! RAII session handle

use std::io;

use super::{GatewayError, ReadChunk, SessionGateway};

/// An open session on a [`SessionGateway`]
///
/// Closes the session when dropped. Implements [`io::Read`], so each call
/// to `read` pulls one word and fills at most 8 bytes of the buffer.
///
/// # Example
/// ```
/// use std::io::Read;
/// use xoroshiro_device::{SessionGateway, Xoroshiro128Plus};
///
/// let rng = Xoroshiro128Plus::seed(314159265, 1618033989).unwrap();
/// let gateway = SessionGateway::with_tracing("xoroshiro128p", rng);
///
/// let mut session = gateway.session().unwrap();
/// let mut buf = [0u8; 16];
/// assert_eq!(session.read(&mut buf).unwrap(), 8);
///
/// // Only one session at a time.
/// assert!(gateway.session().is_err());
/// drop(session);
/// assert!(gateway.session().is_ok());
/// ```
#[derive(Debug)]
pub struct Session<'a> {
    gateway: &'a SessionGateway,
}

impl<'a> Session<'a> {
    pub(super) fn new(gateway: &'a SessionGateway) -> Self {
        Self { gateway }
    }

    /// Generate one word, keeping a prefix of `requested_len` bytes
    pub fn read_chunk(&mut self, requested_len: usize) -> ReadChunk {
        self.gateway.read_chunk(requested_len)
    }

    /// Read one full word
    pub fn next_u64(&mut self) -> u64 {
        self.read_chunk(8).word()
    }

    /// Close the session now
    pub fn close(self) {
        // Drop does the work.
    }
}

impl io::Read for Session<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        self.gateway.read(len, buf).map_err(io::Error::from)
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.gateway.close();
    }
}

impl From<GatewayError> for io::Error {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Busy => io::Error::new(io::ErrorKind::WouldBlock, err),
            GatewayError::Fault { .. } => io::Error::other(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::rng::Xoroshiro128Plus;

    fn gateway() -> SessionGateway {
        let rng = Xoroshiro128Plus::seed(1, 2).unwrap();
        SessionGateway::with_tracing("test", rng)
    }

    #[test]
    fn test_drop_closes() {
        let gateway = gateway();
        {
            let _session = gateway.session().unwrap();
            assert!(gateway.is_held());
        }
        assert!(!gateway.is_held());
    }

    #[test]
    fn test_explicit_close() {
        let gateway = gateway();
        let session = gateway.session().unwrap();
        session.close();
        assert!(!gateway.is_held());
    }

    #[test]
    fn test_busy_maps_to_would_block() {
        let gateway = gateway();
        let _session = gateway.session().unwrap();

        let err = io::Error::from(gateway.session().unwrap_err());
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_io_read_caps_at_one_word() {
        let gateway = gateway();
        let mut session = gateway.session().unwrap();

        let mut buf = [0u8; 32];
        assert_eq!(session.read(&mut buf).unwrap(), 8);
        assert!(buf[8..].iter().all(|&b| b == 0));

        let mut small = [0u8; 3];
        assert_eq!(session.read(&mut small).unwrap(), 3);
    }

    #[test]
    fn test_read_exact_spans_words() {
        let gateway = gateway();
        let mut session = gateway.session().unwrap();

        let mut buf = [0u8; 20];
        session.read_exact(&mut buf).unwrap();
        assert!(buf.iter().any(|&b| b != 0));
    }
}

//! Session Gateway
//!
//! Serializes access to the generator across at most one open session and
//! hands out byte prefixes of generated words.
//!
//! # Protocol
//!
//! ```text
//! Free --open()--> Held          (jump once, count the open)
//! Held --open()--> Busy          (no state change, never blocks)
//! Held --read(n)--> Held         (one word consumed, min(n, 8) bytes out)
//! Held --close()--> Free
//! ```
//!
//! # Critical Invariants
//!
//! - **Exclusivity**: at most one session is held at any instant
//! - **Decorrelation**: every session starts one jump (2^64 words) past the
//!   previous one
//! - **One word per read**: a read never generates more than one word,
//!   whatever length was requested
//! - **Generate, then copy**: a read that faults has still consumed its word
//!
//! `read` and `close` trust the caller to hold the session. `close` takes no
//! ownership token and always frees the lock.

mod buffer;
mod session;

pub use buffer::UserBuffer;
pub use session::Session;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::models::DeviceEvent;
use crate::rng::{GeneratorState, Xoroshiro128Plus};

/// Largest number of bytes a single read delivers (one 64-bit word).
pub const MAX_BYTES_PER_READ: usize = 8;

/// Errors returned by gateway operations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GatewayError {
    /// Another session holds the device
    #[error("Device busy: a session is already open")]
    Busy,

    /// The reader's buffer could not take the bytes; the word is consumed
    #[error("Bad address: failed to deliver {not_copied}/{len} bytes")]
    Fault { len: usize, not_copied: usize },
}

/// One generated word and the prefix of it a read delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadChunk {
    word: u64,
    bytes: [u8; MAX_BYTES_PER_READ],
    len: usize,
}

impl ReadChunk {
    fn new(word: u64, requested_len: usize) -> Self {
        Self {
            word,
            bytes: word.to_le_bytes(),
            len: requested_len.min(MAX_BYTES_PER_READ),
        }
    }

    /// The full generated word
    pub fn word(&self) -> u64 {
        self.word
    }

    /// Number of bytes delivered
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Low-order little-endian bytes of the word, truncated to `len()`
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Exclusive-access front end to the generator
pub struct SessionGateway {
    name: String,
    held: AtomicBool,
    n_opens: AtomicU64,
    generator: Mutex<Xoroshiro128Plus>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl SessionGateway {
    /// Create a gateway in the Free state
    pub fn new(
        name: impl Into<String>,
        generator: Xoroshiro128Plus,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            name: name.into(),
            held: AtomicBool::new(false),
            n_opens: AtomicU64::new(0),
            generator: Mutex::new(generator),
            diagnostics,
        }
    }

    /// Create a gateway that reports only through `tracing`
    pub fn with_tracing(name: impl Into<String>, generator: Xoroshiro128Plus) -> Self {
        Self::new(name, generator, Arc::new(TracingDiagnostics))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start a session
    ///
    /// Never blocks: if a session is already held this returns
    /// [`GatewayError::Busy`] immediately and changes nothing.
    pub fn open(&self) -> Result<(), GatewayError> {
        if self
            .held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.diagnostics.record(DeviceEvent::Busy {
                device: self.name.clone(),
            });
            return Err(GatewayError::Busy);
        }

        self.generator().jump();

        let n_opens = self.n_opens.fetch_add(1, Ordering::Relaxed);
        self.diagnostics.record(DeviceEvent::Opened {
            device: self.name.clone(),
            n_opens,
        });

        Ok(())
    }

    /// Start a session and get a handle that closes it on drop
    pub fn session(&self) -> Result<Session<'_>, GatewayError> {
        self.open()?;
        Ok(Session::new(self))
    }

    /// Generate one word and keep the prefix a read of `requested_len` gets
    pub fn read_chunk(&self, requested_len: usize) -> ReadChunk {
        let word = self.generator().next();
        ReadChunk::new(word, requested_len)
    }

    /// Read up to 8 bytes of one fresh word into `dest`
    ///
    /// Returns the number of bytes delivered, `min(requested_len, 8)`.
    ///
    /// # Errors
    /// [`GatewayError::Fault`] when `dest` cannot take all of them. The word
    /// is consumed either way.
    pub fn read<B>(&self, requested_len: usize, dest: &mut B) -> Result<usize, GatewayError>
    where
        B: UserBuffer + ?Sized,
    {
        let chunk = self.read_chunk(requested_len);

        let not_copied = dest.copy_to_user(chunk.as_bytes());
        if not_copied != 0 {
            self.diagnostics.record(DeviceEvent::ReadFault {
                device: self.name.clone(),
                requested: requested_len,
                not_copied,
            });
            return Err(GatewayError::Fault {
                len: chunk.len(),
                not_copied,
            });
        }

        self.diagnostics.record(DeviceEvent::Read {
            device: self.name.clone(),
            requested: requested_len,
            delivered: chunk.len(),
        });
        Ok(chunk.len())
    }

    /// End the current session
    ///
    /// Frees the lock unconditionally; no check is made that the caller
    /// opened it.
    pub fn close(&self) {
        self.held.store(false, Ordering::Release);
        self.diagnostics.record(DeviceEvent::Closed {
            device: self.name.clone(),
        });
    }

    /// Whether a session is currently held
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Number of successful opens so far
    pub fn open_count(&self) -> u64 {
        self.n_opens.load(Ordering::Relaxed)
    }

    /// Current generator state
    pub fn generator_state(&self) -> GeneratorState {
        self.generator().state()
    }

    // Uncontended while callers respect the session protocol.
    fn generator(&self) -> MutexGuard<'_, Xoroshiro128Plus> {
        self.generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGateway")
            .field("name", &self.name)
            .field("held", &self.is_held())
            .field("n_opens", &self.open_count())
            .finish_non_exhaustive()
    }
}

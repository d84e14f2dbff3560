//! Mock completion-queue primitive for testing and development.
//!
//! This module simulates a submit/complete I/O ring: submissions resolve
//! immediately, read submissions are satisfied from a queue of prepared
//! payloads, and every submission is recorded for inspection. The handle
//! can inject errno-class failures and short completions.

use crate::traits::CompletionRing;
use spindle_core::BufferSlot;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded ring submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A write submission and the bytes it carried.
    Write {
        /// Whether the submission used a registered fixed buffer.
        fixed: bool,
        /// Outbound bytes at submission time.
        data: Vec<u8>,
    },

    /// A read submission.
    Read {
        /// Whether the submission used a registered fixed buffer.
        fixed: bool,
        /// Requested length in bytes.
        len: usize,
    },

    /// A full-duplex fixed-buffer transfer and the bytes it wrote out.
    Transfer {
        /// Outbound bytes at submission time.
        data: Vec<u8>,
    },
}

#[derive(Debug, Default)]
struct RingInner {
    registered: Option<(usize, usize)>,
    submissions: Vec<Submission>,
    read_data: VecDeque<Vec<u8>>,
    fail_next: Option<io::ErrorKind>,
    short_next: Option<usize>,
}

impl RingInner {
    fn take_fault(&mut self) -> io::Result<()> {
        match self.fail_next.take() {
            Some(kind) => Err(kind.into()),
            None => Ok(()),
        }
    }

    fn completed_len(&mut self, requested: usize) -> usize {
        match self.short_next.take() {
            Some(len) => len.min(requested),
            None => requested,
        }
    }

    fn fill_from_queue(&mut self, buf: &mut [u8]) {
        if let Some(data) = self.read_data.pop_front() {
            let n = data.len().min(buf.len());
            buf[..n].copy_from_slice(&data[..n]);
        }
    }

    fn ensure_registered(&self, slot: BufferSlot, len: usize) -> io::Result<()> {
        let Some((write_len, read_len)) = self.registered else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no fixed buffers registered",
            ));
        };
        let capacity = match slot {
            BufferSlot::Write => write_len,
            BufferSlot::Read => read_len,
        };
        if len > capacity {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} bytes exceed the {} capacity {}", len, slot, capacity),
            ));
        }
        Ok(())
    }
}

/// Mock completion-queue ring.
///
/// Created together with its control handle; the ring side goes to the
/// driver, the handle side stays with the test.
///
/// # Examples
///
/// ```
/// use spindle_hal::mock::{MockRing, Submission};
/// use spindle_hal::traits::CompletionRing;
///
/// #[tokio::main]
/// async fn main() {
///     let (mut ring, handle) = MockRing::new();
///
///     ring.submit_write(&[0x10, 0x20]).await.unwrap();
///
///     assert_eq!(
///         handle.submissions(),
///         vec![Submission::Write { fixed: false, data: vec![0x10, 0x20] }]
///     );
/// }
/// ```
#[derive(Debug)]
pub struct MockRing {
    shared: Arc<Mutex<RingInner>>,
}

impl MockRing {
    /// Create a new mock ring and its control handle.
    pub fn new() -> (Self, MockRingHandle) {
        let shared = Arc::new(Mutex::new(RingInner::default()));

        let handle = MockRingHandle {
            shared: Arc::clone(&shared),
        };

        (Self { shared }, handle)
    }

    fn lock(&self) -> MutexGuard<'_, RingInner> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CompletionRing for MockRing {
    fn register_buffers(&mut self, write_len: usize, read_len: usize) -> io::Result<()> {
        let mut inner = self.lock();
        if inner.registered.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "fixed buffers already registered",
            ));
        }
        inner.registered = Some((write_len, read_len));
        Ok(())
    }

    async fn submit_write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.take_fault()?;
        inner.submissions.push(Submission::Write {
            fixed: false,
            data: data.to_vec(),
        });
        Ok(inner.completed_len(data.len()))
    }

    async fn submit_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.take_fault()?;
        inner.submissions.push(Submission::Read {
            fixed: false,
            len: buf.len(),
        });
        inner.fill_from_queue(buf);
        Ok(inner.completed_len(buf.len()))
    }

    async fn submit_write_fixed(&mut self, slot: BufferSlot, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.take_fault()?;
        inner.ensure_registered(slot, buf.len())?;
        inner.submissions.push(Submission::Write {
            fixed: true,
            data: buf.to_vec(),
        });
        Ok(inner.completed_len(buf.len()))
    }

    async fn submit_read_fixed(&mut self, slot: BufferSlot, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.take_fault()?;
        inner.ensure_registered(slot, buf.len())?;
        inner.submissions.push(Submission::Read {
            fixed: true,
            len: buf.len(),
        });
        inner.fill_from_queue(buf);
        Ok(inner.completed_len(buf.len()))
    }

    async fn submit_transfer_fixed(
        &mut self,
        slot: BufferSlot,
        buf: &mut [u8],
    ) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.take_fault()?;
        inner.ensure_registered(slot, buf.len())?;
        inner.submissions.push(Submission::Transfer {
            data: buf.to_vec(),
        });
        // With no prepared payload the outbound bytes stay in place, which
        // reads back as a wire loop.
        inner.fill_from_queue(buf);
        Ok(inner.completed_len(buf.len()))
    }
}

/// Handle for controlling a [`MockRing`].
///
/// Can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockRingHandle {
    shared: Arc<Mutex<RingInner>>,
}

impl MockRingHandle {
    fn lock(&self) -> MutexGuard<'_, RingInner> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a payload for the next read submission.
    pub fn push_read(&self, data: &[u8]) {
        self.lock().read_data.push_back(data.to_vec());
    }

    /// Get a copy of every submission so far, in submission order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    /// Buffer lengths passed to registration, if any.
    pub fn registered(&self) -> Option<(usize, usize)> {
        self.lock().registered
    }

    /// Make the next submission fail with the given error kind.
    pub fn fail_next(&self, kind: io::ErrorKind) {
        self.lock().fail_next = Some(kind);
    }

    /// Make the next submission complete with `len` bytes instead of the
    /// requested length.
    pub fn short_next(&self, len: usize) {
        self.lock().short_next = Some(len);
    }
}

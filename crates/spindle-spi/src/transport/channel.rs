//! Notification-driven producer/consumer transport.
//!
//! Two pump tasks run for the life of the transport, one per direction,
//! each bound to its own readiness notification:
//!
//! - the **write pump** drains the outbound frame queue one raw register
//!   write at a time, resolving each frame's enqueuing caller with the
//!   outcome, and parks on the outbound notification edge whenever the
//!   pending level reaches zero;
//! - the **read pump** wakes on each inbound notification edge and, while
//!   the pending level stays nonzero, moves exactly one word per raw read
//!   into the inbound frame queue.
//!
//! A raw failure terminates the failing pump's inner loop and is delivered
//! to exactly the caller it concerns: the enqueuing writer, or whichever
//! consumer is waiting on the inbound queue. The pump resumes on the next
//! notification edge; nothing is retried.
//!
//! The outbound and inbound pipelines are independent: there is no
//! cross-ordering guarantee between the two directions.

use bytes::{Buf, Bytes};
use spindle_core::constants::{CHANNEL_CAPACITY, MAX_WORD_BYTES};
use spindle_core::{Result, SpiError, WordLength};
use spindle_hal::traits::{ReadinessNotifier, SpiBus};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// One outbound transfer unit, carrying the slot its caller suspends on.
struct Frame {
    bytes: Bytes,
    done: oneshot::Sender<Result<()>>,
}

/// Interrupt-driven channel transport.
///
/// Owned by a [`SpiDevice`](crate::device::SpiDevice), which serializes all
/// access. Dropping the transport closes the outbound queue; aborting the
/// pump tasks closes the inbound queue. Either way every suspended caller
/// resolves: the dropped oneshot and mpsc halves read back as
/// [`SpiError::Canceled`].
pub struct ChannelTransport {
    outbound: mpsc::Sender<Frame>,
    inbound: mpsc::Receiver<Result<Bytes>>,
    stash: Bytes,
}

impl ChannelTransport {
    /// Spawn the two pump tasks into `tasks` and wire up the frame queues.
    ///
    /// The raw bus is shared between the pumps behind a `std::sync` mutex;
    /// register access is brief and never held across a suspension point.
    pub(crate) fn start<B, Tx, Rx>(
        word_length: WordLength,
        bus: B,
        tx_irq: Tx,
        rx_irq: Rx,
        tasks: &mut JoinSet<()>,
    ) -> Self
    where
        B: SpiBus + 'static,
        Tx: ReadinessNotifier + 'static,
        Rx: ReadinessNotifier + 'static,
    {
        let bus = Arc::new(Mutex::new(bus));
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

        tasks.spawn(write_pump(Arc::clone(&bus), tx_irq, outbound_rx));
        tasks.spawn(read_pump(bus, word_length, rx_irq, inbound_tx));

        Self {
            outbound: outbound_tx,
            inbound: inbound_rx,
            stash: Bytes::new(),
        }
    }

    /// Enqueue one outbound frame and await its resolution by the write
    /// pump.
    ///
    /// Suspends while the outbound queue is at capacity.
    pub(crate) async fn write(&mut self, bytes: Bytes) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.outbound
            .send(Frame {
                bytes,
                done: done_tx,
            })
            .await
            .map_err(|_| SpiError::Canceled)?;
        done_rx.await.map_err(|_| SpiError::Canceled)?
    }

    /// Copy inbound frames into `buf` until it is full.
    ///
    /// Suspends while the inbound queue is empty. A frame longer than the
    /// remaining space parks its tail, which the next read consumes first.
    /// Returns the total bytes copied, or the first failure delivered by
    /// the read pump.
    pub(crate) async fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut copied = 0;
        while copied < buf.len() {
            if !self.stash.is_empty() {
                let n = self.stash.len().min(buf.len() - copied);
                buf[copied..copied + n].copy_from_slice(&self.stash[..n]);
                self.stash.advance(n);
                copied += n;
                continue;
            }
            match self.inbound.recv().await {
                Some(Ok(frame)) => self.stash = frame,
                Some(Err(err)) => return Err(err),
                None => return Err(SpiError::Canceled),
            }
        }
        Ok(copied)
    }
}

async fn write_pump<B: SpiBus, N: ReadinessNotifier>(
    bus: Arc<Mutex<B>>,
    mut irq: N,
    mut outbound: mpsc::Receiver<Frame>,
) {
    debug!("write pump started");
    'pump: loop {
        loop {
            let Some(frame) = outbound.recv().await else {
                break 'pump;
            };
            let requested = frame.bytes.len();
            let outcome = lock_bus(&bus).write_raw(&frame.bytes);
            match outcome {
                Ok(completed) if completed == requested => {
                    let _ = frame.done.send(Ok(()));
                }
                Ok(completed) => {
                    warn!(requested, completed, "short raw write");
                    let _ = frame
                        .done
                        .send(Err(SpiError::short_transfer(requested, completed)));
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "raw write failed");
                    let _ = frame.done.send(Err(err.into()));
                    break;
                }
            }
            if irq.pending() == 0 {
                break;
            }
        }
        if irq.edge().await.is_err() {
            break 'pump;
        }
    }
    debug!("write pump terminated");
}

async fn read_pump<B: SpiBus, N: ReadinessNotifier>(
    bus: Arc<Mutex<B>>,
    word_length: WordLength,
    mut irq: N,
    inbound: mpsc::Sender<Result<Bytes>>,
) {
    debug!("read pump started");
    let unit = word_length.granularity();
    'pump: loop {
        if irq.edge().await.is_err() {
            break;
        }
        while irq.pending() > 0 {
            let mut word = [0u8; MAX_WORD_BYTES];
            let outcome = lock_bus(&bus).read_raw(&mut word[..unit]);
            match outcome {
                Ok(completed) => {
                    let frame = Bytes::copy_from_slice(&word[..completed]);
                    if inbound.send(Ok(frame)).await.is_err() {
                        break 'pump;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "raw read failed");
                    let _ = inbound.send(Err(err.into())).await;
                    break;
                }
            }
        }
    }
    debug!("read pump terminated");
}

fn lock_bus<B>(bus: &Mutex<B>) -> MutexGuard<'_, B> {
    bus.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

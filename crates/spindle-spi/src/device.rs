//! Serialized SPI device façade.
//!
//! The peripheral cannot service concurrent transactions, so every
//! operation funnels through one fair async mutex: callers are admitted
//! strictly in arrival order, and a second operation does not touch the
//! transport until the first completes, resolves, or fails. The exclusivity
//! is a hardware constraint, not a policy choice.
//!
//! One `SpiDevice` type fronts both transport strategies; the operation
//! surface follows the transport the device was built with:
//!
//! - [`SpiDevice::with_ring`]: completion-queue transport, with the
//!   block-suffixed zero-copy operations when a block size is configured;
//! - [`SpiDevice::with_interrupts`]: channel transport, with
//!   count-resolving `write`/`read` against caller buffers.
//!
//! Argument validation (length resolution, 32-bit word alignment, block
//! size presence) runs before the transport lock is taken; an invalid call
//! never reaches the peripheral.

use crate::readiness::ReadinessSignal;
use crate::transport::channel::ChannelTransport;
use crate::transport::completion::CompletionTransport;
use crate::validate;
use bytes::Bytes;
use spindle_core::{Result, SpiConfig, SpiError};
use spindle_hal::traits::{CompletionRing, DigitalInput, ReadinessNotifier, SpiBus};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Serialized access to one SPI peripheral.
///
/// Cloning is cheap and shares the underlying device; all clones observe
/// the same one-operation-at-a-time admission order. The admission queue is
/// FIFO: `tokio::sync::Mutex` parks waiters fairly, so concurrent issuers
/// execute in the order their calls arrived.
///
/// # Teardown
///
/// [`shutdown`](SpiDevice::shutdown) resolves every suspended caller with
/// [`SpiError::Canceled`] and terminates the pump tasks. Dropping the last
/// clone without a shutdown tears the pump tasks down through the
/// destructor; a suspended caller always holds a clone, so no waiter can
/// outlive the device.
///
/// # Examples
///
/// ```
/// use spindle_core::{SpiConfig, WordLength};
/// use spindle_hal::mock::MockRing;
/// use spindle_spi::SpiDevice;
///
/// #[tokio::main]
/// async fn main() -> spindle_core::Result<()> {
///     let (ring, _handle) = MockRing::new();
///     let config = SpiConfig::new(WordLength::Bits8).with_block_size(64);
///     let spi = SpiDevice::with_ring(config, ring, None)?;
///
///     spi.write(&[0x9F]).await?;
///     let id = spi.read(3).await?;
///     assert_eq!(id.len(), 3);
///     Ok(())
/// }
/// ```
pub struct SpiDevice<T> {
    shared: Arc<DeviceShared<T>>,
}

impl<T> Clone for SpiDevice<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct DeviceShared<T> {
    config: SpiConfig,
    transport: Mutex<T>,
    readiness: Option<Arc<ReadinessSignal>>,
    tasks: std::sync::Mutex<Option<JoinSet<()>>>,
    closed: AtomicBool,
}

impl<T> Drop for DeviceShared<T> {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            if let Some(signal) = &self.readiness {
                signal.close();
            }
            // Dropping the JoinSet aborts any still-running pump task.
        }
    }
}

impl<T> SpiDevice<T> {
    /// The configuration this device was built with.
    pub fn config(&self) -> &SpiConfig {
        &self.shared.config
    }

    /// Cancel every suspended caller and terminate the pump tasks.
    ///
    /// Pending waiters, readiness waiters and channel waiters alike,
    /// resolve with [`SpiError::Canceled`]; operations issued after the
    /// shutdown fail the same way. Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(signal) = &self.shared.readiness {
            signal.close();
        }

        let tasks = self
            .shared
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(mut tasks) = tasks {
            tasks.abort_all();
            while let Some(result) = tasks.join_next().await {
                if let Err(err) = result
                    && !err.is_cancelled()
                {
                    warn!(error = %err, "pump task panicked during shutdown");
                }
            }
        }

        debug!("device shut down");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(SpiError::Canceled);
        }
        Ok(())
    }

    fn ensure_block_size(&self) -> Result<usize> {
        self.shared.config.block_size.ok_or_else(|| {
            SpiError::invalid_argument("Block operation requires a configured block size")
        })
    }
}

impl<R: CompletionRing> SpiDevice<CompletionTransport<R>> {
    /// Build a device over the completion-queue transport.
    ///
    /// With a block size configured, the two fixed buffers are registered
    /// with the ring here. A readiness input, when supplied, gates every
    /// read on the data-available line.
    ///
    /// # Errors
    ///
    /// Returns `SpiError::InvalidArgument` for an invalid configuration and
    /// propagates registration failures from the ring.
    pub fn with_ring(
        config: SpiConfig,
        ring: R,
        readiness_input: Option<Arc<dyn DigitalInput>>,
    ) -> Result<Self> {
        config.validate()?;
        let readiness = readiness_input.map(ReadinessSignal::new);
        let transport = CompletionTransport::new(ring, &config, readiness.clone())?;

        Ok(Self {
            shared: Arc::new(DeviceShared {
                config,
                transport: Mutex::new(transport),
                readiness,
                tasks: std::sync::Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Write the full byte sequence to the peripheral.
    pub async fn write(&self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        validate::check_alignment(self.shared.config.word_length, data.len())?;
        let mut transport = self.shared.transport.lock().await;
        transport.write(data).await
    }

    /// Read `count` bytes from the peripheral.
    ///
    /// Waits on the readiness input first when one is configured.
    pub async fn read(&self, count: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;
        validate::check_alignment(self.shared.config.word_length, count)?;
        let mut transport = self.shared.transport.lock().await;
        transport.read(count).await
    }

    /// Let `fill` populate the write slot in place, then submit the whole
    /// block.
    ///
    /// Requires a configured block size.
    pub async fn write_block(&self, fill: impl FnOnce(&mut [u8])) -> Result<()> {
        self.ensure_open()?;
        self.ensure_block_size()?;
        let mut transport = self.shared.transport.lock().await;
        transport.write_block(fill).await
    }

    /// Fill the read slot from the peripheral, then hand it to `drain`.
    ///
    /// Waits on the readiness input first when one is configured. Requires
    /// a configured block size.
    pub async fn read_block(&self, drain: impl FnOnce(&[u8])) -> Result<()> {
        self.ensure_open()?;
        self.ensure_block_size()?;
        let mut transport = self.shared.transport.lock().await;
        transport.read_block(drain).await
    }

    /// Let `exchange` populate the write slot, then run a full-duplex
    /// transfer reusing that slot for the simultaneous read.
    ///
    /// Requires a configured block size.
    pub async fn transceive_block(&self, exchange: impl FnOnce(&mut [u8])) -> Result<()> {
        self.ensure_open()?;
        self.ensure_block_size()?;
        let mut transport = self.shared.transport.lock().await;
        transport.transceive_block(exchange).await
    }
}

impl SpiDevice<ChannelTransport> {
    /// Build a device over the interrupt-driven channel transport.
    ///
    /// Spawns the two pump tasks, so this must be called from within a
    /// Tokio runtime. Each direction binds its own notifier; the raw bus
    /// is owned by the pumps for the life of the device.
    ///
    /// # Errors
    ///
    /// Returns `SpiError::InvalidArgument` for an invalid configuration.
    pub fn with_interrupts<B, Tx, Rx>(config: SpiConfig, bus: B, tx_irq: Tx, rx_irq: Rx) -> Result<Self>
    where
        B: SpiBus + 'static,
        Tx: ReadinessNotifier + 'static,
        Rx: ReadinessNotifier + 'static,
    {
        config.validate()?;
        let mut tasks = JoinSet::new();
        let transport = ChannelTransport::start(config.word_length, bus, tx_irq, rx_irq, &mut tasks);

        Ok(Self {
            shared: Arc::new(DeviceShared {
                config,
                transport: Mutex::new(transport),
                readiness: None,
                tasks: std::sync::Mutex::new(Some(tasks)),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Write `count` bytes of `data` (all of it when `count` is absent).
    ///
    /// Resolves once the write pump has pushed the bytes to the
    /// peripheral; a raw-write failure surfaces here, not in some later
    /// call.
    pub async fn write(&self, data: &[u8], count: Option<usize>) -> Result<()> {
        self.ensure_open()?;
        let len = validate::effective_len(data.len(), count)?;
        validate::check_alignment(self.shared.config.word_length, len)?;
        let bytes = Bytes::copy_from_slice(&data[..len]);
        let mut transport = self.shared.transport.lock().await;
        transport.write(bytes).await
    }

    /// Read `count` bytes (the whole buffer when `count` is absent) into
    /// `buf`, suspending until the inbound data arrives.
    ///
    /// Returns the number of bytes copied, or propagates a failure raised
    /// by the read pump.
    pub async fn read(&self, buf: &mut [u8], count: Option<usize>) -> Result<usize> {
        self.ensure_open()?;
        let len = validate::effective_len(buf.len(), count)?;
        validate::check_alignment(self.shared.config.word_length, len)?;
        let mut transport = self.shared.transport.lock().await;
        transport.read_into(&mut buf[..len]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_core::WordLength;
    use spindle_hal::mock::{MockRing, MockSpiBus, Submission};

    #[tokio::test]
    async fn test_config_accessor() {
        let (ring, _handle) = MockRing::new();
        let config = SpiConfig::new(WordLength::Bits16).with_block_size(32);
        let spi = SpiDevice::with_ring(config.clone(), ring, None).unwrap();

        assert_eq!(spi.config(), &config);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let (ring, _handle) = MockRing::new();
        let config = SpiConfig::new(WordLength::Bits32).with_block_size(30);

        assert!(matches!(
            SpiDevice::with_ring(config, ring, None),
            Err(SpiError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn test_operations_after_shutdown() {
        let (ring, _handle) = MockRing::new();
        let spi = SpiDevice::with_ring(SpiConfig::new(WordLength::Bits8), ring, None).unwrap();

        spi.shutdown().await.unwrap();

        assert!(matches!(spi.write(&[1]).await, Err(SpiError::Canceled)));
        assert!(matches!(spi.read(1).await, Err(SpiError::Canceled)));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (bus, handle) = MockSpiBus::new();
        let spi = SpiDevice::with_interrupts(
            SpiConfig::new(WordLength::Bits8),
            bus,
            handle.tx_notifier(),
            handle.rx_notifier(),
        )
        .unwrap();

        spi.shutdown().await.unwrap();
        spi.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_admission_order() {
        let (ring, handle) = MockRing::new();
        let spi = SpiDevice::with_ring(SpiConfig::new(WordLength::Bits8), ring, None).unwrap();

        let mut issuers = Vec::new();
        for i in 0u8..4 {
            let spi = spi.clone();
            issuers.push(tokio::spawn(async move { spi.write(&[i]).await }));
            // Give each issuer time to reach the admission queue so the
            // arrival order is deterministic.
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        for issuer in issuers {
            issuer.await.unwrap().unwrap();
        }

        let order: Vec<Vec<u8>> = handle
            .submissions()
            .into_iter()
            .map(|submission| match submission {
                Submission::Write { data, .. } => data,
                other => panic!("unexpected submission {:?}", other),
            })
            .collect();
        assert_eq!(order, vec![vec![0], vec![1], vec![2], vec![3]]);
    }
}

//! Zero-copy fixed-buffer transport over a completion-queue primitive.
//!
//! With a configured block size the transport registers exactly two buffers
//! with the ring at construction: slot 0 is filled by the caller and
//! submitted for writes, slot 1 receives inbound data for reads. Block
//! operations hand the caller a view of the matching slot and reuse it
//! across transfers without copying. Reads are gated on the device's
//! readiness signal when one is configured.
//!
//! Without a block size the transport still serves `write` and `read`
//! through plain (non-fixed) submissions; only the block-suffixed
//! operations need the registered slots.

use super::ensure_complete;
use crate::readiness::ReadinessSignal;
use spindle_core::{BufferSlot, Result, SpiConfig, SpiError};
use spindle_hal::traits::CompletionRing;
use std::sync::Arc;

/// The two pre-registered buffer slots.
struct FixedSlots {
    write: Box<[u8]>,
    read: Box<[u8]>,
}

impl FixedSlots {
    fn block_size(&self) -> usize {
        self.write.len()
    }
}

/// Fixed-buffer completion-queue transport.
///
/// Owned by a [`SpiDevice`](crate::device::SpiDevice), which serializes all
/// access; the slots are therefore never shared between a fill and a drain
/// operation at the same time.
pub struct CompletionTransport<R: CompletionRing> {
    ring: R,
    slots: Option<FixedSlots>,
    readiness: Option<Arc<ReadinessSignal>>,
}

impl<R: CompletionRing> CompletionTransport<R> {
    /// Build the transport, registering the fixed buffers when the
    /// configuration carries a block size.
    pub(crate) fn new(
        mut ring: R,
        config: &SpiConfig,
        readiness: Option<Arc<ReadinessSignal>>,
    ) -> Result<Self> {
        let slots = match config.block_size {
            Some(block_size) => {
                ring.register_buffers(block_size, block_size)?;
                Some(FixedSlots {
                    write: vec![0u8; block_size].into_boxed_slice(),
                    read: vec![0u8; block_size].into_boxed_slice(),
                })
            }
            None => None,
        };

        Ok(Self {
            ring,
            slots,
            readiness,
        })
    }

    /// Submit the full byte sequence as a plain write.
    pub(crate) async fn write(&mut self, data: &[u8]) -> Result<()> {
        let completed = self.ring.submit_write(data).await?;
        ensure_complete(data.len(), completed)
    }

    /// Wait for readiness, then read `count` bytes.
    ///
    /// With registered slots the read lands in slot 1 and `count` must fit
    /// the block size; otherwise a plain submission fills a fresh buffer.
    pub(crate) async fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        self.wait_ready().await?;
        match self.slots.as_mut() {
            Some(slots) => {
                if count > slots.block_size() {
                    return Err(SpiError::invalid_argument(format!(
                        "Read length {} exceeds configured block size {}",
                        count,
                        slots.block_size()
                    )));
                }
                let completed = self
                    .ring
                    .submit_read_fixed(BufferSlot::Read, &mut slots.read[..count])
                    .await?;
                ensure_complete(count, completed)?;
                Ok(slots.read[..count].to_vec())
            }
            None => {
                let mut buf = vec![0u8; count];
                let completed = self.ring.submit_read(&mut buf).await?;
                ensure_complete(count, completed)?;
                Ok(buf)
            }
        }
    }

    /// Let `fill` populate slot 0 in place, then submit the whole block.
    pub(crate) async fn write_block(&mut self, fill: impl FnOnce(&mut [u8])) -> Result<()> {
        let Some(slots) = self.slots.as_mut() else {
            return Err(missing_block_size());
        };
        fill(&mut slots.write);
        let requested = slots.block_size();
        let completed = self
            .ring
            .submit_write_fixed(BufferSlot::Write, &slots.write)
            .await?;
        ensure_complete(requested, completed)
    }

    /// Wait for readiness, fill slot 1 from the peripheral, then hand the
    /// block to `drain`.
    pub(crate) async fn read_block(&mut self, drain: impl FnOnce(&[u8])) -> Result<()> {
        self.wait_ready().await?;
        let Some(slots) = self.slots.as_mut() else {
            return Err(missing_block_size());
        };
        let requested = slots.block_size();
        let completed = self
            .ring
            .submit_read_fixed(BufferSlot::Read, &mut slots.read)
            .await?;
        ensure_complete(requested, completed)?;
        drain(&slots.read);
        Ok(())
    }

    /// Let `exchange` populate slot 0 in place, then run a full-duplex
    /// transfer that reuses the same slot for the simultaneous read.
    pub(crate) async fn transceive_block(&mut self, exchange: impl FnOnce(&mut [u8])) -> Result<()> {
        let Some(slots) = self.slots.as_mut() else {
            return Err(missing_block_size());
        };
        exchange(&mut slots.write);
        let requested = slots.block_size();
        let completed = self
            .ring
            .submit_transfer_fixed(BufferSlot::Write, &mut slots.write)
            .await?;
        ensure_complete(requested, completed)
    }

    async fn wait_ready(&self) -> Result<()> {
        match &self.readiness {
            Some(signal) => signal.available().await,
            None => Ok(()),
        }
    }
}

fn missing_block_size() -> SpiError {
    SpiError::invalid_argument("Block operation requires a configured block size")
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_core::WordLength;
    use spindle_hal::mock::{MockRing, Submission};

    fn transport(block_size: Option<usize>) -> (
        CompletionTransport<MockRing>,
        spindle_hal::mock::MockRingHandle,
    ) {
        let (ring, handle) = MockRing::new();
        let mut config = SpiConfig::new(WordLength::Bits8);
        if let Some(block_size) = block_size {
            config = config.with_block_size(block_size);
        }
        let transport = CompletionTransport::new(ring, &config, None).unwrap();
        (transport, handle)
    }

    #[tokio::test]
    async fn test_construction_registers_two_buffers() {
        let (_transport, handle) = transport(Some(64));
        assert_eq!(handle.registered(), Some((64, 64)));
    }

    #[tokio::test]
    async fn test_construction_without_block_size_skips_registration() {
        let (_transport, handle) = transport(None);
        assert_eq!(handle.registered(), None);
    }

    #[tokio::test]
    async fn test_write_plain_submission() {
        let (mut transport, handle) = transport(Some(8));

        transport.write(&[1, 2, 3]).await.unwrap();

        assert_eq!(
            handle.submissions(),
            vec![Submission::Write {
                fixed: false,
                data: vec![1, 2, 3],
            }]
        );
    }

    #[tokio::test]
    async fn test_write_short_completion() {
        let (mut transport, handle) = transport(None);
        handle.short_next(1);

        let err = transport.write(&[1, 2, 3]).await.unwrap_err();
        assert!(matches!(
            err,
            SpiError::ShortTransfer {
                requested: 3,
                completed: 1,
            }
        ));
    }

    #[tokio::test]
    async fn test_write_block_fills_slot_and_submits() {
        let (mut transport, handle) = transport(Some(4));

        transport
            .write_block(|block| {
                block.copy_from_slice(&[0xA, 0xB, 0xC, 0xD]);
            })
            .await
            .unwrap();

        assert_eq!(
            handle.submissions(),
            vec![Submission::Write {
                fixed: true,
                data: vec![0xA, 0xB, 0xC, 0xD],
            }]
        );
    }

    #[tokio::test]
    async fn test_read_block_drains_slot() {
        let (mut transport, handle) = transport(Some(4));
        handle.push_read(&[9, 8, 7, 6]);

        let mut drained = Vec::new();
        transport
            .read_block(|block| drained.extend_from_slice(block))
            .await
            .unwrap();

        assert_eq!(drained, vec![9, 8, 7, 6]);
    }

    #[tokio::test]
    async fn test_read_fixed_respects_block_size() {
        let (mut transport, _handle) = transport(Some(4));

        let err = transport.read(8).await.unwrap_err();
        assert!(matches!(err, SpiError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_read_plain_without_block_size() {
        let (mut transport, handle) = transport(None);
        handle.push_read(&[1, 2]);

        let data = transport.read(2).await.unwrap();
        assert_eq!(data, vec![1, 2]);
        assert_eq!(
            handle.submissions(),
            vec![Submission::Read {
                fixed: false,
                len: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_block_ops_without_slots() {
        let (mut transport, handle) = transport(None);

        let err = transport.write_block(|_| {}).await.unwrap_err();
        assert!(matches!(err, SpiError::InvalidArgument { .. }));

        let err = transport.read_block(|_| {}).await.unwrap_err();
        assert!(matches!(err, SpiError::InvalidArgument { .. }));

        let err = transport.transceive_block(|_| {}).await.unwrap_err();
        assert!(matches!(err, SpiError::InvalidArgument { .. }));

        // Nothing reached the ring.
        assert!(handle.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_transceive_reuses_write_slot() {
        let (mut transport, handle) = transport(Some(2));

        transport
            .transceive_block(|block| block.copy_from_slice(&[3, 4]))
            .await
            .unwrap();

        assert_eq!(
            handle.submissions(),
            vec![Submission::Transfer { data: vec![3, 4] }]
        );
    }

    #[tokio::test]
    async fn test_io_error_propagates() {
        let (mut transport, handle) = transport(None);
        handle.fail_next(std::io::ErrorKind::BrokenPipe);

        let err = transport.write(&[0]).await.unwrap_err();
        assert!(matches!(err, SpiError::Io(_)));
    }
}

//! Common test utilities for integration tests.
//!
//! Builders for mock-backed devices shared across the integration suites,
//! plus one-time tracing setup so `RUST_LOG` reaches the pump tasks under
//! test.

use spindle_core::SpiConfig;
use spindle_hal::mock::{
    MockDigitalInput, MockDigitalInputHandle, MockRing, MockRingHandle, MockSpiBus,
    MockSpiBusHandle,
};
use spindle_spi::{ChannelTransport, CompletionTransport, SpiDevice};
use std::sync::Arc;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the tracing subscriber once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Completion-path device without a readiness input.
pub fn ring_device(
    config: SpiConfig,
) -> (SpiDevice<CompletionTransport<MockRing>>, MockRingHandle) {
    init_tracing();
    let (ring, handle) = MockRing::new();
    let spi = SpiDevice::with_ring(config, ring, None).expect("device construction");
    (spi, handle)
}

/// Completion-path device gated on a mock data-available line.
pub fn ring_device_with_input(
    config: SpiConfig,
) -> (
    SpiDevice<CompletionTransport<MockRing>>,
    MockRingHandle,
    MockDigitalInputHandle,
) {
    init_tracing();
    let (ring, ring_handle) = MockRing::new();
    let (input, input_handle) = MockDigitalInput::new();
    let spi =
        SpiDevice::with_ring(config, ring, Some(Arc::new(input))).expect("device construction");
    (spi, ring_handle, input_handle)
}

/// Channel-path device over a mock bus with per-direction notifiers.
pub fn irq_device(config: SpiConfig) -> (SpiDevice<ChannelTransport>, MockSpiBusHandle) {
    init_tracing();
    let (bus, handle) = MockSpiBus::new();
    let spi = SpiDevice::with_interrupts(config, bus, handle.tx_notifier(), handle.rx_notifier())
        .expect("device construction");
    (spi, handle)
}

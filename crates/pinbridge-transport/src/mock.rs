//! Mock transport implementation for testing and development.
//!
//! This module provides a simulated firmware transport that can be driven
//! programmatically: tests emit pin events through a handle and inspect
//! every call the core made, without requiring a physical board.

use crate::{
    Result, TransportError,
    event::{EVENT_CHANNEL_CAPACITY, EventStream, PinEvent},
    traits::Transport,
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use pinbridge_core::PinKind;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Record of one call observed by the mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `set_pin_mode_digital_input` was invoked.
    SetPinModeDigitalInput { channel: u8 },

    /// `set_pin_mode_digital_input_pullup` was invoked.
    SetPinModeDigitalInputPullup { channel: u8 },

    /// `set_pin_mode_analog_input` was invoked.
    SetPinModeAnalogInput { channel: u8, update_threshold: u16 },

    /// `set_pin_mode_digital_output` was invoked.
    SetPinModeDigitalOutput { channel: u8 },

    /// `set_pin_mode_analog_output` was invoked.
    SetPinModeAnalogOutput { channel: u8 },

    /// `enable_digital_reporting` was invoked.
    EnableDigitalReporting { channel: u8 },

    /// `disable_digital_reporting` was invoked.
    DisableDigitalReporting { channel: u8 },

    /// `enable_analog_reporting` was invoked.
    EnableAnalogReporting { channel: u8 },

    /// `disable_analog_reporting` was invoked.
    DisableAnalogReporting { channel: u8 },

    /// `disable_all_reporting` was invoked.
    DisableAllReporting,

    /// `digital_write` was invoked.
    DigitalWrite { channel: u8, value: u16 },

    /// `shutdown` was invoked.
    Shutdown,
}

/// Transport operations that can be made to fail via
/// [`MockTransportHandle::fail_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    DigitalInput,
    DigitalInputPullup,
    AnalogInput,
    DigitalOutput,
    AnalogOutput,
    EnableDigitalReporting,
    DisableDigitalReporting,
    EnableAnalogReporting,
    DisableAnalogReporting,
    DisableAllReporting,
    DigitalWrite,
    Shutdown,
}

/// Shared state behind both the transport and its handle.
#[derive(Debug, Default)]
struct MockState {
    /// Every call the core has made, in order.
    calls: Vec<TransportCall>,

    /// Event stream producers keyed by (kind, channel).
    subscriptions: HashMap<(PinKind, u8), mpsc::Sender<PinEvent>>,

    /// Channels with reporting currently enabled.
    reporting: HashSet<(PinKind, u8)>,

    /// Last value written per output channel.
    written: HashMap<u8, u16>,

    /// Operations armed to fail.
    failures: HashSet<MockOp>,

    /// Set once `shutdown` has run.
    closed: bool,
}

/// Mock firmware transport for testing and development.
///
/// The mock records every call, tracks per-channel subscriptions and
/// reporting state, and delivers events only to channels that are both
/// subscribed and reporting, mirroring real firmware behavior.
///
/// # Examples
///
/// ```
/// use pinbridge_transport::{MockTransport, Transport};
///
/// #[tokio::main]
/// async fn main() -> pinbridge_transport::Result<()> {
///     let (transport, handle) = MockTransport::new();
///
///     let mut events = transport.set_pin_mode_digital_input(4).await?;
///     transport.enable_digital_reporting(4).await?;
///
///     // Simulate the board reporting a high level
///     assert!(handle.emit_digital(4, 1));
///
///     let event = events.recv().await.unwrap();
///     assert_eq!(event.channel, 4);
///     assert_eq!(event.value, 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the
    /// handle drives the simulation and inspects recorded calls.
    pub fn new() -> (Self, MockTransportHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let transport = Self {
            state: Arc::clone(&state),
        };
        let handle = MockTransportHandle { state };
        (transport, handle)
    }

    /// Lock the state, rejecting the call if the transport is closed or the
    /// operation is armed to fail. Failed calls are not recorded.
    fn guard(&self, op: MockOp, channel: u8) -> Result<MutexGuard<'_, MockState>> {
        let state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if state.failures.contains(&op) {
            return Err(Self::injected(op, channel));
        }
        Ok(state)
    }

    fn injected(op: MockOp, channel: u8) -> TransportError {
        match op {
            MockOp::DigitalInput
            | MockOp::DigitalInputPullup
            | MockOp::AnalogInput
            | MockOp::DigitalOutput
            | MockOp::AnalogOutput => {
                TransportError::configuration_failed(channel, "injected failure")
            }
            MockOp::EnableDigitalReporting
            | MockOp::DisableDigitalReporting
            | MockOp::EnableAnalogReporting
            | MockOp::DisableAnalogReporting => TransportError::reporting_unavailable(channel),
            MockOp::DisableAllReporting => {
                TransportError::other("injected failure: disable_all_reporting")
            }
            MockOp::DigitalWrite => TransportError::write_failed(channel, "injected failure"),
            MockOp::Shutdown => TransportError::shutdown_failed("injected failure"),
        }
    }

    /// Subscribe a channel, replacing any previous subscription for it.
    fn subscribe(
        &self,
        kind: PinKind,
        channel: u8,
        op: MockOp,
        call: TransportCall,
    ) -> Result<EventStream> {
        let mut state = self.guard(op, channel)?;
        state.calls.push(call);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        state.subscriptions.insert((kind, channel), tx);
        Ok(rx)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new().0
    }
}

impl Transport for MockTransport {
    async fn set_pin_mode_digital_input(&self, channel: u8) -> Result<EventStream> {
        self.subscribe(
            PinKind::Digital,
            channel,
            MockOp::DigitalInput,
            TransportCall::SetPinModeDigitalInput { channel },
        )
    }

    async fn set_pin_mode_digital_input_pullup(&self, channel: u8) -> Result<EventStream> {
        self.subscribe(
            PinKind::Digital,
            channel,
            MockOp::DigitalInputPullup,
            TransportCall::SetPinModeDigitalInputPullup { channel },
        )
    }

    async fn set_pin_mode_analog_input(
        &self,
        channel: u8,
        update_threshold: u16,
    ) -> Result<EventStream> {
        self.subscribe(
            PinKind::Analog,
            channel,
            MockOp::AnalogInput,
            TransportCall::SetPinModeAnalogInput {
                channel,
                update_threshold,
            },
        )
    }

    async fn set_pin_mode_digital_output(&self, channel: u8) -> Result<()> {
        let mut state = self.guard(MockOp::DigitalOutput, channel)?;
        state
            .calls
            .push(TransportCall::SetPinModeDigitalOutput { channel });
        Ok(())
    }

    async fn set_pin_mode_analog_output(&self, channel: u8) -> Result<()> {
        let mut state = self.guard(MockOp::AnalogOutput, channel)?;
        state
            .calls
            .push(TransportCall::SetPinModeAnalogOutput { channel });
        Ok(())
    }

    async fn enable_digital_reporting(&self, channel: u8) -> Result<()> {
        let mut state = self.guard(MockOp::EnableDigitalReporting, channel)?;
        state
            .calls
            .push(TransportCall::EnableDigitalReporting { channel });
        state.reporting.insert((PinKind::Digital, channel));
        Ok(())
    }

    async fn disable_digital_reporting(&self, channel: u8) -> Result<()> {
        let mut state = self.guard(MockOp::DisableDigitalReporting, channel)?;
        state
            .calls
            .push(TransportCall::DisableDigitalReporting { channel });
        state.reporting.remove(&(PinKind::Digital, channel));
        Ok(())
    }

    async fn enable_analog_reporting(&self, channel: u8) -> Result<()> {
        let mut state = self.guard(MockOp::EnableAnalogReporting, channel)?;
        state
            .calls
            .push(TransportCall::EnableAnalogReporting { channel });
        state.reporting.insert((PinKind::Analog, channel));
        Ok(())
    }

    async fn disable_analog_reporting(&self, channel: u8) -> Result<()> {
        let mut state = self.guard(MockOp::DisableAnalogReporting, channel)?;
        state
            .calls
            .push(TransportCall::DisableAnalogReporting { channel });
        state.reporting.remove(&(PinKind::Analog, channel));
        Ok(())
    }

    async fn disable_all_reporting(&self) -> Result<()> {
        let mut state = self.guard(MockOp::DisableAllReporting, 0)?;
        state.calls.push(TransportCall::DisableAllReporting);
        state.reporting.clear();
        Ok(())
    }

    async fn digital_write(&self, channel: u8, value: u16) -> Result<()> {
        let mut state = self.guard(MockOp::DigitalWrite, channel)?;
        state
            .calls
            .push(TransportCall::DigitalWrite { channel, value });
        state.written.insert(channel, value);
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            // Idempotent: repeated shutdown is a no-op
            return Ok(());
        }
        if state.failures.contains(&MockOp::Shutdown) {
            return Err(Self::injected(MockOp::Shutdown, 0));
        }
        state.calls.push(TransportCall::Shutdown);
        state.closed = true;
        // Dropping the senders ends every open event stream
        state.subscriptions.clear();
        state.reporting.clear();
        Ok(())
    }
}

/// Handle for driving and inspecting a [`MockTransport`].
///
/// The handle shares state with the transport, can be cloned freely, and
/// is callable from plain synchronous test threads: event emission uses a
/// non-blocking send.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransportHandle {
    /// Emit a digital sample stamped with the current time.
    ///
    /// Returns `true` if the event was delivered: the channel must be
    /// subscribed, have reporting enabled, and have stream capacity left.
    pub fn emit_digital(&self, channel: u8, value: u16) -> bool {
        self.emit(PinEvent::new(PinKind::Digital, channel, value))
    }

    /// Emit a digital sample with an explicit timestamp.
    pub fn emit_digital_at(&self, channel: u8, value: u16, timestamp: DateTime<Utc>) -> bool {
        self.emit(PinEvent::with_timestamp(
            PinKind::Digital,
            channel,
            value,
            timestamp,
        ))
    }

    /// Emit an analog sample stamped with the current time.
    ///
    /// Returns `true` if the event was delivered.
    pub fn emit_analog(&self, channel: u8, value: u16) -> bool {
        self.emit(PinEvent::new(PinKind::Analog, channel, value))
    }

    /// Emit an analog sample with an explicit timestamp.
    pub fn emit_analog_at(&self, channel: u8, value: u16, timestamp: DateTime<Utc>) -> bool {
        self.emit(PinEvent::with_timestamp(
            PinKind::Analog,
            channel,
            value,
            timestamp,
        ))
    }

    fn emit(&self, event: PinEvent) -> bool {
        let state = self.state.lock();
        if state.closed {
            return false;
        }
        let key = (event.kind, event.channel);
        if !state.reporting.contains(&key) {
            return false;
        }
        match state.subscriptions.get(&key) {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Snapshot of every recorded call, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Forget all recorded calls.
    ///
    /// Useful after startup so assertions only see the calls a scenario
    /// itself produced.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Last value written to an output channel, if any.
    pub fn written(&self, channel: u8) -> Option<u16> {
        self.state.lock().written.get(&channel).copied()
    }

    /// Whether reporting is currently enabled for a channel.
    pub fn is_reporting(&self, kind: PinKind, channel: u8) -> bool {
        self.state.lock().reporting.contains(&(kind, channel))
    }

    /// Whether a channel currently has a live subscription.
    pub fn has_subscriber(&self, kind: PinKind, channel: u8) -> bool {
        self.state.lock().subscriptions.contains_key(&(kind, channel))
    }

    /// Arm an operation to fail on every subsequent call.
    pub fn fail_on(&self, op: MockOp) {
        self.state.lock().failures.insert(op);
    }

    /// Disarm all injected failures.
    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Whether the transport has been shut down.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

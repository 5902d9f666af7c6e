//! Hardware transport trait definition.
//!
//! This module defines the contract between the pin-control core and the
//! firmware transport (a microcontroller speaking a serial protocol where
//! pin reads arrive as unsolicited events). The trait enables substitution
//! between the scriptable mock and real protocol clients.
//!
//! All methods are natively async (Rust 1.90 + Edition 2024 RPITIT),
//! declared as `fn ... -> impl Future + Send` so a call built on one
//! thread can be boxed and driven on another. No `async_trait` macro is
//! needed.

use crate::error::Result;
use crate::event::EventStream;
use std::future::Future;

/// Asynchronous hardware transport abstraction.
///
/// Implementors are cheap, cloneable handles onto one underlying device
/// connection: every per-pin listener task holds its own clone, so all
/// methods take `&self` and implementations synchronize internally.
///
/// Configuring an input mode subscribes the caller to that channel and
/// returns the [`EventStream`] the transport will push samples into once
/// reporting is enabled. Reconfiguring a channel replaces the previous
/// subscription, ending its stream.
///
/// Every method returns a `Send` future: the GPIO layer builds calls on
/// the caller's thread and hands them to its event loop thread to run.
/// Implementations can still be written as plain `async fn` provided the
/// resulting futures are `Send`.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because its methods return
/// opaque `impl Future` types, which cannot be used in trait objects
/// (Edition 2024 RPITIT). You cannot use `Box<dyn Transport>`.
/// Use generic type parameters instead:
///
/// ```no_run
/// use pinbridge_transport::{Result, Transport};
///
/// async fn pulse<T: Transport>(transport: &T, channel: u8) -> Result<()> {
///     transport.set_pin_mode_digital_output(channel).await?;
///     transport.digital_write(channel, 1).await?;
///     transport.digital_write(channel, 0).await?;
///     Ok(())
/// }
/// ```
pub trait Transport: Clone + Send + Sync + 'static {
    /// Configure a channel as a digital input and subscribe to its samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the channel cannot
    /// be configured.
    fn set_pin_mode_digital_input(
        &self,
        channel: u8,
    ) -> impl Future<Output = Result<EventStream>> + Send;

    /// Configure a channel as a digital input with the internal pull-up
    /// resistor enabled, and subscribe to its samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the channel cannot
    /// be configured.
    fn set_pin_mode_digital_input_pullup(
        &self,
        channel: u8,
    ) -> impl Future<Output = Result<EventStream>> + Send;

    /// Configure a channel as an analog input and subscribe to its samples.
    ///
    /// The firmware reports a new sample only when it differs from the last
    /// reported one by at least `update_threshold` ADC counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the channel cannot
    /// be configured.
    fn set_pin_mode_analog_input(
        &self,
        channel: u8,
        update_threshold: u16,
    ) -> impl Future<Output = Result<EventStream>> + Send;

    /// Configure a channel as a digital output.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the channel cannot
    /// be configured.
    fn set_pin_mode_digital_output(&self, channel: u8) -> impl Future<Output = Result<()>> + Send;

    /// Configure a channel as an analog (PWM) output.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the channel cannot
    /// be configured.
    fn set_pin_mode_analog_output(&self, channel: u8) -> impl Future<Output = Result<()>> + Send;

    /// Enable unsolicited event delivery for a digital channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or reporting cannot be
    /// toggled for the channel.
    fn enable_digital_reporting(&self, channel: u8) -> impl Future<Output = Result<()>> + Send;

    /// Disable unsolicited event delivery for a digital channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or reporting cannot be
    /// toggled for the channel.
    fn disable_digital_reporting(&self, channel: u8) -> impl Future<Output = Result<()>> + Send;

    /// Enable unsolicited event delivery for an analog channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or reporting cannot be
    /// toggled for the channel.
    fn enable_analog_reporting(&self, channel: u8) -> impl Future<Output = Result<()>> + Send;

    /// Disable unsolicited event delivery for an analog channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or reporting cannot be
    /// toggled for the channel.
    fn disable_analog_reporting(&self, channel: u8) -> impl Future<Output = Result<()>> + Send;

    /// Disable event delivery for every channel at once.
    ///
    /// Used to put the device into a known-quiet baseline at startup and
    /// during bulk cleanup.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed.
    fn disable_all_reporting(&self) -> impl Future<Output = Result<()>> + Send;

    /// Drive a digital output channel to the given level.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the write fails.
    fn digital_write(&self, channel: u8, value: u16) -> impl Future<Output = Result<()>> + Send;

    /// Shut the transport down cleanly.
    ///
    /// After shutdown every open event stream ends and all further calls
    /// fail with [`TransportError::Closed`](crate::TransportError::Closed).
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be released cleanly.
    fn shutdown(&self) -> impl Future<Output = Result<()>> + Send;
}

//! Pin state model.
//!
//! A [`Pin`] is the bridge-side record of one configured channel: its static
//! configuration (kind, direction, pull), the most recent sampled value with
//! its timestamp, the previous sample (for the derived rate of change), an
//! optional update callback, and the handle of the listener task feeding it.
//!
//! Input pins are written only by their listener task applying transport
//! events; output pins are written only by the synchronous facade. Reads are
//! safe from any thread.

use crate::supervisor::TaskHandle;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pinbridge_core::constants::{
    ANALOG_LEVEL_MAX, DEFAULT_UPDATE_THRESHOLD, DIGITAL_LEVEL_MAX, LOW,
};
use pinbridge_core::{Error, PinDirection, PinKind, PullMode, Result};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::warn;

/// Callback invoked on the listener task after each applied update.
///
/// Receives the pin itself, so the new value, timestamp, and rate of change
/// are all readable from inside the callback.
///
/// Callbacks run on the event loop thread. Facade calls that hand work to
/// the loop, such as `output` or `setup_pin`, return
/// [`Error::Unsupported`] when made from inside a callback: the loop
/// cannot service new work while it is running the callback.
pub type UpdateCallback = Arc<dyn Fn(&Pin) + Send + Sync>;

/// Sampled state: current and previous value/timestamp pairs.
#[derive(Debug, Clone, Copy, Default)]
struct SampleState {
    value: Option<u16>,
    timestamp: Option<DateTime<Utc>>,
    previous_value: Option<u16>,
    previous_timestamp: Option<DateTime<Utc>>,
}

/// Validated configuration for one pin.
///
/// Collects everything `setup` needs before any pin exists or any transport
/// call is made: semantically invalid combinations (initial value on an
/// input, pull-down resistors, pull on outputs or analog pins, out-of-range
/// initial values) are rejected by [`validate`](PinConfig::validate) up
/// front.
///
/// # Examples
///
/// ```
/// use pinbridge_core::{PinDirection, PinKind, PullMode};
/// use pinbridge_gpio::PinConfig;
///
/// let config = PinConfig::new(4, PinKind::Digital, PinDirection::In)
///     .pull(PullMode::Up);
/// assert!(config.validate().is_ok());
///
/// let config = PinConfig::new(4, PinKind::Digital, PinDirection::In)
///     .pull(PullMode::Down);
/// assert!(config.validate().is_err());
/// ```
#[derive(Clone)]
pub struct PinConfig {
    pin: u8,
    kind: PinKind,
    direction: PinDirection,
    pull: PullMode,
    initial: Option<u16>,
    update_threshold: u16,
    callback: Option<UpdateCallback>,
}

impl PinConfig {
    /// Create a configuration with default pull (off), default analog update
    /// threshold, no initial value, and no callback.
    pub fn new(pin: u8, kind: PinKind, direction: PinDirection) -> Self {
        Self {
            pin,
            kind,
            direction,
            pull: PullMode::Off,
            initial: None,
            update_threshold: DEFAULT_UPDATE_THRESHOLD,
            callback: None,
        }
    }

    /// Set the pull resistor mode.
    #[must_use]
    pub fn pull(mut self, pull: PullMode) -> Self {
        self.pull = pull;
        self
    }

    /// Set the initial locally stored value (output pins only).
    ///
    /// The initial value seeds the pin's local state; it is not written to
    /// the board.
    #[must_use]
    pub fn initial(mut self, value: u16) -> Self {
        self.initial = Some(value);
        self
    }

    /// Set the analog update threshold: the board only reports a new sample
    /// when the value differs from the last report by at least this much.
    #[must_use]
    pub fn update_threshold(mut self, threshold: u16) -> Self {
        self.update_threshold = threshold;
        self
    }

    /// Set the update callback.
    #[must_use]
    pub fn callback(mut self, callback: UpdateCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Reject semantically invalid configurations.
    ///
    /// # Errors
    ///
    /// - [`Error::InitialValueOnInput`] for an initial value on an input pin
    /// - [`Error::OutputPullUnsupported`] for any pull on an output pin
    /// - [`Error::AnalogPullUnsupported`] for any pull on an analog pin
    /// - [`Error::PullDownUnsupported`] for pull-down on a digital input
    /// - [`Error::ValueOutOfRange`] for an initial value beyond the pin's
    ///   level range
    pub fn validate(&self) -> Result<()> {
        if self.direction.is_input() && self.initial.is_some() {
            return Err(Error::InitialValueOnInput);
        }
        if self.direction.is_output() && self.pull != PullMode::Off {
            return Err(Error::OutputPullUnsupported);
        }
        if self.kind.is_analog() && self.pull != PullMode::Off {
            return Err(Error::AnalogPullUnsupported);
        }
        if self.pull == PullMode::Down {
            return Err(Error::PullDownUnsupported);
        }
        if let Some(initial) = self.initial {
            let max = match self.kind {
                PinKind::Digital => DIGITAL_LEVEL_MAX,
                PinKind::Analog => ANALOG_LEVEL_MAX,
            };
            if initial > max {
                return Err(Error::out_of_range(initial, max));
            }
        }
        Ok(())
    }

    pub(crate) fn pin_number(&self) -> u8 {
        self.pin
    }

    pub(crate) fn kind(&self) -> PinKind {
        self.kind
    }

    pub(crate) fn direction(&self) -> PinDirection {
        self.direction
    }
}

impl fmt::Debug for PinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinConfig")
            .field("pin", &self.pin)
            .field("kind", &self.kind)
            .field("direction", &self.direction)
            .field("pull", &self.pull)
            .field("initial", &self.initial)
            .field("update_threshold", &self.update_threshold)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// One configured channel and its sampled state.
///
/// Output pins start with their initial value (default low) and no
/// timestamp; input pins hold no value until the first transport event
/// arrives.
pub struct Pin {
    channel: u8,
    kind: PinKind,
    direction: PinDirection,
    pull: PullMode,
    update_threshold: u16,
    sample: Mutex<SampleState>,
    callback: Mutex<Option<UpdateCallback>>,
    listener: Mutex<Option<TaskHandle>>,
}

impl Pin {
    /// Build a pin from a validated configuration, bound to its resolved
    /// logical channel.
    pub(crate) fn from_config(channel: u8, config: &PinConfig) -> Self {
        let mut sample = SampleState::default();
        if config.direction.is_output() {
            sample.value = Some(config.initial.unwrap_or(LOW));
        }
        Self {
            channel,
            kind: config.kind,
            direction: config.direction,
            pull: config.pull,
            update_threshold: config.update_threshold,
            sample: Mutex::new(sample),
            callback: Mutex::new(config.callback.clone()),
            listener: Mutex::new(None),
        }
    }

    /// Logical channel number on the transport.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Digital or analog.
    pub fn kind(&self) -> PinKind {
        self.kind
    }

    /// Input or output.
    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    /// Configured pull resistor mode.
    pub fn pull(&self) -> PullMode {
        self.pull
    }

    /// Analog update threshold passed to the transport at configuration.
    pub fn update_threshold(&self) -> u16 {
        self.update_threshold
    }

    /// Most recent value, if any sample has been stored yet.
    pub fn value(&self) -> Option<u16> {
        self.sample.lock().value
    }

    /// Timestamp of the most recent value.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.sample.lock().timestamp
    }

    /// Value before the most recent one.
    pub fn previous_value(&self) -> Option<u16> {
        self.sample.lock().previous_value
    }

    /// Timestamp of the previous value.
    pub fn previous_timestamp(&self) -> Option<DateTime<Utc>> {
        self.sample.lock().previous_timestamp
    }

    /// Rate of change between the two most recent samples, in levels per
    /// second.
    ///
    /// Returns `0.0` until two samples exist, and also when the timestamps
    /// are not strictly increasing.
    #[must_use]
    pub fn rate_of_change(&self) -> f64 {
        let sample = self.sample.lock();
        let (Some(value), Some(timestamp), Some(previous_value), Some(previous_timestamp)) = (
            sample.value,
            sample.timestamp,
            sample.previous_value,
            sample.previous_timestamp,
        ) else {
            return 0.0;
        };
        if timestamp <= previous_timestamp {
            return 0.0;
        }
        let delta = timestamp - previous_timestamp;
        let seconds = match delta.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => delta.num_milliseconds() as f64 / 1_000.0,
        };
        (f64::from(value) - f64::from(previous_value)) / seconds
    }

    /// Replace the update callback. `None` removes it.
    pub fn set_callback(&self, callback: Option<UpdateCallback>) {
        *self.callback.lock() = callback;
    }

    /// Apply a sample reported by the transport: shift the current sample
    /// into the previous slot, store the new one, and invoke the callback.
    ///
    /// Called from the listener task only.
    pub(crate) fn apply_update(&self, value: u16, timestamp: DateTime<Utc>) {
        {
            let mut sample = self.sample.lock();
            sample.previous_value = sample.value;
            sample.previous_timestamp = sample.timestamp;
            sample.value = Some(value);
            sample.timestamp = Some(timestamp);
        }
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            // A panicking callback must not take down the listener task
            if catch_unwind(AssertUnwindSafe(|| callback(self))).is_err() {
                warn!(channel = self.channel, "pin update callback panicked");
            }
        }
    }

    /// Store a value written through the synchronous output path, stamped
    /// with the current wall-clock time. Does not invoke the callback.
    pub(crate) fn store_output(&self, value: u16) {
        let mut sample = self.sample.lock();
        sample.previous_value = sample.value;
        sample.previous_timestamp = sample.timestamp;
        sample.value = Some(value);
        sample.timestamp = Some(Utc::now());
    }

    /// Attach the handle of the listener task feeding this pin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListenerOnOutput`] for output pins, which have no
    /// listener.
    pub(crate) fn set_listener(&self, handle: TaskHandle) -> Result<()> {
        if self.direction.is_output() {
            return Err(Error::ListenerOnOutput {
                channel: self.channel,
            });
        }
        *self.listener.lock() = Some(handle);
        Ok(())
    }

    /// Request cancellation of the listener task. Idempotent; a no-op when
    /// no listener is attached.
    pub(crate) fn cancel_listener(&self) {
        if let Some(handle) = self.listener.lock().as_ref() {
            handle.cancel();
        }
    }

    /// Whether a listener task has been attached.
    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// `true` when the pin has no listener task or its task has finished.
    pub fn listener_finished(&self) -> bool {
        match self.listener.lock().as_ref() {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("channel", &self.channel)
            .field("kind", &self.kind)
            .field("direction", &self.direction)
            .field("pull", &self.pull)
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(
                f,
                "pin {} ({} {}, value {value})",
                self.channel, self.kind, self.direction
            ),
            None => write!(
                f,
                "pin {} ({} {}, value unset)",
                self.channel, self.kind, self.direction
            ),
        }
    }
}

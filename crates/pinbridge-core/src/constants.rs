//! Core constants for pin levels, value ranges, and lifecycle timing.
//!
//! These values mirror the conventions of classic single-board-computer GPIO
//! libraries (digital levels 0/1, 8-bit PWM writes) and the firmware
//! transports they are bridged to (10-bit ADC reads, per-channel update
//! thresholds).
//!
//! # Usage
//!
//! ```
//! use pinbridge_core::constants::{HIGH, LOW, ANALOG_LEVEL_MAX};
//!
//! assert_eq!(HIGH, 1);
//! assert_eq!(LOW, 0);
//!
//! fn is_valid_pwm(value: u16) -> bool {
//!     value <= ANALOG_LEVEL_MAX
//! }
//! assert!(is_valid_pwm(255));
//! assert!(!is_valid_pwm(256));
//! ```

// ============================================================================
// Signal Levels
// ============================================================================

/// Logical low level for digital pins (0V).
pub const LOW: u16 = 0;

/// Logical high level for digital pins (VCC).
pub const HIGH: u16 = 1;

/// Maximum accepted value for a digital write.
///
/// Digital outputs accept exactly `{0, 1}`; anything else is rejected
/// before the value is stored or transmitted.
pub const DIGITAL_LEVEL_MAX: u16 = 1;

/// Maximum accepted value for an analog (PWM) write.
///
/// PWM duty values are 8-bit, matching `analogWrite` semantics on AVR
/// firmware.
///
/// # Examples
///
/// ```
/// use pinbridge_core::constants::ANALOG_LEVEL_MAX;
///
/// assert_eq!(ANALOG_LEVEL_MAX, 255);
/// ```
pub const ANALOG_LEVEL_MAX: u16 = 255;

// ============================================================================
// Analog Input Filtering
// ============================================================================

/// Default update threshold for analog input reporting.
///
/// The firmware only reports a new analog sample when it differs from the
/// previously reported one by at least this much, filtering ADC noise.
/// Pins can override it at setup time.
///
/// # Value: 5 ADC counts
pub const DEFAULT_UPDATE_THRESHOLD: u16 = 5;

// ============================================================================
// Event Loop Lifecycle
// ============================================================================

/// Interval between checks while waiting for the event loop to stop
/// (milliseconds).
///
/// Shutdown polls the loop thread at this granularity instead of blocking
/// indefinitely.
///
/// # Value: 100ms
pub const SHUTDOWN_POLL_INTERVAL_MS: u64 = 100;

/// Upper bound on the wait for the event loop to stop (milliseconds).
///
/// If the loop thread has not terminated within this window, shutdown
/// stops polling and reports the failure instead of hanging the caller.
///
/// # Value: 5000ms (5 seconds)
///
/// # Examples
///
/// ```
/// use pinbridge_core::constants::{SHUTDOWN_POLL_INTERVAL_MS, SHUTDOWN_TIMEOUT_MS};
///
/// let max_polls = SHUTDOWN_TIMEOUT_MS / SHUTDOWN_POLL_INTERVAL_MS;
/// assert_eq!(max_polls, 50);
/// ```
pub const SHUTDOWN_TIMEOUT_MS: u64 = 5000;

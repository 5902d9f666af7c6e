//! Pin update events delivered by the transport.
//!
//! Every input sample arrives as an unsolicited [`PinEvent`] on a bounded
//! per-channel stream. The transport's internal reader demultiplexes raw
//! firmware messages into these streams; consumers never poll the wire.

use chrono::{DateTime, Utc};
use pinbridge_core::PinKind;
use tokio::sync::mpsc;

/// Capacity of a per-channel event stream.
///
/// Bursts beyond this are dropped by the producer rather than blocking the
/// transport reader; input pins only care about the latest level.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Stream of update events for one subscribed channel.
pub type EventStream = mpsc::Receiver<PinEvent>;

/// One timestamped sample reported by the hardware for a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEvent {
    /// Signal family the sample belongs to.
    pub kind: PinKind,

    /// Logical channel the sample was read from.
    pub channel: u8,

    /// Sampled level (0/1 for digital, raw ADC counts for analog).
    pub value: u16,

    /// Wall-clock time the sample was reported.
    pub timestamp: DateTime<Utc>,
}

impl PinEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(kind: PinKind, channel: u8, value: u16) -> Self {
        Self {
            kind,
            channel,
            value,
            timestamp: Utc::now(),
        }
    }

    /// Create an event with an explicit timestamp.
    ///
    /// Useful for tests and for replaying recorded samples.
    #[must_use]
    pub fn with_timestamp(
        kind: PinKind,
        channel: u8,
        value: u16,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            channel,
            value,
            timestamp,
        }
    }
}

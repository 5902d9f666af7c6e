use crate::types::{PinDirection, PinKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Pin numbering mode not set: select board or logical numbering before setup")]
    ModeNotSet,

    #[error("Pull-down resistors are not supported")]
    PullDownUnsupported,

    #[error("Pull resistors are not supported for output pins")]
    OutputPullUnsupported,

    #[error("Pull resistors are not supported for analog pins")]
    AnalogPullUnsupported,

    #[error("Cannot set an initial value for an input pin")]
    InitialValueOnInput,

    #[error("Cannot attach a listener to output channel {channel}")]
    ListenerOnOutput { channel: u8 },

    // Capability errors
    #[error("Channel {channel} is not a valid {kind} {direction} pin")]
    InvalidPin {
        channel: u8,
        kind: PinKind,
        direction: PinDirection,
    },

    #[error("Board pin {pin} has no logical channel mapping")]
    UnmappedBoardPin { pin: u8 },

    // State errors
    #[error("Channel {channel} is already in use")]
    ChannelInUse { channel: u8 },

    #[error("Channel {channel} is not active")]
    ChannelNotActive { channel: u8 },

    #[error("Channel {channel} is not configured as {expected}")]
    WrongDirection {
        channel: u8,
        expected: PinDirection,
    },

    // Value errors
    #[error("Value {value} is out of range: must be 0-{max}")]
    ValueOutOfRange { value: u16, max: u16 },

    // Unsupported legacy operations
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    // Event loop errors
    #[error("Event loop is not running")]
    LoopNotRunning,

    #[error("Event loop startup failed: {message}")]
    Startup { message: String },

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Create a new invalid-pin capability error.
    pub fn invalid_pin(channel: u8, kind: PinKind, direction: PinDirection) -> Self {
        Self::InvalidPin {
            channel,
            kind,
            direction,
        }
    }

    /// Create a new unmapped board pin error.
    pub fn unmapped(pin: u8) -> Self {
        Self::UnmappedBoardPin { pin }
    }

    /// Create a new channel-in-use error.
    pub fn in_use(channel: u8) -> Self {
        Self::ChannelInUse { channel }
    }

    /// Create a new channel-not-active error.
    pub fn not_active(channel: u8) -> Self {
        Self::ChannelNotActive { channel }
    }

    /// Create a new wrong-direction error.
    pub fn wrong_direction(channel: u8, expected: PinDirection) -> Self {
        Self::WrongDirection { channel, expected }
    }

    /// Create a new value-out-of-range error.
    pub fn out_of_range(value: u16, max: u16) -> Self {
        Self::ValueOutOfRange { value, max }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new startup failure error.
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }

    /// Create a new transport error from any displayable source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_active_display() {
        let error = Error::not_active(17);
        assert!(matches!(error, Error::ChannelNotActive { .. }));
        assert_eq!(error.to_string(), "Channel 17 is not active");
    }

    #[test]
    fn test_wrong_direction_display() {
        let error = Error::wrong_direction(4, PinDirection::In);
        assert_eq!(error.to_string(), "Channel 4 is not configured as input");
    }

    #[test]
    fn test_out_of_range_display() {
        let error = Error::out_of_range(300, 255);
        assert_eq!(error.to_string(), "Value 300 is out of range: must be 0-255");
    }

    #[test]
    fn test_invalid_pin_display() {
        let error = Error::invalid_pin(7, PinKind::Analog, PinDirection::In);
        assert_eq!(
            error.to_string(),
            "Channel 7 is not a valid analog input pin"
        );
    }

    #[test]
    fn test_unsupported_display() {
        let error = Error::unsupported("wait_for_edge");
        assert_eq!(error.to_string(), "Unsupported operation: wait_for_edge");
    }
}

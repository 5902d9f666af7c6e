//! Error types for transport operations.
//!
//! This module defines the failure modes of the asynchronous hardware
//! transport: connection establishment, per-channel configuration, event
//! reporting, writes, and shutdown.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while talking to the hardware transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport could not be constructed or connected.
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The transport has been shut down and accepts no further calls.
    #[error("Transport is closed")]
    Closed,

    /// Configuring a pin mode on a channel failed.
    #[error("Configuration failed for channel {channel}: {message}")]
    ConfigurationFailed { channel: u8, message: String },

    /// Event reporting could not be toggled for a channel.
    #[error("Reporting is not available for channel {channel}")]
    ReportingUnavailable { channel: u8 },

    /// A value write to a channel failed.
    #[error("Write failed for channel {channel}: {message}")]
    WriteFailed { channel: u8, message: String },

    /// Graceful shutdown of the transport failed.
    #[error("Shutdown failed: {message}")]
    ShutdownFailed { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new connection failure error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Create a new configuration failure error.
    pub fn configuration_failed(channel: u8, message: impl Into<String>) -> Self {
        Self::ConfigurationFailed {
            channel,
            message: message.into(),
        }
    }

    /// Create a new reporting-unavailable error.
    pub fn reporting_unavailable(channel: u8) -> Self {
        Self::ReportingUnavailable { channel }
    }

    /// Create a new write failure error.
    pub fn write_failed(channel: u8, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            channel,
            message: message.into(),
        }
    }

    /// Create a new shutdown failure error.
    pub fn shutdown_failed(message: impl Into<String>) -> Self {
        Self::ShutdownFailed {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<TransportError> for pinbridge_core::Error {
    fn from(err: TransportError) -> Self {
        pinbridge_core::Error::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_display() {
        let error = TransportError::connection_failed("serial port busy");
        assert!(matches!(error, TransportError::ConnectionFailed { .. }));
        assert_eq!(error.to_string(), "Connection failed: serial port busy");
    }

    #[test]
    fn test_write_failed_display() {
        let error = TransportError::write_failed(13, "device gone");
        assert_eq!(error.to_string(), "Write failed for channel 13: device gone");
    }

    #[test]
    fn test_reporting_unavailable_display() {
        let error = TransportError::reporting_unavailable(5);
        assert_eq!(
            error.to_string(),
            "Reporting is not available for channel 5"
        );
    }

    #[test]
    fn test_conversion_to_core_error() {
        let error = TransportError::Closed;
        let core: pinbridge_core::Error = error.into();
        assert!(matches!(core, pinbridge_core::Error::Transport(_)));
        assert_eq!(core.to_string(), "Transport error: Transport is closed");
    }
}

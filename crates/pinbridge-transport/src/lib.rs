//! Asynchronous board transport layer for the pinbridge system.
//!
//! This crate defines the message-driven interface between the GPIO layer
//! and a board running a pin-control firmware: pin mode configuration,
//! reporting control, digital writes, and the event streams that carry
//! samples reported by the board.
//!
//! # Architecture
//!
//! - [`traits`] - The [`Transport`] trait implemented by concrete transports
//! - [`event`] - Pin events and the stream type that delivers them
//! - [`error`] - Transport error types
//! - [`mock`] - Scriptable mock transport for testing and development
//!
//! Concrete serial and TCP transports are planned behind the
//! `transport-serial` and `transport-tcp` features.

pub mod error;
pub mod event;
pub mod mock;
pub mod traits;

// Re-export main types
pub use error::{Result, TransportError};
pub use event::{EVENT_CHANNEL_CAPACITY, EventStream, PinEvent};
pub use mock::{MockOp, MockTransport, MockTransportHandle, TransportCall};
pub use traits::Transport;

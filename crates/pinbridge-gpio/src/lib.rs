//! Synchronous GPIO facade over an asynchronous board transport.
//!
//! This crate bridges two programming models: the blocking, call-and-return
//! pin API familiar from single-board-computer GPIO libraries, and the
//! message-driven transports that remote boards actually speak. Callers
//! write ordinary sequential code; a dedicated event loop thread owns the
//! transport and keeps pin state fresh in the background.
//!
//! # Architecture
//!
//! - [`GpioController`] is the facade. It validates every call against a
//!   [`BoardScheme`] capability table and the active-pin registry before
//!   anything reaches the wire.
//! - [`EventLoopSupervisor`] owns the loop thread. It runs a
//!   current-thread Tokio runtime, accepts futures over a channel, and
//!   supervises them in a [`tokio::task::JoinSet`].
//! - Each input pin gets a listener task that configures the channel,
//!   enables reporting, and applies every reported sample to the shared
//!   [`Pin`]. Output writes are stored locally and submitted to the loop
//!   without waiting for confirmation.
//! - [`Pin`] keeps the current and previous sample with timestamps, so
//!   [`Pin::rate_of_change`] works without further transport traffic.
//!
//! # Threading
//!
//! The facade is `Sync`: `setup`, `input`, `output`, and `cleanup` may be
//! called from any thread. Handing work to the loop blocks briefly, so
//! calls that reach the loop (`setup`, `output`) are rejected with an
//! error when made from inside an async runtime, including from an
//! update callback.
//!
//! # Examples
//!
//! ```no_run
//! use pinbridge_core::constants::HIGH;
//! use pinbridge_core::{BoardScheme, NumberingMode, PinDirection};
//! use pinbridge_gpio::GpioController;
//! use pinbridge_transport::{MockTransport, TransportError};
//!
//! fn main() -> pinbridge_core::Result<()> {
//!     let controller = GpioController::new(BoardScheme::arduino_uno());
//!     let (transport, _handle) = MockTransport::new();
//!     controller.start(move || async move { Ok::<_, TransportError>(transport) })?;
//!
//!     controller.set_mode(NumberingMode::Logical);
//!     controller.setup(2, PinDirection::In)?;
//!     controller.setup(13, PinDirection::Out)?;
//!
//!     controller.output(13, HIGH)?;
//!     let button = controller.input(2)?;
//!     println!("button: {button:?}");
//!
//!     controller.cleanup_all()?;
//!     controller.shutdown()
//! }
//! ```

pub mod controller;
pub mod listener;
pub mod pin;
pub mod registry;
pub mod supervisor;

// Re-export commonly used types for convenience
pub use controller::GpioController;
pub use pin::{Pin, PinConfig, UpdateCallback};
pub use registry::PinRegistry;
pub use supervisor::{EventLoopSupervisor, TaskFuture, TaskHandle};

// Re-export the vocabulary crates so applications need only one import
pub use pinbridge_core::{
    BoardScheme, Edge, Error, NumberingMode, PinDirection, PinKind, PullMode, Result, constants,
};
pub use pinbridge_transport::Transport;

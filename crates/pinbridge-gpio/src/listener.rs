//! Pin listener task.
//!
//! One listener runs on the event loop per input pin. It configures the
//! channel on the transport, enables reporting, then parks on the event
//! stream and applies every reported sample to the pin. Cancellation (from
//! cleanup or shutdown) interrupts the `recv` await; that is the task's
//! normal end of life and not an error.

use crate::pin::Pin;
use pinbridge_core::{PinKind, PullMode};
use pinbridge_transport::{Result, Transport};
use std::sync::Arc;
use tracing::{debug, trace};

/// Configure an input channel and feed its events into the pin until the
/// stream ends or the task is cancelled.
pub(crate) async fn run_pin_listener<T: Transport>(pin: Arc<Pin>, transport: T) -> Result<()> {
    let channel = pin.channel();
    let mut events = match (pin.kind(), pin.pull()) {
        (PinKind::Digital, PullMode::Up) => {
            transport.set_pin_mode_digital_input_pullup(channel).await?
        }
        (PinKind::Digital, _) => transport.set_pin_mode_digital_input(channel).await?,
        (PinKind::Analog, _) => {
            transport
                .set_pin_mode_analog_input(channel, pin.update_threshold())
                .await?
        }
    };
    match pin.kind() {
        PinKind::Digital => transport.enable_digital_reporting(channel).await?,
        PinKind::Analog => transport.enable_analog_reporting(channel).await?,
    }
    debug!(channel, kind = %pin.kind(), "pin listener started");

    while let Some(event) = events.recv().await {
        trace!(channel, value = event.value, "pin update received");
        pin.apply_update(event.value, event.timestamp);
    }

    debug!(channel, "pin event stream ended");
    Ok(())
}

//! Blink: the classic sequential GPIO loop, bridged to a mock board.
//!
//! Configure an output and an input, then blink while polling, exactly the
//! shape of script this API exists for. The mock transport stands in for a
//! connected board, and its handle plays the hardware side by reporting
//! button samples.
//!
//! Run with `RUST_LOG=debug` to watch the event loop work.

use std::thread;
use std::time::Duration;

use pinbridge_gpio::constants::{HIGH, LOW};
use pinbridge_gpio::{BoardScheme, GpioController, NumberingMode, PinDirection, Result};
use pinbridge_transport::{MockTransport, TransportError};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, board) = MockTransport::new();
    let controller = GpioController::new(BoardScheme::arduino_uno());
    controller.start(move || async move { Ok::<_, TransportError>(transport) })?;

    controller.set_mode(NumberingMode::Logical);
    controller.setup(13, PinDirection::Out)?;
    controller.setup(2, PinDirection::In)?;

    // Give the input listener a moment to enable reporting
    thread::sleep(Duration::from_millis(50));

    for cycle in 0..2 {
        let level = if cycle % 2 == 0 { HIGH } else { LOW };
        board.emit_digital(2, level);
        thread::sleep(Duration::from_millis(50));
        println!("button: {:?}", controller.input(2)?);

        controller.output(13, HIGH)?;
        println!("ON");
        thread::sleep(Duration::from_millis(500));

        controller.output(13, LOW)?;
        println!("OFF");
        thread::sleep(Duration::from_millis(500));
    }

    controller.cleanup_all()?;
    controller.shutdown()?;
    println!("DONE");
    Ok(())
}

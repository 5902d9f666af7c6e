//! Integration tests for `GpioController` over the mock transport.
//!
//! These tests drive the synchronous facade from ordinary threads, the way
//! applications use it, and observe the event loop side through the mock
//! transport handle. Reported samples are injected with explicit
//! timestamps so derived values stay deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use pinbridge_core::constants::{HIGH, LOW};
use pinbridge_core::{BoardScheme, Error, NumberingMode, PinDirection, PinKind, PullMode};
use pinbridge_gpio::{GpioController, PinConfig};
use pinbridge_transport::{
    MockOp, MockTransport, MockTransportHandle, TransportCall, TransportError,
};

const WAIT: Duration = Duration::from_secs(2);

/// Start a controller in logical numbering mode with a fresh mock board.
///
/// The call log is cleared after startup so tests observe only their own
/// traffic, not the reporting reset the loop performs while connecting.
fn started() -> (GpioController<MockTransport>, MockTransportHandle) {
    let (transport, handle) = MockTransport::new();
    let controller = GpioController::new(BoardScheme::arduino_uno());
    controller
        .start(move || async move { Ok::<_, TransportError>(transport) })
        .unwrap();
    controller.set_mode(NumberingMode::Logical);
    handle.clear_calls();
    (controller, handle)
}

/// Poll until the condition holds or the timeout expires.
fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        assert!(
            Instant::now() < deadline,
            "condition not met within {timeout:?}"
        );
        thread::sleep(Duration::from_millis(5));
    }
}

fn sample_time(seconds: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, seconds).unwrap()
}

#[test]
fn test_digital_output_write_reaches_board() {
    let (controller, handle) = started();

    controller.setup(13, PinDirection::Out).unwrap();
    wait_until(WAIT, || {
        handle
            .calls()
            .contains(&TransportCall::SetPinModeDigitalOutput { channel: 13 })
    });

    controller.output(13, HIGH).unwrap();

    // The stored value is visible immediately, the wire write shortly after
    assert_eq!(controller.pin(13).unwrap().value(), Some(HIGH));
    wait_until(WAIT, || handle.written(13) == Some(HIGH));

    controller.output(13, LOW).unwrap();
    wait_until(WAIT, || handle.written(13) == Some(LOW));

    controller.shutdown().unwrap();
}

#[test]
fn test_unconfigured_channel_is_rejected() {
    let (controller, _handle) = started();

    assert!(matches!(
        controller.input(7),
        Err(Error::ChannelNotActive { channel: 7 })
    ));
    assert!(matches!(
        controller.output(7, HIGH),
        Err(Error::ChannelNotActive { channel: 7 })
    ));

    controller.shutdown().unwrap();
}

#[test]
fn test_duplicate_setup_is_rejected() {
    let (controller, _handle) = started();

    controller.setup(13, PinDirection::Out).unwrap();
    assert!(matches!(
        controller.setup(13, PinDirection::Out),
        Err(Error::ChannelInUse { channel: 13 })
    ));
    // Direction does not matter: the channel is taken
    assert!(matches!(
        controller.setup(13, PinDirection::In),
        Err(Error::ChannelInUse { channel: 13 })
    ));
    assert_eq!(controller.channels(), vec![13]);

    controller.shutdown().unwrap();
}

#[test]
fn test_out_of_range_write_leaves_value_unchanged() {
    let (controller, handle) = started();

    controller.setup(13, PinDirection::Out).unwrap();
    controller.output(13, HIGH).unwrap();
    wait_until(WAIT, || handle.written(13) == Some(HIGH));

    let result = controller.output(13, 2);
    assert!(matches!(
        result,
        Err(Error::ValueOutOfRange { value: 2, max: 1 })
    ));

    // Neither the local value nor the board saw the rejected write
    assert_eq!(controller.pin(13).unwrap().value(), Some(HIGH));
    assert_eq!(handle.written(13), Some(HIGH));

    controller.shutdown().unwrap();
}

#[test]
fn test_analog_output_accepts_config_but_not_writes() {
    let (controller, handle) = started();

    controller
        .setup_pin(PinConfig::new(9, PinKind::Analog, PinDirection::Out))
        .unwrap();
    wait_until(WAIT, || {
        handle
            .calls()
            .contains(&TransportCall::SetPinModeAnalogOutput { channel: 9 })
    });

    // Range is checked against the analog maximum first
    assert!(matches!(
        controller.output(9, 300),
        Err(Error::ValueOutOfRange { value: 300, max: 255 })
    ));
    // In-range writes still fail: this path does not drive PWM
    assert!(matches!(
        controller.output(9, 128),
        Err(Error::Unsupported { .. })
    ));
    assert_eq!(handle.written(9), None);

    controller.shutdown().unwrap();
}

#[test]
fn test_digital_input_reports_samples() {
    let (controller, handle) = started();

    controller.setup(2, PinDirection::In).unwrap();
    wait_until(WAIT, || {
        handle
            .calls()
            .contains(&TransportCall::EnableDigitalReporting { channel: 2 })
    });
    assert!(handle.is_reporting(PinKind::Digital, 2));

    // No sample has arrived yet
    assert_eq!(controller.input(2).unwrap(), None);

    assert!(handle.emit_digital(2, HIGH));
    wait_until(WAIT, || controller.input(2).unwrap() == Some(HIGH));

    assert!(handle.emit_digital(2, LOW));
    wait_until(WAIT, || controller.input(2).unwrap() == Some(LOW));

    controller.shutdown().unwrap();
}

#[test]
fn test_pull_up_input_uses_pullup_mode() {
    let (controller, handle) = started();

    controller
        .setup_with_pull(4, PinDirection::In, PullMode::Up)
        .unwrap();
    wait_until(WAIT, || {
        handle
            .calls()
            .contains(&TransportCall::SetPinModeDigitalInputPullup { channel: 4 })
    });
    assert!(handle.is_reporting(PinKind::Digital, 4));

    controller.shutdown().unwrap();
}

#[test]
fn test_pull_down_fails_before_any_transport_call() {
    let (controller, handle) = started();

    assert!(matches!(
        controller.setup_with_pull(2, PinDirection::In, PullMode::Down),
        Err(Error::PullDownUnsupported)
    ));
    assert_eq!(handle.call_count(), 0);
    assert!(controller.channels().is_empty());

    controller.shutdown().unwrap();
}

#[test]
fn test_analog_input_threshold_and_samples() {
    let (controller, handle) = started();

    controller
        .setup_pin(PinConfig::new(1, PinKind::Analog, PinDirection::In).update_threshold(10))
        .unwrap();
    wait_until(WAIT, || {
        handle.calls().contains(&TransportCall::SetPinModeAnalogInput {
            channel: 1,
            update_threshold: 10,
        })
    });
    assert!(handle.is_reporting(PinKind::Analog, 1));

    assert!(handle.emit_analog(1, 512));
    wait_until(WAIT, || controller.input(1).unwrap() == Some(512));

    controller.shutdown().unwrap();
}

#[test]
fn test_rate_of_change_from_timestamped_samples() {
    let (controller, handle) = started();

    controller
        .setup_pin(PinConfig::new(1, PinKind::Analog, PinDirection::In))
        .unwrap();
    wait_until(WAIT, || handle.is_reporting(PinKind::Analog, 1));

    assert!(handle.emit_analog_at(1, 100, sample_time(1)));
    wait_until(WAIT, || controller.input(1).unwrap() == Some(100));
    assert!(handle.emit_analog_at(1, 160, sample_time(3)));
    wait_until(WAIT, || controller.input(1).unwrap() == Some(160));

    // 60 counts over two seconds
    let pin = controller.pin(1).unwrap();
    assert!((pin.rate_of_change() - 30.0).abs() < 1e-9);

    controller.shutdown().unwrap();
}

#[test]
fn test_update_callback_fires_per_sample() {
    let (controller, handle) = started();

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    controller
        .setup_pin(
            PinConfig::new(2, PinKind::Digital, PinDirection::In)
                .callback(Arc::new(move |pin| sink.lock().push(pin.value()))),
        )
        .unwrap();
    wait_until(WAIT, || handle.is_reporting(PinKind::Digital, 2));

    assert!(handle.emit_digital(2, HIGH));
    wait_until(WAIT, || seen.lock().len() == 1);
    assert!(handle.emit_digital(2, LOW));
    wait_until(WAIT, || seen.lock().len() == 2);

    // The callback observes the freshly stored value each time
    assert_eq!(*seen.lock(), vec![Some(HIGH), Some(LOW)]);

    controller.shutdown().unwrap();
}

#[test]
fn test_panicking_callback_does_not_kill_listener() {
    let (controller, handle) = started();

    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invocations);
    controller
        .setup_pin(
            PinConfig::new(2, PinKind::Digital, PinDirection::In).callback(Arc::new(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first sample rejected");
                }
            })),
        )
        .unwrap();
    wait_until(WAIT, || handle.is_reporting(PinKind::Digital, 2));

    assert!(handle.emit_digital(2, HIGH));
    wait_until(WAIT, || invocations.load(Ordering::SeqCst) == 1);

    // The panic was contained: the next sample is stored and reported
    assert!(handle.emit_digital(2, LOW));
    wait_until(WAIT, || invocations.load(Ordering::SeqCst) == 2);
    assert_eq!(controller.input(2).unwrap(), Some(LOW));
    assert!(!controller.pin(2).unwrap().listener_finished());

    controller.shutdown().unwrap();
}

#[test]
fn test_callback_reentry_is_rejected_without_panicking() {
    let (controller, handle) = started();
    let controller = Arc::new(controller);

    controller.setup(13, PinDirection::Out).unwrap();

    let failures = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    let facade = Arc::clone(&controller);
    controller
        .setup_pin(
            PinConfig::new(2, PinKind::Digital, PinDirection::In).callback(Arc::new(move |_| {
                if let Err(error) = facade.output(13, HIGH) {
                    sink.lock().push(error);
                }
            })),
        )
        .unwrap();
    wait_until(WAIT, || handle.is_reporting(PinKind::Digital, 2));
    handle.clear_calls();

    // Each sample makes the callback call back into the facade; the write
    // is refused with an error instead of killing the callback
    assert!(handle.emit_digital(2, HIGH));
    wait_until(WAIT, || !failures.lock().is_empty());
    assert!(matches!(failures.lock()[0], Error::Unsupported { .. }));

    let wrote = handle
        .calls()
        .iter()
        .any(|call| matches!(call, TransportCall::DigitalWrite { .. }));
    assert!(!wrote);

    // The listener survived and keeps applying samples
    assert!(handle.emit_digital(2, LOW));
    wait_until(WAIT, || controller.input(2).unwrap() == Some(LOW));
    assert!(!controller.pin(2).unwrap().listener_finished());

    controller.shutdown().unwrap();
}

#[test]
fn test_wrong_direction_reads_and_writes() {
    let (controller, _handle) = started();

    controller.setup(2, PinDirection::In).unwrap();
    controller.setup(13, PinDirection::Out).unwrap();

    assert!(matches!(
        controller.output(2, HIGH),
        Err(Error::WrongDirection {
            channel: 2,
            expected: PinDirection::Out,
        })
    ));
    assert!(matches!(
        controller.input(13),
        Err(Error::WrongDirection {
            channel: 13,
            expected: PinDirection::In,
        })
    ));

    controller.shutdown().unwrap();
}

#[test]
fn test_cleanup_disables_reporting_and_frees_channel() {
    let (controller, handle) = started();

    controller.setup(2, PinDirection::In).unwrap();
    wait_until(WAIT, || handle.is_reporting(PinKind::Digital, 2));
    let pin = controller.pin(2).unwrap();

    controller.cleanup(2).unwrap();
    wait_until(WAIT, || {
        handle
            .calls()
            .contains(&TransportCall::DisableDigitalReporting { channel: 2 })
    });
    wait_until(WAIT, || pin.listener_finished());

    assert!(controller.channels().is_empty());
    assert!(matches!(
        controller.input(2),
        Err(Error::ChannelNotActive { channel: 2 })
    ));

    // The channel can be configured again from scratch
    controller.setup(2, PinDirection::Out).unwrap();
    assert_eq!(controller.channels(), vec![2]);

    controller.shutdown().unwrap();
}

#[test]
fn test_cleanup_all_cancels_every_listener() {
    let (controller, handle) = started();

    controller.setup(2, PinDirection::In).unwrap();
    controller.setup(13, PinDirection::Out).unwrap();
    controller
        .setup_pin(PinConfig::new(1, PinKind::Analog, PinDirection::In))
        .unwrap();
    wait_until(WAIT, || {
        handle.is_reporting(PinKind::Digital, 2) && handle.is_reporting(PinKind::Analog, 1)
    });

    let digital = controller.pin(2).unwrap();
    let analog = controller.pin(1).unwrap();

    controller.cleanup_all().unwrap();
    wait_until(WAIT, || {
        handle.calls().contains(&TransportCall::DisableAllReporting)
    });
    wait_until(WAIT, || {
        digital.listener_finished() && analog.listener_finished()
    });
    assert!(controller.channels().is_empty());

    controller.shutdown().unwrap();
}

#[test]
fn test_board_numbering_translates_header_positions() {
    let (controller, handle) = started();
    controller.set_mode(NumberingMode::Board);

    // Physical header position 11 is logical channel 17
    controller.setup(11, PinDirection::In).unwrap();
    wait_until(WAIT, || {
        handle
            .calls()
            .contains(&TransportCall::SetPinModeDigitalInput { channel: 17 })
    });
    assert_eq!(controller.channels(), vec![17]);

    assert!(handle.emit_digital(17, HIGH));
    wait_until(WAIT, || controller.input(11).unwrap() == Some(HIGH));

    // Power and ground positions have no channel behind them
    assert!(matches!(
        controller.setup(6, PinDirection::In),
        Err(Error::UnmappedBoardPin { pin: 6 })
    ));

    controller.shutdown().unwrap();
}

#[test]
fn test_listener_failure_leaves_pin_registered() {
    let (controller, handle) = started();

    handle.fail_on(MockOp::DigitalInput);
    controller.setup(2, PinDirection::In).unwrap();

    // The listener dies during configuration; the pin entry survives
    let pin = controller.pin(2).unwrap();
    wait_until(WAIT, || pin.listener_finished());
    assert_eq!(controller.input(2).unwrap(), None);
    assert_eq!(controller.channels(), vec![2]);

    controller.shutdown().unwrap();
}

#[test]
fn test_start_surfaces_connection_failure() {
    let controller: GpioController<MockTransport> =
        GpioController::new(BoardScheme::arduino_uno());

    let result = controller.start(|| async {
        Err(TransportError::connection_failed("no board on /dev/ttyUSB0"))
    });
    assert!(matches!(result, Err(Error::Startup { .. })));
    assert!(!controller.is_running());

    // The failure is sticky rather than silently retried
    let retry = controller.start(|| async {
        let (transport, _handle) = MockTransport::new();
        Ok::<_, TransportError>(transport)
    });
    assert!(matches!(retry, Err(Error::Startup { .. })));
}

#[test]
fn test_panicking_connector_surfaces_startup_error() {
    let controller: GpioController<MockTransport> =
        GpioController::new(BoardScheme::arduino_uno());

    let error = controller
        .start(|| async { panic!("firmware handshake failed") })
        .unwrap_err();
    assert!(matches!(error, Error::Startup { .. }));
    assert!(error.to_string().contains("firmware handshake failed"));
    assert!(!controller.is_running());

    // Shutdown returns promptly rather than waiting on the dead loop
    controller.shutdown().unwrap();
}

#[test]
fn test_shutdown_closes_transport_and_rejects_new_setup() {
    let (controller, handle) = started();
    controller.setup(2, PinDirection::In).unwrap();
    wait_until(WAIT, || handle.is_reporting(PinKind::Digital, 2));
    assert!(handle.emit_digital(2, HIGH));
    wait_until(WAIT, || controller.input(2).unwrap() == Some(HIGH));

    controller.shutdown().unwrap();
    assert!(handle.is_closed());
    assert!(!controller.is_running());

    // Local reads keep working; new hardware work does not
    assert_eq!(controller.input(2).unwrap(), Some(HIGH));
    assert!(matches!(
        controller.setup(4, PinDirection::In),
        Err(Error::LoopNotRunning)
    ));
    assert!(matches!(
        controller.output(2, HIGH),
        Err(Error::WrongDirection { .. })
    ));

    // Shutdown is idempotent, and the loop cannot be restarted
    controller.shutdown().unwrap();
    assert!(controller.start(|| async {
        let (transport, _handle) = MockTransport::new();
        Ok::<_, TransportError>(transport)
    })
    .is_err());
}

#[test]
fn test_concurrent_start_connects_once() {
    let controller = Arc::new(GpioController::new(BoardScheme::arduino_uno()));
    let connections = Arc::new(AtomicUsize::new(0));

    let mut racers = Vec::new();
    for _ in 0..2 {
        let controller = Arc::clone(&controller);
        let connections = Arc::clone(&connections);
        racers.push(thread::spawn(move || {
            controller.start(move || {
                connections.fetch_add(1, Ordering::SeqCst);
                let (transport, _handle) = MockTransport::new();
                async move { Ok::<_, TransportError>(transport) }
            })
        }));
    }
    for racer in racers {
        racer.join().unwrap().unwrap();
    }

    assert_eq!(connections.load(Ordering::SeqCst), 1);
    assert!(controller.is_running());
    controller.shutdown().unwrap();
}

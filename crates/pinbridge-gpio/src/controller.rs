//! Synchronous GPIO facade.
//!
//! `GpioController` is the owned context object callers interact with. It
//! holds the board scheme, the numbering mode, the pin registry, and the
//! event loop supervisor, and turns blocking setup/read/write/cleanup
//! calls into validated work handed to the loop.

use crate::listener::run_pin_listener;
use crate::pin::{Pin, PinConfig, UpdateCallback};
use crate::registry::PinRegistry;
use crate::supervisor::EventLoopSupervisor;
use parking_lot::Mutex;
use pinbridge_core::constants::{ANALOG_LEVEL_MAX, DIGITAL_LEVEL_MAX};
use pinbridge_core::{
    BoardScheme, Edge, Error, NumberingMode, PinDirection, PinKind, PullMode, Result,
};
use pinbridge_transport::Transport;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Synchronous pin-control API over an asynchronous board transport.
///
/// Every call validates its arguments against the board scheme and the
/// registry before anything is mutated or submitted to the event loop, so
/// a failed call leaves no trace. Dropping the controller shuts the event
/// loop down.
///
/// # Lifecycle
///
/// 1. Create with a [`BoardScheme`]
/// 2. `start()` to connect the transport and bring the event loop up
/// 3. `set_mode()` to choose physical or logical pin numbering
/// 4. `setup` / `input` / `output` from any thread
/// 5. `cleanup` pins individually or `cleanup_all()`
/// 6. `shutdown()` (also runs on drop)
///
/// # Examples
///
/// ```no_run
/// use pinbridge_core::constants::HIGH;
/// use pinbridge_core::{BoardScheme, NumberingMode, PinDirection};
/// use pinbridge_gpio::GpioController;
/// use pinbridge_transport::{MockTransport, TransportError};
///
/// fn main() -> pinbridge_core::Result<()> {
///     let controller = GpioController::new(BoardScheme::arduino_uno());
///     let (transport, _handle) = MockTransport::new();
///     controller.start(move || async move { Ok::<_, TransportError>(transport) })?;
///
///     controller.set_mode(NumberingMode::Logical);
///     controller.setup(13, PinDirection::Out)?;
///     controller.output(13, HIGH)?;
///
///     controller.cleanup_all()?;
///     controller.shutdown()?;
///     Ok(())
/// }
/// ```
pub struct GpioController<T: Transport> {
    scheme: BoardScheme,
    mode: Mutex<Option<NumberingMode>>,
    registry: PinRegistry,
    supervisor: EventLoopSupervisor<T>,
}

impl<T: Transport> GpioController<T> {
    /// Create a controller for the given board scheme. The event loop is
    /// not started and no numbering mode is selected.
    pub fn new(scheme: BoardScheme) -> Self {
        Self {
            scheme,
            mode: Mutex::new(None),
            registry: PinRegistry::new(),
            supervisor: EventLoopSupervisor::new(),
        }
    }

    /// The board scheme this controller validates against.
    pub fn scheme(&self) -> &BoardScheme {
        &self.scheme
    }

    /// Connect the transport and start the event loop.
    ///
    /// Blocks until the loop is accepting work. See
    /// [`EventLoopSupervisor::start`] for the concurrency and failure
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Startup`] when the transport fails to construct.
    pub fn start<F, Fut>(&self, connector: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = pinbridge_transport::Result<T>>,
    {
        self.supervisor.start(connector)
    }

    /// Whether the event loop is running.
    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Select the pin numbering scheme: physical board positions or
    /// logical channel numbers. Must be called before any `setup`.
    pub fn set_mode(&self, mode: NumberingMode) {
        debug!(%mode, "numbering mode set");
        *self.mode.lock() = Some(mode);
    }

    /// Currently selected numbering mode, if any.
    pub fn mode(&self) -> Option<NumberingMode> {
        *self.mode.lock()
    }

    /// Configure a digital pin.
    ///
    /// # Errors
    ///
    /// See [`setup_pin`](Self::setup_pin).
    pub fn setup(&self, pin: u8, direction: PinDirection) -> Result<()> {
        self.setup_pin(PinConfig::new(pin, PinKind::Digital, direction))
    }

    /// Configure a digital pin with a pull resistor mode.
    ///
    /// # Errors
    ///
    /// See [`setup_pin`](Self::setup_pin); pull-down resistors are
    /// rejected before any transport call.
    pub fn setup_with_pull(
        &self,
        pin: u8,
        direction: PinDirection,
        pull: PullMode,
    ) -> Result<()> {
        self.setup_pin(PinConfig::new(pin, PinKind::Digital, direction).pull(pull))
    }

    /// Configure a pin from a full [`PinConfig`]: analog inputs with an
    /// update threshold, analog outputs, initial values, and callbacks.
    ///
    /// Inputs get a listener task on the event loop that applies every
    /// reported sample; outputs get a one-shot configuration task.
    /// Registration is atomic: if the work cannot be handed to the loop,
    /// the registry entry is rolled back.
    ///
    /// # Errors
    ///
    /// Configuration errors ([`PinConfig::validate`]), [`Error::ModeNotSet`]
    /// before [`set_mode`](Self::set_mode), [`Error::UnmappedBoardPin`] and
    /// [`Error::InvalidPin`] from the scheme, [`Error::LoopNotRunning`]
    /// before [`start`](Self::start), and [`Error::ChannelInUse`] when the
    /// resolved channel is already configured. All are raised before any
    /// state changes.
    pub fn setup_pin(&self, config: PinConfig) -> Result<()> {
        config.validate()?;
        let channel = self.check(config.pin_number(), config.kind(), config.direction())?;
        let transport = self.supervisor.transport()?;

        let pin = Arc::new(Pin::from_config(channel, &config));
        self.registry.add(Arc::clone(&pin))?;

        let submitted = match config.direction() {
            PinDirection::In => self
                .supervisor
                .submit(Box::pin(run_pin_listener(Arc::clone(&pin), transport)))
                .and_then(|handle| pin.set_listener(handle)),
            PinDirection::Out => {
                let kind = config.kind();
                self.supervisor
                    .submit(Box::pin(async move {
                        match kind {
                            PinKind::Digital => {
                                transport.set_pin_mode_digital_output(channel).await
                            }
                            PinKind::Analog => transport.set_pin_mode_analog_output(channel).await,
                        }
                    }))
                    .map(|_handle| ())
            }
        };
        if let Err(e) = submitted {
            // Roll the registration back so a failed setup leaves no trace
            let _ = self.registry.remove(channel);
            return Err(e);
        }
        debug!(channel, kind = %config.kind(), direction = %config.direction(), "pin configured");
        Ok(())
    }

    /// Read the most recent sampled value of an input pin.
    ///
    /// Returns `Ok(None)` until the first sample arrives from the board;
    /// that is a legitimate state, not an error.
    ///
    /// # Errors
    ///
    /// [`Error::ChannelNotActive`] for an unconfigured channel and
    /// [`Error::WrongDirection`] for an output pin.
    pub fn input(&self, pin: u8) -> Result<Option<u16>> {
        let channel = self.resolve(pin)?;
        let pin = self.registry.get(channel)?;
        if !pin.direction().is_input() {
            return Err(Error::wrong_direction(channel, PinDirection::In));
        }
        Ok(pin.value())
    }

    /// Write a digital level to an output pin.
    ///
    /// The value is stored locally first (so an immediate read of the pin
    /// observes it) and the hardware write is submitted to the event loop
    /// without waiting for confirmation. There is no read-after-write
    /// guarantee across the hardware boundary.
    ///
    /// # Errors
    ///
    /// In order of precedence: [`Error::ChannelNotActive`],
    /// [`Error::WrongDirection`] for an input pin,
    /// [`Error::ValueOutOfRange`] for a level beyond the pin's range, and
    /// [`Error::Unsupported`] for in-range writes to analog pins, which
    /// this path does not drive. All are raised before the value is
    /// stored.
    pub fn output(&self, pin: u8, value: u16) -> Result<()> {
        let channel = self.resolve(pin)?;
        let pin = self.registry.get(channel)?;
        if !pin.direction().is_output() {
            return Err(Error::wrong_direction(channel, PinDirection::Out));
        }
        let max = match pin.kind() {
            PinKind::Digital => DIGITAL_LEVEL_MAX,
            PinKind::Analog => ANALOG_LEVEL_MAX,
        };
        if value > max {
            return Err(Error::out_of_range(value, max));
        }
        if pin.kind().is_analog() {
            return Err(Error::unsupported("analog write (use PWM)"));
        }
        let transport = self.supervisor.transport()?;

        pin.store_output(value);
        trace!(channel, value, "digital write submitted");
        self.supervisor
            .submit(Box::pin(async move {
                transport.digital_write(channel, value).await
            }))
            .map(|_handle| ())
    }

    /// Deactivate one pin: disable its reporting (inputs), cancel its
    /// listener task, and remove it from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelNotActive`] when the channel is not
    /// configured.
    pub fn cleanup(&self, pin: u8) -> Result<()> {
        let channel = self.resolve(pin)?;
        let pin = self.registry.get(channel)?;

        // Reporting teardown is best-effort once the loop is gone
        if pin.direction().is_input()
            && let Ok(transport) = self.supervisor.transport()
        {
            let kind = pin.kind();
            let _ = self.supervisor.submit(Box::pin(async move {
                match kind {
                    PinKind::Digital => transport.disable_digital_reporting(channel).await,
                    PinKind::Analog => transport.disable_analog_reporting(channel).await,
                }
            }));
        }

        self.registry.remove(channel)?;
        debug!(channel, "pin cleaned up");
        Ok(())
    }

    /// Deactivate every pin: disable all reporting, cancel every listener
    /// task, and clear the registry.
    pub fn cleanup_all(&self) -> Result<()> {
        if let Ok(transport) = self.supervisor.transport() {
            let _ = self
                .supervisor
                .submit(Box::pin(
                    async move { transport.disable_all_reporting().await },
                ));
        }
        self.registry.clear_all();
        info!("all pins cleaned up");
        Ok(())
    }

    /// Snapshot of the active logical channels, in setup order.
    pub fn channels(&self) -> Vec<u8> {
        self.registry.channels()
    }

    /// Look up an active pin by its number in the current numbering mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelNotActive`] when the channel is not
    /// configured.
    pub fn pin(&self, pin: u8) -> Result<Arc<Pin>> {
        let channel = self.resolve(pin)?;
        self.registry.get(channel)
    }

    /// Stop the event loop: abort outstanding tasks, shut the transport
    /// down, and join the loop thread. Idempotent; also runs on drop.
    pub fn shutdown(&self) -> Result<()> {
        self.supervisor.shutdown()
    }

    // Legacy surface of the mirrored API. These operations require
    // interrupt support the transport does not provide, so each fails
    // fast with the operation name.

    /// Not supported by this bridge.
    pub fn set_warnings(&self, _enabled: bool) -> Result<()> {
        Err(Error::unsupported("set_warnings"))
    }

    /// Not supported by this bridge.
    pub fn gpio_function(&self, _pin: u8) -> Result<PinDirection> {
        Err(Error::unsupported("gpio_function"))
    }

    /// Not supported by this bridge: reported samples are polled, not
    /// edge-triggered.
    pub fn add_event_detect(
        &self,
        _pin: u8,
        _edge: Edge,
        _bouncetime: Option<Duration>,
    ) -> Result<()> {
        Err(Error::unsupported("add_event_detect"))
    }

    /// Not supported by this bridge; use [`PinConfig::callback`] for
    /// per-update callbacks instead.
    pub fn add_event_callback(&self, _pin: u8, _callback: UpdateCallback) -> Result<()> {
        Err(Error::unsupported("add_event_callback"))
    }

    /// Not supported by this bridge.
    pub fn event_detected(&self, _pin: u8) -> Result<bool> {
        Err(Error::unsupported("event_detected"))
    }

    /// Not supported by this bridge.
    pub fn remove_event_detect(&self, _pin: u8) -> Result<()> {
        Err(Error::unsupported("remove_event_detect"))
    }

    /// Not supported by this bridge.
    pub fn wait_for_edge(&self, _pin: u8, _edge: Edge, _timeout: Option<Duration>) -> Result<()> {
        Err(Error::unsupported("wait_for_edge"))
    }

    /// Resolve a user-facing pin number to a logical channel through the
    /// current numbering mode.
    fn resolve(&self, pin: u8) -> Result<u8> {
        let mode = (*self.mode.lock()).ok_or(Error::ModeNotSet)?;
        self.scheme.resolve(pin, mode)
    }

    /// Resolve and validate capability for `(kind, direction)`.
    fn check(&self, pin: u8, kind: PinKind, direction: PinDirection) -> Result<u8> {
        let mode = (*self.mode.lock()).ok_or(Error::ModeNotSet)?;
        self.scheme.check(pin, kind, direction, mode)
    }
}

//! Event loop supervisor.
//!
//! The supervisor owns the one background thread that talks to the board.
//! That thread runs a single-threaded tokio runtime hosting the transport,
//! every pin listener task, and the short-lived configuration and write
//! tasks the facade submits.
//!
//! # Architecture
//!
//! ```text
//! caller threads (sync)              event loop thread
//! ─────────────────────              ─────────────────────────────────
//! start()    ──wait on condvar◄───── connect, reset reporting,
//!                                    publish Running, notify
//! submit()   ──► submit channel ───► JoinSet::spawn ──► AbortHandle
//! shutdown() ──► stop oneshot   ───► abort tasks, drain JoinSet,
//!                join thread   ◄──── transport.shutdown()
//! ```
//!
//! Readiness is published under the state lock before the condvar is
//! notified, so a woken starter can never observe a half-constructed
//! transport handle. Task failures inside the loop are logged through
//! `tracing`; they never crash the loop.

use parking_lot::{Condvar, Mutex};
use pinbridge_core::constants::{SHUTDOWN_POLL_INTERVAL_MS, SHUTDOWN_TIMEOUT_MS};
use pinbridge_core::{Error, Result};
use pinbridge_transport::{Transport, TransportError};
use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tracing::{debug, error, info, trace, warn};

/// Boxed unit of work submitted to the event loop.
pub type TaskFuture =
    std::pin::Pin<Box<dyn Future<Output = pinbridge_transport::Result<()>> + Send>>;

/// Cancellable handle to a task running on the event loop.
#[derive(Debug)]
pub struct TaskHandle {
    abort: AbortHandle,
}

impl TaskHandle {
    pub(crate) fn new(abort: AbortHandle) -> Self {
        Self { abort }
    }

    /// Request cancellation. Idempotent; a no-op once the task has
    /// finished.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Whether the task has finished, whether by completing, failing, or
    /// being cancelled.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Lifecycle of the event loop.
enum LoopState<T> {
    Idle,
    Starting,
    Running(LoopHandles<T>),
    ShuttingDown,
    Stopped,
    Failed(String),
}

/// Handles published when the loop reaches `Running`.
struct LoopHandles<T> {
    transport: T,
    submit_tx: mpsc::UnboundedSender<SubmitRequest>,
    stop_tx: Option<oneshot::Sender<()>>,
}

struct SubmitRequest {
    future: TaskFuture,
    reply: oneshot::Sender<AbortHandle>,
}

struct Shared<T> {
    state: Mutex<LoopState<T>>,
    ready: Condvar,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

/// Owns the background event loop thread and hands work to it.
///
/// All methods block and are meant for synchronous callers; do not call
/// them from inside an async runtime. [`submit`](Self::submit) enforces
/// this and rejects async-context callers.
///
/// # Examples
///
/// ```no_run
/// use pinbridge_gpio::EventLoopSupervisor;
/// use pinbridge_transport::{MockTransport, TransportError};
///
/// fn main() -> pinbridge_core::Result<()> {
///     let supervisor = EventLoopSupervisor::new();
///     let (transport, _handle) = MockTransport::new();
///     supervisor.start(move || async move { Ok::<_, TransportError>(transport) })?;
///     supervisor.shutdown()?;
///     Ok(())
/// }
/// ```
pub struct EventLoopSupervisor<T: Transport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> EventLoopSupervisor<T> {
    /// Create a supervisor with no loop running.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(LoopState::Idle),
                ready: Condvar::new(),
                thread: Mutex::new(None),
            }),
        }
    }

    /// Start the event loop and block until it is accepting work.
    ///
    /// The connector runs on the loop thread and produces the transport.
    /// Before any caller is released, the loop awaits a successful
    /// `disable_all_reporting` so stale reporting from a previous session
    /// cannot leak into this one.
    ///
    /// Concurrent calls are safe: exactly one caller spawns the thread and
    /// runs its connector, the rest block until the same outcome is
    /// published. Calling on an already running supervisor is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Startup`] when the connector fails, when the loop
    /// thread cannot be spawned, or when the supervisor has already been
    /// shut down. A failed startup is sticky: later calls report the same
    /// failure.
    pub fn start<F, Fut>(&self, connector: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = pinbridge_transport::Result<T>>,
    {
        {
            let mut state = self.shared.state.lock();
            loop {
                match &*state {
                    LoopState::Idle => break,
                    LoopState::Starting => self.shared.ready.wait(&mut state),
                    LoopState::Running(_) => return Ok(()),
                    LoopState::Failed(message) => return Err(Error::startup(message.clone())),
                    LoopState::ShuttingDown | LoopState::Stopped => {
                        return Err(Error::startup("event loop has been shut down"));
                    }
                }
            }
            *state = LoopState::Starting;
        }

        debug!("spawning event loop thread");
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("pinbridge-event-loop".into())
            .spawn(move || run_event_loop(shared, connector));
        match spawned {
            Ok(handle) => *self.shared.thread.lock() = Some(handle),
            Err(e) => {
                let message = format!("failed to spawn event loop thread: {e}");
                publish_failure(&self.shared, message.clone());
                return Err(Error::startup(message));
            }
        }

        let mut state = self.shared.state.lock();
        while matches!(&*state, LoopState::Starting) {
            self.shared.ready.wait(&mut state);
        }
        match &*state {
            LoopState::Running(_) => Ok(()),
            LoopState::Failed(message) => Err(Error::startup(message.clone())),
            _ => Err(Error::LoopNotRunning),
        }
    }

    /// Whether the loop is currently accepting work.
    pub fn is_running(&self) -> bool {
        matches!(&*self.shared.state.lock(), LoopState::Running(_))
    }

    /// Clone of the transport handle owned by the running loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoopNotRunning`] when the loop is not in the
    /// running state.
    pub fn transport(&self) -> Result<T> {
        match &*self.shared.state.lock() {
            LoopState::Running(handles) => Ok(handles.transport.clone()),
            _ => Err(Error::LoopNotRunning),
        }
    }

    /// Hand a unit of work to the event loop.
    ///
    /// Blocks only for the spawn handoff, never for the task's completion.
    /// The returned [`TaskHandle`] cancels the task if needed; dropping it
    /// detaches the task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoopNotRunning`] when the loop is absent or winds
    /// down during the handoff, and [`Error::Unsupported`] when called
    /// from inside an async runtime, including from a pin callback running
    /// on the loop thread.
    pub fn submit(&self, future: TaskFuture) -> Result<TaskHandle> {
        // The reply handoff blocks, which tokio forbids inside a runtime.
        // This also catches pin callbacks calling back into the facade
        // from the loop thread.
        if Handle::try_current().is_ok() {
            return Err(Error::unsupported("blocking call from async context"));
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let state = self.shared.state.lock();
            let LoopState::Running(handles) = &*state else {
                return Err(Error::LoopNotRunning);
            };
            handles
                .submit_tx
                .send(SubmitRequest {
                    future,
                    reply: reply_tx,
                })
                .map_err(|_| Error::LoopNotRunning)?;
        }
        let abort = reply_rx.blocking_recv().map_err(|_| Error::LoopNotRunning)?;
        Ok(TaskHandle::new(abort))
    }

    /// Stop the event loop and join its thread.
    ///
    /// Outstanding tasks are aborted and drained, the transport is shut
    /// down, then the thread is joined after a bounded wait. Idempotent,
    /// and safe to call when `start` never ran.
    pub fn shutdown(&self) -> Result<()> {
        let stop_tx = {
            let mut state = self.shared.state.lock();
            while matches!(&*state, LoopState::Starting) {
                self.shared.ready.wait(&mut state);
            }
            match &mut *state {
                LoopState::Running(handles) => {
                    let stop_tx = handles.stop_tx.take();
                    *state = LoopState::ShuttingDown;
                    stop_tx
                }
                LoopState::ShuttingDown => None,
                LoopState::Idle => {
                    *state = LoopState::Stopped;
                    return Ok(());
                }
                LoopState::Starting | LoopState::Stopped | LoopState::Failed(_) => {
                    return Ok(());
                }
            }
        };

        if let Some(stop_tx) = stop_tx {
            debug!("requesting event loop stop");
            let _ = stop_tx.send(());
        }

        let Some(thread) = self.shared.thread.lock().take() else {
            return Ok(());
        };

        // Bounded wait for the loop to wind down before joining
        let deadline = Instant::now() + Duration::from_millis(SHUTDOWN_TIMEOUT_MS);
        while !thread.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(SHUTDOWN_POLL_INTERVAL_MS));
        }
        if !thread.is_finished() {
            warn!("event loop did not stop within {SHUTDOWN_TIMEOUT_MS} ms, detaching");
            return Ok(());
        }
        if thread.join().is_err() {
            error!("event loop thread panicked");
        }
        Ok(())
    }
}

impl<T: Transport> Default for EventLoopSupervisor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Drop for EventLoopSupervisor<T> {
    fn drop(&mut self) {
        if self.is_running() {
            debug!("supervisor dropped while running, shutting down event loop");
        }
        let _ = self.shutdown();
    }
}

/// Body of the event loop thread.
///
/// The loop proper runs under `catch_unwind`: a panic in the connector or
/// the loop body must still publish a terminal state, otherwise callers
/// blocked in `start` or `shutdown` would wait on the condvar forever.
fn run_event_loop<T, F, Fut>(shared: Arc<Shared<T>>, connector: F)
where
    T: Transport,
    F: FnOnce() -> Fut,
    Fut: Future<Output = pinbridge_transport::Result<T>>,
{
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| drive_loop(&shared, connector))) {
        let reason = panic_reason(payload.as_ref());
        error!("event loop thread panicked: {reason}");
        let mut state = shared.state.lock();
        *state = LoopState::Failed(format!("event loop panicked: {reason}"));
        shared.ready.notify_all();
        return;
    }

    let mut state = shared.state.lock();
    if !matches!(&*state, LoopState::Failed(_)) {
        *state = LoopState::Stopped;
    }
    shared.ready.notify_all();
    drop(state);
    info!("event loop stopped");
}

/// Connect, publish readiness, then service submissions until stopped.
fn drive_loop<T, F, Fut>(shared: &Shared<T>, connector: F)
where
    T: Transport,
    F: FnOnce() -> Fut,
    Fut: Future<Output = pinbridge_transport::Result<T>>,
{
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            publish_failure(shared, format!("failed to build event loop runtime: {e}"));
            return;
        }
    };

    runtime.block_on(async {
        let transport = match connector().await {
            Ok(transport) => transport,
            Err(e) => {
                publish_failure(shared, format!("transport connection failed: {e}"));
                return;
            }
        };

        // Clean reporting baseline before any caller can configure pins
        if let Err(e) = transport.disable_all_reporting().await {
            publish_failure(shared, format!("failed to reset reporting: {e}"));
            return;
        }

        let (submit_tx, mut submit_rx) = mpsc::unbounded_channel::<SubmitRequest>();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        // Publish under the lock, then notify
        {
            let mut state = shared.state.lock();
            *state = LoopState::Running(LoopHandles {
                transport: transport.clone(),
                submit_tx,
                stop_tx: Some(stop_tx),
            });
            shared.ready.notify_all();
        }
        info!("event loop running");

        let mut tasks: JoinSet<pinbridge_transport::Result<()>> = JoinSet::new();
        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    debug!("event loop stop requested");
                    break;
                }
                request = submit_rx.recv() => {
                    match request {
                        Some(request) => {
                            let abort = tasks.spawn(request.future);
                            // The submitter may have given up waiting
                            let _ = request.reply.send(abort);
                        }
                        None => {
                            debug!("all supervisor handles dropped");
                            break;
                        }
                    }
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    log_termination(classify_task_result(result));
                }
            }
        }

        // Drain: cancel whatever is still running and account for each task
        tasks.abort_all();
        while let Some(result) = tasks.join_next().await {
            log_termination(classify_task_result(result));
        }

        if let Err(e) = transport.shutdown().await {
            warn!(error = %e, "transport shutdown reported an error");
        }
    });
}

fn publish_failure<T>(shared: &Shared<T>, message: String) {
    error!("event loop startup failed: {message}");
    let mut state = shared.state.lock();
    *state = LoopState::Failed(message);
    shared.ready.notify_all();
}

/// Best-effort extraction of a panic payload's message.
fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

/// Task termination classification for the loop's error sink.
#[derive(Debug)]
enum TaskTermination {
    /// Task completed successfully.
    Success,
    /// Task returned an error.
    Error(TransportError),
    /// Task was cancelled (expected during cleanup and shutdown).
    Cancelled,
    /// Task panicked.
    Panic(JoinError),
}

fn classify_task_result(
    result: std::result::Result<pinbridge_transport::Result<()>, JoinError>,
) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(e)) => TaskTermination::Error(e),
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(e) => TaskTermination::Panic(e),
    }
}

fn log_termination(termination: TaskTermination) {
    match termination {
        TaskTermination::Success => trace!("loop task completed"),
        TaskTermination::Error(e) => warn!(error = %e, "loop task failed"),
        TaskTermination::Cancelled => trace!("loop task cancelled"),
        TaskTermination::Panic(e) => error!(error = %e, "loop task panicked"),
    }
}

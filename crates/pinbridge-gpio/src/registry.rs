//! Active pin registry.
//!
//! Ordered collection of configured pins, channel-unique, shared between
//! the synchronous facade and the listener tasks.

use crate::pin::Pin;
use parking_lot::RwLock;
use pinbridge_core::{Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Concurrency-safe collection of active pins.
///
/// Registration order is preserved; every mutation and lookup is guarded by
/// a read-write lock so the facade and listener tasks can touch the
/// registry from different threads.
#[derive(Debug, Default)]
pub struct PinRegistry {
    pins: RwLock<Vec<Arc<Pin>>>,
}

impl PinRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelInUse`] when a pin with the same channel is
    /// already active.
    pub fn add(&self, pin: Arc<Pin>) -> Result<()> {
        let mut pins = self.pins.write();
        if pins.iter().any(|p| p.channel() == pin.channel()) {
            return Err(Error::in_use(pin.channel()));
        }
        pins.push(pin);
        Ok(())
    }

    /// Look up a pin by channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelNotActive`] when no pin with that channel is
    /// registered.
    pub fn get(&self, channel: u8) -> Result<Arc<Pin>> {
        self.pins
            .read()
            .iter()
            .find(|p| p.channel() == channel)
            .cloned()
            .ok_or_else(|| Error::not_active(channel))
    }

    /// Whether a pin with the given channel is registered.
    pub fn contains(&self, channel: u8) -> bool {
        self.pins.read().iter().any(|p| p.channel() == channel)
    }

    /// Remove a pin, cancelling its listener task first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelNotActive`] when no pin with that channel is
    /// registered.
    pub fn remove(&self, channel: u8) -> Result<Arc<Pin>> {
        let mut pins = self.pins.write();
        let index = pins
            .iter()
            .position(|p| p.channel() == channel)
            .ok_or_else(|| Error::not_active(channel))?;
        let pin = pins.remove(index);
        pin.cancel_listener();
        debug!(channel, "pin removed from registry");
        Ok(pin)
    }

    /// Remove every pin, cancelling all listener tasks.
    pub fn clear_all(&self) {
        let mut pins = self.pins.write();
        for pin in pins.iter() {
            pin.cancel_listener();
        }
        let count = pins.len();
        pins.clear();
        debug!(count, "registry cleared");
    }

    /// Snapshot of the active channel numbers, in registration order.
    pub fn channels(&self) -> Vec<u8> {
        self.pins.read().iter().map(|p| p.channel()).collect()
    }

    /// Number of active pins.
    pub fn len(&self) -> usize {
        self.pins.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.pins.read().is_empty()
    }
}

//! Fault indicator side channel
//!
//! The player signals unrecoverable resource problems to the operator (an LED
//! blink on hardware). The playlist core only ever raises it, it never owns it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::error;

/// Capability to raise the global error indicator
pub trait FaultSignal: Send + Sync {
    fn indicate_error(&self);
}

impl<F> FaultSignal for F
where
    F: Fn() + Send + Sync,
{
    fn indicate_error(&self) {
        self()
    }
}

/// Fault signal that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFault;

impl FaultSignal for LogFault {
    fn indicate_error(&self) {
        error!("Error indicator raised");
    }
}

/// Fault signal that counts how often it was raised
#[derive(Debug, Default, Clone)]
pub struct FaultCounter {
    raised: Arc<AtomicUsize>,
}

impl FaultCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the indicator has been raised
    pub fn count(&self) -> usize {
        self.raised.load(Ordering::SeqCst)
    }
}

impl FaultSignal for FaultCounter {
    fn indicate_error(&self) {
        self.raised.fetch_add(1, Ordering::SeqCst);
    }
}

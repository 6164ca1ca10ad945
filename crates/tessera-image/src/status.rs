use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared progress counter with a cooperative abort flag.
///
/// Engines advance the counter at coarse intervals (tens of thousands of
/// samples) and poll the abort flag at the same cadence. The status object
/// is injected by the caller; the engines never own its lifecycle.
#[derive(Debug, Default)]
pub struct Status {
    count: AtomicU64,
    abort: AtomicBool,
}

impl Status {
    /// Create a new status object with a zero counter and no abort request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` processed samples to the progress counter.
    pub fn advance(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    /// Total samples reported so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Request a cooperative abort. Workers observe the flag between chunks
    /// and unwind without touching shared output with partial data.
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Whether an abort has been requested.
    pub fn is_abort_requested(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}

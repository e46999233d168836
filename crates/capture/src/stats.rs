use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Monotonic diagnostics for the capture loop.
///
/// Dropped messages never reach stdout (parser noise would flood the
/// output); these counters are the visible trace they leave behind.
#[derive(Debug, Default)]
pub struct CaptureStats {
    received: AtomicU64,
    filtered_out: AtomicU64,
    parse_failures: AtomicU64,
    printed: AtomicU64,
}

impl CaptureStats {
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_filtered_out(&self) {
        self.filtered_out.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_printed(&self) {
        self.printed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn filtered_out(&self) -> u64 {
        self.filtered_out.load(Ordering::Relaxed)
    }

    pub fn parse_failures(&self) -> u64 {
        self.parse_failures.load(Ordering::Relaxed)
    }

    pub fn printed(&self) -> u64 {
        self.printed.load(Ordering::Relaxed)
    }

    pub fn dump(&self) {
        info!(
            received = self.received(),
            filtered_out = self.filtered_out(),
            parse_failures = self.parse_failures(),
            printed = self.printed(),
            "capture statistics"
        );
    }
}

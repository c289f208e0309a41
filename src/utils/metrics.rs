//! Observability and Metrics
//!
//! Counters for the framing codec, shared between connections.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector for encoded and decoded frames
#[derive(Debug)]
pub struct CodecMetrics {
    /// Total frames encoded
    pub frames_encoded: AtomicU64,
    /// Total frames decoded
    pub frames_decoded: AtomicU64,
    /// Total bytes written by the encoder, headers included
    pub bytes_encoded: AtomicU64,
    /// Total bytes consumed by the decoder, headers included
    pub bytes_decoded: AtomicU64,
    /// Frames rejected for schema or size violations
    pub codec_errors: AtomicU64,
    start_time: Instant,
}

impl CodecMetrics {
    pub fn new() -> Self {
        Self {
            frames_encoded: AtomicU64::new(0),
            frames_decoded: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            codec_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an encoded frame
    pub fn frame_encoded(&self, byte_count: u64) {
        self.frames_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a decoded frame
    pub fn frame_decoded(&self, byte_count: u64) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a rejected frame
    pub fn codec_error(&self) {
        self.codec_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            codec_errors: self.codec_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            frames_encoded = snapshot.frames_encoded,
            frames_decoded = snapshot.frames_decoded,
            bytes_encoded = snapshot.bytes_encoded,
            bytes_decoded = snapshot.bytes_decoded,
            codec_errors = snapshot.codec_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_encoded: u64,
    pub frames_decoded: u64,
    pub bytes_encoded: u64,
    pub bytes_decoded: u64,
    pub codec_errors: u64,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CodecMetrics::new();
        metrics.frame_encoded(43);
        metrics.frame_encoded(6);
        metrics.frame_decoded(238);
        metrics.codec_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_encoded, 2);
        assert_eq!(snapshot.bytes_encoded, 49);
        assert_eq!(snapshot.frames_decoded, 1);
        assert_eq!(snapshot.bytes_decoded, 238);
        assert_eq!(snapshot.codec_errors, 1);
    }
}

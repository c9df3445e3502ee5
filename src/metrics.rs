//! Frame rate and throughput counters, updated once per flush.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{
    Mutex,
    raw::CriticalSectionRawMutex,
};
use embassy_time::Instant;

#[derive(Clone, Copy)]
struct Counters {
    since: Instant,
    frames: u32,
    bytes: u64,
}

/// Flush statistics since the last [`reset`](Metrics::reset).
///
/// Shared between the flush task, which records, and whoever displays the
/// numbers. Purely observational.
pub struct Metrics {
    counters: Mutex<CriticalSectionRawMutex, Cell<Option<Counters>>>,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            counters: Mutex::new(Cell::new(None)),
        }
    }

    /// Count one flushed frame of `bytes` bytes.
    pub fn record_flush(&self, bytes: usize) {
        self.counters.lock(|c| {
            let mut counters = c.get().unwrap_or_else(Self::fresh);
            counters.frames = counters.frames.wrapping_add(1);
            counters.bytes = counters.bytes.wrapping_add(bytes as u64);
            c.set(Some(counters));
        });
    }

    /// Start a new measurement window.
    pub fn reset(&self) {
        self.counters.lock(|c| c.set(Some(Self::fresh())));
    }

    /// Frames flushed since the last reset.
    pub fn frames(&self) -> u32 {
        self.counters.lock(|c| c.get().map_or(0, |c| c.frames))
    }

    /// Average frames per second over the current window.
    pub fn fps(&self) -> f32 {
        self.rate(|c| c.frames as f32)
    }

    /// Average bytes per second over the current window.
    pub fn bytes_per_second(&self) -> f32 {
        self.rate(|c| c.bytes as f32)
    }

    fn rate(&self, amount: impl Fn(&Counters) -> f32) -> f32 {
        let Some(counters) = self.counters.lock(Cell::get) else {
            return 0.0;
        };
        let elapsed = counters.since.elapsed().as_micros();
        if elapsed == 0 {
            return 0.0;
        }
        amount(&counters) * 1_000_000.0 / elapsed as f32
    }

    fn fresh() -> Counters {
        Counters {
            since: Instant::now(),
            frames: 0,
            bytes: 0,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames_and_rates() {
        let metrics = Metrics::new();
        assert_eq!(metrics.fps(), 0.0);

        metrics.reset();
        for _ in 0..3 {
            metrics.record_flush(1000);
        }
        std::thread::sleep(std::time::Duration::from_millis(20));

        assert_eq!(metrics.frames(), 3);
        let fps = metrics.fps();
        assert!(fps > 0.0 && fps <= 150.0, "fps {fps}");
        let bps = metrics.bytes_per_second();
        assert!((bps / fps - 1000.0).abs() < 50.0);
    }

    #[test]
    fn reset_clears_counters() {
        let metrics = Metrics::new();
        metrics.record_flush(10);
        metrics.reset();
        assert_eq!(metrics.frames(), 0);
    }
}

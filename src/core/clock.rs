use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic time source shared by the transport, the input path and the
/// engine. Milliseconds from an arbitrary epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that only moves when told to. For tests and externally driven
/// transports.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: AtomicU64::new(start_ms.to_bits()),
        }
    }

    pub fn set(&self, ms: f64) {
        self.bits.store(ms.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: f64) {
        let now = self.now_ms();
        self.set(now + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advance() {
        let clock = ManualClock::new(0.0);
        assert_eq!(clock.now_ms(), 0.0);
        clock.advance(3500.0);
        assert_eq!(clock.now_ms(), 3500.0);
        clock.advance(30.0);
        assert_eq!(clock.now_ms(), 3530.0);
    }

    #[test]
    fn manual_clock_set() {
        let clock = ManualClock::default();
        clock.set(12.5);
        assert_eq!(clock.now_ms(), 12.5);
    }

    #[test]
    fn monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new();
        let t1 = clock.now_ms();
        let t2 = clock.now_ms();
        assert!(t2 >= t1);
    }
}

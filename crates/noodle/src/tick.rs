//! # Tick Pacing
//!
//! Fixed-rate pacing for the update loop. A rate of zero runs ticks back to
//! back, which is what tests and headless simulations want.

use std::time::{Duration, Instant};

/// Default tick rate in Hz.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Paces ticks and measures how long they take.
#[derive(Debug)]
pub struct TickClock {
    /// Target tick period, `None` when unpaced.
    period: Option<Duration>,
    /// When the next tick is due.
    next_due: Instant,
    /// Ticks started so far.
    tick_count: u64,
    /// Timing statistics.
    stats: TickStats,
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickStats {
    /// Shortest tick observed, in microseconds.
    pub min_tick_us: u64,
    /// Longest tick observed, in microseconds.
    pub max_tick_us: u64,
    /// Rolling average, in microseconds.
    pub avg_tick_us: u64,
    /// Ticks that took longer than the period.
    pub late_ticks: u64,
    /// Ticks measured.
    pub total_ticks: u64,
}

impl TickStats {
    fn fresh(period: Option<Duration>) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: period.map_or(0, micros),
            late_ticks: 0,
            total_ticks: 0,
        }
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::fresh(None)
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl TickClock {
    /// Creates a clock running at `tick_rate` Hz; zero means unpaced.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let period = (tick_rate > 0)
            .then(|| Duration::from_micros(1_000_000 / u64::from(tick_rate)));
        Self {
            period,
            next_due: Instant::now(),
            tick_count: 0,
            stats: TickStats::fresh(period),
        }
    }

    /// Creates a clock that never waits.
    #[must_use]
    pub fn unpaced() -> Self {
        Self::new(0)
    }

    /// Blocks until the next tick is due.
    ///
    /// A clock that has fallen more than a period behind does not try to
    /// catch up with a burst of ticks; it restarts from now.
    pub fn wait_for_next_tick(&mut self) {
        let Some(period) = self.period else {
            return;
        };

        let now = Instant::now();
        if now < self.next_due {
            let remaining = self.next_due - now;
            if remaining > Duration::from_micros(1000) {
                std::thread::sleep(remaining - Duration::from_micros(500));
            }
            while Instant::now() < self.next_due {
                std::hint::spin_loop();
            }
        }

        self.next_due = (self.next_due + period).max(Instant::now());
    }

    /// Marks the start of a tick and returns its start time.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.tick_count += 1;
        Instant::now()
    }

    /// Marks the end of the tick started at `start`.
    pub fn end_tick(&mut self, start: Instant) {
        let elapsed = start.elapsed();
        let elapsed_us = micros(elapsed);

        self.stats.total_ticks += 1;
        self.stats.min_tick_us = self.stats.min_tick_us.min(elapsed_us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(elapsed_us);
        self.stats.avg_tick_us = (self.stats.avg_tick_us * 15 + elapsed_us) / 16;

        if self.period.is_some_and(|period| elapsed > period) {
            self.stats.late_ticks += 1;
        }
    }

    /// Returns the number of ticks started.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Returns the target period, `None` when unpaced.
    #[must_use]
    pub const fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Clears timing statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::fresh(self.period);
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_creation() {
        let clock = TickClock::new(60);
        assert_eq!(clock.tick_count(), 0);
        assert_eq!(clock.period(), Some(Duration::from_micros(16_666)));
        assert_eq!(TickClock::unpaced().period(), None);
    }

    #[test]
    fn test_unpaced_never_waits() {
        let mut clock = TickClock::unpaced();
        let before = Instant::now();
        for _ in 0..1000 {
            clock.wait_for_next_tick();
            let start = clock.begin_tick();
            clock.end_tick(start);
        }
        assert!(before.elapsed() < Duration::from_secs(1));
        assert_eq!(clock.tick_count(), 1000);
        assert_eq!(clock.stats().late_ticks, 0);
    }

    #[test]
    fn test_paced_ticks_take_their_period() {
        let before = Instant::now();
        let mut clock = TickClock::new(200);
        for _ in 0..5 {
            clock.wait_for_next_tick();
            let start = clock.begin_tick();
            clock.end_tick(start);
        }
        // First tick is due immediately, the other four wait 5ms each.
        assert!(before.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_stats_tracking() {
        let mut clock = TickClock::new(1000);
        for _ in 0..5 {
            let start = clock.begin_tick();
            std::thread::sleep(Duration::from_micros(50));
            clock.end_tick(start);
        }

        let stats = clock.stats();
        assert_eq!(stats.total_ticks, 5);
        assert!(stats.min_tick_us > 0);
        assert!(stats.min_tick_us <= stats.max_tick_us);

        clock.reset_stats();
        assert_eq!(clock.stats().total_ticks, 0);
    }
}

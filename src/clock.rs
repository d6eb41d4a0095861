use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub trait Clock {
    fn elapsed(&self) -> Duration;
    fn wait(&mut self, period: Duration);
}

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
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wait(&mut self, period: Duration) {
        if !period.is_zero() {
            std::thread::sleep(period);
        }
    }
}

// Virtual clock. `wait` jumps forward instead of sleeping; a script of
// intervals can replace the nominal period to simulate irregular callbacks.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Duration,
    script: VecDeque<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(intervals: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            now: Duration::ZERO,
            script: intervals.into_iter().collect(),
        }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now
    }

    fn wait(&mut self, period: Duration) {
        let step = self.script.pop_front().unwrap_or(period);
        self.now += step;
    }
}

use std::time::{Duration, Instant};

// Displayed lap time, refreshed at a fixed cadence rather than every frame so
// the readout stays steady when the frame rate stutters
#[derive(Clone, Debug)]
pub struct SampleClock {
    interval: Duration,
    started_at: Option<Instant>,
    last_sample: Option<Instant>,
    elapsed: Duration,
}

impl SampleClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started_at: None,
            last_sample: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.last_sample = Some(now);
        self.elapsed = Duration::ZERO;
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.last_sample = None;
        self.elapsed = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Refreshes the elapsed time if a full interval has passed since the last
    /// refresh. Returns the new value when it changed.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        let started_at = self.started_at?;
        let last_sample = self.last_sample.unwrap_or(started_at);

        if now.saturating_duration_since(last_sample) < self.interval {
            return None;
        }

        self.last_sample = Some(now);
        self.elapsed = now.saturating_duration_since(started_at);
        Some(self.elapsed)
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::DVec3;
use laptimer_core::lap_info::TimingRecord;
use laptimer_core::Settings;
use tracing::info;

use crate::best_time::BestTimeStore;
use crate::checkpoints::CheckpointSet;
use crate::lap_timer::{LapEvent, LapTimer};

#[derive(Debug, Default)]
pub struct FrameReport {
    pub events: Vec<LapEvent>,
    // set when the HUD should redraw
    pub record: Option<TimingRecord>,
}

/// Per-frame entry point for one viewing session.
///
/// Every frame ticks the display clock; only every `eval_stride`-th frame
/// is evaluated against the checkpoints. A record is emitted right after
/// any lap event, otherwise at most once per `emit_interval`.
pub struct LapSession<S: BestTimeStore> {
    timer: LapTimer<S>,
    eval_stride: u64,
    emit_interval: Duration,
    frame: u64,
    last_emit: Option<Instant>,
    latest: TimingRecord,
    closed: bool,
}

impl<S: BestTimeStore> LapSession<S> {
    pub fn new(timer: LapTimer<S>, eval_stride: u32, emit_interval: Duration) -> Self {
        let latest = timer.record();
        Self {
            timer,
            eval_stride: u64::from(eval_stride.max(1)),
            emit_interval,
            frame: 0,
            last_emit: None,
            latest,
            closed: false,
        }
    }

    pub fn from_settings(checkpoints: Arc<CheckpointSet>, settings: &Settings, store: S) -> Self {
        Self::new(
            LapTimer::from_settings(checkpoints, settings, store),
            settings.eval_stride,
            Duration::from_millis(settings.emit_interval_ms),
        )
    }

    pub fn timer(&self) -> &LapTimer<S> {
        &self.timer
    }

    // last record handed to the HUD
    pub fn latest(&self) -> &TimingRecord {
        &self.latest
    }

    pub fn frames_seen(&self) -> u64 {
        self.frame
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn on_frame(&mut self, position: DVec3, now: Instant) -> FrameReport {
        if self.closed {
            return FrameReport::default();
        }

        self.frame += 1;
        let events = if self.frame % self.eval_stride == 0 {
            self.timer.update(position, now)
        } else {
            self.timer.refresh_clock(now);
            Vec::new()
        };

        let record = self.timer.record();
        let emit = if !events.is_empty() {
            true
        } else {
            record != self.latest && self.emit_due(now)
        };

        if emit {
            self.latest = record.clone();
            self.last_emit = Some(now);
        }

        FrameReport {
            events,
            record: emit.then(|| record),
        }
    }

    fn emit_due(&self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) => now.saturating_duration_since(last) >= self.emit_interval,
            None => true,
        }
    }

    /// Stops the periodic clock; later frames are ignored.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.timer.halt_clock();
        info!(
            frames = self.frame,
            laps = self.timer.state().lap_count,
            "lap session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::best_time::MemoryStore;
    use crate::checkpoints::Checkpoint;
    use crate::progress::TimerPhase;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn session(eval_stride: u32) -> LapSession<MemoryStore> {
        let mut settings = Settings::defaults().unwrap();
        settings.eval_stride = eval_stride;
        let set = CheckpointSet::new(vec![
            Checkpoint::start(DVec3::ZERO, 10.0),
            Checkpoint::gate(1, "Far", DVec3::new(30.0, 0.0, 0.0), 10.0),
        ])
        .unwrap();
        LapSession::from_settings(Arc::new(set), &settings, MemoryStore::new())
    }

    #[test]
    fn only_every_nth_frame_is_evaluated() {
        let t0 = Instant::now();
        let mut session = session(5);

        for frame in 1..=4u64 {
            let report = session.on_frame(DVec3::ZERO, t0 + ms(frame * 16));
            assert!(report.events.is_empty());
            assert_eq!(session.timer().phase(), TimerPhase::Idle);
        }

        let report = session.on_frame(DVec3::ZERO, t0 + ms(80));
        assert_eq!(report.events, vec![LapEvent::TimerStarted]);
        assert_eq!(session.frames_seen(), 5);
    }

    #[test]
    fn lap_events_are_emitted_immediately() {
        let t0 = Instant::now();
        let mut session = session(1);

        let report = session.on_frame(DVec3::ZERO, t0);
        let record = report.record.expect("start should be emitted");
        assert_eq!(record.lap_count, 1);
        assert_eq!(session.latest(), &record);

        let report = session.on_frame(DVec3::new(30.0, 0.0, 0.0), t0 + ms(16));
        assert_eq!(report.events, vec![LapEvent::CheckpointReached { ordinal: 1 }]);
        assert_eq!(
            report.record.unwrap().next_checkpoint.as_deref(),
            Some("START/FINISH")
        );
    }

    #[test]
    fn clock_updates_are_throttled() {
        let t0 = Instant::now();
        let mut session = session(1);
        session.on_frame(DVec3::ZERO, t0);

        let mut emitted = Vec::new();
        for frame in 1..=60u64 {
            let at = t0 + ms(frame * 16);
            if let Some(record) = session.on_frame(DVec3::new(1.0, 0.0, 0.0), at).record {
                emitted.push((frame * 16, record.current_time));
            }
        }

        assert!(!emitted.is_empty());
        for pair in emitted.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= 100);
        }
        for (at, shown) in emitted {
            assert!(shown <= at);
        }
    }

    #[test]
    fn clock_keeps_running_between_evaluated_frames() {
        let t0 = Instant::now();
        let mut session = session(5);
        for frame in 1..=5u64 {
            session.on_frame(DVec3::ZERO, t0 + ms(frame * 16));
        }

        // frames 6 to 9 are not evaluated but still refresh the display; the
        // timer started on frame 5 at 80ms and the last refresh lands at 400ms
        for frame in 6..=9u64 {
            session.on_frame(DVec3::ZERO, t0 + ms(frame * 50));
        }
        assert_eq!(session.timer().state().current_elapsed_ms, 320);
    }

    #[test]
    fn shutdown_stops_all_work() {
        let t0 = Instant::now();
        let mut session = session(1);
        session.on_frame(DVec3::ZERO, t0);
        session.on_frame(DVec3::ZERO, t0 + ms(200));
        let before = session.timer().state().clone();

        session.shutdown();
        assert!(session.is_closed());

        let report = session.on_frame(DVec3::new(30.0, 0.0, 0.0), t0 + ms(5_000));
        assert!(report.events.is_empty());
        assert!(report.record.is_none());
        assert_eq!(session.timer().state(), &before);
        assert_eq!(session.frames_seen(), 2);
    }
}

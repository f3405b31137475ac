use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::DVec3;
use laptimer_core::lap_info::{LapNumber, Millis, Ordinal, TimingRecord};
use laptimer_core::{ProgressPolicy, Settings};
use tracing::{debug, info, warn};

use crate::best_time::BestTimeStore;
use crate::checkpoints::CheckpointSet;
use crate::classifier::{OnTrackClassifier, TrackEnvelope, TrackStatus};
use crate::progress::{CheckpointProgress, TimerPhase};
use crate::sample_clock::SampleClock;


// Thresholds the state machine runs on, resolved once from the settings
#[derive(Clone, Copy, Debug)]
pub struct LapRules {
    pub policy: ProgressPolicy,
    // consecutive off-track frames tolerated before the lap is thrown away
    pub debounce_frames: u32,
    // render frames represented by one evaluated sample
    pub frames_per_sample: u32,
    pub sample_interval: Duration,
    // shortest lap the sequential policy accepts
    pub lap_guard: Duration,
    // shortest lap the coverage policy accepts
    pub coverage_min_lap: Duration,
    pub coverage_min_checkpoints: usize,
    pub coverage_leave_distance: f64,
}

impl LapRules {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            policy: settings.progress_policy,
            debounce_frames: settings.off_track_debounce_frames,
            frames_per_sample: settings.eval_stride.max(1),
            sample_interval: Duration::from_millis(settings.sample_interval_ms),
            lap_guard: Duration::from_millis(settings.lap_guard_ms),
            coverage_min_lap: Duration::from_millis(settings.coverage_min_lap_ms),
            coverage_min_checkpoints: settings.coverage_min_checkpoints,
            coverage_leave_distance: settings.coverage_leave_distance,
        }
    }

    fn min_lap_time(&self) -> Duration {
        match self.policy {
            ProgressPolicy::Sequential => self.lap_guard,
            ProgressPolicy::Coverage => self.coverage_min_lap,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LapTimerState {
    pub timer_active: bool,
    pub current_elapsed_ms: Millis,
    pub best_time_ms: Option<Millis>,
    pub lap_count: LapNumber,
    pub progress: CheckpointProgress,
    pub is_on_track: bool,
    pub off_track_frames: u32,
    // also stamped when the timer starts
    pub last_lap_completion: Option<Instant>,
}

impl LapTimerState {
    fn new(policy: ProgressPolicy, best_time_ms: Option<Millis>) -> Self {
        Self {
            timer_active: false,
            current_elapsed_ms: 0,
            best_time_ms,
            lap_count: 0,
            progress: CheckpointProgress::cleared(policy),
            is_on_track: true,
            off_track_frames: 0,
            last_lap_completion: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LapEvent {
    TimerStarted,
    CheckpointReached {
        ordinal: Ordinal,
    },
    LapCompleted {
        lap: LapNumber,
        lap_time_ms: Millis,
        personal_best: bool,
    },
    WentOffTrack(TrackStatus),
    BackOnTrack,
}

fn as_millis(duration: Duration) -> Millis {
    duration.as_millis() as Millis
}

/// Lap timing and checkpoint progress for one car.
///
/// Fed one position per evaluated frame through [`LapTimer::update`]. The
/// state is only reachable read-only; the HUD gets [`TimingRecord`] copies.
pub struct LapTimer<S: BestTimeStore> {
    rules: LapRules,
    checkpoints: Arc<CheckpointSet>,
    classifier: OnTrackClassifier,
    clock: SampleClock,
    store: S,
    state: LapTimerState,
}

impl<S: BestTimeStore> LapTimer<S> {
    pub fn new(
        checkpoints: Arc<CheckpointSet>,
        envelope: TrackEnvelope,
        rules: LapRules,
        store: S,
    ) -> Self {
        let best_time_ms = store.load();
        if let Some(best) = best_time_ms {
            info!(best_ms = best, "loaded best lap time");
        }

        Self {
            classifier: OnTrackClassifier::new(envelope, checkpoints.clone()),
            clock: SampleClock::new(rules.sample_interval),
            state: LapTimerState::new(rules.policy, best_time_ms),
            rules,
            checkpoints,
            store,
        }
    }

    pub fn from_settings(checkpoints: Arc<CheckpointSet>, settings: &Settings, store: S) -> Self {
        Self::new(
            checkpoints,
            TrackEnvelope::from_settings(settings),
            LapRules::from_settings(settings),
            store,
        )
    }

    pub fn state(&self) -> &LapTimerState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn phase(&self) -> TimerPhase {
        if self.state.timer_active {
            TimerPhase::Timing
        } else if self.state.lap_count > 0 {
            TimerPhase::OffTrack
        } else {
            TimerPhase::Idle
        }
    }

    pub fn record(&self) -> TimingRecord {
        let (next_checkpoint, checkpoint_progress) = if self.state.timer_active {
            (
                self.state.progress.next_label(&self.checkpoints),
                Some(self.state.progress.progress_label(&self.checkpoints)),
            )
        } else {
            (None, None)
        };

        TimingRecord {
            current_time: self.state.current_elapsed_ms,
            best_time: self.state.best_time_ms,
            is_on_track: self.state.is_on_track,
            lap_count: self.state.lap_count,
            next_checkpoint,
            checkpoint_progress,
        }
    }

    /// Pulls the displayed lap time forward if a sample interval has passed.
    pub fn refresh_clock(&mut self, now: Instant) -> bool {
        match self.clock.tick(now) {
            Some(elapsed) => {
                self.state.current_elapsed_ms = as_millis(elapsed);
                true
            }
            None => false,
        }
    }

    // stops the periodic clock without touching lap state
    pub fn halt_clock(&mut self) {
        self.clock.stop();
    }

    /// Evaluates one position sample and returns what happened on it.
    pub fn update(&mut self, position: DVec3, now: Instant) -> Vec<LapEvent> {
        let mut events = Vec::new();

        let status = self.classifier.classify(position);
        if status.is_on_track() {
            self.state.off_track_frames = 0;
            if !self.state.is_on_track {
                self.state.is_on_track = true;
                info!("back on track");
                events.push(LapEvent::BackOnTrack);
            }
        } else {
            self.state.off_track_frames = self
                .state
                .off_track_frames
                .saturating_add(self.rules.frames_per_sample);
            if self.state.off_track_frames > self.rules.debounce_frames && self.state.is_on_track {
                self.go_off_track(status);
                events.push(LapEvent::WentOffTrack(status));
            }
        }

        if !self.state.is_on_track {
            return events;
        }

        self.refresh_clock(now);

        let in_start_zone = self.checkpoints.start().contains(position);

        if !self.state.timer_active {
            if in_start_zone && status.is_on_track() {
                self.start_timer(now);
                events.push(LapEvent::TimerStarted);
            }
            return events;
        }

        let reached = self.state.progress.advance(
            position,
            &self.checkpoints,
            self.rules.coverage_leave_distance,
        );
        for ordinal in reached {
            debug!(ordinal, "checkpoint reached");
            events.push(LapEvent::CheckpointReached { ordinal });
        }

        if in_start_zone
            && self
                .state
                .progress
                .lap_covered(&self.checkpoints, self.rules.coverage_min_checkpoints)
            && self.since_lap_start(now) >= self.rules.min_lap_time()
        {
            events.push(self.complete_lap(now));
        }

        events
    }

    fn since_lap_start(&self, now: Instant) -> Duration {
        self.state
            .last_lap_completion
            .map(|stamp| now.saturating_duration_since(stamp))
            .unwrap_or(Duration::ZERO)
    }

    fn start_timer(&mut self, now: Instant) {
        self.state.timer_active = true;
        self.state.current_elapsed_ms = 0;
        self.state.progress.begin(&self.checkpoints);
        self.state.last_lap_completion = Some(now);
        if self.state.lap_count == 0 {
            self.state.lap_count = 1;
        }
        self.clock.start(now);

        info!(lap = self.state.lap_count, "timer started");
    }

    fn go_off_track(&mut self, status: TrackStatus) {
        self.state.is_on_track = false;
        self.state.timer_active = false;
        self.state.current_elapsed_ms = 0;
        self.state.progress.clear();
        self.clock.stop();

        warn!(
            reason = status.describe(),
            "off track, lap timer reset; return to start/finish to restart"
        );
    }

    fn complete_lap(&mut self, now: Instant) -> LapEvent {
        let lap_time_ms = as_millis(self.since_lap_start(now));
        let personal_best = self
            .state
            .best_time_ms
            .map_or(true, |best| lap_time_ms < best);

        if personal_best {
            self.state.best_time_ms = Some(lap_time_ms);
            self.store.save(lap_time_ms);
        }

        let lap = self.state.lap_count;
        info!(lap, lap_time_ms, personal_best, "lap completed");

        self.state.lap_count += 1;
        self.state.current_elapsed_ms = 0;
        self.state.progress.begin(&self.checkpoints);
        self.state.last_lap_completion = Some(now);
        self.clock.start(now);

        LapEvent::LapCompleted {
            lap,
            lap_time_ms,
            personal_best,
        }
    }
}

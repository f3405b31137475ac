use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::DVec3;
use laptimer_core::Settings;
use laptimer_sim::best_time::MemoryStore;
use laptimer_sim::checkpoints::CheckpointSet;
use laptimer_sim::classifier::{OnTrackClassifier, TrackEnvelope};
use laptimer_sim::hud;
use laptimer_sim::lap_timer::LapEvent;
use laptimer_sim::progress::TimerPhase;
use laptimer_sim::session::LapSession;

// drives the session from outside the crate, the way a render loop links against it
#[test]
fn render_loop_can_drive_a_session() {
    let settings = Settings::defaults().unwrap();
    let checkpoints = Arc::new(CheckpointSet::portfolio());
    let start = checkpoints.start().position;

    let classifier =
        OnTrackClassifier::new(TrackEnvelope::from_settings(&settings), checkpoints.clone());
    assert!(classifier.is_on_track(start));
    assert!(!classifier.is_on_track(start + DVec3::new(0.0, 20.0, 0.0)));

    let mut session = LapSession::from_settings(checkpoints, &settings, MemoryStore::with_best(42_000));
    assert_eq!(session.timer().phase(), TimerPhase::Idle);

    let t0 = Instant::now();
    let report = session.on_frame(start, t0);
    assert_eq!(report.events, vec![LapEvent::TimerStarted]);
    assert_eq!(session.timer().phase(), TimerPhase::Timing);

    let record = report.record.unwrap();
    assert_eq!(session.latest(), &record);
    assert_eq!(record.best_time, Some(42_000));
    assert!(hud::render(&record).starts_with("00:00.00 | Best: 00:42.00 | Lap 1"));

    session.on_frame(start, t0 + Duration::from_millis(250));
    assert_eq!(session.frames_seen(), 2);
    assert_eq!(session.timer().store().save_count(), 0);

    session.shutdown();
    assert!(session.is_closed());
}

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use laptimer_core::track::TrackPath;
use laptimer_core::GLOBAL_CONFIG;
use tracing::info;
use tracing_subscriber::EnvFilter;

use laptimer_sim::best_time::FileStore;
use laptimer_sim::checkpoints::CheckpointSet;
use laptimer_sim::driver::ScriptedDriver;
use laptimer_sim::game::FrameLoop;
use laptimer_sim::session::LapSession;

const TRACK_START_RADIUS: f64 = 25.0;
const TRACK_GATE_RADIUS: f64 = 30.0;

fn load_course() -> anyhow::Result<(TrackPath, CheckpointSet)> {
    match &GLOBAL_CONFIG.track_file {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            let track = TrackPath::from_yaml(&text).with_context(|| format!("parsing {}", path))?;
            let checkpoints = CheckpointSet::from_track(
                &track,
                track.waypoints()[0],
                TRACK_START_RADIUS,
                TRACK_GATE_RADIUS,
            )?;
            info!(path = %path, waypoints = track.len(), "loaded track");
            Ok((track, checkpoints))
        }
        None => Ok((TrackPath::default_circuit(), CheckpointSet::portfolio())),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = &*GLOBAL_CONFIG;
    let (track, checkpoints) = load_course()?;
    info!(
        checkpoints = checkpoints.len(),
        length = track.approximate_length(256),
        policy = ?settings.progress_policy,
        "course ready"
    );

    let start = checkpoints.start().position;
    let store = FileStore::new(&settings.best_time_path, &settings.best_time_key);
    let session = LapSession::from_settings(Arc::new(checkpoints), settings, store);
    let driver = ScriptedDriver::from_settings(track, start, settings);

    let summary = FrameLoop::new(session, driver, settings)
        .run(Duration::from_secs(settings.sim_duration_seconds));

    info!(
        frames = summary.frames,
        laps = summary.lap_times.len(),
        resets = summary.resets,
        best_ms = ?summary.best_time,
        "run finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary.final_record)?);

    Ok(())
}

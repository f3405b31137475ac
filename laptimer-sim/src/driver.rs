use std::time::Duration;

use glam::DVec3;
use laptimer_core::track::TrackPath;
use laptimer_core::Settings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// height of the car body above the road surface
const RIDE_HEIGHT: f64 = 0.5;

// A stretch of the run where the car is thrown into the air
#[derive(Clone, Copy, Debug)]
pub struct Excursion {
    pub at: Duration,
    pub length: Duration,
    pub height: f64,
}

impl Excursion {
    fn covers(&self, elapsed: Duration) -> bool {
        elapsed >= self.at && elapsed < self.at + self.length
    }
}

/// Stand-in for the physics collaborator: drives the racing line at a
/// constant lap pace, starting from the waypoint closest to the start line.
pub struct ScriptedDriver {
    track: TrackPath,
    lap_time: Duration,
    start_fraction: f64,
    jitter: f64,
    rng: StdRng,
    excursions: Vec<Excursion>,
}

impl ScriptedDriver {
    pub fn new(
        track: TrackPath,
        start_position: DVec3,
        lap_time: Duration,
        jitter: f64,
        seed: u64,
    ) -> Self {
        let start_fraction = track.nearest_waypoint(start_position) as f64 / track.len() as f64;
        Self {
            track,
            lap_time,
            start_fraction,
            jitter: jitter.abs(),
            rng: StdRng::seed_from_u64(seed),
            excursions: Vec::new(),
        }
    }

    pub fn from_settings(track: TrackPath, start_position: DVec3, settings: &Settings) -> Self {
        Self::new(
            track,
            start_position,
            Duration::from_secs_f64(settings.sim_lap_seconds.max(0.1)),
            settings.sim_jitter,
            settings.sim_seed,
        )
    }

    pub fn with_excursion(mut self, excursion: Excursion) -> Self {
        self.excursions.push(excursion);
        self
    }

    pub fn position_at(&mut self, elapsed: Duration) -> DVec3 {
        let laps = elapsed.as_secs_f64() / self.lap_time.as_secs_f64();
        let mut position = self.track.point_at(self.start_fraction + laps);
        position.y += RIDE_HEIGHT;

        if self.jitter > 0.0 {
            position.x += self.rng.gen_range(-self.jitter..=self.jitter);
            position.z += self.rng.gen_range(-self.jitter..=self.jitter);
        }

        for excursion in &self.excursions {
            if excursion.covers(elapsed) {
                position.y += excursion.height;
            }
        }

        position
    }
}

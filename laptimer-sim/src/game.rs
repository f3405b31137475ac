use std::thread;
use std::time::{Duration, Instant};

use laptimer_core::lap_info::{Millis, TimingRecord};
use laptimer_core::Settings;
use tracing::warn;

use crate::best_time::BestTimeStore;
use crate::driver::ScriptedDriver;
use crate::hud;
use crate::lap_timer::LapEvent;
use crate::session::LapSession;

#[derive(Debug, Default)]
pub struct RunSummary {
    pub frames: u64,
    pub lap_times: Vec<Millis>,
    pub best_time: Option<Millis>,
    pub resets: usize,
    pub final_record: TimingRecord,
}

// Drives a lap session the way the render loop would: one car position per
// frame, HUD redrawn whenever the session emits a record
pub struct FrameLoop<S: BestTimeStore> {
    session: LapSession<S>,
    driver: ScriptedDriver,
    frame_duration: Duration,
    realtime: bool,
    print_hud: bool,
}

impl<S: BestTimeStore> FrameLoop<S> {
    pub fn new(session: LapSession<S>, driver: ScriptedDriver, settings: &Settings) -> Self {
        FrameLoop {
            session,
            driver,
            frame_duration: Duration::from_secs_f64(1.0 / settings.frame_rate_hz.max(1) as f64),
            realtime: settings.realtime,
            print_hud: true,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.print_hud = false;
        self
    }

    pub fn session(&self) -> &LapSession<S> {
        &self.session
    }

    // runs for `duration` of simulated time, then tears the session down
    pub fn run(&mut self, duration: Duration) -> RunSummary {
        let origin = Instant::now();
        let total_frames = (duration.as_secs_f64() / self.frame_duration.as_secs_f64()) as u64;
        let mut summary = RunSummary::default();

        for frame in 0..total_frames {
            let tick_start = Instant::now();
            let sim_time = self.frame_duration.mul_f64(frame as f64);
            let now = if self.realtime {
                tick_start
            } else {
                origin + sim_time
            };

            let position = self.driver.position_at(now.saturating_duration_since(origin));
            let report = self.session.on_frame(position, now);

            for event in &report.events {
                match event {
                    LapEvent::LapCompleted { lap_time_ms, .. } => {
                        summary.lap_times.push(*lap_time_ms);
                        if self.print_hud {
                            println!("lap finished in {}", hud::format_lap_time(*lap_time_ms));
                        }
                    }
                    LapEvent::WentOffTrack(_) => summary.resets += 1,
                    _ => {}
                }
            }

            if let Some(record) = &report.record {
                if self.print_hud {
                    println!("{}", hud::render(record));
                }
            }

            summary.frames += 1;

            // wait until the frame time has elapsed
            if self.realtime {
                match self.frame_duration.checked_sub(tick_start.elapsed()) {
                    Some(remaining) => thread::sleep(remaining),
                    None => warn!(frame, "frame took longer than the configured frame time"),
                }
            }
        }

        self.session.shutdown();

        let timer = self.session.timer();
        summary.best_time = timer.state().best_time_ms;
        summary.final_record = timer.record();
        summary
    }
}

pub mod best_time;
pub mod checkpoints;
pub mod classifier;
pub mod driver;
pub mod game;
pub mod hud;
pub mod lap_timer;
pub mod progress;
pub mod sample_clock;
pub mod session;

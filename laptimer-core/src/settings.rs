use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File, Source};
use lazy_static::lazy_static;
use serde::Deserialize;

// Which rule decides that a lap has been driven
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPolicy {
    // every checkpoint, strictly in ordinal order
    Sequential,
    // enough distinct checkpoints, in any order
    Coverage,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    // frame loop
    pub frame_rate_hz: u64,
    pub eval_stride: u32,

    // lap state machine
    pub off_track_debounce_frames: u32,
    pub sample_interval_ms: u64,
    pub emit_interval_ms: u64,
    pub lap_guard_ms: u64,
    pub progress_policy: ProgressPolicy,
    pub coverage_min_checkpoints: usize,
    pub coverage_min_lap_ms: u64,
    pub coverage_leave_distance: f64,

    // on-track envelope
    pub floor_y: f64,
    pub ceiling_y: f64,
    pub playfield_half_extent: f64,
    pub track_margin: f64,

    // persistence
    pub best_time_path: String,
    pub best_time_key: String,

    // driver binary
    #[serde(default)]
    pub track_file: Option<String>,
    pub sim_lap_seconds: f64,
    pub sim_duration_seconds: u64,
    pub sim_jitter: f64,
    pub sim_seed: u64,
    pub realtime: bool,
}

impl Settings {
    fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("frame_rate_hz", 60)?
            .set_default("eval_stride", 1)?
            .set_default("off_track_debounce_frames", 15)?
            .set_default("sample_interval_ms", 100)?
            .set_default("emit_interval_ms", 100)?
            .set_default("lap_guard_ms", 3000)?
            .set_default("progress_policy", "sequential")?
            .set_default("coverage_min_checkpoints", 5)?
            .set_default("coverage_min_lap_ms", 10000)?
            .set_default("coverage_leave_distance", 15.0)?
            .set_default("floor_y", -0.5)?
            .set_default("ceiling_y", 6.0)?
            .set_default("playfield_half_extent", 45.0)?
            .set_default("track_margin", 5.0)?
            .set_default("best_time_path", "best_time.json")?
            .set_default("best_time_key", "carRaceBestTime")?
            .set_default("sim_lap_seconds", 20.0)?
            .set_default("sim_duration_seconds", 90)?
            .set_default("sim_jitter", 0.5)?
            .set_default("sim_seed", 7)?
            .set_default("realtime", false)
    }

    /// Built-in values only; no file or environment lookups.
    pub fn defaults() -> Result<Settings, ConfigError> {
        Self::with_defaults()?.build()?.try_deserialize()
    }

    // later sources win: defaults, then the file, then the environment
    fn layered<F>(file: F, env: Environment) -> Result<Settings, ConfigError>
    where
        F: Source + Send + Sync + 'static,
    {
        Self::with_defaults()?
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    fn new() -> Result<Settings, ConfigError> {
        Self::layered(
            File::with_name("config.yaml").required(false),
            Environment::with_prefix("LAPTIMER"),
        )
    }
}

lazy_static! {
    pub static ref GLOBAL_CONFIG: Settings = Settings::new().expect("failed to read config file");
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    #[test]
    fn defaults_match_reference_thresholds() {
        let settings = Settings::defaults().unwrap();
        assert_eq!(settings.off_track_debounce_frames, 15);
        assert_eq!(settings.sample_interval_ms, 100);
        assert_eq!(settings.lap_guard_ms, 3000);
        assert_eq!(settings.progress_policy, ProgressPolicy::Sequential);
        assert_eq!(settings.floor_y, -0.5);
        assert_eq!(settings.ceiling_y, 6.0);
        assert_eq!(settings.playfield_half_extent, 45.0);
        assert_eq!(settings.track_margin, 5.0);
        assert_eq!(settings.best_time_key, "carRaceBestTime");
        assert!(settings.track_file.is_none());
    }

    #[test]
    fn environment_overrides_file_overrides_defaults() {
        let file = File::from_str(
            "eval_stride: 4\nlap_guard_ms: 5000\nprogress_policy: coverage\n",
            FileFormat::Yaml,
        );
        let env = Environment::with_prefix("LAPTIMER").source(Some(
            [
                ("LAPTIMER_LAP_GUARD_MS", "2500"),
                ("LAPTIMER_BEST_TIME_PATH", "/tmp/laps.json"),
            ]
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        ));

        let settings = Settings::layered(file, env).unwrap();
        // untouched default
        assert_eq!(settings.off_track_debounce_frames, 15);
        // file only
        assert_eq!(settings.eval_stride, 4);
        assert_eq!(settings.progress_policy, ProgressPolicy::Coverage);
        // file and environment, environment wins
        assert_eq!(settings.lap_guard_ms, 2500);
        // environment only
        assert_eq!(settings.best_time_path, "/tmp/laps.json");
    }
}

pub mod lap_info;
mod settings;
pub mod track;

pub use settings::{ProgressPolicy, Settings, GLOBAL_CONFIG};

use serde::{Deserialize, Serialize};

pub type LapNumber = u32;
pub type Ordinal = usize;
pub type Millis = u64;

// TimingRecord is the only thing the timing core hands to the HUD; it is a
// copy of the state at one instant and never a handle back into it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimingRecord {
    pub current_time: Millis,
    pub best_time: Option<Millis>,
    pub is_on_track: bool,
    pub lap_count: LapNumber,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_checkpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub checkpoint_progress: Option<String>,
}

impl TimingRecord {
    pub fn new() -> Self {
        TimingRecord {
            current_time: 0,
            best_time: None,
            is_on_track: true,
            lap_count: 0,
            next_checkpoint: None,
            checkpoint_progress: None,
        }
    }
}

impl Default for TimingRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_hud_field_names() {
        let record = TimingRecord {
            current_time: 12_340,
            best_time: Some(11_000),
            lap_count: 2,
            next_checkpoint: Some("South".to_string()),
            ..TimingRecord::new()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["currentTime"], 12_340);
        assert_eq!(json["bestTime"], 11_000);
        assert_eq!(json["isOnTrack"], true);
        assert_eq!(json["lapCount"], 2);
        assert_eq!(json["nextCheckpoint"], "South");
        assert!(json.get("checkpointProgress").is_none());
    }

    #[test]
    fn absent_best_time_is_null() {
        let json = serde_json::to_value(&TimingRecord::new()).unwrap();
        assert!(json["bestTime"].is_null());
    }
}

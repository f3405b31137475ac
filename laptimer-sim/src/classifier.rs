use std::sync::Arc;

use glam::DVec3;
use laptimer_core::Settings;

use crate::checkpoints::CheckpointSet;

// Why a position does or does not count as being on the track. Rules are
// checked in declaration order and the first one that fails is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStatus {
    OnTrack,
    BelowFloor,
    Airborne,
    OutsidePlayfield,
    AwayFromTrack,
}

impl TrackStatus {
    pub fn is_on_track(self) -> bool {
        self == TrackStatus::OnTrack
    }

    pub fn describe(self) -> &'static str {
        match self {
            TrackStatus::OnTrack => "on track",
            TrackStatus::BelowFloor => "fell through the floor",
            TrackStatus::Airborne => "airborne",
            TrackStatus::OutsidePlayfield => "left the playfield",
            TrackStatus::AwayFromTrack => "too far from the road",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TrackEnvelope {
    pub floor_y: f64,
    pub ceiling_y: f64,
    pub half_extent: f64,
    pub margin: f64,
}

impl TrackEnvelope {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            floor_y: settings.floor_y,
            ceiling_y: settings.ceiling_y,
            half_extent: settings.playfield_half_extent,
            margin: settings.track_margin,
        }
    }
}

/// Approximates "near the ribbon of the road" by planar proximity to any
/// checkpoint, inside a fixed playfield box.
#[derive(Clone, Debug)]
pub struct OnTrackClassifier {
    envelope: TrackEnvelope,
    checkpoints: Arc<CheckpointSet>,
}

impl OnTrackClassifier {
    pub fn new(envelope: TrackEnvelope, checkpoints: Arc<CheckpointSet>) -> Self {
        Self {
            envelope,
            checkpoints,
        }
    }

    pub fn classify(&self, position: DVec3) -> TrackStatus {
        let envelope = &self.envelope;

        if position.y < envelope.floor_y {
            return TrackStatus::BelowFloor;
        }
        if position.y > envelope.ceiling_y {
            return TrackStatus::Airborne;
        }
        if position.x.abs() > envelope.half_extent || position.z.abs() > envelope.half_extent {
            return TrackStatus::OutsidePlayfield;
        }

        let near_track = self.checkpoints.iter().any(|checkpoint| {
            let dx = position.x - checkpoint.position.x;
            let dz = position.z - checkpoint.position.z;
            let reach = checkpoint.radius + envelope.margin;
            dx * dx + dz * dz < reach * reach
        });

        if near_track {
            TrackStatus::OnTrack
        } else {
            TrackStatus::AwayFromTrack
        }
    }

    pub fn is_on_track(&self, position: DVec3) -> bool {
        self.classify(position).is_on_track()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoints::Checkpoint;

    fn envelope() -> TrackEnvelope {
        TrackEnvelope {
            floor_y: -0.5,
            ceiling_y: 6.0,
            half_extent: 45.0,
            margin: 5.0,
        }
    }

    fn single_gate_classifier() -> OnTrackClassifier {
        let set = CheckpointSet::new(vec![Checkpoint::start(DVec3::new(10.0, 0.0, 0.0), 10.0)])
            .unwrap();
        OnTrackClassifier::new(envelope(), Arc::new(set))
    }

    #[test]
    fn vertical_bounds_come_first() {
        let classifier = single_gate_classifier();
        assert_eq!(
            classifier.classify(DVec3::new(10.0, -0.6, 0.0)),
            TrackStatus::BelowFloor
        );
        assert_eq!(
            classifier.classify(DVec3::new(10.0, 6.1, 0.0)),
            TrackStatus::Airborne
        );
        // airborne wins over being outside the playfield
        assert_eq!(
            classifier.classify(DVec3::new(100.0, 10.0, 0.0)),
            TrackStatus::Airborne
        );
        assert!(classifier.is_on_track(DVec3::new(10.0, 6.0, 0.0)));
        assert!(classifier.is_on_track(DVec3::new(10.0, -0.5, 0.0)));
    }

    #[test]
    fn horizontal_bounds_clip_the_playfield() {
        let set = CheckpointSet::new(vec![Checkpoint::start(DVec3::new(40.0, 0.0, 0.0), 20.0)])
            .unwrap();
        let classifier = OnTrackClassifier::new(envelope(), Arc::new(set));

        assert!(classifier.is_on_track(DVec3::new(45.0, 0.0, 0.0)));
        assert_eq!(
            classifier.classify(DVec3::new(45.1, 0.0, 0.0)),
            TrackStatus::OutsidePlayfield
        );
        assert_eq!(
            classifier.classify(DVec3::new(40.0, 0.0, -45.5)),
            TrackStatus::OutsidePlayfield
        );
    }

    #[test]
    fn proximity_uses_radius_plus_margin_on_the_ground_plane() {
        let classifier = single_gate_classifier();

        // 14.9 away in the plane, inside 10 + 5
        assert!(classifier.is_on_track(DVec3::new(24.9, 0.0, 0.0)));
        // exactly on the boundary is outside
        assert_eq!(
            classifier.classify(DVec3::new(25.0, 0.0, 0.0)),
            TrackStatus::AwayFromTrack
        );
        // height does not count towards proximity
        assert!(classifier.is_on_track(DVec3::new(10.0, 5.0, 14.0)));
    }

    #[test]
    fn any_checkpoint_keeps_the_car_on_track() {
        let set = CheckpointSet::portfolio();
        let classifier = OnTrackClassifier::new(envelope(), Arc::new(set));

        assert!(classifier.is_on_track(DVec3::new(-25.0, 0.5, 5.0)));
        assert!(classifier.is_on_track(DVec3::new(-5.0, 0.5, 40.0)));
        assert_eq!(
            classifier.classify(DVec3::new(44.0, 0.5, 44.0)),
            TrackStatus::AwayFromTrack
        );
    }
}

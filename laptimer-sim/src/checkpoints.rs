use std::fmt;

use glam::DVec3;
use laptimer_core::lap_info::Ordinal;
use laptimer_core::track::TrackPath;

#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub ordinal: Ordinal,
    pub position: DVec3,
    pub radius: f64,
    pub is_start: bool,
    pub name: String,
}

impl Checkpoint {
    pub fn start(position: DVec3, radius: f64) -> Self {
        Self {
            ordinal: 0,
            position,
            radius,
            is_start: true,
            name: String::from("START/FINISH"),
        }
    }

    pub fn gate(ordinal: Ordinal, name: &str, position: DVec3, radius: f64) -> Self {
        Self {
            ordinal,
            position,
            radius,
            is_start: false,
            name: name.to_string(),
        }
    }

    pub fn contains(&self, point: DVec3) -> bool {
        self.position.distance(point) < self.radius
    }
}

#[derive(Debug, PartialEq)]
pub enum CheckpointError {
    Empty,
    MissingStart,
    MisplacedStart(Ordinal),
    DuplicateStart(Ordinal),
    OrdinalMismatch { index: usize, ordinal: Ordinal },
    InvalidRadius { ordinal: Ordinal, radius: f64 },
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Empty => write!(f, "checkpoint set is empty"),
            CheckpointError::MissingStart => write!(f, "no start/finish checkpoint"),
            CheckpointError::MisplacedStart(ordinal) => {
                write!(f, "start/finish must be ordinal 0, found at {}", ordinal)
            }
            CheckpointError::DuplicateStart(ordinal) => {
                write!(f, "second start/finish checkpoint at ordinal {}", ordinal)
            }
            CheckpointError::OrdinalMismatch { index, ordinal } => {
                write!(f, "checkpoint at index {} has ordinal {}", index, ordinal)
            }
            CheckpointError::InvalidRadius { ordinal, radius } => {
                write!(f, "checkpoint {} has invalid radius {}", ordinal, radius)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

/// Ordered gates around the track. Ordinal 0 is always the start/finish
/// line; the rest must be visited in increasing ordinal order.
#[derive(Clone, Debug)]
pub struct CheckpointSet {
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointSet {
    pub fn new(checkpoints: Vec<Checkpoint>) -> Result<Self, CheckpointError> {
        if checkpoints.is_empty() {
            return Err(CheckpointError::Empty);
        }

        let mut start_seen = false;
        for (index, checkpoint) in checkpoints.iter().enumerate() {
            if checkpoint.ordinal != index {
                return Err(CheckpointError::OrdinalMismatch {
                    index,
                    ordinal: checkpoint.ordinal,
                });
            }
            if !checkpoint.radius.is_finite() || checkpoint.radius <= 0.0 {
                return Err(CheckpointError::InvalidRadius {
                    ordinal: checkpoint.ordinal,
                    radius: checkpoint.radius,
                });
            }
            if checkpoint.is_start {
                if index != 0 {
                    return Err(if start_seen {
                        CheckpointError::DuplicateStart(index)
                    } else {
                        CheckpointError::MisplacedStart(index)
                    });
                }
                start_seen = true;
            }
        }

        if !start_seen {
            return Err(CheckpointError::MissingStart);
        }

        Ok(Self { checkpoints })
    }

    // One gate per waypoint, starting after the waypoint closest to the start
    // line so that the final gate leads back onto the start straight
    pub fn from_track(
        track: &TrackPath,
        start_position: DVec3,
        start_radius: f64,
        gate_radius: f64,
    ) -> Result<Self, CheckpointError> {
        let waypoints = track.waypoints();
        let first = (track.nearest_waypoint(start_position) + 1) % waypoints.len();

        let mut checkpoints = vec![Checkpoint::start(start_position, start_radius)];
        for i in 0..waypoints.len() {
            let ordinal = i + 1;
            checkpoints.push(Checkpoint::gate(
                ordinal,
                &format!("Checkpoint {}", ordinal),
                waypoints[(first + i) % waypoints.len()],
                gate_radius,
            ));
        }

        Self::new(checkpoints)
    }

    // the gates used on the portfolio circuit; radii cover the full road width
    pub fn portfolio() -> Self {
        let gates = [
            ("First Corner", DVec3::new(-5.0, 0.0, -5.0), 30.0),
            ("South", DVec3::new(0.0, 0.0, -30.0), 35.0),
            ("Southeast", DVec3::new(20.0, 0.0, -10.0), 30.0),
            ("East Mid", DVec3::new(20.0, 0.0, 0.0), 30.0),
            ("Northeast", DVec3::new(15.0, 0.0, 10.0), 30.0),
            ("North", DVec3::new(5.0, 0.0, 20.0), 30.0),
            ("Far North", DVec3::new(-5.0, 0.0, 35.0), 35.0),
            ("West", DVec3::new(-20.0, 0.0, 5.0), 30.0),
        ];

        let mut checkpoints = vec![Checkpoint::start(DVec3::new(-25.0, 0.0, 5.0), 25.0)];
        for (i, (name, position, radius)) in gates.iter().enumerate() {
            checkpoints.push(Checkpoint::gate(i + 1, name, *position, *radius));
        }

        Self { checkpoints }
    }

    pub fn start(&self) -> &Checkpoint {
        &self.checkpoints[0]
    }

    pub fn get(&self, ordinal: Ordinal) -> Option<&Checkpoint> {
        self.checkpoints.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    // number of checkpoints a lap must pass besides start/finish
    pub fn gate_count(&self) -> usize {
        self.checkpoints.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter()
    }

    pub fn gates(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter().skip(1)
    }
}

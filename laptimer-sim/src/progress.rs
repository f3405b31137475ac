use std::collections::BTreeSet;

use glam::DVec3;
use laptimer_core::lap_info::Ordinal;
use laptimer_core::ProgressPolicy;

use crate::checkpoints::CheckpointSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerPhase {
    // never started this session
    Idle,
    Timing,
    // lap invalidated, waiting for the car to come back to start/finish
    OffTrack,
}

// How far the car has come around the current lap
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointProgress {
    // `next` is the only gate that counts; 0 means the lap closes at start/finish
    Sequential {
        next: Ordinal,
    },
    Coverage {
        visited: BTreeSet<Ordinal>,
        left_start: bool,
    },
}

impl CheckpointProgress {
    // a cleared cursor points at the first gate, never at start/finish
    pub fn cleared(policy: ProgressPolicy) -> Self {
        match policy {
            ProgressPolicy::Sequential => CheckpointProgress::Sequential { next: 1 },
            ProgressPolicy::Coverage => CheckpointProgress::Coverage {
                visited: BTreeSet::new(),
                left_start: false,
            },
        }
    }

    pub fn policy(&self) -> ProgressPolicy {
        match self {
            CheckpointProgress::Sequential { .. } => ProgressPolicy::Sequential,
            CheckpointProgress::Coverage { .. } => ProgressPolicy::Coverage,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::cleared(self.policy());
    }

    // fresh lap: the first gate after start/finish is the target
    pub fn begin(&mut self, checkpoints: &CheckpointSet) {
        self.clear();
        if let CheckpointProgress::Sequential { next } = self {
            *next = if checkpoints.gate_count() > 0 { 1 } else { 0 };
        }
    }

    /// Records the gates captured at `position` and returns their ordinals.
    /// The sequential policy captures at most one gate per call.
    pub fn advance(
        &mut self,
        position: DVec3,
        checkpoints: &CheckpointSet,
        leave_distance: f64,
    ) -> Vec<Ordinal> {
        match self {
            CheckpointProgress::Sequential { next } => {
                if *next == 0 {
                    return Vec::new();
                }
                match checkpoints.get(*next) {
                    Some(target) if target.contains(position) => {
                        let reached = *next;
                        *next += 1;
                        if *next >= checkpoints.len() {
                            *next = 0;
                        }
                        vec![reached]
                    }
                    _ => Vec::new(),
                }
            }
            CheckpointProgress::Coverage {
                visited,
                left_start,
            } => {
                if checkpoints.start().position.distance(position) > leave_distance {
                    *left_start = true;
                }
                checkpoints
                    .gates()
                    .filter(|gate| gate.contains(position))
                    .filter_map(|gate| visited.insert(gate.ordinal).then(|| gate.ordinal))
                    .collect()
            }
        }
    }

    // whether enough of the lap has been driven for start/finish to close it
    pub fn lap_covered(&self, checkpoints: &CheckpointSet, min_coverage: usize) -> bool {
        match self {
            CheckpointProgress::Sequential { next } => *next == 0,
            CheckpointProgress::Coverage {
                visited,
                left_start,
            } => *left_start && visited.len() >= min_coverage.min(checkpoints.gate_count()),
        }
    }

    pub fn next_label(&self, checkpoints: &CheckpointSet) -> Option<String> {
        match self {
            CheckpointProgress::Sequential { next } => {
                checkpoints.get(*next).map(|target| target.name.clone())
            }
            CheckpointProgress::Coverage { .. } => None,
        }
    }

    pub fn progress_label(&self, checkpoints: &CheckpointSet) -> String {
        let done = match self {
            CheckpointProgress::Sequential { next: 0 } => checkpoints.gate_count(),
            CheckpointProgress::Sequential { next } => next - 1,
            CheckpointProgress::Coverage { visited, .. } => visited.len(),
        };
        format!("Checkpoints: {}/{}", done, checkpoints.gate_count())
    }
}

use std::fmt;

use glam::DVec3;

pub type Waypoint = DVec3;

#[derive(Debug)]
pub enum TrackError {
    TooFewWaypoints(usize),
    Parse(serde_yaml::Error),
}

impl From<serde_yaml::Error> for TrackError {
    fn from(err: serde_yaml::Error) -> Self {
        TrackError::Parse(err)
    }
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::TooFewWaypoints(n) => {
                write!(f, "a closed track needs at least 3 waypoints, got {}", n)
            }
            TrackError::Parse(e) => write!(f, "invalid track file: {}", e),
        }
    }
}

impl std::error::Error for TrackError {}

/// Closed racing line through an ordered list of waypoints.
///
/// The curve between waypoints is a uniform Catmull-Rom spline that wraps
/// from the last waypoint back to the first.
#[derive(Clone, Debug)]
pub struct TrackPath {
    waypoints: Vec<Waypoint>,
}

impl TrackPath {
    pub fn new(waypoints: Vec<Waypoint>) -> Result<TrackPath, TrackError> {
        if waypoints.len() < 3 {
            return Err(TrackError::TooFewWaypoints(waypoints.len()));
        }
        Ok(TrackPath { waypoints })
    }

    /// Parses a YAML sequence of `[x, y, z]` triples.
    pub fn from_yaml(text: &str) -> Result<TrackPath, TrackError> {
        let waypoints: Vec<DVec3> = serde_yaml::from_str(text)?;
        TrackPath::new(waypoints)
    }

    // the layout of the portfolio circuit, at ground level
    pub fn default_circuit() -> TrackPath {
        TrackPath {
            waypoints: vec![
                DVec3::new(0.0, 0.0, -30.0),
                DVec3::new(20.0, 0.0, -10.0),
                DVec3::new(20.0, 0.0, 0.0),
                DVec3::new(15.0, 0.0, 10.0),
                DVec3::new(5.0, 0.0, 20.0),
                DVec3::new(-5.0, 0.0, 35.0),
                DVec3::new(-20.0, 0.0, 5.0),
                DVec3::new(-5.0, 0.0, -5.0),
            ],
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn nearest_waypoint(&self, point: DVec3) -> usize {
        self.waypoints
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.distance_squared(point)
                    .total_cmp(&b.distance_squared(point))
            })
            .map(|(index, _)| index)
            .unwrap_or(0)
    }

    /// Point on the closed curve at lap fraction `t`; `t` wraps modulo 1.
    pub fn point_at(&self, t: f64) -> DVec3 {
        let n = self.waypoints.len();
        let scaled = t.rem_euclid(1.0) * n as f64;
        let segment = (scaled.floor() as usize).min(n - 1);
        let u = scaled - segment as f64;

        let p0 = self.waypoints[(segment + n - 1) % n];
        let p1 = self.waypoints[segment];
        let p2 = self.waypoints[(segment + 1) % n];
        let p3 = self.waypoints[(segment + 2) % n];

        let u2 = u * u;
        let u3 = u2 * u;
        0.5 * ((2.0 * p1)
            + (p2 - p0) * u
            + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * u2
            + (3.0 * p1 - p0 - 3.0 * p2 + p3) * u3)
    }

    // chord length of the curve sampled at `samples` evenly spaced points
    pub fn approximate_length(&self, samples: usize) -> f64 {
        let samples = samples.max(self.waypoints.len());
        let mut previous = self.point_at(0.0);
        let mut length = 0.0;
        for i in 1..=samples {
            let next = self.point_at(i as f64 / samples as f64);
            length += previous.distance(next);
            previous = next;
        }
        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_tracks() {
        let two = vec![DVec3::ZERO, DVec3::X];
        assert!(matches!(
            TrackPath::new(two),
            Err(TrackError::TooFewWaypoints(2))
        ));
    }

    #[test]
    fn curve_passes_through_waypoints() {
        let track = TrackPath::default_circuit();
        let n = track.len();
        for (k, waypoint) in track.waypoints().iter().enumerate() {
            let on_curve = track.point_at(k as f64 / n as f64);
            assert!(on_curve.abs_diff_eq(*waypoint, 1e-9), "waypoint {}", k);
        }
    }

    #[test]
    fn curve_is_closed() {
        let track = TrackPath::default_circuit();
        assert!(track.point_at(1.0).abs_diff_eq(track.point_at(0.0), 1e-9));
        assert!(track.point_at(-0.25).abs_diff_eq(track.point_at(0.75), 1e-9));
        assert!(track.point_at(0.999_999).abs_diff_eq(track.point_at(0.0), 1e-3));
    }

    #[test]
    fn nearest_waypoint_to_start_line_is_west_corner() {
        let track = TrackPath::default_circuit();
        assert_eq!(track.nearest_waypoint(DVec3::new(-25.0, 0.0, 5.0)), 6);
    }

    #[test]
    fn length_is_at_least_the_polygon_perimeter() {
        let track = TrackPath::default_circuit();
        let points = track.waypoints();
        let perimeter: f64 = (0..points.len())
            .map(|i| points[i].distance(points[(i + 1) % points.len()]))
            .sum();
        assert!(track.approximate_length(2000) >= perimeter - 1e-6);
    }

    #[test]
    fn loads_waypoints_from_yaml() {
        let track = TrackPath::from_yaml("- [0, 0, 0]\n- [10, 0, 0]\n- [10.5, 0, 10]\n").unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.waypoints()[2], DVec3::new(10.5, 0.0, 10.0));

        assert!(TrackPath::from_yaml("- [0, 0, 0]\n").is_err());
        assert!(TrackPath::from_yaml("not: [a, track]").is_err());
    }
}

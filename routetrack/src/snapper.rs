//! Nearest-segment route snapping.
//!
//! [`RouteSnapper`] classifies each fix as on-route or off-route by
//! projecting it onto every route segment and keeping the closest
//! projection. Projecting onto segments rather than measuring to vertices
//! keeps the snapped position stable when waypoints are dense or uneven.

use serde::Serialize;

use crate::config::DEFAULT_SNAP_THRESHOLD_M;
use crate::geo::{self, Coordinate, PlanarPoint};
use crate::location::LocationSample;

/// Outcome of snapping one fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrackingStatus {
    /// The fix is within the threshold of the route.
    OnTrack {
        /// Closest point on the route.
        snapped: Coordinate,
        /// `snapped` followed by every vertex after its segment.
        remaining_path: Vec<Coordinate>,
        /// Index of the segment the fix snapped onto.
        segment_index: usize,
        /// Distance in meters from the fix to `snapped`.
        deviation_m: f64,
    },
    /// The fix is too far from the route (or the route is empty).
    OutOfRoute {
        /// Distance in meters to the closest route point; infinite for an empty route.
        deviation_m: f64,
    },
}

impl TrackingStatus {
    pub fn is_on_track(&self) -> bool {
        matches!(self, TrackingStatus::OnTrack { .. })
    }
}

/// Snaps fixes onto a fixed route.
#[derive(Debug, Clone)]
pub struct RouteSnapper {
    route: Vec<Coordinate>,
    projected: Vec<PlanarPoint>,
    threshold: f64,
}

impl RouteSnapper {
    /// Create a snapper with the default 30m threshold.
    pub fn new(route: Vec<Coordinate>) -> Self {
        Self::with_threshold(route, DEFAULT_SNAP_THRESHOLD_M)
    }

    /// Create a snapper with an explicit on-route threshold in meters.
    pub fn with_threshold(route: Vec<Coordinate>, threshold: f64) -> Self {
        let projected = route.iter().copied().map(PlanarPoint::project).collect();
        Self {
            route,
            projected,
            threshold,
        }
    }

    /// The route being tracked.
    pub fn route(&self) -> &[Coordinate] {
        &self.route
    }

    /// On-route threshold in meters.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify a fix.
    pub fn update(&self, location: &LocationSample) -> TrackingStatus {
        self.snap(location.coordinate)
    }

    /// Classify a bare coordinate.
    pub fn snap(&self, coordinate: Coordinate) -> TrackingStatus {
        match self.route.len() {
            0 => {
                return TrackingStatus::OutOfRoute {
                    deviation_m: f64::INFINITY,
                }
            }
            1 => return self.snap_to_point(coordinate),
            _ => {}
        }

        let p = PlanarPoint::project(coordinate);
        let mut best_distance = f64::INFINITY;
        let mut best_point = self.route[0];
        let mut best_index = 0;
        let mut best_t = 0.0;

        for (i, segment) in self.projected.windows(2).enumerate() {
            let projection = geo::project_onto_segment(p, segment[0], segment[1]);
            let closest = geo::interpolate(self.route[i], self.route[i + 1], projection.t);
            let distance = geo::distance(coordinate, closest);
            if distance < best_distance {
                best_distance = distance;
                best_point = closest;
                best_index = i;
                best_t = projection.t;
            }
        }

        // Snapped to the end vertex of an inner segment: continue from the
        // next segment so the remaining path does not start with a repeat.
        if best_t >= 1.0 && best_index + 2 < self.route.len() {
            best_index += 1;
            best_point = self.route[best_index];
        }

        if best_distance > self.threshold {
            return TrackingStatus::OutOfRoute {
                deviation_m: best_distance,
            };
        }

        let mut remaining_path = Vec::with_capacity(self.route.len() - best_index);
        remaining_path.push(best_point);
        remaining_path.extend_from_slice(&self.route[best_index + 1..]);

        TrackingStatus::OnTrack {
            snapped: best_point,
            remaining_path,
            segment_index: best_index,
            deviation_m: best_distance,
        }
    }

    fn snap_to_point(&self, coordinate: Coordinate) -> TrackingStatus {
        let point = self.route[0];
        let distance = geo::distance(coordinate, point);
        if distance > self.threshold {
            return TrackingStatus::OutOfRoute {
                deviation_m: distance,
            };
        }
        TrackingStatus::OnTrack {
            snapped: point,
            remaining_path: self.route.clone(),
            segment_index: 0,
            deviation_m: distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(lat: f64, lon: f64) -> LocationSample {
        LocationSample::new(
            Coordinate::new(lat, lon),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    fn short_route() -> RouteSnapper {
        RouteSnapper::with_threshold(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.001)],
            30.0,
        )
    }

    fn assert_close(a: Coordinate, b: Coordinate) {
        assert!(
            (a.latitude - b.latitude).abs() < 1e-9 && (a.longitude - b.longitude).abs() < 1e-9,
            "Expected {} to equal {}",
            a,
            b
        );
    }

    #[test]
    fn test_midpoint_snaps_onto_route() {
        match short_route().update(&fix(0.0, 0.0005)) {
            TrackingStatus::OnTrack {
                snapped,
                remaining_path,
                segment_index,
                deviation_m,
            } => {
                assert_close(snapped, Coordinate::new(0.0, 0.0005));
                assert_eq!(*remaining_path.last().unwrap(), Coordinate::new(0.0, 0.001));
                assert_eq!(remaining_path.len(), 2);
                assert_eq!(segment_index, 0);
                assert!(deviation_m < 1e-3);
            }
            other => panic!("Expected OnTrack, got {:?}", other),
        }
    }

    #[test]
    fn test_perpendicular_offset_within_threshold() {
        // ~11m north of the line
        match short_route().update(&fix(0.0001, 0.0005)) {
            TrackingStatus::OnTrack {
                snapped,
                deviation_m,
                ..
            } => {
                assert!(snapped.latitude.abs() < 1e-9, "Should snap onto the line");
                assert!((snapped.longitude - 0.0005).abs() < 1e-7);
                assert!((deviation_m - 11.1).abs() < 0.1);
            }
            other => panic!("Expected OnTrack, got {:?}", other),
        }
    }

    #[test]
    fn test_far_fix_is_out_of_route() {
        // ~111m north of the line
        match short_route().update(&fix(0.001, 0.0005)) {
            TrackingStatus::OutOfRoute { deviation_m } => {
                assert!((deviation_m - 111.2).abs() < 0.5);
            }
            other => panic!("Expected OutOfRoute, got {:?}", other),
        }
    }

    #[test]
    fn test_fix_before_start_clamps_to_first_vertex() {
        match short_route().update(&fix(0.0, -0.0001)) {
            TrackingStatus::OnTrack {
                snapped,
                remaining_path,
                ..
            } => {
                assert_close(snapped, Coordinate::new(0.0, 0.0));
                assert_eq!(remaining_path.len(), 2);
            }
            other => panic!("Expected OnTrack, got {:?}", other),
        }
    }

    #[test]
    fn test_dense_route_picks_nearest_segment() {
        let snapper = RouteSnapper::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0002),
            Coordinate::new(0.0, 0.0004),
            Coordinate::new(0.0002, 0.0004),
            Coordinate::new(0.0004, 0.0004),
        ]);

        match snapper.update(&fix(0.00025, 0.00041)) {
            TrackingStatus::OnTrack {
                snapped,
                remaining_path,
                segment_index,
                ..
            } => {
                assert_eq!(segment_index, 3);
                assert!((snapped.latitude - 0.00025).abs() < 1e-7);
                assert!((snapped.longitude - 0.0004).abs() < 1e-9);
                assert_eq!(remaining_path.len(), 2);
            }
            other => panic!("Expected OnTrack, got {:?}", other),
        }
    }

    #[test]
    fn test_fix_outside_corner_starts_at_next_segment() {
        let route = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.002, 0.001),
        ];
        let snapper = RouteSnapper::new(route.clone());

        // Just past the corner, south-east of it: equally close to both segments
        match snapper.update(&fix(-0.00005, 0.00105)) {
            TrackingStatus::OnTrack {
                snapped,
                remaining_path,
                segment_index,
                ..
            } => {
                assert_eq!(segment_index, 1);
                assert_eq!(snapped, route[1]);
                assert_eq!(remaining_path, route[1..].to_vec());
            }
            other => panic!("Expected OnTrack, got {:?}", other),
        }
    }

    #[test]
    fn test_single_point_route() {
        let point = Coordinate::new(10.0, 10.0);
        let snapper = RouteSnapper::new(vec![point]);

        assert_eq!(
            snapper.update(&fix(10.0001, 10.0)),
            TrackingStatus::OnTrack {
                snapped: point,
                remaining_path: vec![point],
                segment_index: 0,
                deviation_m: geo::distance(Coordinate::new(10.0001, 10.0), point),
            }
        );
        assert!(!snapper.update(&fix(10.01, 10.0)).is_on_track());
    }

    #[test]
    fn test_empty_route_is_always_out_of_route() {
        let snapper = RouteSnapper::new(Vec::new());
        match snapper.update(&fix(0.0, 0.0)) {
            TrackingStatus::OutOfRoute { deviation_m } => assert!(deviation_m.is_infinite()),
            other => panic!("Expected OutOfRoute, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_length_segment_falls_back_to_point_distance() {
        let p = Coordinate::new(0.0, 0.0);
        let snapper = RouteSnapper::new(vec![p, p]);
        assert!(snapper.update(&fix(0.0001, 0.0)).is_on_track());
        assert!(!snapper.update(&fix(0.001, 0.0)).is_on_track());
    }
}

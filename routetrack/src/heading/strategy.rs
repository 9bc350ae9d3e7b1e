//! Route-derived heading strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::{self, Coordinate, EARTH_RADIUS_M};

/// Paths shorter than this (meters) give no usable direction.
const MIN_DIRECTION_LENGTH_M: f64 = 0.01;

/// How the heading is derived from the remaining route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteHeadingStrategy {
    /// Aim at a point a fixed distance ahead along the route.
    #[default]
    LookAhead,
    /// Blend the directions of the next two route segments.
    ThreePointWeighted,
}

impl RouteHeadingStrategy {
    /// Stable identifier used in config files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteHeadingStrategy::LookAhead => "look_ahead",
            RouteHeadingStrategy::ThreePointWeighted => "three_point_weighted",
        }
    }
}

impl fmt::Display for RouteHeadingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RouteHeadingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "look_ahead" | "lookahead" => Ok(RouteHeadingStrategy::LookAhead),
            "three_point_weighted" | "three_point" => Ok(RouteHeadingStrategy::ThreePointWeighted),
            other => Err(format!("unknown route heading strategy '{}'", other)),
        }
    }
}

/// Bearing from the path start to the point `look_ahead` meters along it.
///
/// Paths shorter than `look_ahead` aim at their last point. Returns `None`
/// when the path has no usable direction.
pub fn look_ahead_heading(path: &[Coordinate], look_ahead: f64) -> Option<f64> {
    let start = *path.first()?;
    let mut travelled = 0.0;
    let mut target = start;

    for segment in path.windows(2) {
        let length = geo::distance(segment[0], segment[1]);
        if travelled + length >= look_ahead {
            let t = if length > 0.0 {
                ((look_ahead - travelled) / length).clamp(0.0, 1.0)
            } else {
                1.0
            };
            target = geo::interpolate(segment[0], segment[1], t);
            break;
        }
        travelled += length;
        target = segment[1];
    }

    if geo::distance(start, target) < MIN_DIRECTION_LENGTH_M {
        return None;
    }
    Some(geo::bearing(start, target))
}

/// Weighted blend of the first two segment directions.
///
/// Each segment is reduced to a unit vector in local east/north meters so
/// that a long first segment does not drown out an upcoming turn. With
/// fewer than three points this is the plain bearing of the first segment.
pub fn three_point_heading(
    path: &[Coordinate],
    primary_weight: f64,
    secondary_weight: f64,
) -> Option<f64> {
    if path.len() < 2 {
        return None;
    }

    let first = unit_vector(path[0], path[1]);
    if path.len() < 3 {
        return first.map(|_| geo::bearing(path[0], path[1]));
    }
    let second = unit_vector(path[1], path[2]);

    let (east, north) = match (first, second) {
        (Some((e1, n1)), Some((e2, n2))) => (
            primary_weight * e1 + secondary_weight * e2,
            primary_weight * n1 + secondary_weight * n2,
        ),
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => return None,
    };

    if east.hypot(north) < f64::EPSILON {
        // Weights cancel on a full reversal
        return first.map(|_| geo::bearing(path[0], path[1]));
    }
    Some(geo::normalize_heading(east.atan2(north).to_degrees()))
}

/// Unit east/north vector from `a` to `b` in local planar meters.
fn unit_vector(a: Coordinate, b: Coordinate) -> Option<(f64, f64)> {
    let mean_lat = ((a.latitude + b.latitude) / 2.0).to_radians();
    let east = (b.longitude - a.longitude).to_radians() * mean_lat.cos() * EARTH_RADIUS_M;
    let north = (b.latitude - a.latitude).to_radians() * EARTH_RADIUS_M;
    let length = east.hypot(north);
    if length < MIN_DIRECTION_LENGTH_M {
        return None;
    }
    Some((east / length, north / length))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn east_then_north() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.001, 0.001),
        ]
    }

    #[test]
    fn test_strategy_parse_and_display() {
        assert_eq!(
            "look_ahead".parse::<RouteHeadingStrategy>().unwrap(),
            RouteHeadingStrategy::LookAhead
        );
        assert_eq!(
            "Three-Point-Weighted".parse::<RouteHeadingStrategy>().unwrap(),
            RouteHeadingStrategy::ThreePointWeighted
        );
        assert!("compass".parse::<RouteHeadingStrategy>().is_err());
        assert_eq!(
            RouteHeadingStrategy::ThreePointWeighted.to_string(),
            "three_point_weighted"
        );
        assert_eq!(RouteHeadingStrategy::default(), RouteHeadingStrategy::LookAhead);
    }

    #[test]
    fn test_look_ahead_within_first_segment() {
        let heading = look_ahead_heading(&east_then_north(), 25.0).unwrap();
        assert!((heading - 90.0).abs() < 0.1, "Expected ~90°, got {}", heading);
    }

    #[test]
    fn test_look_ahead_past_corner_turns_north() {
        // 111m east then 111m north; aiming 200m ahead is well past the corner
        let heading = look_ahead_heading(&east_then_north(), 200.0).unwrap();
        assert!(heading > 10.0 && heading < 80.0, "Expected NE, got {}", heading);
    }

    #[test]
    fn test_look_ahead_beyond_path_aims_at_end() {
        let heading = look_ahead_heading(&east_then_north(), 10_000.0).unwrap();
        let expected = geo::bearing(Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.001));
        assert!((heading - expected).abs() < 0.01);
    }

    #[test]
    fn test_look_ahead_degenerate_paths() {
        assert!(look_ahead_heading(&[], 25.0).is_none());
        assert!(look_ahead_heading(&[Coordinate::new(1.0, 1.0)], 25.0).is_none());
        let p = Coordinate::new(1.0, 1.0);
        assert!(look_ahead_heading(&[p, p, p], 25.0).is_none());
    }

    #[test]
    fn test_three_point_blends_toward_turn() {
        let heading = three_point_heading(&east_then_north(), 0.65, 0.35).unwrap();
        // atan2(0.65, 0.35) ≈ 61.7°
        assert!((heading - 61.7).abs() < 0.5, "Expected ~61.7°, got {}", heading);
    }

    #[test]
    fn test_three_point_with_two_points_is_plain_bearing() {
        let path = &east_then_north()[..2];
        let heading = three_point_heading(path, 0.65, 0.35).unwrap();
        assert!((heading - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_three_point_skips_degenerate_segment() {
        let path = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.001, 0.0),
        ];
        let heading = three_point_heading(&path, 0.65, 0.35).unwrap();
        assert!(heading < 0.01 || heading > 359.99);
    }

    #[test]
    fn test_three_point_full_reversal_uses_first_segment() {
        let path = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.0, 0.0),
        ];
        let heading = three_point_heading(&path, 0.5, 0.5).unwrap();
        assert!((heading - 90.0).abs() < 0.01);
    }
}

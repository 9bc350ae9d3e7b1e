//! Geodesy helpers
//!
//! Great-circle distance and bearing for everything reported in real-world
//! meters and degrees, plus a planar (Web Mercator) projection used for
//! nearest-segment searches where only relative distances matter.

mod types;

pub use types::{
    Coordinate, PlanarPoint, SegmentProjection, EARTH_RADIUS_M, MAX_LAT, MAX_LON, MIN_LAT,
    MIN_LON,
};

/// Segments shorter than this (squared planar meters) are treated as points.
const DEGENERATE_SEGMENT_SQ: f64 = 1e-12;

/// Haversine distance between two coordinates in meters.
#[inline]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial great-circle bearing from `a` to `b`.
///
/// Returns degrees in `[0, 360)`, where 0 = North, 90 = East.
/// Coincident points yield 0.
#[inline]
pub fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    normalize_heading(y.atan2(x).to_degrees())
}

/// Normalize a heading into `[0, 360)`. Non-finite input maps to 0.
#[inline]
pub fn normalize_heading(heading: f64) -> f64 {
    if !heading.is_finite() {
        return 0.0;
    }
    let normalized = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Shortest signed angular difference from `from` to `to`, in `[-180, 180]`.
///
/// Handles wraparound: 350° → 10° is +20°, not -340°.
#[inline]
pub fn heading_delta(from: f64, to: f64) -> f64 {
    let mut delta = normalize_heading(to) - normalize_heading(from);
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// Linear interpolation between two coordinates.
#[inline]
pub fn interpolate(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate::new(
        a.latitude + (b.latitude - a.latitude) * t,
        a.longitude + (b.longitude - a.longitude) * t,
    )
}

/// Project `p` onto the segment `a`-`b` in planar space.
///
/// The segment parameter is clamped to `[0, 1]`. A zero-length segment
/// degrades to point distance against `a`.
pub fn project_onto_segment(p: PlanarPoint, a: PlanarPoint, b: PlanarPoint) -> SegmentProjection {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;

    if len_sq < DEGENERATE_SEGMENT_SQ {
        return SegmentProjection {
            t: 0.0,
            closest: a,
            planar_distance: p.distance_to(&a),
        };
    }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let closest = PlanarPoint {
        x: a.x + t * dx,
        y: a.y + t * dy,
    };

    SegmentProjection {
        t,
        closest,
        planar_distance: p.distance_to(&closest),
    }
}

/// Total great-circle length of a polyline in meters.
pub fn path_length(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

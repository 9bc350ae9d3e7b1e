//! Geographic and planar point types

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Mean Earth radius in meters (WGS84 mean).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 position in degrees. No altitude.
///
/// `Coordinate::default()` is the origin (0°, 0°), used as the sentinel
/// returned by lookups on an empty route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude/longitude in degrees.
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (MIN_LON..=MAX_LON).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// A point in spherical Web Mercator space, in meters.
///
/// Used for cheap Euclidean segment math. Distances in this space are
/// stretched by `1 / cos(latitude)`, so they are only compared against
/// each other, never reported as real-world meters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlanarPoint {
    /// Easting in meters.
    pub x: f64,
    /// Northing in meters.
    pub y: f64,
}

impl PlanarPoint {
    /// Project a geographic coordinate. Latitude is clamped to the Web Mercator range.
    #[inline]
    pub fn project(coordinate: Coordinate) -> Self {
        let lat = coordinate.latitude.clamp(MIN_LAT, MAX_LAT).to_radians();
        let lon = coordinate.longitude.to_radians();
        Self {
            x: EARTH_RADIUS_M * lon,
            y: EARTH_RADIUS_M * (PI / 4.0 + lat / 2.0).tan().ln(),
        }
    }

    /// Inverse projection back to geographic degrees.
    #[inline]
    pub fn unproject(&self) -> Coordinate {
        let lon = self.x / EARTH_RADIUS_M;
        let lat = (self.y / EARTH_RADIUS_M).sinh().atan();
        Coordinate::new(lat.to_degrees(), lon.to_degrees())
    }

    /// Euclidean distance to another planar point.
    #[inline]
    pub fn distance_to(&self, other: &PlanarPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Result of projecting a point onto a single segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Position along the segment, clamped to `[0, 1]`.
    pub t: f64,
    /// Closest planar point on the segment.
    pub closest: PlanarPoint,
    /// Planar distance from the input point to `closest`.
    pub planar_distance: f64,
}

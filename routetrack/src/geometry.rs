//! Arc-length parameterization of a route.
//!
//! [`RouteGeometry`] maps between positions on a route and *progress*, the
//! distance in meters travelled along the route from its first vertex. It is
//! built once per route and never mutated, so a session and an animator can
//! share it by reference for the route's lifetime.
//!
//! Segment searches run in planar Web Mercator space; every length reported
//! back (cumulative distances, progress) is great-circle meters so progress
//! stays consistent with [`crate::geo::distance`].

use crate::geo::{self, Coordinate, PlanarPoint};

/// Adjacent points in a remaining route closer than this are merged.
pub const DEDUP_DISTANCE_M: f64 = 0.05;

/// Half-width of the window used to sample the heading at a progress value.
const HEADING_SAMPLE_OFFSET_M: f64 = 1.0;

/// Immutable arc-length view of a route.
#[derive(Debug, Clone)]
pub struct RouteGeometry {
    coordinates: Vec<Coordinate>,
    projected: Vec<PlanarPoint>,
    cumulative_distances: Vec<f64>,
    total_distance: f64,
}

impl RouteGeometry {
    /// Build the geometry for a route.
    ///
    /// Routes with fewer than two points are accepted and produce an
    /// invalid geometry with zero length.
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        let projected = coordinates
            .iter()
            .copied()
            .map(PlanarPoint::project)
            .collect();

        let mut cumulative_distances = Vec::with_capacity(coordinates.len());
        let mut running = 0.0;
        for (i, coordinate) in coordinates.iter().enumerate() {
            if i > 0 {
                running += geo::distance(coordinates[i - 1], *coordinate);
            }
            cumulative_distances.push(running);
        }

        let total_distance = if coordinates.len() < 2 { 0.0 } else { running };

        Self {
            coordinates,
            projected,
            cumulative_distances,
            total_distance,
        }
    }

    /// Whether the route has at least one segment.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.coordinates.len() >= 2
    }

    /// Total route length in meters.
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// The route vertices.
    #[inline]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Cumulative distance at each vertex.
    #[inline]
    pub fn cumulative_distances(&self) -> &[f64] {
        &self.cumulative_distances
    }

    /// Clamp a progress value into `[0, total_distance]`. NaN maps to 0.
    #[inline]
    pub fn clamp(&self, progress: f64) -> f64 {
        if progress.is_nan() {
            return 0.0;
        }
        progress.clamp(0.0, self.total_distance)
    }

    /// Progress of the point on the route nearest to `coordinate`.
    pub fn progress_of(&self, coordinate: Coordinate) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }

        let p = PlanarPoint::project(coordinate);
        let mut best_distance = f64::INFINITY;
        let mut best_progress = 0.0;

        for (i, segment) in self.projected.windows(2).enumerate() {
            let projection = geo::project_onto_segment(p, segment[0], segment[1]);
            if projection.planar_distance < best_distance {
                best_distance = projection.planar_distance;
                let segment_length = self.cumulative_distances[i + 1] - self.cumulative_distances[i];
                best_progress = self.cumulative_distances[i] + segment_length * projection.t;
            }
        }

        self.clamp(best_progress)
    }

    /// Progress implied by a remaining path (the tail of the route starting
    /// at a snapped point). `None` for an empty path.
    pub fn progress_from_remaining_path(&self, remaining_path: &[Coordinate]) -> Option<f64> {
        if remaining_path.is_empty() {
            return None;
        }
        let remaining = geo::path_length(remaining_path);
        Some(self.clamp(self.total_distance - remaining))
    }

    /// Coordinate at a progress value, interpolated within its segment.
    pub fn coordinate_at(&self, progress: f64) -> Coordinate {
        match self.coordinates.len() {
            0 => return Coordinate::default(),
            1 => return self.coordinates[0],
            _ => {}
        }

        let progress = self.clamp(progress);
        let last = self.coordinates.len() - 1;
        if progress <= 0.0 {
            return self.coordinates[0];
        }
        if progress >= self.total_distance {
            return self.coordinates[last];
        }

        let i = self.segment_index(progress);
        let start = self.cumulative_distances[i];
        let segment_length = self.cumulative_distances[i + 1] - start;
        if segment_length <= 0.0 {
            return self.coordinates[i];
        }

        let t = ((progress - start) / segment_length).clamp(0.0, 1.0);
        geo::interpolate(self.coordinates[i], self.coordinates[i + 1], t)
    }

    /// Direction of travel at a progress value.
    ///
    /// Samples the route one meter either side of `progress` and returns the
    /// bearing between the samples. Returns `fallback` for routes with fewer
    /// than two points or when the samples coincide.
    pub fn heading_at(&self, progress: f64, fallback: f64) -> f64 {
        if !self.is_valid() {
            return fallback;
        }

        let behind = self.coordinate_at(progress - HEADING_SAMPLE_OFFSET_M);
        let ahead = self.coordinate_at(progress + HEADING_SAMPLE_OFFSET_M);
        if geo::distance(behind, ahead) <= f64::EPSILON {
            return fallback;
        }
        geo::bearing(behind, ahead)
    }

    /// The part of the route still ahead of `progress`.
    ///
    /// Starts with the interpolated point at `progress`, followed by every
    /// vertex after the bracketing segment.
    pub fn remaining_route(&self, progress: f64) -> Vec<Coordinate> {
        if !self.is_valid() {
            return self.coordinates.clone();
        }

        let progress = self.clamp(progress);
        let head = self.coordinate_at(progress);
        let i = self.segment_index(progress);

        let mut remaining = Vec::with_capacity(self.coordinates.len() - i);
        remaining.push(head);
        for vertex in &self.coordinates[i + 1..] {
            if let Some(previous) = remaining.last() {
                if geo::distance(*previous, *vertex) < DEDUP_DISTANCE_M {
                    continue;
                }
            }
            remaining.push(*vertex);
        }
        remaining
    }

    /// Index of the segment bracketing `progress` (already clamped).
    fn segment_index(&self, progress: f64) -> usize {
        let after = self
            .cumulative_distances
            .partition_point(|distance| *distance <= progress);
        after.saturating_sub(1).min(self.coordinates.len() - 2)
    }
}

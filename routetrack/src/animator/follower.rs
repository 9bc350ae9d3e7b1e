//! Moves a marker along the route between session frames.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use serde::Serialize;

use crate::geo::Coordinate;
use crate::geometry::RouteGeometry;
use crate::session::TrackFrame;

use super::ProgressAnimator;

/// Marker state for one rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimatedMarker {
    /// Distance along the route in meters.
    pub progress: f64,
    pub coordinate: Coordinate,
    pub heading: f64,
    /// Route still ahead of the marker.
    pub remaining_route: Vec<Coordinate>,
}

/// Drives a [`ProgressAnimator`] over a [`RouteGeometry`].
///
/// Each applied frame animates progress toward the frame's position on the
/// route. The target is never behind the current progress, so GPS jitter
/// cannot pull the marker backwards.
#[derive(Debug)]
pub struct RouteFollower {
    geometry: RouteGeometry,
    animator: ProgressAnimator,
    progress: Rc<Cell<f64>>,
    heading: f64,
}

impl RouteFollower {
    /// Start at the beginning of `geometry`, facing `heading`.
    pub fn new(geometry: RouteGeometry, heading: f64) -> Self {
        Self {
            geometry,
            animator: ProgressAnimator::new(),
            progress: Rc::new(Cell::new(0.0)),
            heading,
        }
    }

    pub fn geometry(&self) -> &RouteGeometry {
        &self.geometry
    }

    /// Current animated progress in meters.
    pub fn progress(&self) -> f64 {
        self.progress.get()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_running()
    }

    /// Progress a frame corresponds to, before the monotonic rule.
    pub fn frame_progress(&self, frame: &TrackFrame) -> f64 {
        self.geometry
            .progress_from_remaining_path(&frame.remaining_path)
            .unwrap_or_else(|| self.geometry.progress_of(frame.marker_coordinate))
    }

    /// Animate toward a new frame. Returns the target progress.
    pub fn apply(&mut self, frame: &TrackFrame, now: Instant) -> f64 {
        let current = self.progress.get();
        let target = current.max(self.frame_progress(frame));
        self.heading = frame.marker_heading;

        let progress = Rc::clone(&self.progress);
        self.animator.animate(
            current,
            target,
            frame.transition_duration,
            now,
            move |value| progress.set(value),
            || {},
        );

        tracing::trace!(
            from = format!("{:.1}", current),
            to = format!("{:.1}", target),
            duration_ms = frame.transition_duration.as_millis() as u64,
            "Animating route progress"
        );

        target
    }

    /// Advance the animation and report where the marker is.
    pub fn tick(&mut self, now: Instant) -> AnimatedMarker {
        self.animator.tick(now);
        self.marker()
    }

    /// Marker at the current progress, without advancing.
    pub fn marker(&self) -> AnimatedMarker {
        let progress = self.progress.get();
        AnimatedMarker {
            progress,
            coordinate: self.geometry.coordinate_at(progress),
            heading: self.geometry.heading_at(progress, self.heading),
            remaining_route: self.geometry.remaining_route(progress),
        }
    }

    /// Switch to a new route, e.g. after a reroute. Progress restarts at zero.
    pub fn replace_route(&mut self, geometry: RouteGeometry, heading: f64) {
        self.animator.cancel();
        self.geometry = geometry;
        self.progress.set(0.0);
        self.heading = heading;
    }

    /// Stop animating, leaving the marker where it is.
    pub fn cancel(&mut self) {
        self.animator.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::HeadingSource;
    use std::time::Duration;

    fn straight_route() -> RouteGeometry {
        RouteGeometry::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.0, 0.002),
        ])
    }

    fn frame_at(lon: f64, geometry: &RouteGeometry, duration: Duration) -> TrackFrame {
        let marker = Coordinate::new(0.0, lon);
        let mut remaining_path = vec![marker];
        remaining_path.extend(
            geometry
                .coordinates()
                .iter()
                .copied()
                .filter(|c| c.longitude > lon),
        );

        TrackFrame {
            marker_coordinate: marker,
            marker_heading: 90.0,
            transition_duration: duration,
            remaining_path,
            connector_path: None,
            has_arrived: false,
            heading_source: HeadingSource::Route,
        }
    }

    #[test]
    fn test_apply_animates_to_frame_progress() {
        let geometry = straight_route();
        let half = geometry.total_distance() / 2.0;
        let mut follower = RouteFollower::new(geometry.clone(), 90.0);
        let t0 = Instant::now();

        let target = follower.apply(&frame_at(0.001, &geometry, Duration::from_secs(1)), t0);
        assert!((target - half).abs() < 0.01);
        assert!(follower.is_animating());

        let marker = follower.tick(t0 + Duration::from_millis(500));
        assert!((marker.progress - half / 2.0).abs() < 0.01);
        assert!((marker.coordinate.longitude - 0.0005).abs() < 1e-6);
        assert!((marker.heading - 90.0).abs() < 0.01);

        let marker = follower.tick(t0 + Duration::from_secs(1));
        assert!((marker.progress - half).abs() < 0.01);
        assert!(!follower.is_animating());
        assert_eq!(marker.remaining_route.len(), 2);
    }

    #[test]
    fn test_progress_never_runs_backward() {
        let geometry = straight_route();
        let mut follower = RouteFollower::new(geometry.clone(), 90.0);
        let t0 = Instant::now();

        follower.apply(&frame_at(0.0015, &geometry, Duration::ZERO), t0);
        let ahead = follower.progress();

        let target = follower.apply(&frame_at(0.0012, &geometry, Duration::from_secs(1)), t0);
        assert_eq!(target, ahead);
        assert!(follower.tick(t0 + Duration::from_millis(300)).progress >= ahead);
    }

    #[test]
    fn test_replace_route_resets_progress() {
        let geometry = straight_route();
        let mut follower = RouteFollower::new(geometry.clone(), 90.0);
        let t0 = Instant::now();
        follower.apply(&frame_at(0.001, &geometry, Duration::from_secs(1)), t0);

        let detour = RouteGeometry::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.0)]);
        follower.replace_route(detour, 0.0);

        assert!(!follower.is_animating());
        assert_eq!(follower.progress(), 0.0);
        let marker = follower.tick(t0 + Duration::from_secs(1));
        assert_eq!(marker.coordinate, Coordinate::new(0.0, 0.0));
        assert!(marker.heading < 0.01 || marker.heading > 359.99);
    }

    #[test]
    fn test_cancel_freezes_marker() {
        let geometry = straight_route();
        let mut follower = RouteFollower::new(geometry.clone(), 90.0);
        let t0 = Instant::now();
        follower.apply(&frame_at(0.002, &geometry, Duration::from_secs(2)), t0);

        let midway = follower.tick(t0 + Duration::from_secs(1)).progress;
        follower.cancel();
        follower.cancel();
        assert_eq!(follower.tick(t0 + Duration::from_secs(5)).progress, midway);
    }
}

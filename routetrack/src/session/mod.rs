//! Stateful route tracking.
//!
//! A [`TrackingSession`] owns the active route and the marker's displayed
//! state, and turns each location fix into a [`RenderState`].
//!
//! # State Machine
//!
//! ```text
//! Idle --[configure_route(non-empty)]--> Tracking
//! Tracking --[configure_route(new route)]--> Tracking
//! Tracking --[configure_route(empty) | clear_route_state]--> Idle
//! ```
//!
//! The session is single-threaded: callers deliver fixes and server
//! headings in order on one execution context. Every input is classified;
//! nothing is rejected.

mod render;

pub use render::{RenderState, RerouteRequest, RouteSetup, TrackFrame};

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::TrackingConfig;
use crate::geo::{self, Coordinate};
use crate::heading::{
    compute_target_heading, smooth_heading, HeadingInput, RouteHeadingStrategy, ServerHeading,
};
use crate::location::LocationSample;
use crate::snapper::{RouteSnapper, TrackingStatus};

/// Whether a session has a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No route configured.
    Idle,
    /// Tracking a route.
    Tracking,
}

/// Per-route mutable bookkeeping.
#[derive(Debug)]
struct ActiveRoute {
    snapper: RouteSnapper,
    displayed_coordinate: Coordinate,
    displayed_heading: f64,
    last_heading_update: Option<DateTime<Utc>>,
    last_location_update: Option<DateTime<Utc>>,
    arrived: bool,
}

impl ActiveRoute {
    fn destination(&self) -> Coordinate {
        self.snapper
            .route()
            .last()
            .copied()
            .unwrap_or_default()
    }
}

/// Combines snapping and heading fusion into render states for one route.
#[derive(Debug)]
pub struct TrackingSession {
    config: TrackingConfig,
    strategy: RouteHeadingStrategy,
    server_heading: Option<ServerHeading>,
    active: Option<ActiveRoute>,
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new(TrackingConfig::default())
    }
}

impl TrackingSession {
    /// Create an idle session.
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            strategy: config.default_strategy,
            config,
            server_heading: None,
            active: None,
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Tracking
        } else {
            SessionState::Idle
        }
    }

    /// The route being tracked, if any.
    pub fn route(&self) -> Option<&[Coordinate]> {
        self.active.as_ref().map(|active| active.snapper.route())
    }

    /// Where the marker is currently displayed.
    pub fn displayed_coordinate(&self) -> Option<Coordinate> {
        self.active.as_ref().map(|active| active.displayed_coordinate)
    }

    /// Heading the marker is currently displayed with.
    pub fn displayed_heading(&self) -> Option<f64> {
        self.active.as_ref().map(|active| active.displayed_heading)
    }

    pub fn route_heading_strategy(&self) -> RouteHeadingStrategy {
        self.strategy
    }

    pub fn server_heading(&self) -> Option<ServerHeading> {
        self.server_heading
    }

    /// Start tracking a route, replacing any previous one.
    ///
    /// The marker starts at `current_location` (or the first route point),
    /// facing along the first segment. An empty route leaves the session
    /// idle and returns `None`.
    pub fn configure_route(
        &mut self,
        coordinates: Vec<Coordinate>,
        current_location: Option<Coordinate>,
    ) -> Option<RouteSetup> {
        self.clear_route_state();

        let first = *coordinates.first()?;
        let heading = if coordinates.len() >= 2 {
            geo::bearing(coordinates[0], coordinates[1])
        } else {
            0.0
        };
        let marker_coordinate = current_location.unwrap_or(first);

        tracing::info!(
            points = coordinates.len(),
            length_m = format!("{:.1}", geo::path_length(&coordinates)),
            heading = format!("{:.1}°", heading),
            "Route configured"
        );

        let snapper = RouteSnapper::with_threshold(coordinates, self.config.snap_threshold);
        let setup = RouteSetup {
            route: snapper.route().to_vec(),
            marker_coordinate,
            heading,
        };

        self.active = Some(ActiveRoute {
            snapper,
            displayed_coordinate: marker_coordinate,
            displayed_heading: heading,
            last_heading_update: None,
            last_location_update: None,
            arrived: false,
        });

        Some(setup)
    }

    /// Process one fix. Returns `None` while idle.
    pub fn handle_location_update(&mut self, location: &LocationSample) -> Option<RenderState> {
        let active = self.active.as_mut()?;

        let (snapped, remaining_path, deviation_m) = match active.snapper.update(location) {
            TrackingStatus::OnTrack {
                snapped,
                remaining_path,
                deviation_m,
                ..
            } => (snapped, remaining_path, deviation_m),
            TrackingStatus::OutOfRoute { deviation_m } => {
                let request = RerouteRequest {
                    from: location.coordinate,
                    destination: active.destination(),
                };
                tracing::info!(
                    deviation_m = format!("{:.1}", deviation_m),
                    from = %request.from,
                    "Fix is off route, reroute needed"
                );
                return Some(RenderState::OutOfRoute(request));
            }
        };

        let now = location.timestamp;
        let input = HeadingInput {
            event_time: now,
            server_heading: self.server_heading,
            strategy: self.strategy,
            remaining_path: &remaining_path,
            snapped_coordinate: snapped,
            displayed_coordinate: Some(active.displayed_coordinate),
            displayed_heading: active.displayed_heading,
            location,
        };
        let decision = compute_target_heading(&input, &self.config);

        let heading_dt = elapsed_since(active.last_heading_update, now)
            .unwrap_or(self.config.marker_animation_fallback_duration)
            .as_secs_f64();
        let heading = smooth_heading(
            active.displayed_heading,
            decision.heading,
            self.config.heading_smoothing_factor,
            heading_dt,
            self.config.max_heading_turn_rate,
        );

        let transition_duration = match elapsed_since(active.last_location_update, now) {
            Some(elapsed) => self.config.clamp_transition(elapsed),
            None => self.config.marker_animation_fallback_duration,
        };

        let marker_coordinate = if self.config.snap_marker_to_route {
            snapped
        } else {
            location.coordinate
        };

        let connector_path = remaining_path.first().and_then(|route_start| {
            let gap = geo::distance(marker_coordinate, *route_start);
            (gap > self.config.connector_hide_threshold)
                .then(|| vec![marker_coordinate, *route_start])
        });

        let has_arrived =
            geo::distance(snapped, active.destination()) <= self.config.arrival_threshold;
        if has_arrived && !active.arrived {
            tracing::info!(at = %snapped, "Arrived at destination");
        }

        active.displayed_coordinate = marker_coordinate;
        active.displayed_heading = heading;
        active.last_heading_update = Some(now);
        active.last_location_update = Some(now);
        active.arrived = has_arrived;

        tracing::debug!(
            deviation_m = format!("{:.1}", deviation_m),
            heading = format!("{:.1}°", heading),
            target = format!("{:.1}°", decision.heading),
            source = decision.source.as_str(),
            remaining_points = remaining_path.len(),
            "Location update on route"
        );

        Some(RenderState::OnTrack(TrackFrame {
            marker_coordinate,
            marker_heading: heading,
            transition_duration,
            remaining_path,
            connector_path,
            has_arrived,
            heading_source: decision.source,
        }))
    }

    /// Forget update timing while keeping the route.
    ///
    /// Use after a pause in fixes so the next update animates with the
    /// fallback duration instead of the length of the gap.
    pub fn reset_tracking_state(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.last_heading_update = None;
            active.last_location_update = None;
            tracing::debug!("Tracking timing reset");
        }
    }

    /// Drop the route and all per-route state. The session becomes idle.
    pub fn clear_route_state(&mut self) {
        if self.active.take().is_some() {
            tracing::info!("Route cleared");
        }
        self.server_heading = None;
    }

    /// Cache a server heading, replacing any previous one.
    pub fn update_server_heading(&mut self, value: f64, timestamp: DateTime<Utc>) {
        self.server_heading = Some(ServerHeading::new(value, timestamp));
    }

    /// Choose how the route heading is derived from the next update on.
    pub fn set_route_heading_strategy(&mut self, strategy: RouteHeadingStrategy) {
        if strategy != self.strategy {
            tracing::debug!(strategy = strategy.as_str(), "Route heading strategy changed");
        }
        self.strategy = strategy;
    }
}

/// Strictly positive time from `since` to `now`.
fn elapsed_since(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Duration> {
    (now - since?).to_std().ok().filter(|elapsed| !elapsed.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RouteGeometry;
    use crate::heading::HeadingSource;
    use chrono::TimeZone;

    fn at_millis(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + millis).unwrap()
    }

    fn fix(lat: f64, lon: f64, millis: i64) -> LocationSample {
        LocationSample::new(Coordinate::new(lat, lon), at_millis(millis))
    }

    /// ~333m eastbound along the equator.
    fn eastbound_route() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.0, 0.002),
            Coordinate::new(0.0, 0.003),
        ]
    }

    fn tracking_session() -> TrackingSession {
        let mut session = TrackingSession::default();
        session.configure_route(eastbound_route(), None).unwrap();
        session
    }

    fn expect_frame(state: Option<RenderState>) -> TrackFrame {
        match state {
            Some(RenderState::OnTrack(frame)) => frame,
            other => panic!("Expected OnTrack, got {:?}", other),
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let mut session = TrackingSession::default();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.handle_location_update(&fix(0.0, 0.0, 0)).is_none());
        assert!(session.displayed_coordinate().is_none());
    }

    #[test]
    fn test_configure_empty_route_stays_idle() {
        let mut session = TrackingSession::default();
        assert!(session.configure_route(Vec::new(), None).is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_configure_route_initial_state() {
        let mut session = TrackingSession::default();
        let setup = session.configure_route(eastbound_route(), None).unwrap();

        assert_eq!(session.state(), SessionState::Tracking);
        assert_eq!(setup.marker_coordinate, Coordinate::new(0.0, 0.0));
        assert!((setup.heading - 90.0).abs() < 0.01);
        assert_eq!(setup.route, eastbound_route());
        assert_eq!(session.displayed_heading(), Some(setup.heading));
    }

    #[test]
    fn test_configure_route_uses_current_location() {
        let mut session = TrackingSession::default();
        let here = Coordinate::new(0.0001, 0.0);
        let setup = session
            .configure_route(eastbound_route(), Some(here))
            .unwrap();
        assert_eq!(setup.marker_coordinate, here);
        assert_eq!(session.displayed_coordinate(), Some(here));
    }

    #[test]
    fn test_single_point_route_heading_is_zero() {
        let mut session = TrackingSession::default();
        let setup = session
            .configure_route(vec![Coordinate::new(5.0, 5.0)], None)
            .unwrap();
        assert_eq!(setup.heading, 0.0);

        // Degenerate but non-crashing: a fix on the point has arrived
        let frame = expect_frame(session.handle_location_update(&fix(5.0, 5.0, 0)));
        assert!(frame.has_arrived);
    }

    #[test]
    fn test_on_track_update_produces_frame() {
        let mut session = tracking_session();
        let frame = expect_frame(session.handle_location_update(&fix(0.00005, 0.0005, 0)));

        assert!(frame.marker_coordinate.latitude.abs() < 1e-9);
        assert!((frame.marker_coordinate.longitude - 0.0005).abs() < 1e-7);
        assert_eq!(frame.remaining_path.len(), 4);
        assert_eq!(frame.transition_duration, Duration::from_secs(1));
        assert!(frame.connector_path.is_none());
        assert!(!frame.has_arrived);
        assert_eq!(frame.heading_source, HeadingSource::Route);
        assert!((frame.marker_heading - 90.0).abs() < 0.5);
        assert_eq!(session.displayed_coordinate(), Some(frame.marker_coordinate));
    }

    #[test]
    fn test_transition_duration_follows_update_interval() {
        let mut session = tracking_session();
        session.handle_location_update(&fix(0.0, 0.0002, 0));

        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0003, 700)));
        assert_eq!(frame.transition_duration, Duration::from_millis(700));

        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0004, 750)));
        assert_eq!(frame.transition_duration, Duration::from_millis(200));

        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0005, 10_750)));
        assert_eq!(frame.transition_duration, Duration::from_secs(2));

        // Out-of-order timestamp falls back
        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0006, 5_000)));
        assert_eq!(frame.transition_duration, Duration::from_secs(1));
    }

    #[test]
    fn test_out_of_route_leaves_displayed_state() {
        let mut session = tracking_session();
        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.001, 0)));

        let state = session.handle_location_update(&fix(0.01, 0.001, 1_000));
        match state {
            Some(RenderState::OutOfRoute(request)) => {
                assert_eq!(request.from, Coordinate::new(0.01, 0.001));
                assert_eq!(request.destination, Coordinate::new(0.0, 0.003));
            }
            other => panic!("Expected OutOfRoute, got {:?}", other),
        }
        assert_eq!(session.displayed_coordinate(), Some(frame.marker_coordinate));
        assert_eq!(session.displayed_heading(), Some(frame.marker_heading));
        assert_eq!(session.state(), SessionState::Tracking);
    }

    #[test]
    fn test_arrival_near_final_vertex() {
        let mut session = tracking_session();
        // ~11m before the end, threshold is 15m
        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0029, 0)));
        assert!(frame.has_arrived);

        let mut session = tracking_session();
        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0025, 0)));
        assert!(!frame.has_arrived);
    }

    #[test]
    fn test_fresh_server_heading_overrides_route() {
        let mut session = TrackingSession::new(
            TrackingConfig::default()
                .with_heading_smoothing_factor(1.0)
                .with_max_heading_turn_rate(720.0),
        );
        session.configure_route(eastbound_route(), None).unwrap();
        session.update_server_heading(100.0, at_millis(0));

        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0005, 500)));
        assert_eq!(frame.heading_source, HeadingSource::Server);
        assert!((frame.marker_heading - 100.0).abs() < 1e-9);

        // Ten seconds later the server heading is stale
        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0006, 10_000)));
        assert_eq!(frame.heading_source, HeadingSource::Route);
    }

    #[test]
    fn test_heading_turn_is_rate_limited() {
        let config = TrackingConfig::default()
            .with_heading_smoothing_factor(1.0)
            .with_max_heading_turn_rate(30.0);
        let mut session = TrackingSession::new(config);
        session.configure_route(eastbound_route(), None).unwrap();
        session.handle_location_update(&fix(0.0, 0.0002, 0));

        // Server says north; 0.5s at 30°/s allows 15°
        session.update_server_heading(0.0, at_millis(500));
        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0003, 500)));
        assert!((frame.marker_heading - 75.0).abs() < 0.5, "Got {}", frame.marker_heading);
    }

    #[test]
    fn test_raw_marker_draws_connector() {
        let config = TrackingConfig::default().with_snap_marker_to_route(false);
        let mut session = TrackingSession::new(config);
        session.configure_route(eastbound_route(), None).unwrap();

        // ~11m off the line: marker stays on the fix, connector bridges to the route
        let frame = expect_frame(session.handle_location_update(&fix(0.0001, 0.0005, 0)));
        assert_eq!(frame.marker_coordinate, Coordinate::new(0.0001, 0.0005));
        let connector = frame.connector_path.expect("connector expected");
        assert_eq!(connector.len(), 2);
        assert_eq!(connector[0], frame.marker_coordinate);
        assert_eq!(connector[1], frame.remaining_path[0]);

        // ~1m off is below the hide threshold
        let frame = expect_frame(session.handle_location_update(&fix(0.00001, 0.0006, 1_000)));
        assert!(frame.connector_path.is_none());
    }

    #[test]
    fn test_snapped_marker_has_no_connector() {
        let mut session = tracking_session();

        // Same ~11m offset: the marker is drawn on the route itself
        let frame = expect_frame(session.handle_location_update(&fix(0.0001, 0.0005, 0)));
        assert_eq!(frame.marker_coordinate, frame.remaining_path[0]);
        assert!(frame.connector_path.is_none());
    }

    #[test]
    fn test_reset_tracking_state_keeps_route() {
        let mut session = tracking_session();
        session.handle_location_update(&fix(0.0, 0.0002, 0));
        session.reset_tracking_state();

        assert_eq!(session.state(), SessionState::Tracking);
        let frame = expect_frame(session.handle_location_update(&fix(0.0, 0.0003, 300)));
        assert_eq!(frame.transition_duration, Duration::from_secs(1));
    }

    #[test]
    fn test_clear_route_state_goes_idle() {
        let mut session = tracking_session();
        session.update_server_heading(10.0, at_millis(0));
        session.set_route_heading_strategy(RouteHeadingStrategy::ThreePointWeighted);
        session.clear_route_state();

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.route().is_none());
        assert!(session.server_heading().is_none());
        assert_eq!(
            session.route_heading_strategy(),
            RouteHeadingStrategy::ThreePointWeighted
        );
        assert!(session.handle_location_update(&fix(0.0, 0.0, 0)).is_none());
    }

    #[test]
    fn test_reroute_replaces_route() {
        let mut session = tracking_session();
        let detour = vec![Coordinate::new(0.01, 0.0), Coordinate::new(0.01, 0.001)];
        session.configure_route(detour.clone(), None).unwrap();

        assert_eq!(session.route(), Some(detour.as_slice()));
        assert!(session
            .handle_location_update(&fix(0.01, 0.0005, 0))
            .unwrap()
            .is_on_track());
    }

    #[test]
    fn test_progress_is_monotonic_with_max_rule() {
        let mut session = tracking_session();
        let geometry = RouteGeometry::new(eastbound_route());

        // Second fix jitters backwards
        let fixes = [
            fix(0.00002, 0.0010, 0),
            fix(-0.00002, 0.0009, 1_000),
            fix(0.00001, 0.0015, 2_000),
        ];

        let mut progress = 0.0_f64;
        for location in &fixes {
            let frame = expect_frame(session.handle_location_update(location));
            let computed = geometry
                .progress_from_remaining_path(&frame.remaining_path)
                .unwrap();
            let next = progress.max(computed);
            assert!(next >= progress);
            progress = next;
        }
        assert!((progress - geometry.total_distance() / 2.0).abs() < 0.5);
    }
}

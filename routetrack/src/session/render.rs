//! Values a session hands to the rendering layer.

use std::time::Duration;

use serde::Serialize;

use crate::geo::Coordinate;
use crate::heading::HeadingSource;

/// What to draw after one on-route update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackFrame {
    /// Where the directional marker goes.
    pub marker_coordinate: Coordinate,
    /// Marker heading in degrees.
    pub marker_heading: f64,
    /// How long the marker should take to move to its new position.
    pub transition_duration: Duration,
    /// The part of the route still to travel, starting at the snapped fix.
    pub remaining_path: Vec<Coordinate>,
    /// Short line from the marker to the route, when the gap is visible.
    ///
    /// Only appears with `snap_marker_to_route` off; a snapped marker sits
    /// on `remaining_path[0]`, so there is no gap to draw.
    pub connector_path: Option<Vec<Coordinate>>,
    /// The snapped fix is within the arrival threshold of the destination.
    pub has_arrived: bool,
    /// Which source the heading came from.
    pub heading_source: HeadingSource,
}

/// Everything an external router needs to compute a new route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RerouteRequest {
    /// Last known position (the raw fix that left the route).
    pub from: Coordinate,
    /// Destination of the route being abandoned.
    pub destination: Coordinate,
}

/// Output of one location update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum RenderState {
    OnTrack(TrackFrame),
    OutOfRoute(RerouteRequest),
}

impl RenderState {
    pub fn is_on_track(&self) -> bool {
        matches!(self, RenderState::OnTrack(_))
    }

    /// The frame, if on-route.
    pub fn frame(&self) -> Option<&TrackFrame> {
        match self {
            RenderState::OnTrack(frame) => Some(frame),
            RenderState::OutOfRoute(_) => None,
        }
    }

    /// Whether this update completed the route.
    pub fn has_arrived(&self) -> bool {
        self.frame().is_some_and(|frame| frame.has_arrived)
    }
}

/// Initial display state returned when a route is configured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSetup {
    pub route: Vec<Coordinate>,
    pub marker_coordinate: Coordinate,
    pub heading: f64,
}

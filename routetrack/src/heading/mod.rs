//! Heading fusion.
//!
//! Picks the direction a marker should face from several candidate sources
//! and eases the displayed heading toward it. Everything here is a pure
//! function of its inputs; session state lives in [`crate::session`].
//!
//! # Source priority
//!
//! ```text
//! server heading (fresh) > route geometry > displayed movement > device course > unchanged
//! ```

mod smoothing;
mod strategy;

pub use smoothing::{smooth_heading, MAX_SMOOTHING_DELTA_SECS, MIN_SMOOTHING_DELTA_SECS};
pub use strategy::{look_ahead_heading, three_point_heading, RouteHeadingStrategy};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TrackingConfig;
use crate::geo::{self, Coordinate};
use crate::location::LocationSample;

/// A heading pushed by a backend, e.g. from a vehicle's own compass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerHeading {
    /// Heading in degrees.
    pub value: f64,
    /// When the backend measured it.
    pub timestamp: DateTime<Utc>,
}

impl ServerHeading {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    /// Whether the heading is within `max_age` of `event_time`, in either direction.
    pub fn is_fresh(&self, event_time: DateTime<Utc>, max_age: std::time::Duration) -> bool {
        let age = (event_time - self.timestamp).abs();
        match age.to_std() {
            Ok(age) => age <= max_age,
            Err(_) => false,
        }
    }
}

/// Which source produced a target heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingSource {
    Server,
    Route,
    Movement,
    DeviceCourse,
    Unchanged,
}

impl HeadingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingSource::Server => "server",
            HeadingSource::Route => "route",
            HeadingSource::Movement => "movement",
            HeadingSource::DeviceCourse => "device_course",
            HeadingSource::Unchanged => "unchanged",
        }
    }
}

/// The chosen target heading and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingDecision {
    pub heading: f64,
    pub source: HeadingSource,
}

/// Everything the heading fusion looks at for one update.
#[derive(Debug, Clone, Copy)]
pub struct HeadingInput<'a> {
    /// Time of the location event being processed.
    pub event_time: DateTime<Utc>,
    /// Most recent server heading, if any.
    pub server_heading: Option<ServerHeading>,
    /// Active route heading strategy.
    pub strategy: RouteHeadingStrategy,
    /// Remaining route, starting at the snapped point.
    pub remaining_path: &'a [Coordinate],
    /// Fix snapped onto the route.
    pub snapped_coordinate: Coordinate,
    /// Coordinate the marker is currently displayed at.
    pub displayed_coordinate: Option<Coordinate>,
    /// Heading the marker is currently displayed with.
    pub displayed_heading: f64,
    /// The raw fix.
    pub location: &'a LocationSample,
}

/// Pick the target heading for an update, first applicable source wins.
pub fn compute_target_heading(input: &HeadingInput<'_>, config: &TrackingConfig) -> HeadingDecision {
    if let Some(server) = input.server_heading {
        if server.is_fresh(input.event_time, config.server_heading_max_age) {
            return HeadingDecision {
                heading: geo::normalize_heading(server.value),
                source: HeadingSource::Server,
            };
        }
    }

    if let Some(heading) = route_heading(input.remaining_path, input.strategy, config) {
        return HeadingDecision {
            heading,
            source: HeadingSource::Route,
        };
    }

    if let Some(previous) = input.displayed_coordinate {
        if geo::distance(previous, input.snapped_coordinate) > config.movement_threshold {
            return HeadingDecision {
                heading: geo::bearing(previous, input.snapped_coordinate),
                source: HeadingSource::Movement,
            };
        }
    }

    if let (Some(course), Some(speed)) = (input.location.known_course(), input.location.known_speed())
    {
        if speed >= config.min_reliable_course_speed {
            return HeadingDecision {
                heading: geo::normalize_heading(course),
                source: HeadingSource::DeviceCourse,
            };
        }
    }

    HeadingDecision {
        heading: geo::normalize_heading(input.displayed_heading),
        source: HeadingSource::Unchanged,
    }
}

/// Heading derived from the remaining route with the given strategy.
pub fn route_heading(
    remaining_path: &[Coordinate],
    strategy: RouteHeadingStrategy,
    config: &TrackingConfig,
) -> Option<f64> {
    match strategy {
        RouteHeadingStrategy::LookAhead => {
            look_ahead_heading(remaining_path, config.heading_look_ahead_distance)
        }
        RouteHeadingStrategy::ThreePointWeighted => three_point_heading(
            remaining_path,
            config.primary_segment_weight,
            config.secondary_segment_weight,
        ),
    }
}

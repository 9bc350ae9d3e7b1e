//! Tracking configuration.
//!
//! [`TrackingConfig`] holds every tunable the engine reads. It is immutable
//! once handed to a session. Values can be built in code with the `with_*`
//! setters or loaded from `~/.routetrack/config.ini` via [`file`].

mod defaults;
pub mod file;

use std::time::Duration;

use thiserror::Error;

use crate::heading::RouteHeadingStrategy;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};

/// A tunable outside its accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid value for {field}: {value} - {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub value: f64,
    pub reason: &'static str,
}

/// Engine tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Max distance (m) from the route for a fix to be on-route.
    pub snap_threshold: f64,
    /// Distance (m) to the last vertex that counts as arrived.
    pub arrival_threshold: f64,
    /// Connector is hidden when the marker-to-route gap (m) is at or below this.
    pub connector_hide_threshold: f64,
    /// Fraction of heading error corrected per update, in `(0, 1]`.
    pub heading_smoothing_factor: f64,
    /// Look-ahead distance (m) for the route heading.
    pub heading_look_ahead_distance: f64,
    /// Minimum speed (m/s) at which the device course is trusted.
    pub min_reliable_course_speed: f64,
    /// Max heading rotation in degrees per second.
    pub max_heading_turn_rate: f64,
    /// Age after which a server heading is stale.
    pub server_heading_max_age: Duration,
    /// Shortest marker transition.
    pub marker_animation_min_duration: Duration,
    /// Marker transition when no previous update exists.
    pub marker_animation_fallback_duration: Duration,
    /// Longest marker transition.
    pub marker_animation_max_duration: Duration,
    /// Min displayed movement (m) for a movement-derived heading.
    pub movement_threshold: f64,
    /// Weight of the first segment in the three-point heading.
    pub primary_segment_weight: f64,
    /// Weight of the second segment in the three-point heading.
    pub secondary_segment_weight: f64,
    /// Place the marker on the snapped point rather than the raw fix.
    pub snap_marker_to_route: bool,
    /// Route heading strategy a new session starts with.
    pub default_strategy: RouteHeadingStrategy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            snap_threshold: DEFAULT_SNAP_THRESHOLD_M,
            arrival_threshold: DEFAULT_ARRIVAL_THRESHOLD_M,
            connector_hide_threshold: DEFAULT_CONNECTOR_HIDE_THRESHOLD_M,
            heading_smoothing_factor: DEFAULT_HEADING_SMOOTHING_FACTOR,
            heading_look_ahead_distance: DEFAULT_HEADING_LOOK_AHEAD_M,
            min_reliable_course_speed: DEFAULT_MIN_RELIABLE_COURSE_SPEED,
            max_heading_turn_rate: DEFAULT_MAX_HEADING_TURN_RATE,
            server_heading_max_age: Duration::from_secs_f64(DEFAULT_SERVER_HEADING_MAX_AGE_SECS),
            marker_animation_min_duration: Duration::from_secs_f64(
                DEFAULT_MARKER_ANIMATION_MIN_SECS,
            ),
            marker_animation_fallback_duration: Duration::from_secs_f64(
                DEFAULT_MARKER_ANIMATION_FALLBACK_SECS,
            ),
            marker_animation_max_duration: Duration::from_secs_f64(
                DEFAULT_MARKER_ANIMATION_MAX_SECS,
            ),
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD_M,
            primary_segment_weight: DEFAULT_PRIMARY_SEGMENT_WEIGHT,
            secondary_segment_weight: DEFAULT_SECONDARY_SEGMENT_WEIGHT,
            snap_marker_to_route: true,
            default_strategy: RouteHeadingStrategy::default(),
        }
    }
}

impl TrackingConfig {
    /// Set the on-route snap threshold in meters.
    pub fn with_snap_threshold(mut self, meters: f64) -> Self {
        self.snap_threshold = meters;
        self
    }

    /// Set the arrival threshold in meters.
    pub fn with_arrival_threshold(mut self, meters: f64) -> Self {
        self.arrival_threshold = meters;
        self
    }

    /// Set the connector hide threshold in meters.
    pub fn with_connector_hide_threshold(mut self, meters: f64) -> Self {
        self.connector_hide_threshold = meters;
        self
    }

    /// Set the heading smoothing factor.
    pub fn with_heading_smoothing_factor(mut self, factor: f64) -> Self {
        self.heading_smoothing_factor = factor;
        self
    }

    /// Set the look-ahead distance in meters.
    pub fn with_heading_look_ahead_distance(mut self, meters: f64) -> Self {
        self.heading_look_ahead_distance = meters;
        self
    }

    /// Set the minimum speed at which device course is trusted.
    pub fn with_min_reliable_course_speed(mut self, mps: f64) -> Self {
        self.min_reliable_course_speed = mps;
        self
    }

    /// Set the maximum heading turn rate in degrees per second.
    pub fn with_max_heading_turn_rate(mut self, degrees_per_sec: f64) -> Self {
        self.max_heading_turn_rate = degrees_per_sec;
        self
    }

    /// Set the server heading staleness limit.
    pub fn with_server_heading_max_age(mut self, max_age: Duration) -> Self {
        self.server_heading_max_age = max_age;
        self
    }

    /// Set the marker animation bounds.
    pub fn with_marker_animation(mut self, min: Duration, fallback: Duration, max: Duration) -> Self {
        self.marker_animation_min_duration = min;
        self.marker_animation_fallback_duration = fallback;
        self.marker_animation_max_duration = max;
        self
    }

    /// Set the movement threshold in meters.
    pub fn with_movement_threshold(mut self, meters: f64) -> Self {
        self.movement_threshold = meters;
        self
    }

    /// Set the three-point heading weights.
    pub fn with_segment_weights(mut self, primary: f64, secondary: f64) -> Self {
        self.primary_segment_weight = primary;
        self.secondary_segment_weight = secondary;
        self
    }

    /// Choose whether the marker sits on the route or on the raw fix.
    pub fn with_snap_marker_to_route(mut self, snap: bool) -> Self {
        self.snap_marker_to_route = snap;
        self
    }

    /// Set the route heading strategy new sessions start with.
    pub fn with_default_strategy(mut self, strategy: RouteHeadingStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Check every value against its expected range.
    ///
    /// The engine itself never rejects a config; this is for edges that
    /// accept user input (config file, CLI).
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("snap_threshold", self.snap_threshold)?;
        non_negative("arrival_threshold", self.arrival_threshold)?;
        non_negative("connector_hide_threshold", self.connector_hide_threshold)?;
        non_negative("heading_look_ahead_distance", self.heading_look_ahead_distance)?;
        non_negative("min_reliable_course_speed", self.min_reliable_course_speed)?;
        non_negative("movement_threshold", self.movement_threshold)?;
        non_negative("primary_segment_weight", self.primary_segment_weight)?;
        non_negative("secondary_segment_weight", self.secondary_segment_weight)?;

        let factor = self.heading_smoothing_factor;
        if !(factor.is_finite() && factor > 0.0 && factor <= 1.0) {
            return Err(ConfigError {
                field: "heading_smoothing_factor",
                value: factor,
                reason: "must be in (0, 1]",
            });
        }

        let rate = self.max_heading_turn_rate;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ConfigError {
                field: "max_heading_turn_rate",
                value: rate,
                reason: "must be positive",
            });
        }

        if self.primary_segment_weight + self.secondary_segment_weight <= 0.0 {
            return Err(ConfigError {
                field: "primary_segment_weight",
                value: self.primary_segment_weight,
                reason: "segment weights must not both be zero",
            });
        }

        if self.marker_animation_min_duration > self.marker_animation_max_duration {
            return Err(ConfigError {
                field: "marker_animation_min_duration",
                value: self.marker_animation_min_duration.as_secs_f64(),
                reason: "must not exceed the maximum duration",
            });
        }

        let fallback = self.marker_animation_fallback_duration;
        if fallback < self.marker_animation_min_duration
            || fallback > self.marker_animation_max_duration
        {
            return Err(ConfigError {
                field: "marker_animation_fallback_duration",
                value: fallback.as_secs_f64(),
                reason: "must lie between the minimum and maximum durations",
            });
        }

        Ok(())
    }

    /// Clamp an elapsed time into the marker animation bounds.
    pub fn clamp_transition(&self, elapsed: Duration) -> Duration {
        let max = self
            .marker_animation_max_duration
            .max(self.marker_animation_min_duration);
        elapsed.clamp(self.marker_animation_min_duration, max)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            value,
            reason: "must be a finite, non-negative number",
        })
    }
}

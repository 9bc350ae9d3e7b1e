//! Default values for every tracking tunable.

/// Maximum distance from the route, in meters, for a fix to count as on-route.
pub const DEFAULT_SNAP_THRESHOLD_M: f64 = 30.0;

/// Distance to the final vertex, in meters, at which the route is complete.
pub const DEFAULT_ARRIVAL_THRESHOLD_M: f64 = 15.0;

/// Marker-to-route gaps at or below this many meters draw no connector.
pub const DEFAULT_CONNECTOR_HIDE_THRESHOLD_M: f64 = 2.0;

/// Fraction of the heading error corrected per update.
pub const DEFAULT_HEADING_SMOOTHING_FACTOR: f64 = 0.35;

/// How far ahead along the route the look-ahead strategy aims, in meters.
pub const DEFAULT_HEADING_LOOK_AHEAD_M: f64 = 25.0;

/// Below this speed (m/s) the device course is too noisy to trust.
pub const DEFAULT_MIN_RELIABLE_COURSE_SPEED: f64 = 1.5;

/// Upper bound on how fast the displayed heading may rotate, in degrees/second.
pub const DEFAULT_MAX_HEADING_TURN_RATE: f64 = 120.0;

/// Server headings older than this many seconds are ignored.
pub const DEFAULT_SERVER_HEADING_MAX_AGE_SECS: f64 = 3.0;

/// Shortest marker transition, in seconds.
pub const DEFAULT_MARKER_ANIMATION_MIN_SECS: f64 = 0.2;

/// Marker transition used when no previous update exists, in seconds.
pub const DEFAULT_MARKER_ANIMATION_FALLBACK_SECS: f64 = 1.0;

/// Longest marker transition, in seconds.
pub const DEFAULT_MARKER_ANIMATION_MAX_SECS: f64 = 2.0;

/// Displayed position must move more than this (meters) to derive a heading from it.
pub const DEFAULT_MOVEMENT_THRESHOLD_M: f64 = 0.8;

/// Weight of the first route segment in the three-point heading blend.
pub const DEFAULT_PRIMARY_SEGMENT_WEIGHT: f64 = 0.65;

/// Weight of the second route segment in the three-point heading blend.
pub const DEFAULT_SECONDARY_SEGMENT_WEIGHT: f64 = 0.35;

//! Live position fixes as delivered by a platform location service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A single position fix.
///
/// Course and speed follow platform conventions: a missing or negative
/// value means the provider could not determine it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Reported position.
    pub coordinate: Coordinate,
    /// When the fix was taken.
    pub timestamp: DateTime<Utc>,
    /// Course over ground in degrees, if known.
    #[serde(default)]
    pub course: Option<f64>,
    /// Ground speed in m/s, if known.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Horizontal accuracy radius in meters, if known.
    #[serde(default)]
    pub horizontal_accuracy: Option<f64>,
}

impl LocationSample {
    /// Create a sample with unknown course, speed and accuracy.
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            timestamp,
            course: None,
            speed: None,
            horizontal_accuracy: None,
        }
    }

    /// Set the reported course and speed.
    pub fn with_motion(mut self, course: f64, speed: f64) -> Self {
        self.course = Some(course);
        self.speed = Some(speed);
        self
    }

    /// Set the horizontal accuracy.
    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.horizontal_accuracy = Some(meters);
        self
    }

    /// Course if the provider reported a usable (non-negative, finite) value.
    pub fn known_course(&self) -> Option<f64> {
        self.course.filter(|c| c.is_finite() && *c >= 0.0)
    }

    /// Speed if the provider reported a usable (non-negative, finite) value.
    pub fn known_speed(&self) -> Option<f64> {
        self.speed.filter(|s| s.is_finite() && *s >= 0.0)
    }
}

//! Recorded drive scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinate;
use crate::heading::ServerHeading;
use crate::location::LocationSample;

/// Errors that can occur while loading or replaying a scenario.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The scenario file could not be read.
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scenario file is not valid scenario JSON.
    #[error("Invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The scenario has no route to track.
    #[error("Scenario route is empty")]
    EmptyRoute,

    /// A route point, start or fix lies outside the WGS84 ranges.
    #[error("Invalid coordinate {coordinate} at {location}")]
    InvalidCoordinate {
        location: String,
        coordinate: Coordinate,
    },
}

/// A route plus the fixes and server headings recorded while driving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Route to follow.
    pub route: Vec<Coordinate>,

    /// Where the marker starts; defaults to the first route point.
    #[serde(default)]
    pub start: Option<Coordinate>,

    /// Location fixes in delivery order.
    #[serde(default)]
    pub samples: Vec<LocationSample>,

    /// Server heading pushes, applied once their timestamp is reached.
    #[serde(default)]
    pub server_headings: Vec<ServerHeading>,
}

impl Scenario {
    /// Parse a scenario from JSON text and check its coordinates.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check that every coordinate is finite and inside the WGS84 ranges.
    pub fn validate(&self) -> Result<(), ReplayError> {
        let route = self
            .route
            .iter()
            .enumerate()
            .map(|(i, c)| (format!("route[{i}]"), *c));
        let start = self.start.map(|c| ("start".to_string(), c));
        let samples = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("samples[{i}]"), s.coordinate));

        match route
            .chain(start)
            .chain(samples)
            .find(|(_, c)| !c.is_valid())
        {
            Some((location, coordinate)) => Err(ReplayError::InvalidCoordinate {
                location,
                coordinate,
            }),
            None => Ok(()),
        }
    }

    /// Serialize the scenario as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Load a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario, ReplayError> {
    let json = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let scenario = Scenario::from_json(&json)?;

    tracing::debug!(
        path = %path.display(),
        route_points = scenario.route.len(),
        samples = scenario.samples.len(),
        server_headings = scenario.server_headings.len(),
        "Loaded scenario"
    );

    Ok(scenario)
}

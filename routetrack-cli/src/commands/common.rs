//! Common types and utilities shared across CLI commands.

use std::path::Path;

use clap::ValueEnum;
use routetrack::config::{self, TrackingConfig};
use routetrack::RouteHeadingStrategy;

use crate::error::CliError;

/// Route heading strategy selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StrategyArg {
    /// Bearing toward a point a fixed distance ahead on the route
    LookAhead,
    /// Weighted blend of the next two segment directions
    ThreePoint,
}

impl From<StrategyArg> for RouteHeadingStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::LookAhead => RouteHeadingStrategy::LookAhead,
            StrategyArg::ThreePoint => RouteHeadingStrategy::ThreePointWeighted,
        }
    }
}

/// Load the tracking config from `path`, or from the default location.
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<TrackingConfig, CliError> {
    let config = match path {
        Some(path) => config::file::load_from(path)?,
        None => config::file::load()?,
    };
    Ok(config)
}

//! Offline replay of recorded drives.
//!
//! Feeds a [`Scenario`] through a [`TrackingSession`] exactly as a live
//! location service would: fixes in recorded order, server headings pushed
//! as soon as their timestamp is reached. Progress along the route is
//! tracked with the same never-backwards rule the presentation layer uses.

mod scenario;

pub use scenario::{load_scenario, ReplayError, Scenario};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::TrackingConfig;
use crate::geometry::RouteGeometry;
use crate::heading::RouteHeadingStrategy;
use crate::session::{RenderState, TrackingSession};

/// How a replay is run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Overrides the configured default route heading strategy.
    pub strategy: Option<RouteHeadingStrategy>,
    /// Stop feeding fixes once the destination is reached.
    pub stop_on_arrival: bool,
}

/// Result of one replayed fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayFrame {
    /// Position of the fix in the scenario.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    /// Distance along the route in meters; never decreases.
    pub progress: f64,
    pub render: RenderState,
}

/// Totals over a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub route_length_m: f64,
    pub samples_total: usize,
    pub samples_processed: usize,
    pub on_track: usize,
    pub out_of_route: usize,
    pub arrived: bool,
    pub arrived_at: Option<DateTime<Utc>>,
    pub final_progress_m: f64,
    /// How many on-route frames took their heading from each source.
    pub heading_sources: BTreeMap<String, usize>,
}

/// Frames plus summary for a whole replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub frames: Vec<ReplayFrame>,
    pub summary: ReplaySummary,
}

/// Replay a scenario through a fresh session.
pub fn run(
    scenario: &Scenario,
    config: TrackingConfig,
    options: ReplayOptions,
) -> Result<ReplayReport, ReplayError> {
    if scenario.route.is_empty() {
        return Err(ReplayError::EmptyRoute);
    }
    scenario.validate()?;

    let geometry = RouteGeometry::new(scenario.route.clone());
    let mut session = TrackingSession::new(config);
    if let Some(strategy) = options.strategy {
        session.set_route_heading_strategy(strategy);
    }
    session
        .configure_route(scenario.route.clone(), scenario.start)
        .ok_or(ReplayError::EmptyRoute)?;

    let mut server_headings = scenario.server_headings.clone();
    server_headings.sort_by_key(|heading| heading.timestamp);
    let mut pending_headings = server_headings.into_iter().peekable();

    let mut summary = ReplaySummary {
        route_length_m: geometry.total_distance(),
        samples_total: scenario.samples.len(),
        samples_processed: 0,
        on_track: 0,
        out_of_route: 0,
        arrived: false,
        arrived_at: None,
        final_progress_m: 0.0,
        heading_sources: BTreeMap::new(),
    };
    let mut frames = Vec::with_capacity(scenario.samples.len());
    let mut progress = 0.0_f64;

    tracing::info!(
        route_points = scenario.route.len(),
        route_length_m = format!("{:.1}", summary.route_length_m),
        samples = summary.samples_total,
        strategy = session.route_heading_strategy().as_str(),
        "Starting replay"
    );

    for (index, sample) in scenario.samples.iter().enumerate() {
        while let Some(heading) =
            pending_headings.next_if(|heading| heading.timestamp <= sample.timestamp)
        {
            session.update_server_heading(heading.value, heading.timestamp);
        }

        let Some(render) = session.handle_location_update(sample) else {
            break;
        };
        summary.samples_processed += 1;

        match &render {
            RenderState::OnTrack(frame) => {
                summary.on_track += 1;
                *summary
                    .heading_sources
                    .entry(frame.heading_source.as_str().to_string())
                    .or_default() += 1;

                let computed = geometry
                    .progress_from_remaining_path(&frame.remaining_path)
                    .unwrap_or_else(|| geometry.progress_of(frame.marker_coordinate));
                progress = progress.max(computed);

                if frame.has_arrived && !summary.arrived {
                    summary.arrived = true;
                    summary.arrived_at = Some(sample.timestamp);
                }
            }
            RenderState::OutOfRoute(_) => summary.out_of_route += 1,
        }

        let arrived = render.has_arrived();
        frames.push(ReplayFrame {
            index,
            timestamp: sample.timestamp,
            progress,
            render,
        });

        if arrived && options.stop_on_arrival {
            tracing::debug!(index, "Stopping replay at arrival");
            break;
        }
    }

    summary.final_progress_m = progress;

    tracing::info!(
        processed = summary.samples_processed,
        on_track = summary.on_track,
        out_of_route = summary.out_of_route,
        arrived = summary.arrived,
        final_progress_m = format!("{:.1}", progress),
        "Replay complete"
    );

    Ok(ReplayReport { frames, summary })
}

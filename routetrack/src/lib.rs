//! RouteTrack - live route tracking for navigation displays
//!
//! This library turns a fixed route and a stream of position fixes into a
//! stable "where is the vehicle, which way is it facing, what route remains"
//! signal:
//!
//! - [`snapper`] projects fixes onto the route and classifies them as on or
//!   off route
//! - [`heading`] fuses server, route, movement and device headings and eases
//!   the displayed heading with a bounded turn rate
//! - [`session`] ties both together into [`session::RenderState`] values
//! - [`geometry`] and [`animator`] move the marker along the route between
//!   updates without ever running backwards
//!
//! All tracking code is synchronous, allocation-light and free of I/O.
//! [`config::file`], [`replay`] and [`logging`] are the only modules that
//! touch the filesystem.

pub mod animator;
pub mod config;
pub mod geo;
pub mod geometry;
pub mod heading;
pub mod location;
pub mod logging;
pub mod replay;
pub mod session;
pub mod snapper;

pub use animator::{AnimatedMarker, ProgressAnimator, RouteFollower};
pub use config::TrackingConfig;
pub use geo::Coordinate;
pub use geometry::RouteGeometry;
pub use heading::{HeadingSource, RouteHeadingStrategy, ServerHeading};
pub use location::LocationSample;
pub use session::{RenderState, RerouteRequest, RouteSetup, TrackFrame, TrackingSession};
pub use snapper::{RouteSnapper, TrackingStatus};

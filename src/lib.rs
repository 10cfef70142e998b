// lib.rs - hazard-aware navigation app core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod error;
pub mod event;
pub mod geo;
pub mod model;
pub mod polyline;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use error::{CollaboratorError, ErrorKind};
pub use event::Event;
pub use geo::LatLng;
pub use model::Model;
pub use view::ViewModel;

/// Fallback map center when device geolocation is unavailable.
pub const DEFAULT_CENTER: LatLng = LatLng::new(40.7128, -74.006);

/// Fixed radius for the one-shot nearby-hazard query.
pub const HAZARD_SEARCH_RADIUS_M: f64 = 5_000.0;

/// Hazard display titles keep the first sentence up to this many chars.
pub const HAZARD_TITLE_MAX_CHARS: usize = 60;

/// Deadline the shell enforces per collaborator call; configurable via
/// `CoreConfig`.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Reported location accuracy attached to SOS events.
pub const DEFAULT_SOS_ACCURACY_M: f64 = 10.0;

pub const SAFETY_ANALYSIS_PROMPT: &str =
    "Analyze the driving routes between my origin and destination and rank them by safety.";

pub const ROUTE_UNAVAILABLE_ERROR: &str =
    "Unable to calculate route. Please try a different destination.";

pub const MISSING_POLYLINE_ERROR: &str =
    "This route suggestion has no path data to apply.";

pub const ASSISTANT_UNREACHABLE_REPLY: &str =
    "Sorry, I couldn't reach the assistant right now. Please try again in a moment.";

pub const EMPTY_REPLY_FALLBACK: &str = "Here are the route options I found.";

pub const SIGN_IN_REQUIRED_ERROR: &str = "You need to be signed in to do that.";

/// Milliseconds since the Unix epoch; 0 when the platform clock is
/// unavailable.
#[must_use]
pub fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

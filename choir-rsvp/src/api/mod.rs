//! HTTP API handlers for choir-rsvp

pub mod attendance;
pub mod error;
pub mod health;
pub mod responses;

pub use attendance::{get_attendance, get_events};
pub use error::{ApiError, Locale};
pub use health::health_routes;
pub use responses::submit_response;

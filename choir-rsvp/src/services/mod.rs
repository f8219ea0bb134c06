//! Service layer: spreadsheet access and attendance operations

pub mod attendance_service;
pub mod rsvp_service;
pub mod sheets_client;
pub mod sheets_gateway;

pub use attendance_service::AttendanceService;
pub use rsvp_service::RsvpService;
pub use sheets_client::{GoogleSheetsClient, SheetsBackend};
pub use sheets_gateway::SheetsGateway;

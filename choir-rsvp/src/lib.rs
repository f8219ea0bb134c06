//! choir-rsvp library - choir attendance service
//!
//! Serves the attendance view and accepts RSVPs, reading and writing the
//! members and responses sheets through a shared request queue.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use choir_common::config::ServiceConfig;
use choir_common::Result;

pub mod api;
pub mod services;
pub mod utils;

use services::{AttendanceService, GoogleSheetsClient, RsvpService, SheetsBackend, SheetsGateway};
use utils::{QueueConfig, RequestQueue, RetryPolicy};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub attendance: Arc<AttendanceService>,
    pub rsvp: Arc<RsvpService>,
}

impl AppState {
    /// Wire services around a spreadsheet backend.
    ///
    /// Creates the process-wide request queue, so it must run inside a Tokio
    /// runtime.
    pub fn new(backend: Arc<dyn SheetsBackend>, config: &ServiceConfig) -> Self {
        Self::with_retry_policy(
            backend,
            config,
            RetryPolicy::with_max_retries(config.max_retries),
        )
    }

    /// Same as [`AppState::new`] with explicit retry timing
    pub fn with_retry_policy(
        backend: Arc<dyn SheetsBackend>,
        config: &ServiceConfig,
        retry_policy: RetryPolicy,
    ) -> Self {
        let queue = Arc::new(RequestQueue::new(QueueConfig {
            max_concurrent: config.max_concurrent,
            delay_between_requests: config.delay_between_requests,
        }));
        let gateway = Arc::new(SheetsGateway::new(backend, queue, retry_policy));

        Self {
            attendance: Arc::new(AttendanceService::new(
                Arc::clone(&gateway),
                config.members_range.clone(),
                config.responses_range.clone(),
            )),
            rsvp: Arc::new(RsvpService::new(gateway, config.responses_range.clone())),
        }
    }

    /// State backed by the live Google Sheets API
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let client = GoogleSheetsClient::new(
            config.spreadsheet_id.clone(),
            config.credentials.clone(),
        )?;
        Ok(Self::new(Arc::new(client), config))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let endpoints = Router::new()
        .route("/api/attendance", get(api::get_attendance))
        .route("/api/events", get(api::get_events))
        .route("/api/responses", post(api::submit_response));

    Router::new()
        .merge(endpoints)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

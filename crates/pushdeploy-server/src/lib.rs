// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Webhook receiver and deploy orchestration for pushdeploy.
//!
//! A signed GitHub delivery passes the [`AdmissionGate`], is matched to a
//! configured repository, and is handed to the [`DeployPipeline`], which
//! downloads the zipball, stages it and swaps it into the plugin or theme
//! directory.

pub mod admission;
pub mod connection;
pub mod discover;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod rate_limit;
pub mod registry;
pub mod routes;
pub mod state;
pub mod versions;

pub use admission::{AdmissionFailure, AdmissionGate};
pub use connection::{check_connection, ConnectionStatus};
pub use error::{DeployError, ErrorKind, ServerError};
pub use events::WebhookEvent;
pub use pipeline::DeployPipeline;
pub use rate_limit::{InMemoryRateLimiter, RateLimiter};
pub use registry::RepositoryRegistry;
pub use state::{AppState, Services};
pub use versions::{VersionReport, VersionResolver};

use axum::{
	extract::DefaultBodyLimit,
	routing::{get, post},
	Router,
};
use pushdeploy_server_config::WEBHOOK_PATH;
use tower_http::trace::TraceLayer;

/// GitHub caps webhook payloads at 25 MB.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route(WEBHOOK_PATH, post(routes::webhook::receive_webhook))
		.route("/health", get(routes::health::health_check))
		.layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for the GitHub client.

use thiserror::Error;

/// Errors that can occur when talking to the GitHub API.
#[derive(Debug, Error)]
pub enum GithubError {
	/// No bearer token configured.
	#[error("GitHub token is not configured")]
	MissingToken,

	/// No webhook secret available to sign a webhook registration.
	#[error("Webhook secret is not configured")]
	MissingWebhookSecret,

	/// Token rejected by GitHub.
	#[error("Unauthorized: GitHub rejected the token")]
	Unauthorized,

	/// Rate limit exceeded.
	#[error("GitHub rate limit exceeded")]
	RateLimited,

	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// GitHub API returned a non-success status.
	#[error("GitHub API error: {status} - {message}")]
	ApiError { status: u16, message: String },

	/// The archive download returned no bytes.
	#[error("Downloaded archive is empty")]
	EmptyBody,

	/// The archive download exceeded the configured ceiling.
	#[error("Downloaded archive exceeds {limit} bytes")]
	DownloadTooLarge { limit: u64 },

	/// Invalid or unparseable response.
	#[error("Invalid response from GitHub: {0}")]
	InvalidResponse(String),

	/// Local I/O while writing a download.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Configuration error.
	#[error("Configuration error: {0}")]
	Config(String),
}

impl GithubError {
	/// Create an API error from status code and message.
	pub fn api_error(status: u16, message: impl Into<String>) -> Self {
		Self::ApiError {
			status,
			message: message.into(),
		}
	}

	/// Missing or rejected credentials.
	pub fn is_auth(&self) -> bool {
		matches!(
			self,
			GithubError::MissingToken | GithubError::MissingWebhookSecret | GithubError::Unauthorized
		)
	}

	/// Failure to reach GitHub at all.
	pub fn is_transport(&self) -> bool {
		matches!(self, GithubError::Network(_) | GithubError::Timeout)
	}

	/// A 404 from the API.
	pub fn is_not_found(&self) -> bool {
		matches!(self, GithubError::ApiError { status: 404, .. })
	}
}

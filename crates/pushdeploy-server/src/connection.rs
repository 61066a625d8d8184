// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Token check against the authenticated-user endpoint.

use std::fmt;

use pushdeploy_github::{GithubClient, GithubError};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
	Connected { login: String },
	NoToken,
	InvalidToken,
	RateLimited,
	/// 403 that is not a rate limit: the token lacks the needed scopes.
	Forbidden { message: String },
	Failed { message: String },
}

impl ConnectionStatus {
	pub fn is_connected(&self) -> bool {
		matches!(self, ConnectionStatus::Connected { .. })
	}
}

impl fmt::Display for ConnectionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConnectionStatus::Connected { login } => write!(f, "Connected to GitHub as {login}"),
			ConnectionStatus::NoToken => write!(f, "No GitHub token configured"),
			ConnectionStatus::InvalidToken => write!(f, "GitHub rejected the token"),
			ConnectionStatus::RateLimited => write!(f, "GitHub rate limit exceeded; try again later"),
			ConnectionStatus::Forbidden { message } => {
				write!(f, "Token lacks the required permissions: {message}")
			}
			ConnectionStatus::Failed { message } => write!(f, "Could not reach GitHub: {message}"),
		}
	}
}

pub async fn check_connection(github: &GithubClient) -> ConnectionStatus {
	let status = match github.current_user().await {
		Ok(user) => ConnectionStatus::Connected { login: user.login },
		Err(GithubError::MissingToken) => ConnectionStatus::NoToken,
		Err(GithubError::Unauthorized) => ConnectionStatus::InvalidToken,
		Err(GithubError::RateLimited) => ConnectionStatus::RateLimited,
		Err(GithubError::ApiError {
			status: 403,
			message,
		}) => ConnectionStatus::Forbidden { message },
		Err(e) => ConnectionStatus::Failed {
			message: e.to_string(),
		},
	};
	if status.is_connected() {
		info!(%status, "GitHub connection check passed");
	} else {
		warn!(%status, "GitHub connection check failed");
	}
	status
}

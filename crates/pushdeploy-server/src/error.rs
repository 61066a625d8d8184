// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Deploy failures and their HTTP mapping.

use std::fmt;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pushdeploy_archive::{ArchiveError, StageError, ValidationError};
use pushdeploy_common_core::TreeError;
use pushdeploy_github::GithubError;
use pushdeploy_install::InstallError;
use serde::Serialize;
use thiserror::Error;

use crate::events::PayloadError;

/// Coarse classification of a failed deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Auth,
	Transport,
	HostApi,
	Archive,
	Validation,
	Filesystem,
	Internal,
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ErrorKind::Auth => "auth",
			ErrorKind::Transport => "transport",
			ErrorKind::HostApi => "host_api",
			ErrorKind::Archive => "archive",
			ErrorKind::Validation => "validation",
			ErrorKind::Filesystem => "filesystem",
			ErrorKind::Internal => "internal",
		};
		f.write_str(s)
	}
}

#[derive(Debug, Error)]
pub enum DeployError {
	#[error(transparent)]
	Github(#[from] GithubError),

	#[error(transparent)]
	Archive(#[from] ArchiveError),

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error(transparent)]
	Install(#[from] InstallError),

	#[error(transparent)]
	Filesystem(#[from] TreeError),

	#[error("I/O error at {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Deploy task failed: {0}")]
	Task(#[from] tokio::task::JoinError),
}

impl From<StageError> for DeployError {
	fn from(e: StageError) -> Self {
		match e {
			StageError::Archive(e) => DeployError::Archive(e),
			StageError::Validation(e) => DeployError::Validation(e),
		}
	}
}

impl DeployError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			DeployError::Github(e) if e.is_auth() => ErrorKind::Auth,
			DeployError::Github(e) if e.is_transport() => ErrorKind::Transport,
			DeployError::Github(GithubError::Io(_)) => ErrorKind::Filesystem,
			DeployError::Github(GithubError::EmptyBody | GithubError::DownloadTooLarge { .. }) => {
				ErrorKind::Archive
			}
			DeployError::Github(GithubError::Config(_)) => ErrorKind::Internal,
			DeployError::Github(_) => ErrorKind::HostApi,
			DeployError::Archive(ArchiveError::Io { .. } | ArchiveError::Filesystem(_)) => {
				ErrorKind::Filesystem
			}
			DeployError::Archive(_) => ErrorKind::Archive,
			DeployError::Validation(ValidationError::Walk(_)) => ErrorKind::Filesystem,
			DeployError::Validation(_) => ErrorKind::Validation,
			DeployError::Install(InstallError::Manifest { .. }) => ErrorKind::Internal,
			DeployError::Install(_) | DeployError::Filesystem(_) | DeployError::Io { .. } => {
				ErrorKind::Filesystem
			}
			DeployError::Task(_) => ErrorKind::Internal,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
	pub message: String,
}

/// Errors returned from route handlers.
#[derive(Debug, Error)]
pub enum ServerError {
	/// Admission refused. The body is always empty.
	#[error("unauthorized")]
	Unauthorized,

	#[error(transparent)]
	BadPayload(#[from] PayloadError),

	#[error(transparent)]
	Deploy(#[from] DeployError),
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		match self {
			ServerError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
			ServerError::BadPayload(e) => (
				StatusCode::BAD_REQUEST,
				Json(MessageResponse {
					message: e.to_string(),
				}),
			)
				.into_response(),
			ServerError::Deploy(e) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(MessageResponse {
					message: e.to_string(),
				}),
			)
				.into_response(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_kind_mapping() {
		assert_eq!(DeployError::from(GithubError::MissingToken).kind(), ErrorKind::Auth);
		assert_eq!(DeployError::from(GithubError::Timeout).kind(), ErrorKind::Transport);
		assert_eq!(
			DeployError::from(GithubError::api_error(404, "Not Found")).kind(),
			ErrorKind::HostApi
		);
		assert_eq!(DeployError::from(GithubError::EmptyBody).kind(), ErrorKind::Archive);
		assert_eq!(
			DeployError::from(ArchiveError::TooLarge { limit: 1 }).kind(),
			ErrorKind::Archive
		);
		assert_eq!(
			DeployError::from(StageError::Validation(ValidationError::DisallowedFile {
				path: PathBuf::from("x.exe")
			}))
			.kind(),
			ErrorKind::Validation
		);
		assert_eq!(
			DeployError::from(InstallError::MissingSource(PathBuf::from("/nope"))).kind(),
			ErrorKind::Filesystem
		);
	}

	#[test]
	fn test_unauthorized_has_empty_body() {
		let response = ServerError::Unauthorized.into_response();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert!(response
			.headers()
			.get(axum::http::header::CONTENT_TYPE)
			.is_none());
	}

	#[test]
	fn test_deploy_failure_is_500() {
		let response = ServerError::from(DeployError::from(GithubError::MissingToken)).into_response();
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}

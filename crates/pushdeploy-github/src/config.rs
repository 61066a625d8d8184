// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration for the GitHub client.

use std::time::Duration;

use pushdeploy_common_secret::{Secret, SecretString};
use reqwest::Url;

use crate::error::GithubError;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for [`GithubClient`](crate::GithubClient).
///
/// The token is held as a [`SecretString`] so it never shows up in logs.
#[derive(Clone)]
pub struct GithubConfig {
	token: Option<SecretString>,

	/// Validated base URL without a trailing slash.
	base_url: String,

	/// Timeout for metadata, hook and version calls.
	request_timeout: Duration,

	/// Timeout for zipball downloads.
	download_timeout: Duration,
}

impl std::fmt::Debug for GithubConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GithubConfig")
			.field("token", &self.token)
			.field("base_url", &self.base_url)
			.field("request_timeout", &self.request_timeout)
			.field("download_timeout", &self.download_timeout)
			.finish()
	}
}

impl Default for GithubConfig {
	fn default() -> Self {
		Self {
			token: None,
			base_url: DEFAULT_BASE_URL.to_string(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
		}
	}
}

impl GithubConfig {
	/// Validate and normalize a base URL.
	///
	/// Requirements:
	/// - Must be a valid URL with a host
	/// - Must use HTTPS, except for loopback hosts (local mirrors and tests)
	/// - Trailing slashes are trimmed
	pub fn validate_base_url(raw: &str) -> Result<String, GithubError> {
		let url = Url::parse(raw)
			.map_err(|e| GithubError::Config(format!("Invalid GitHub base URL '{raw}': {e}")))?;

		let host = url
			.host_str()
			.ok_or_else(|| GithubError::Config("GitHub base URL must include a host".to_string()))?;

		let loopback = matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1");
		match url.scheme() {
			"https" => {}
			"http" if loopback => {}
			other => {
				return Err(GithubError::Config(format!(
					"GitHub base URL must use https, got '{other}'"
				)))
			}
		}

		Ok(url.as_str().trim_end_matches('/').to_string())
	}

	pub fn new() -> Self {
		Self::default()
	}

	/// Set the bearer token. An empty token counts as unset.
	pub fn with_token(mut self, token: impl Into<String>) -> Self {
		let token = token.into();
		self.token = if token.is_empty() {
			None
		} else {
			Some(Secret::new(token))
		};
		self
	}

	/// Set the token from an already-wrapped secret.
	pub fn with_secret_token(mut self, token: Option<SecretString>) -> Self {
		self.token = token.filter(|t| !t.is_empty());
		self
	}

	/// Set a custom base URL (GitHub Enterprise or testing).
	pub fn with_base_url(mut self, url: &str) -> Result<Self, GithubError> {
		self.base_url = Self::validate_base_url(url)?;
		Ok(self)
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
		self.download_timeout = timeout;
		self
	}

	pub fn token(&self) -> Option<&str> {
		self.token.as_ref().map(|t| t.expose().as_str())
	}

	pub fn has_token(&self) -> bool {
		self.token.is_some()
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}

	pub fn download_timeout(&self) -> Duration {
		self.download_timeout
	}
}

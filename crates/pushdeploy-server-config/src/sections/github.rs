// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub credentials and API settings.

use pushdeploy_common_secret::SecretString;
use serde::Deserialize;

const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct GithubSettings {
	pub token: Option<SecretString>,
	pub webhook_secret: Option<SecretString>,
	pub api_base_url: String,
	pub request_timeout_secs: u64,
	pub download_timeout_secs: u64,
}

impl Default for GithubSettings {
	fn default() -> Self {
		GithubSettingsLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubSettingsLayer {
	#[serde(default)]
	pub token: Option<SecretString>,
	#[serde(default)]
	pub webhook_secret: Option<SecretString>,
	#[serde(default)]
	pub api_base_url: Option<String>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	#[serde(default)]
	pub download_timeout_secs: Option<u64>,
}

impl GithubSettingsLayer {
	pub fn merge(&mut self, other: GithubSettingsLayer) {
		if other.token.is_some() {
			self.token = other.token;
		}
		if other.webhook_secret.is_some() {
			self.webhook_secret = other.webhook_secret;
		}
		if other.api_base_url.is_some() {
			self.api_base_url = other.api_base_url;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.download_timeout_secs.is_some() {
			self.download_timeout_secs = other.download_timeout_secs;
		}
	}

	/// Empty secrets count as unset.
	pub fn finalize(self) -> GithubSettings {
		GithubSettings {
			token: self.token.filter(|t| !t.is_empty()),
			webhook_secret: self.webhook_secret.filter(|s| !s.is_empty()),
			api_base_url: self
				.api_base_url
				.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
			download_timeout_secs: self
				.download_timeout_secs
				.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP listener configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Route GitHub delivers webhooks to.
pub const WEBHOOK_PATH: &str = "/gh-deployer/v1/webhook";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Public URL GitHub reaches this server at, without a trailing slash.
	pub base_url: String,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST.to_string(),
			port: DEFAULT_PORT,
			base_url: DEFAULT_BASE_URL.to_string(),
		}
	}
}

impl HttpConfig {
	/// Callback URL registered on GitHub hooks.
	pub fn webhook_url(&self) -> String {
		format!("{}{WEBHOOK_PATH}", self.base_url)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub base_url: Option<String>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
	}

	pub fn finalize(self) -> Result<HttpConfig, ConfigError> {
		let base_url = self
			.base_url
			.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
		let parsed = url::Url::parse(&base_url)
			.map_err(|e| ConfigError::invalid("http.base_url", format!("'{base_url}': {e}")))?;
		if !matches!(parsed.scheme(), "http" | "https") {
			return Err(ConfigError::invalid(
				"http.base_url",
				format!("unsupported scheme '{}'", parsed.scheme()),
			));
		}

		Ok(HttpConfig {
			host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
			port: self.port.unwrap_or(DEFAULT_PORT),
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}
}

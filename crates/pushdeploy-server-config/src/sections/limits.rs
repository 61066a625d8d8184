// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rate and size limits.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_WEBHOOK_RATE_LIMIT: u32 = 10;
const DEFAULT_WEBHOOK_RATE_WINDOW_SECS: u64 = 60;
const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 100 * 1024 * 1024;
const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitsConfig {
	/// Webhook requests admitted per window.
	pub webhook_rate_limit: u32,
	pub webhook_rate_window_secs: u64,
	pub max_archive_bytes: u64,
	pub max_file_bytes: u64,
}

impl Default for LimitsConfig {
	fn default() -> Self {
		Self {
			webhook_rate_limit: DEFAULT_WEBHOOK_RATE_LIMIT,
			webhook_rate_window_secs: DEFAULT_WEBHOOK_RATE_WINDOW_SECS,
			max_archive_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
			max_file_bytes: DEFAULT_MAX_FILE_BYTES,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsConfigLayer {
	#[serde(default)]
	pub webhook_rate_limit: Option<u32>,
	#[serde(default)]
	pub webhook_rate_window_secs: Option<u64>,
	#[serde(default)]
	pub max_archive_bytes: Option<u64>,
	#[serde(default)]
	pub max_file_bytes: Option<u64>,
}

impl LimitsConfigLayer {
	pub fn merge(&mut self, other: LimitsConfigLayer) {
		if other.webhook_rate_limit.is_some() {
			self.webhook_rate_limit = other.webhook_rate_limit;
		}
		if other.webhook_rate_window_secs.is_some() {
			self.webhook_rate_window_secs = other.webhook_rate_window_secs;
		}
		if other.max_archive_bytes.is_some() {
			self.max_archive_bytes = other.max_archive_bytes;
		}
		if other.max_file_bytes.is_some() {
			self.max_file_bytes = other.max_file_bytes;
		}
	}

	pub fn finalize(self) -> Result<LimitsConfig, ConfigError> {
		let defaults = LimitsConfig::default();
		let config = LimitsConfig {
			webhook_rate_limit: self.webhook_rate_limit.unwrap_or(defaults.webhook_rate_limit),
			webhook_rate_window_secs: self
				.webhook_rate_window_secs
				.unwrap_or(defaults.webhook_rate_window_secs),
			max_archive_bytes: self.max_archive_bytes.unwrap_or(defaults.max_archive_bytes),
			max_file_bytes: self.max_file_bytes.unwrap_or(defaults.max_file_bytes),
		};

		for (key, value) in [
			("limits.webhook_rate_limit", u64::from(config.webhook_rate_limit)),
			("limits.webhook_rate_window_secs", config.webhook_rate_window_secs),
			("limits.max_archive_bytes", config.max_archive_bytes),
			("limits.max_file_bytes", config.max_file_bytes),
		] {
			if value == 0 {
				return Err(ConfigError::invalid(key, "must be greater than zero"));
			}
		}

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let limits = LimitsConfigLayer::default().finalize().unwrap();
		assert_eq!(limits, LimitsConfig::default());
		assert_eq!(limits.webhook_rate_limit, 10);
		assert_eq!(limits.webhook_rate_window_secs, 60);
		assert_eq!(limits.max_archive_bytes, 104_857_600);
		assert_eq!(limits.max_file_bytes, 52_428_800);
	}

	#[test]
	fn test_zero_rejected() {
		let layer = LimitsConfigLayer {
			webhook_rate_limit: Some(0),
			..Default::default()
		};
		assert!(layer.finalize().is_err());
	}
}

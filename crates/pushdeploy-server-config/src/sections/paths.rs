// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filesystem locations.

use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_PLUGINS_DIR: &str = "/var/www/html/wp-content/plugins";
const DEFAULT_THEMES_DIR: &str = "/var/www/html/wp-content/themes";
const DEFAULT_DATA_DIR: &str = "/var/lib/pushdeploy";

#[derive(Debug, Clone)]
pub struct PathsConfig {
	pub plugins_dir: PathBuf,
	pub themes_dir: PathBuf,
	/// Downloads and extractions happen here.
	pub temp_dir: PathBuf,
	/// Holds the install manifest.
	pub data_dir: PathBuf,
}

impl Default for PathsConfig {
	fn default() -> Self {
		PathsConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfigLayer {
	#[serde(default)]
	pub plugins_dir: Option<String>,
	#[serde(default)]
	pub themes_dir: Option<String>,
	#[serde(default)]
	pub temp_dir: Option<String>,
	#[serde(default)]
	pub data_dir: Option<String>,
}

impl PathsConfigLayer {
	pub fn merge(&mut self, other: PathsConfigLayer) {
		if other.plugins_dir.is_some() {
			self.plugins_dir = other.plugins_dir;
		}
		if other.themes_dir.is_some() {
			self.themes_dir = other.themes_dir;
		}
		if other.temp_dir.is_some() {
			self.temp_dir = other.temp_dir;
		}
		if other.data_dir.is_some() {
			self.data_dir = other.data_dir;
		}
	}

	pub fn finalize(self) -> PathsConfig {
		PathsConfig {
			plugins_dir: self
				.plugins_dir
				.map(PathBuf::from)
				.unwrap_or_else(|| PathBuf::from(DEFAULT_PLUGINS_DIR)),
			themes_dir: self
				.themes_dir
				.map(PathBuf::from)
				.unwrap_or_else(|| PathBuf::from(DEFAULT_THEMES_DIR)),
			temp_dir: self
				.temp_dir
				.map(PathBuf::from)
				.unwrap_or_else(std::env::temp_dir),
			data_dir: self
				.data_dir
				.map(PathBuf::from)
				.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
		}
	}
}

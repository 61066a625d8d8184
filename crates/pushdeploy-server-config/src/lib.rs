// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the pushdeploy server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`PUSHDEPLOY_*`), with `*_FILE`
//!   variants for secrets
//!
//! # Usage
//!
//! ```ignore
//! use pushdeploy_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use std::path::PathBuf;

use pushdeploy_common_core::RepositoryConfig;
use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub github: GithubSettings,
	pub paths: PathsConfig,
	pub limits: LimitsConfig,
	pub logging: LoggingConfig,
	/// Deploy targets in configured order.
	pub repositories: Vec<RepositoryConfig>,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`PUSHDEPLOY_*`)
/// 2. Config file (`/etc/pushdeploy/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and finalize.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize()?;
	let github = layer.github.unwrap_or_default().finalize();
	let paths = layer.paths.unwrap_or_default().finalize();
	let limits = layer.limits.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();
	let repositories = finalize_repositories(layer.repositories.unwrap_or_default())?;

	validate_config(&paths)?;

	info!(
		host = %http.host,
		port = http.port,
		base_url = %http.base_url,
		github_api = %github.api_base_url,
		token_configured = github.token.is_some(),
		webhook_secret_configured = github.webhook_secret.is_some(),
		repositories = repositories.len(),
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		github,
		paths,
		limits,
		logging,
		repositories,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(paths: &PathsConfig) -> Result<(), ConfigError> {
	if paths.plugins_dir == paths.themes_dir {
		return Err(ConfigError::Validation(format!(
			"paths.plugins_dir and paths.themes_dir must differ (both are {})",
			paths.plugins_dir.display()
		)));
	}

	Ok(())
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::env::{load_secret_with, process_env, Lookup};
use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	GithubSettingsLayer, HttpConfigLayer, LimitsConfigLayer, LogFormat, LoggingConfigLayer,
	PathsConfigLayer, RepositoryEntry,
};

/// Default location of the config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/pushdeploy/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PUSHDEPLOY_<SECTION>_<FIELD>
pub struct EnvSource;

impl EnvSource {
	/// Build a layer from an arbitrary variable lookup.
	pub fn load_with(lookup: Lookup<'_>) -> Result<ServerConfigLayer, ConfigError> {
		let env = Env { lookup };
		Ok(ServerConfigLayer {
			http: Some(env.http()?),
			github: Some(env.github()?),
			paths: Some(env.paths()),
			limits: Some(env.limits()?),
			logging: Some(env.logging()?),
			repositories: env.repositories()?,
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Self::load_with(&process_env)
	}
}

struct Env<'a> {
	lookup: Lookup<'a>,
}

impl Env<'_> {
	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn parsed<T: std::str::FromStr>(&self, name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v
				.parse()
				.map(Some)
				.map_err(|_| ConfigError::invalid(name, format!("invalid {kind} value '{v}'"))),
			None => Ok(None),
		}
	}

	fn http(&self) -> Result<HttpConfigLayer, ConfigError> {
		Ok(HttpConfigLayer {
			host: self.var("PUSHDEPLOY_HTTP_HOST"),
			port: self.parsed("PUSHDEPLOY_HTTP_PORT", "u16")?,
			base_url: self.var("PUSHDEPLOY_HTTP_BASE_URL"),
		})
	}

	fn github(&self) -> Result<GithubSettingsLayer, ConfigError> {
		let secret = |name: &str| {
			load_secret_with(name, self.lookup).map_err(|e| ConfigError::Secret(e.to_string()))
		};
		Ok(GithubSettingsLayer {
			token: secret("PUSHDEPLOY_GITHUB_TOKEN")?,
			webhook_secret: secret("PUSHDEPLOY_GITHUB_WEBHOOK_SECRET")?,
			api_base_url: self.var("PUSHDEPLOY_GITHUB_API_BASE_URL"),
			request_timeout_secs: self.parsed("PUSHDEPLOY_GITHUB_REQUEST_TIMEOUT_SECS", "u64")?,
			download_timeout_secs: self.parsed("PUSHDEPLOY_GITHUB_DOWNLOAD_TIMEOUT_SECS", "u64")?,
		})
	}

	fn paths(&self) -> PathsConfigLayer {
		PathsConfigLayer {
			plugins_dir: self.var("PUSHDEPLOY_PATHS_PLUGINS_DIR"),
			themes_dir: self.var("PUSHDEPLOY_PATHS_THEMES_DIR"),
			temp_dir: self.var("PUSHDEPLOY_PATHS_TEMP_DIR"),
			data_dir: self.var("PUSHDEPLOY_PATHS_DATA_DIR"),
		}
	}

	fn limits(&self) -> Result<LimitsConfigLayer, ConfigError> {
		Ok(LimitsConfigLayer {
			webhook_rate_limit: self.parsed("PUSHDEPLOY_LIMITS_WEBHOOK_RATE_LIMIT", "u32")?,
			webhook_rate_window_secs: self.parsed("PUSHDEPLOY_LIMITS_WEBHOOK_RATE_WINDOW_SECS", "u64")?,
			max_archive_bytes: self.parsed("PUSHDEPLOY_LIMITS_MAX_ARCHIVE_BYTES", "u64")?,
			max_file_bytes: self.parsed("PUSHDEPLOY_LIMITS_MAX_FILE_BYTES", "u64")?,
		})
	}

	fn logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		Ok(LoggingConfigLayer {
			level: self.var("PUSHDEPLOY_LOGGING_LEVEL"),
			format: self
				.var("PUSHDEPLOY_LOGGING_FORMAT")
				.map(|v| v.parse::<LogFormat>())
				.transpose()?,
		})
	}

	/// `PUSHDEPLOY_REPOSITORIES` holds a JSON array of entries.
	fn repositories(&self) -> Result<Option<Vec<RepositoryEntry>>, ConfigError> {
		self.var("PUSHDEPLOY_REPOSITORIES")
			.map(|json| {
				serde_json::from_str(&json).map_err(|e| {
					ConfigError::invalid("PUSHDEPLOY_REPOSITORIES", format!("invalid JSON: {e}"))
				})
			})
			.transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;

	fn load(vars: &[(&str, &str)]) -> Result<ServerConfigLayer, ConfigError> {
		let map: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		EnvSource::load_with(&move |name: &str| map.get(name).cloned())
	}

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.repositories.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/config.toml");
		let layer = source.load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn test_toml_source_parses_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[http]
port = 9090
base_url = "https://site.example"

[github]
token = "ghp_file"

[limits]
webhook_rate_limit = 3

[[repositories]]
project = "acme/widget"
component_type = "plugin"
canonical_name = "widget"
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.http.unwrap().port, Some(9090));
		assert_eq!(
			layer.github.unwrap().token.unwrap().expose(),
			"ghp_file"
		);
		assert_eq!(layer.limits.unwrap().webhook_rate_limit, Some(3));
		assert_eq!(layer.repositories.unwrap()[0].canonical_name, "widget");
	}

	#[test]
	fn test_toml_source_parse_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "[http\nport = ").unwrap();
		assert!(matches!(
			TomlSource::new(file.path()).load(),
			Err(ConfigError::TomlParse { .. })
		));
	}

	#[test]
	fn test_env_values() {
		let layer = load(&[
			("PUSHDEPLOY_HTTP_PORT", "7000"),
			("PUSHDEPLOY_GITHUB_WEBHOOK_SECRET", "hook-secret"),
			("PUSHDEPLOY_LOGGING_FORMAT", "json"),
			(
				"PUSHDEPLOY_REPOSITORIES",
				r#"[{"project":"acme/widget","component_type":"plugin","canonical_name":"widget"}]"#,
			),
		])
		.unwrap();

		assert_eq!(layer.http.unwrap().port, Some(7000));
		assert_eq!(
			layer.github.unwrap().webhook_secret.unwrap().expose(),
			"hook-secret"
		);
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
		assert_eq!(layer.repositories.unwrap().len(), 1);
	}

	#[test]
	fn test_env_invalid_number() {
		let err = load(&[("PUSHDEPLOY_HTTP_PORT", "eighty")]).unwrap_err();
		assert!(err.to_string().contains("PUSHDEPLOY_HTTP_PORT"));
	}

	#[test]
	fn test_env_invalid_repositories_json() {
		assert!(load(&[("PUSHDEPLOY_REPOSITORIES", "[{")]).is_err());
	}

	#[test]
	fn test_env_unset_leaves_fields_empty() {
		let layer = load(&[]).unwrap();
		assert!(layer.http.unwrap().port.is_none());
		assert!(layer.repositories.is_none());
	}
}

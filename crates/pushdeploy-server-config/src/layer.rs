// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::sections::{
	GithubSettingsLayer, HttpConfigLayer, LimitsConfigLayer, LoggingConfigLayer, PathsConfigLayer,
	RepositoryEntry,
};

/// Partial configuration produced by one source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub github: Option<GithubSettingsLayer>,
	#[serde(default)]
	pub paths: Option<PathsConfigLayer>,
	#[serde(default)]
	pub limits: Option<LimitsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	/// Replaced wholesale by a later source, never appended to.
	#[serde(default)]
	pub repositories: Option<Vec<RepositoryEntry>>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *base = Some(incoming),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.github, other.github, GithubSettingsLayer::merge);
		merge_section(&mut self.paths, other.paths, PathsConfigLayer::merge);
		merge_section(&mut self.limits, other.limits, LimitsConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		if other.repositories.is_some() {
			self.repositories = other.repositories;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(base.http.unwrap().port, Some(9000));
	}

	#[test]
	fn test_merge_field_level() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: Some("127.0.0.1".to_string()),
				port: Some(1),
				base_url: None,
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(2),
				..Default::default()
			}),
			..Default::default()
		});
		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
		assert_eq!(http.port, Some(2));
	}

	#[test]
	fn test_repositories_replaced() {
		let entry = |name: &str| RepositoryEntry {
			project: format!("acme/{name}"),
			component_type: "plugin".to_string(),
			canonical_name: name.to_string(),
		};
		let mut base = ServerConfigLayer {
			repositories: Some(vec![entry("a"), entry("b")]),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			repositories: Some(vec![entry("c")]),
			..Default::default()
		});
		assert_eq!(base.repositories.unwrap(), vec![entry("c")]);
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configured deploy targets.

use std::collections::HashSet;

use pushdeploy_common_core::{CanonicalName, ComponentType, ProjectRef, RepositoryConfig};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One `[[repositories]]` entry as written in TOML or JSON, before
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
	pub project: String,
	pub component_type: String,
	pub canonical_name: String,
}

/// Parse and cross-check repository entries, preserving order.
///
/// Within a component type, canonical names and projects must be unique.
pub fn finalize_repositories(
	entries: Vec<RepositoryEntry>,
) -> Result<Vec<RepositoryConfig>, ConfigError> {
	let mut seen_names = HashSet::new();
	let mut seen_projects = HashSet::new();
	let mut repositories = Vec::with_capacity(entries.len());

	for (index, entry) in entries.into_iter().enumerate() {
		let key = |field: &str| format!("repositories[{index}].{field}");

		let project = ProjectRef::parse(&entry.project)
			.map_err(|e| ConfigError::invalid(key("project"), e.to_string()))?;
		let component_type: ComponentType = entry
			.component_type
			.parse()
			.map_err(|e: pushdeploy_common_core::TypeError| {
				ConfigError::invalid(key("component_type"), e.to_string())
			})?;
		let canonical_name = CanonicalName::parse(&entry.canonical_name)
			.map_err(|e| ConfigError::invalid(key("canonical_name"), e.to_string()))?;

		if !seen_names.insert((component_type, canonical_name.clone())) {
			return Err(ConfigError::Validation(format!(
				"{component_type} canonical name '{canonical_name}' is configured more than once"
			)));
		}
		if !seen_projects.insert((component_type, project.full_name().to_ascii_lowercase())) {
			return Err(ConfigError::Validation(format!(
				"project '{project}' is configured more than once as a {component_type}"
			)));
		}

		repositories.push(RepositoryConfig {
			project,
			component_type,
			canonical_name,
		});
	}

	Ok(repositories)
}

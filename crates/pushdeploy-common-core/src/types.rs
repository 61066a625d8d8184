// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Kind of component a repository deploys into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
	Plugin,
	Theme,
}

impl ComponentType {
	pub fn as_str(&self) -> &'static str {
		match self {
			ComponentType::Plugin => "plugin",
			ComponentType::Theme => "theme",
		}
	}
}

impl fmt::Display for ComponentType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ComponentType {
	type Err = TypeError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"plugin" => Ok(ComponentType::Plugin),
			"theme" => Ok(ComponentType::Theme),
			_ => Err(TypeError::UnknownComponentType(s.to_string())),
		}
	}
}

/// A hosting project identifier of the form `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectRef {
	owner: String,
	name: String,
}

impl ProjectRef {
	pub fn parse(raw: &str) -> Result<Self, TypeError> {
		let invalid = || TypeError::InvalidProjectRef(raw.to_string());
		let (owner, name) = raw.split_once('/').ok_or_else(invalid)?;

		let owner_ok = !owner.is_empty()
			&& owner
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
		let name_ok = !name.is_empty()
			&& name != "."
			&& name != ".."
			&& name
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');

		if !owner_ok || !name_ok {
			return Err(invalid());
		}

		Ok(Self {
			owner: owner.to_string(),
			name: name.to_string(),
		})
	}

	pub fn owner(&self) -> &str {
		&self.owner
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// The `owner/name` form used in API paths and webhook payloads.
	pub fn full_name(&self) -> String {
		format!("{}/{}", self.owner, self.name)
	}

	/// Case-insensitive match against a payload's `repository.full_name`.
	pub fn matches_full_name(&self, full_name: &str) -> bool {
		full_name.eq_ignore_ascii_case(&self.full_name())
	}
}

impl fmt::Display for ProjectRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.owner, self.name)
	}
}

impl FromStr for ProjectRef {
	type Err = TypeError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<String> for ProjectRef {
	type Error = TypeError;
	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<ProjectRef> for String {
	fn from(value: ProjectRef) -> Self {
		value.full_name()
	}
}

/// Directory name a component is installed under.
///
/// Always a single path segment, so joining it onto a storage root can never
/// escape that root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalName(String);

impl CanonicalName {
	pub fn parse(raw: &str) -> Result<Self, TypeError> {
		let fail = |reason| {
			Err(TypeError::InvalidCanonicalName {
				name: raw.to_string(),
				reason,
			})
		};

		if raw.is_empty() || raw.len() > 100 {
			return fail("must be 1-100 characters");
		}
		if raw.starts_with('.') || raw.starts_with('-') {
			return fail("cannot start with '.' or '-'");
		}
		if raw.contains("..") {
			return fail("cannot contain '..'");
		}
		if !raw
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
		{
			return fail("can only contain letters, numbers, dash, underscore, dot");
		}

		Ok(Self(raw.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for CanonicalName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for CanonicalName {
	type Err = TypeError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<String> for CanonicalName {
	type Error = TypeError;
	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<CanonicalName> for String {
	fn from(value: CanonicalName) -> Self {
		value.0
	}
}

impl AsRef<std::path::Path> for CanonicalName {
	fn as_ref(&self) -> &std::path::Path {
		std::path::Path::new(&self.0)
	}
}

/// One configured deploy target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
	pub project: ProjectRef,
	pub component_type: ComponentType,
	pub canonical_name: CanonicalName,
}

/// A single pipeline invocation: which target, at which ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
	pub repository: RepositoryConfig,
	pub git_ref: String,
}

impl DeployRequest {
	pub fn new(repository: RepositoryConfig, git_ref: impl Into<String>) -> Self {
		Self {
			repository,
			git_ref: git_ref.into(),
		}
	}
}

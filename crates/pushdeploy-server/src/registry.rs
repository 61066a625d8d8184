// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use pushdeploy_common_core::{ProjectRef, RepositoryConfig};

/// Configured deploy targets, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct RepositoryRegistry {
	entries: Vec<RepositoryConfig>,
}

impl RepositoryRegistry {
	pub fn new(entries: Vec<RepositoryConfig>) -> Self {
		Self { entries }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &RepositoryConfig> {
		self.entries.iter()
	}

	/// First entry whose project matches a payload's `repository.full_name`,
	/// ignoring case.
	pub fn find_by_full_name(&self, full_name: &str) -> Option<&RepositoryConfig> {
		self.entries
			.iter()
			.find(|entry| entry.project.matches_full_name(full_name))
	}

	pub fn find(&self, project: &ProjectRef) -> Option<&RepositoryConfig> {
		self.find_by_full_name(&project.full_name())
	}
}

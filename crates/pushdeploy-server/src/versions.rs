// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Installed and available versions for configured repositories.

use std::sync::Arc;

use pushdeploy_common_core::{ProjectRef, RepositoryConfig};
use pushdeploy_github::GithubClient;
use pushdeploy_install::{Installer, UnknownActivation};
use serde::Serialize;
use tracing::warn;

/// One row of the version report. Either side may be unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionReport {
	pub project: String,
	pub canonical_name: String,
	pub component_type: String,
	pub current: Option<String>,
	pub latest: Option<String>,
	/// Ref of the last recorded deploy.
	pub deployed_ref: Option<String>,
	pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct VersionResolver {
	github: GithubClient,
	installer: Arc<Installer>,
}

impl VersionResolver {
	pub fn new(github: GithubClient, installer: Arc<Installer>) -> Self {
		Self { github, installer }
	}

	/// Version declared by the installed tree. Local only.
	pub fn current_version(&self, repository: &RepositoryConfig) -> Option<String> {
		self.installer.current_version(repository)
	}

	/// Latest release tag, else the newest tag. Lookup failures are logged
	/// and reported as unknown.
	pub async fn latest_version(&self, project: &ProjectRef) -> Option<String> {
		match self.github.latest_version(project).await {
			Ok(version) => version,
			Err(e) => {
				warn!(project = %project, error = %e, "Could not resolve latest version");
				None
			}
		}
	}

	pub async fn report(&self, repository: &RepositoryConfig) -> VersionReport {
		let installed = self.installer.inspect(repository, &UnknownActivation);
		VersionReport {
			project: repository.project.full_name(),
			canonical_name: repository.canonical_name.to_string(),
			component_type: repository.component_type.to_string(),
			current: installed.current_version,
			latest: self.latest_version(&repository.project).await,
			deployed_ref: installed.deployed_ref,
			active: installed.active,
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fetch, validate and install one ref of a configured repository.

use std::path::PathBuf;
use std::sync::Arc;

use pushdeploy_archive::{ArchiveLimits, StagedArchive};
use pushdeploy_common_core::{DeployRequest, RepositoryConfig};
use pushdeploy_github::GithubClient;
use pushdeploy_install::{InstallOutcome, Installer};
use tracing::{info, instrument, warn};

use crate::error::DeployError;

#[derive(Debug, Clone)]
pub struct DeployPipeline {
	github: GithubClient,
	installer: Arc<Installer>,
	limits: ArchiveLimits,
	temp_dir: PathBuf,
}

impl DeployPipeline {
	pub fn new(
		github: GithubClient,
		installer: Arc<Installer>,
		limits: ArchiveLimits,
		temp_dir: impl Into<PathBuf>,
	) -> Self {
		Self {
			github,
			installer,
			limits,
			temp_dir: temp_dir.into(),
		}
	}

	pub fn github(&self) -> &GithubClient {
		&self.github
	}

	pub fn installer(&self) -> &Arc<Installer> {
		&self.installer
	}

	/// Run a deploy. Holds the lease for the canonical name from download
	/// until the new tree is live; temporary files are gone on return.
	#[instrument(
		skip_all,
		fields(
			project = %request.repository.project,
			canonical_name = %request.repository.canonical_name,
			git_ref = %request.git_ref
		)
	)]
	pub async fn deploy(&self, request: &DeployRequest) -> Result<InstallOutcome, DeployError> {
		let repository = &request.repository;
		let _lease = self
			.installer
			.leases()
			.acquire(&repository.canonical_name)
			.await?;

		tokio::fs::create_dir_all(&self.temp_dir)
			.await
			.map_err(|source| DeployError::Io {
				path: self.temp_dir.clone(),
				source,
			})?;
		let archive = self
			.github
			.download_archive(
				&repository.project,
				&request.git_ref,
				&self.temp_dir,
				self.limits.max_total_bytes,
			)
			.await?;

		let installer = Arc::clone(&self.installer);
		let limits = self.limits;
		let temp_dir = self.temp_dir.clone();
		let repository = repository.clone();
		let git_ref = request.git_ref.clone();

		let outcome = tokio::task::spawn_blocking(move || -> Result<InstallOutcome, DeployError> {
			let mut staged = StagedArchive::new(archive, &temp_dir)?;
			let result = staged
				.prepare(&repository.canonical_name, &limits)
				.map_err(DeployError::from)
				.and_then(|root| Ok(installer.install(root, &repository, &git_ref)?));
			if let Err(e) = staged.close() {
				warn!(error = %e, "Failed to remove temporary deploy files");
			}
			result
		})
		.await??;

		info!(
			target = %outcome.target.display(),
			replaced_previous = outcome.replaced_previous,
			"Deploy complete"
		);
		Ok(outcome)
	}

	/// Remove an installed component under the same lease a deploy takes.
	#[instrument(skip_all, fields(canonical_name = %repository.canonical_name))]
	pub async fn uninstall(&self, repository: &RepositoryConfig) -> Result<bool, DeployError> {
		let _lease = self
			.installer
			.leases()
			.acquire(&repository.canonical_name)
			.await?;

		let installer = Arc::clone(&self.installer);
		let repository = repository.clone();
		let removed = tokio::task::spawn_blocking(move || installer.uninstall(&repository)).await??;
		Ok(removed)
	}
}

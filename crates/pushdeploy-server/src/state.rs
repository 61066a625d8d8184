// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared state and its construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use pushdeploy_archive::ArchiveLimits;
use pushdeploy_github::{GithubClient, GithubConfig, GithubError, WebhookManager};
use pushdeploy_install::Installer;
use pushdeploy_server_config::{GithubSettings, LimitsConfig, PathsConfig, ServerConfig};

use crate::admission::AdmissionGate;
use crate::pipeline::DeployPipeline;
use crate::rate_limit::{InMemoryRateLimiter, RateLimiter};
use crate::registry::RepositoryRegistry;
use crate::versions::VersionResolver;

pub fn github_client(settings: &GithubSettings) -> Result<GithubClient, GithubError> {
	let config = GithubConfig::new()
		.with_secret_token(settings.token.clone())
		.with_base_url(&settings.api_base_url)?
		.with_request_timeout(Duration::from_secs(settings.request_timeout_secs))
		.with_download_timeout(Duration::from_secs(settings.download_timeout_secs));
	GithubClient::new(config)
}

pub fn installer(paths: &PathsConfig) -> Installer {
	Installer::new(paths.plugins_dir.clone(), paths.themes_dir.clone(), &paths.data_dir)
}

pub fn archive_limits(limits: &LimitsConfig) -> ArchiveLimits {
	ArchiveLimits {
		max_total_bytes: limits.max_archive_bytes,
		max_file_bytes: limits.max_file_bytes,
	}
}

/// Everything a command or request handler needs, built once from config.
#[derive(Debug, Clone)]
pub struct Services {
	pub registry: Arc<RepositoryRegistry>,
	pub pipeline: DeployPipeline,
	pub webhooks: WebhookManager,
	pub versions: VersionResolver,
}

impl Services {
	pub fn from_config(config: &ServerConfig) -> Result<Self, GithubError> {
		let github = github_client(&config.github)?;
		let installer = Arc::new(installer(&config.paths));
		let pipeline = DeployPipeline::new(
			github.clone(),
			Arc::clone(&installer),
			archive_limits(&config.limits),
			config.paths.temp_dir.clone(),
		);

		Ok(Self {
			registry: Arc::new(RepositoryRegistry::new(config.repositories.clone())),
			webhooks: WebhookManager::new(github.clone(), config.http.webhook_url()),
			versions: VersionResolver::new(github, installer),
			pipeline,
		})
	}
}

#[derive(Debug, Clone)]
pub struct AppState {
	pub gate: AdmissionGate,
	pub registry: Arc<RepositoryRegistry>,
	pub pipeline: DeployPipeline,
}

impl AppState {
	pub fn new(gate: AdmissionGate, registry: Arc<RepositoryRegistry>, pipeline: DeployPipeline) -> Self {
		Self {
			gate,
			registry,
			pipeline,
		}
	}

	pub fn from_config(config: &ServerConfig, services: &Services) -> Self {
		let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new(
			config.limits.webhook_rate_limit,
			Duration::from_secs(config.limits.webhook_rate_window_secs),
		));
		Self::new(
			AdmissionGate::new(limiter, config.github.webhook_secret.clone()),
			Arc::clone(&services.registry),
			services.pipeline.clone(),
		)
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! pushdeploy server and administration CLI.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use pushdeploy_common_core::{DeployRequest, ProjectRef, RepositoryConfig};
use pushdeploy_github::EnsureOutcome;
use pushdeploy_server::{check_connection, create_router, discover, AppState, Services};
use pushdeploy_server_config::{LogFormat, LoggingConfig, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Push-to-deploy for WordPress plugins and themes hosted on GitHub.
#[derive(Parser, Debug)]
#[command(name = "pushdeploy", about = "GitHub push-to-deploy server", version)]
struct Args {
	/// Config file to use instead of /etc/pushdeploy/server.toml
	#[arg(long, global = true, env = "PUSHDEPLOY_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the webhook receiver (default)
	Serve,
	/// Show version information
	Version,
	/// Deploy a configured repository now and register its webhook
	Install {
		/// Project as owner/name
		project: ProjectRef,
		/// Branch or tag to deploy; defaults to the project's default branch
		#[arg(long = "ref")]
		git_ref: Option<String>,
	},
	/// Remove an installed component
	Uninstall {
		project: ProjectRef,
	},
	/// Manage the GitHub webhook for a project
	Webhook {
		#[command(subcommand)]
		action: WebhookAction,
	},
	/// Show installed and latest versions of configured repositories
	Versions,
	/// List your GitHub projects that look like plugins or themes
	Scan,
	/// Verify the configured GitHub token
	Check,
}

#[derive(Subcommand, Debug)]
enum WebhookAction {
	/// Create or update the webhook
	Setup { project: ProjectRef },
	/// Delete the webhook
	Remove { project: ProjectRef },
	/// Report whether the webhook exists and is active
	Status { project: ProjectRef },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("pushdeploy {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => pushdeploy_server_config::load_config_with_file(path),
		None => pushdeploy_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	init_tracing(&config.logging);

	let services = Services::from_config(&config).context("invalid GitHub settings")?;

	match args.command.unwrap_or(Command::Serve) {
		Command::Serve => serve(&config, &services).await,
		Command::Version => Ok(()),
		Command::Install { project, git_ref } => install(&config, &services, &project, git_ref).await,
		Command::Uninstall { project } => uninstall(&services, &project).await,
		Command::Webhook { action } => webhook(&config, &services, action).await,
		Command::Versions => versions(&services).await,
		Command::Scan => scan(&services).await,
		Command::Check => check(&services).await,
	}
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);
	match logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

fn configured<'a>(services: &'a Services, project: &ProjectRef) -> anyhow::Result<&'a RepositoryConfig> {
	services
		.registry
		.find(project)
		.ok_or_else(|| anyhow!("{project} is not a configured repository"))
}

async fn serve(config: &ServerConfig, services: &Services) -> anyhow::Result<()> {
	if config.github.webhook_secret.is_none() {
		tracing::warn!("No webhook secret configured; every delivery will be rejected");
	}

	let app = create_router(AppState::from_config(config, services));

	let addr = config.socket_addr();
	tracing::info!(
		addr = %addr,
		webhook_url = %config.http.webhook_url(),
		repositories = services.registry.len(),
		"listening"
	);

	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;

	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "Failed to listen for shutdown signal");
			}
			tracing::info!("Received shutdown signal");
		})
		.await?;

	tracing::info!("Server shutdown complete");
	Ok(())
}

async fn install(
	config: &ServerConfig,
	services: &Services,
	project: &ProjectRef,
	git_ref: Option<String>,
) -> anyhow::Result<()> {
	let repository = configured(services, project)?;

	let git_ref = match git_ref {
		Some(git_ref) => git_ref,
		None => {
			services
				.pipeline
				.github()
				.get_repository(project)
				.await
				.with_context(|| format!("failed to look up {project}"))?
				.default_branch
		}
	};

	let outcome = services
		.pipeline
		.deploy(&DeployRequest::new(repository.clone(), git_ref.clone()))
		.await
		.map_err(|e| anyhow!("deploy failed ({}): {e}", e.kind()))?;
	println!(
		"Installed {project}@{git_ref} into {}",
		outcome.target.display()
	);
	for stale in &outcome.removed_stale {
		println!("Removed stale install {stale}");
	}
	if !outcome.recorded {
		println!("Warning: the install manifest could not be updated");
	}

	match services
		.webhooks
		.ensure(project, config.github.webhook_secret.as_ref())
		.await
	{
		Ok(outcome) => println!("Webhook {}: id {}", ensure_verb(&outcome), outcome.hook().id),
		Err(e) => {
			tracing::warn!(project = %project, error = %e, "Installed, but webhook setup failed");
			println!("Warning: webhook setup failed: {e}");
		}
	}
	Ok(())
}

fn ensure_verb(outcome: &EnsureOutcome) -> &'static str {
	match outcome {
		EnsureOutcome::Created(_) => "created",
		EnsureOutcome::Updated(_) => "updated",
	}
}

async fn uninstall(services: &Services, project: &ProjectRef) -> anyhow::Result<()> {
	let repository = configured(services, project)?;
	let removed = services
		.pipeline
		.uninstall(repository)
		.await
		.map_err(|e| anyhow!("uninstall failed ({}): {e}", e.kind()))?;
	if removed {
		println!("Removed {}", repository.canonical_name);
	} else {
		println!("{} was not installed", repository.canonical_name);
	}
	Ok(())
}

async fn webhook(config: &ServerConfig, services: &Services, action: WebhookAction) -> anyhow::Result<()> {
	match action {
		WebhookAction::Setup { project } => {
			let outcome = services
				.webhooks
				.ensure(&project, config.github.webhook_secret.as_ref())
				.await?;
			println!(
				"Webhook {} for {project}: id {} -> {}",
				ensure_verb(&outcome),
				outcome.hook().id,
				services.webhooks.callback_url()
			);
		}
		WebhookAction::Remove { project } => {
			if services.webhooks.remove(&project).await? {
				println!("Webhook removed from {project}");
			} else {
				println!("No webhook for {} on {project}", services.webhooks.callback_url());
			}
		}
		WebhookAction::Status { project } => {
			let status = services.webhooks.status(&project).await?;
			println!(
				"{project}: exists={} active={}",
				status.exists, status.active
			);
		}
	}
	Ok(())
}

async fn versions(services: &Services) -> anyhow::Result<()> {
	if services.registry.is_empty() {
		bail!("no repositories configured");
	}
	for repository in services.registry.iter() {
		let report = services.versions.report(repository).await;
		println!(
			"{} ({} {}): current={} latest={} deployed_ref={}",
			report.project,
			report.component_type,
			report.canonical_name,
			report.current.as_deref().unwrap_or("-"),
			report.latest.as_deref().unwrap_or("-"),
			report.deployed_ref.as_deref().unwrap_or("-"),
		);
	}
	Ok(())
}

async fn scan(services: &Services) -> anyhow::Result<()> {
	let repos = services
		.pipeline
		.github()
		.list_user_repositories()
		.await
		.context("failed to list repositories")?;
	let found = discover::candidates(&repos, services.pipeline.installer());
	println!("{} of {} repositories look deployable", found.len(), repos.len());
	for candidate in found {
		let configured = ProjectRef::parse(&candidate.full_name)
			.is_ok_and(|project| services.registry.find(&project).is_some());
		let existing = candidate
			.existing
			.map(|component_type| format!(" (installed {component_type})"))
			.unwrap_or_default();
		println!(
			"{}{}  suggested name: {}{existing}",
			candidate.full_name,
			if configured { " [configured]" } else { "" },
			candidate.suggested_name
		);
	}
	Ok(())
}

async fn check(services: &Services) -> anyhow::Result<()> {
	let status = check_connection(services.pipeline.github()).await;
	if !status.is_connected() {
		bail!("{status}");
	}
	println!("{status}");
	Ok(())
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Remote webhook lifecycle for a project.
//!
//! Hooks are identified by their callback URL. The hook list is fetched
//! fresh before every create, update or delete so a stale id is never used.

use pushdeploy_common_core::ProjectRef;
use pushdeploy_common_secret::SecretString;
use tracing::{info, instrument};

use crate::client::GithubClient;
use crate::error::GithubError;
use crate::types::Hook;

/// Events every managed hook subscribes to.
pub const HOOK_EVENTS: [&str; 2] = ["push", "release"];

#[derive(Debug, Clone, PartialEq)]
pub enum EnsureOutcome {
	Created(Hook),
	Updated(Hook),
}

impl EnsureOutcome {
	pub fn hook(&self) -> &Hook {
		match self {
			EnsureOutcome::Created(hook) | EnsureOutcome::Updated(hook) => hook,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookStatus {
	pub exists: bool,
	pub active: bool,
	pub id: Option<u64>,
}

/// Creates, updates, deletes and inspects the hook pointing at this
/// deployment's callback URL.
#[derive(Debug, Clone)]
pub struct WebhookManager {
	client: GithubClient,
	callback_url: String,
}

impl WebhookManager {
	pub fn new(client: GithubClient, callback_url: impl Into<String>) -> Self {
		Self {
			client,
			callback_url: callback_url.into(),
		}
	}

	pub fn callback_url(&self) -> &str {
		&self.callback_url
	}

	/// Find the hook whose configured URL matches ours.
	pub async fn find(&self, project: &ProjectRef) -> Result<Option<Hook>, GithubError> {
		let hooks = self.client.list_hooks(project).await?;
		Ok(hooks
			.into_iter()
			.find(|hook| hook.url() == Some(self.callback_url.as_str())))
	}

	/// Create the hook, or bring an existing one back to the desired state.
	#[instrument(skip(self, project, secret), fields(project = %project, callback_url = %self.callback_url))]
	pub async fn ensure(
		&self,
		project: &ProjectRef,
		secret: Option<&SecretString>,
	) -> Result<EnsureOutcome, GithubError> {
		let secret = secret
			.filter(|s| !s.is_empty())
			.ok_or(GithubError::MissingWebhookSecret)?;
		if !self.client.config().has_token() {
			return Err(GithubError::MissingToken);
		}

		match self.find(project).await? {
			Some(existing) => {
				let hook = self
					.client
					.update_hook(
						project,
						existing.id,
						&self.callback_url,
						secret.expose(),
						&HOOK_EVENTS,
					)
					.await?;
				info!(hook_id = hook.id, "Updated webhook");
				Ok(EnsureOutcome::Updated(hook))
			}
			None => {
				let hook = self
					.client
					.create_hook(project, &self.callback_url, secret.expose(), &HOOK_EVENTS)
					.await?;
				info!(hook_id = hook.id, "Created webhook");
				Ok(EnsureOutcome::Created(hook))
			}
		}
	}

	/// Delete our hook. Returns `false` when there was nothing to delete.
	#[instrument(skip(self, project), fields(project = %project))]
	pub async fn remove(&self, project: &ProjectRef) -> Result<bool, GithubError> {
		match self.find(project).await? {
			Some(hook) => {
				self.client.delete_hook(project, hook.id).await?;
				info!(hook_id = hook.id, "Deleted webhook");
				Ok(true)
			}
			None => Ok(false),
		}
	}

	#[instrument(skip(self, project), fields(project = %project))]
	pub async fn status(&self, project: &ProjectRef) -> Result<WebhookStatus, GithubError> {
		let hook = self.find(project).await?;
		Ok(WebhookStatus {
			exists: hook.is_some(),
			active: hook.as_ref().is_some_and(|h| h.active),
			id: hook.map(|h| h.id),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::GithubConfig;

	#[tokio::test]
	async fn test_ensure_requires_secret() {
		let client = GithubClient::new(GithubConfig::new().with_token("t")).unwrap();
		let manager = WebhookManager::new(client, "https://site.example/gh-deployer/v1/webhook");
		let project = ProjectRef::parse("acme/widget").unwrap();

		let err = manager.ensure(&project, None).await.unwrap_err();
		assert!(matches!(err, GithubError::MissingWebhookSecret));

		let empty = SecretString::new(String::new());
		let err = manager.ensure(&project, Some(&empty)).await.unwrap_err();
		assert!(matches!(err, GithubError::MissingWebhookSecret));
	}

	#[tokio::test]
	async fn test_ensure_requires_token() {
		let client = GithubClient::new(GithubConfig::new()).unwrap();
		let manager = WebhookManager::new(client, "https://site.example/gh-deployer/v1/webhook");
		let project = ProjectRef::parse("acme/widget").unwrap();
		let secret = SecretString::new("s".to_string());

		let err = manager.ensure(&project, Some(&secret)).await.unwrap_err();
		assert!(matches!(err, GithubError::MissingToken));
	}

	#[test]
	fn test_outcome_hook() {
		let hook = Hook {
			id: 3,
			active: true,
			events: vec![],
			config: Default::default(),
		};
		assert_eq!(EnsureOutcome::Created(hook.clone()).hook().id, 3);
		assert_eq!(EnsureOutcome::Updated(hook).hook().id, 3);
	}
}

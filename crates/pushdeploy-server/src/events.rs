// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub webhook payloads, reduced to the fields a deploy needs.

use serde::Deserialize;
use thiserror::Error;

/// Header carrying the event name.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

const PUBLISHED: &str = "published";

#[derive(Debug, Error)]
pub enum PayloadError {
	#[error("Invalid JSON payload: {0}")]
	InvalidJson(#[from] serde_json::Error),

	#[error("Payload is missing {0}")]
	Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
	Push {
		full_name: String,
		/// Branch or tag name with any `refs/heads/` or `refs/tags/` prefix
		/// removed.
		git_ref: String,
		commits: usize,
		/// Branch deletion; there is nothing to fetch.
		deleted: bool,
	},
	Release {
		full_name: String,
		tag: String,
		action: String,
	},
	Ping {
		full_name: Option<String>,
	},
	Unsupported {
		event: String,
	},
}

#[derive(Debug, Default, Deserialize)]
struct RepositoryField {
	#[serde(default)]
	full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
	#[serde(default)]
	repository: Option<RepositoryField>,
	#[serde(rename = "ref", default)]
	git_ref: Option<String>,
	#[serde(default)]
	commits: Option<Vec<serde_json::Value>>,
	#[serde(default)]
	deleted: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ReleaseField {
	#[serde(default)]
	tag_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
	#[serde(default)]
	repository: Option<RepositoryField>,
	#[serde(default)]
	release: Option<ReleaseField>,
	#[serde(default)]
	action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PingPayload {
	#[serde(default)]
	repository: Option<RepositoryField>,
}

fn full_name(repository: Option<RepositoryField>) -> Option<String> {
	repository
		.and_then(|r| r.full_name)
		.filter(|name| !name.is_empty())
}

/// Strip the fully qualified prefix GitHub puts on push refs.
pub fn short_ref(raw: &str) -> &str {
	raw.strip_prefix("refs/heads/")
		.or_else(|| raw.strip_prefix("refs/tags/"))
		.unwrap_or(raw)
}

impl WebhookEvent {
	/// Classify a delivery. The body must be JSON whatever the event.
	pub fn parse(event: &str, body: &[u8]) -> Result<Self, PayloadError> {
		let value: serde_json::Value = serde_json::from_slice(body)?;

		match event {
			"push" => {
				let payload: PushPayload = serde_json::from_value(value)?;
				let full_name =
					full_name(payload.repository).ok_or(PayloadError::Missing("repository.full_name"))?;
				let raw_ref = payload
					.git_ref
					.filter(|r| !r.is_empty())
					.ok_or(PayloadError::Missing("ref"))?;
				Ok(WebhookEvent::Push {
					full_name,
					git_ref: short_ref(&raw_ref).to_string(),
					commits: payload.commits.map_or(0, |commits| commits.len()),
					deleted: payload.deleted.unwrap_or_default(),
				})
			}
			"release" => {
				let payload: ReleasePayload = serde_json::from_value(value)?;
				let full_name =
					full_name(payload.repository).ok_or(PayloadError::Missing("repository.full_name"))?;
				let tag = payload
					.release
					.and_then(|r| r.tag_name)
					.filter(|t| !t.is_empty())
					.ok_or(PayloadError::Missing("release.tag_name"))?;
				Ok(WebhookEvent::Release {
					full_name,
					tag,
					action: payload.action.unwrap_or_else(|| PUBLISHED.to_string()),
				})
			}
			"ping" => {
				let payload: PingPayload = serde_json::from_value(value)?;
				Ok(WebhookEvent::Ping {
					full_name: full_name(payload.repository),
				})
			}
			other => Ok(WebhookEvent::Unsupported {
				event: other.to_string(),
			}),
		}
	}

	pub fn is_published_release(&self) -> bool {
		matches!(self, WebhookEvent::Release { action, .. } if action == PUBLISHED)
	}
}

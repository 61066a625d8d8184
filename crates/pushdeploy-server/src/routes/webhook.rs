// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub webhook receiver.

use axum::{
	body::Bytes,
	extract::State,
	http::HeaderMap,
	Json,
};
use pushdeploy_common_core::DeployRequest;
use pushdeploy_common_webhook::SIGNATURE_HEADER;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::ServerError;
use crate::events::{WebhookEvent, EVENT_HEADER};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub repository: Option<String>,
	#[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
	pub git_ref: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tag: Option<String>,
}

impl WebhookResponse {
	fn message(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			repository: None,
			git_ref: None,
			tag: None,
		}
	}
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|value| value.to_str().ok())
}

/// POST /gh-deployer/v1/webhook
#[instrument(skip_all, fields(event = tracing::field::Empty))]
pub async fn receive_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<WebhookResponse>, ServerError> {
	if let Err(reason) = state.gate.check(&body, header(&headers, SIGNATURE_HEADER)) {
		warn!(%reason, "Webhook rejected");
		return Err(ServerError::Unauthorized);
	}

	let event_name = header(&headers, EVENT_HEADER).unwrap_or_default();
	tracing::Span::current().record("event", event_name);

	let event = WebhookEvent::parse(event_name, &body).map_err(|e| {
		warn!(error = %e, "Malformed webhook payload");
		e
	})?;

	match event {
		WebhookEvent::Push {
			full_name,
			git_ref,
			commits,
			deleted,
		} => {
			info!(repository = %full_name, git_ref = %git_ref, commits, "Push received");
			if deleted {
				info!(repository = %full_name, git_ref = %git_ref, "Branch deleted, nothing to deploy");
				return Ok(Json(WebhookResponse::message("Branch deleted, nothing to deploy")));
			}
			deploy(&state, full_name, git_ref, false).await
		}
		WebhookEvent::Release {
			full_name,
			tag,
			action,
		} => {
			info!(repository = %full_name, tag = %tag, action = %action, "Release received");
			if action != "published" {
				info!(action = %action, "Ignoring release action");
				return Ok(Json(WebhookResponse::message("Release action ignored")));
			}
			deploy(&state, full_name, tag, true).await
		}
		WebhookEvent::Ping { full_name } => {
			info!(repository = full_name.as_deref().unwrap_or("unknown"), "Ping received");
			Ok(Json(WebhookResponse::message("Ping received")))
		}
		WebhookEvent::Unsupported { event } => {
			info!(event = %event, "Ignoring unsupported event");
			Ok(Json(WebhookResponse::message("Event not supported")))
		}
	}
}

async fn deploy(
	state: &AppState,
	full_name: String,
	git_ref: String,
	is_tag: bool,
) -> Result<Json<WebhookResponse>, ServerError> {
	let Some(repository) = state.registry.find_by_full_name(&full_name) else {
		info!(repository = %full_name, "Repository not configured");
		return Ok(Json(WebhookResponse::message("Repository not configured")));
	};

	let request = DeployRequest::new(repository.clone(), git_ref.clone());
	if let Err(e) = state.pipeline.deploy(&request).await {
		warn!(repository = %full_name, kind = %e.kind(), error = %e, "Deploy failed");
		return Err(e.into());
	}

	let (git_ref, tag) = if is_tag {
		(None, Some(git_ref))
	} else {
		(Some(git_ref), None)
	};
	Ok(Json(WebhookResponse {
		message: "Deploy succeeded".to_string(),
		repository: Some(full_name),
		git_ref,
		tag,
	}))
}

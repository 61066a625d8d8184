// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wire types for the GitHub REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project metadata from `GET /repos/{owner}/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
	pub name: String,
	pub full_name: String,
	#[serde(default = "default_branch")]
	pub default_branch: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub language: Option<String>,
	#[serde(default)]
	pub topics: Vec<String>,
	#[serde(default)]
	pub html_url: String,
	#[serde(default)]
	pub updated_at: Option<DateTime<Utc>>,
}

fn default_branch() -> String {
	"main".to_string()
}

/// A repository webhook as GitHub reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hook {
	pub id: u64,
	#[serde(default)]
	pub active: bool,
	#[serde(default)]
	pub events: Vec<String>,
	#[serde(default)]
	pub config: HookConfig,
}

impl Hook {
	pub fn url(&self) -> Option<&str> {
		self.config.url.as_deref()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookConfig {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub content_type: Option<String>,
}

/// Body for creating or updating a hook. Holds the secret in clear and has no
/// `Debug`.
#[derive(Serialize)]
pub(crate) struct HookRequest<'a> {
	pub name: &'static str,
	pub active: bool,
	pub events: &'a [&'a str],
	pub config: HookRequestConfig<'a>,
}

#[derive(Serialize)]
pub(crate) struct HookRequestConfig<'a> {
	pub url: &'a str,
	pub content_type: &'static str,
	pub secret: &'a str,
	pub insecure_ssl: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
	pub tag_name: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
	pub name: String,
}

/// The authenticated account from `GET /user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub login: String,
	#[serde(default)]
	pub name: Option<String>,
}

/// Error body GitHub returns alongside non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
	pub message: String,
}

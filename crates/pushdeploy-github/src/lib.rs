// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub REST client for pushdeploy.
//!
//! Covers the handful of endpoints a deploy needs: project metadata, zipball
//! snapshots, repository webhooks, releases and tags, and paginated project
//! discovery and a token check for the authenticated user.

pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod types;

pub use client::GithubClient;
pub use config::GithubConfig;
pub use error::GithubError;
pub use hooks::{EnsureOutcome, WebhookManager, WebhookStatus, HOOK_EVENTS};
pub use types::{Hook, HookConfig, Release, RepositoryInfo, Tag, User};

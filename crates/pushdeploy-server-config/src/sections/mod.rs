// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod github;
mod http;
mod limits;
mod logging;
mod paths;
mod repositories;

pub use github::{GithubSettings, GithubSettingsLayer};
pub use http::{HttpConfig, HttpConfigLayer, WEBHOOK_PATH};
pub use limits::{LimitsConfig, LimitsConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use paths::{PathsConfig, PathsConfigLayer};
pub use repositories::{finalize_repositories, RepositoryEntry};

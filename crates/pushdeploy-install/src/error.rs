// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use pushdeploy_common_core::TreeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
	#[error("Source directory {} does not exist", .0.display())]
	MissingSource(PathBuf),

	#[error("I/O error at {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Filesystem(#[from] TreeError),

	#[error("Failed to swap {} into place: {source} (previous version {})", .target.display(), previous_state(.restored))]
	Swap {
		target: PathBuf,
		restored: bool,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to lock {}: {source}", .path.display())]
	Lock {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Manifest {} is unreadable: {source}", .path.display())]
	Manifest {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

fn previous_state(restored: &bool) -> &'static str {
	if *restored {
		"restored"
	} else {
		"lost"
	}
}

impl InstallError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}
}

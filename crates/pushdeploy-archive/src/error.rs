// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use pushdeploy_common_core::TreeError;
use thiserror::Error;

/// Failures opening, extracting or re-rooting an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
	#[error("Failed to open archive: {0}")]
	Open(#[source] zip::result::ZipError),

	#[error("Failed to extract entry {entry}: {source}")]
	Extract {
		entry: String,
		#[source]
		source: zip::result::ZipError,
	},

	#[error("Archive exceeds the {limit} byte size limit")]
	TooLarge { limit: u64 },

	#[error("Archive entry escapes the extraction directory: {0}")]
	UnsafeEntry(String),

	#[error("Unexpected archive layout: {0}")]
	Structure(String),

	#[error("I/O error at {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Filesystem(#[from] TreeError),
}

impl ArchiveError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}
}

/// Extracted content that must not be installed.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Disallowed file type: {}", .path.display())]
	DisallowedFile { path: PathBuf },

	#[error("File {} is {size} bytes, limit is {limit}", .path.display())]
	FileTooLarge { path: PathBuf, size: u64, limit: u64 },

	#[error("Failed to inspect extracted files: {0}")]
	Walk(#[from] walkdir::Error),
}

/// Any failure while staging a download for install.
#[derive(Debug, Error)]
pub enum StageError {
	#[error(transparent)]
	Archive(#[from] ArchiveError),

	#[error(transparent)]
	Validation(#[from] ValidationError),
}

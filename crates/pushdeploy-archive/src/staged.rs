// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Scoped ownership of a downloaded archive and its extraction directory.

use std::fs;
use std::path::{Path, PathBuf};

use pushdeploy_common_core::{remove_tree, CanonicalName};
use tempfile::{TempDir, TempPath};
use tracing::{debug, info, warn};

use crate::error::{ArchiveError, StageError};
use crate::extract::extract_archive;
use crate::limits::ArchiveLimits;
use crate::restructure::restructure;
use crate::validate::validate_tree;

/// A downloaded zipball plus the directory it is extracted into.
///
/// Both are deleted when this value is dropped, on success and on failure.
#[derive(Debug)]
pub struct StagedArchive {
	archive: TempPath,
	workdir: TempDir,
	root: Option<PathBuf>,
}

impl StagedArchive {
	/// Take ownership of `archive` and create an extraction directory under
	/// `temp_root`.
	pub fn new(archive: TempPath, temp_root: &Path) -> Result<Self, ArchiveError> {
		let workdir = tempfile::Builder::new()
			.prefix("pushdeploy-extract-")
			.tempdir_in(temp_root)
			.map_err(|e| ArchiveError::io(temp_root, e))?;
		Ok(Self {
			archive,
			workdir,
			root: None,
		})
	}

	pub fn archive_path(&self) -> &Path {
		&self.archive
	}

	pub fn workdir(&self) -> &Path {
		self.workdir.path()
	}

	/// The validated, canonically named tree once [`prepare`](Self::prepare)
	/// has succeeded.
	pub fn root(&self) -> Option<&Path> {
		self.root.as_deref()
	}

	/// Extract, re-root under `canonical`, and validate.
	///
	/// On any failure the extraction directory is emptied so nothing
	/// partially validated survives.
	pub fn prepare(
		&mut self,
		canonical: &CanonicalName,
		limits: &ArchiveLimits,
	) -> Result<&Path, StageError> {
		match self.prepare_inner(canonical, limits) {
			Ok(root) => Ok(self.root.insert(root).as_path()),
			Err(e) => {
				self.discard();
				Err(e)
			}
		}
	}

	fn prepare_inner(
		&self,
		canonical: &CanonicalName,
		limits: &ArchiveLimits,
	) -> Result<PathBuf, StageError> {
		extract_archive(&self.archive, self.workdir.path(), limits)?;
		let root = restructure(self.workdir.path(), canonical)?;
		let report = validate_tree(&root, limits)?;
		info!(
			canonical_name = %canonical,
			files = report.files,
			bytes = report.bytes,
			"Archive staged"
		);
		Ok(root)
	}

	fn discard(&mut self) {
		self.root = None;
		let entries = match fs::read_dir(self.workdir.path()) {
			Ok(entries) => entries,
			Err(e) => {
				warn!(error = %e, "Failed to list extraction directory for cleanup");
				return;
			}
		};
		for entry in entries.flatten() {
			if let Err(e) = remove_tree(&entry.path()) {
				warn!(error = %e, "Failed to discard staged files");
			}
		}
		debug!(workdir = %self.workdir.path().display(), "Discarded staged files");
	}

	/// Delete the archive and extraction directory now, reporting failures.
	pub fn close(self) -> std::io::Result<()> {
		let Self {
			archive, workdir, ..
		} = self;
		let archive_result = archive.close();
		let workdir_result = workdir.close();
		archive_result.and(workdir_result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ValidationError;
	use crate::testutil::write_zip;

	fn staged_from(entries: &[(&str, &[u8])], temp_root: &Path) -> StagedArchive {
		let archive = tempfile::Builder::new()
			.suffix(".zip")
			.tempfile_in(temp_root)
			.unwrap()
			.into_temp_path();
		write_zip(&archive, entries);
		StagedArchive::new(archive, temp_root).unwrap()
	}

	fn widget() -> CanonicalName {
		CanonicalName::parse("widget").unwrap()
	}

	#[test]
	fn test_prepare_success() {
		let tmp = tempfile::tempdir().unwrap();
		let mut staged = staged_from(
			&[
				("acme-widget-9c1d/widget.php", b"<?php\n/* Version: 2.0 */"),
				("acme-widget-9c1d/readme.txt", b"readme"),
			],
			tmp.path(),
		);

		let root = staged.prepare(&widget(), &ArchiveLimits::default()).unwrap().to_path_buf();
		assert!(root.ends_with("widget"));
		assert!(root.join("widget.php").is_file());
		assert_eq!(staged.root(), Some(root.as_path()));
	}

	#[test]
	fn test_validation_failure_discards_everything() {
		let tmp = tempfile::tempdir().unwrap();
		let mut staged = staged_from(
			&[
				("acme-widget-9c1d/widget.php", b"<?php"),
				("acme-widget-9c1d/tools/install.sh", b"#!/bin/sh"),
			],
			tmp.path(),
		);

		let err = staged.prepare(&widget(), &ArchiveLimits::default()).unwrap_err();
		assert!(matches!(
			err,
			StageError::Validation(ValidationError::DisallowedFile { .. })
		));
		assert!(staged.root().is_none());
		assert_eq!(fs::read_dir(staged.workdir()).unwrap().count(), 0);
	}

	#[test]
	fn test_drop_removes_temp_state() {
		let tmp = tempfile::tempdir().unwrap();
		let mut staged = staged_from(&[("top/widget.php", b"<?php")], tmp.path());
		staged.prepare(&widget(), &ArchiveLimits::default()).unwrap();

		let archive = staged.archive_path().to_path_buf();
		let workdir = staged.workdir().to_path_buf();
		drop(staged);

		assert!(!archive.exists());
		assert!(!workdir.exists());
		assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
	}

	#[test]
	fn test_close_removes_temp_state() {
		let tmp = tempfile::tempdir().unwrap();
		let staged = staged_from(&[("top/widget.php", b"<?php")], tmp.path());
		staged.close().unwrap();
		assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fs;
use std::path::{Path, PathBuf};

use pushdeploy_common_core::{copy_tree, remove_tree, CanonicalName};
use tracing::debug;

use crate::error::ArchiveError;

/// Re-root the single top-level directory of an extracted zipball under
/// `canonical`, returning the new directory.
///
/// The top-level directory name embeds a commit hash, so the first directory
/// in name order is taken. Loose top-level files are left where they are.
pub fn restructure(extract_dir: &Path, canonical: &CanonicalName) -> Result<PathBuf, ArchiveError> {
	let mut dirs = Vec::new();
	let entries = fs::read_dir(extract_dir).map_err(|e| ArchiveError::io(extract_dir, e))?;
	for entry in entries {
		let entry = entry.map_err(|e| ArchiveError::io(extract_dir, e))?;
		let file_type = entry
			.file_type()
			.map_err(|e| ArchiveError::io(entry.path(), e))?;
		if file_type.is_dir() {
			dirs.push(entry.path());
		}
	}
	dirs.sort();

	let top = dirs.into_iter().next().ok_or_else(|| {
		ArchiveError::Structure("archive has no top-level directory".to_string())
	})?;

	let target = extract_dir.join(canonical);
	if top == target {
		return Ok(target);
	}
	if target.exists() {
		return Err(ArchiveError::Structure(format!(
			"archive already contains a top-level {canonical} next to {}",
			top.display()
		)));
	}

	copy_tree(&top, &target)?;
	remove_tree(&top)?;

	debug!(from = %top.display(), to = %target.display(), "Re-rooted archive");
	Ok(target)
}

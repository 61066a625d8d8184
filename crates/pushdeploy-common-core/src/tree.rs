// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Recursive directory copy and removal.
//!
//! Both operations walk the tree iteratively and keep going past individual
//! failures. Every failed path is collected into a [`TreeError`] so a caller
//! sees exactly which part of the tree was left behind.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Operation that failed on a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeOp {
	Read,
	CreateDir,
	Copy,
	Remove,
}

impl fmt::Display for TreeOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TreeOp::Read => "read",
			TreeOp::CreateDir => "create directory",
			TreeOp::Copy => "copy",
			TreeOp::Remove => "remove",
		})
	}
}

#[derive(Debug)]
pub struct TreeFailure {
	pub path: PathBuf,
	pub op: TreeOp,
	pub source: io::Error,
}

impl fmt::Display for TreeFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}: {}", self.op, self.path.display(), self.source)
	}
}

/// One or more paths could not be copied or removed.
#[derive(Debug, Error)]
#[error(
	"{} filesystem operation(s) failed under {}: {}",
	.failures.len(),
	.root.display(),
	first_failure(.failures)
)]
pub struct TreeError {
	pub root: PathBuf,
	pub failures: Vec<TreeFailure>,
}

fn first_failure(failures: &[TreeFailure]) -> String {
	failures
		.first()
		.map(ToString::to_string)
		.unwrap_or_default()
}

impl TreeError {
	fn single(root: &Path, op: TreeOp, source: io::Error) -> Self {
		Self {
			root: root.to_path_buf(),
			failures: vec![TreeFailure {
				path: root.to_path_buf(),
				op,
				source,
			}],
		}
	}
}

/// Totals reported by [`copy_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
	pub files: u64,
	pub bytes: u64,
}

fn walk_error(err: walkdir::Error, fallback: &Path) -> TreeFailure {
	let path = err
		.path()
		.map(Path::to_path_buf)
		.unwrap_or_else(|| fallback.to_path_buf());
	TreeFailure {
		path,
		op: TreeOp::Read,
		source: err.into(),
	}
}

/// Copy the contents of `src` into `dst`, creating `dst` if needed.
///
/// Symlinks are skipped.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats, TreeError> {
	if !src.is_dir() {
		return Err(TreeError::single(
			src,
			TreeOp::Read,
			io::Error::new(io::ErrorKind::NotFound, "source is not a directory"),
		));
	}

	let mut stats = CopyStats::default();
	let mut failures = Vec::new();

	for entry in WalkDir::new(src).follow_links(false) {
		let entry = match entry {
			Ok(entry) => entry,
			Err(e) => {
				failures.push(walk_error(e, src));
				continue;
			}
		};

		let Ok(relative) = entry.path().strip_prefix(src) else {
			continue;
		};
		let target = dst.join(relative);
		let file_type = entry.file_type();

		if file_type.is_dir() {
			if let Err(source) = fs::create_dir_all(&target) {
				failures.push(TreeFailure {
					path: target,
					op: TreeOp::CreateDir,
					source,
				});
			}
		} else if file_type.is_file() {
			match fs::copy(entry.path(), &target) {
				Ok(bytes) => {
					stats.files += 1;
					stats.bytes += bytes;
				}
				Err(source) => failures.push(TreeFailure {
					path: entry.path().to_path_buf(),
					op: TreeOp::Copy,
					source,
				}),
			}
		} else {
			warn!(path = %entry.path().display(), "skipping symlink during copy");
		}
	}

	if failures.is_empty() {
		debug!(
			src = %src.display(),
			dst = %dst.display(),
			files = stats.files,
			bytes = stats.bytes,
			"copied tree"
		);
		Ok(stats)
	} else {
		Err(TreeError {
			root: src.to_path_buf(),
			failures,
		})
	}
}

/// Remove `path` and everything below it. A missing path is not an error.
pub fn remove_tree(path: &Path) -> Result<(), TreeError> {
	let metadata = match fs::symlink_metadata(path) {
		Ok(metadata) => metadata,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
		Err(e) => return Err(TreeError::single(path, TreeOp::Read, e)),
	};

	if !metadata.is_dir() {
		return fs::remove_file(path).map_err(|e| TreeError::single(path, TreeOp::Remove, e));
	}

	let mut failures = Vec::new();

	for entry in WalkDir::new(path).follow_links(false).contents_first(true) {
		let entry = match entry {
			Ok(entry) => entry,
			Err(e) => {
				failures.push(walk_error(e, path));
				continue;
			}
		};

		let result = if entry.file_type().is_dir() {
			fs::remove_dir(entry.path())
		} else {
			fs::remove_file(entry.path())
		};

		if let Err(source) = result {
			failures.push(TreeFailure {
				path: entry.path().to_path_buf(),
				op: TreeOp::Remove,
				source,
			});
		}
	}

	if failures.is_empty() {
		debug!(path = %path.display(), "removed tree");
		Ok(())
	} else {
		Err(TreeError {
			root: path.to_path_buf(),
			failures,
		})
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Post-extraction checks on a staged tree.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::ValidationError;
use crate::limits::{is_denied_extension, ArchiveLimits};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
	pub files: u64,
	pub bytes: u64,
}

/// Text after the last dot of the file name. `.sh` counts as extension `sh`.
fn file_extension(path: &Path) -> Option<String> {
	let name = path.file_name()?.to_string_lossy();
	name.rsplit_once('.').map(|(_, ext)| ext.to_string())
}

/// Walk every file under `root`, failing on the first denylisted extension
/// or oversized file.
pub fn validate_tree(root: &Path, limits: &ArchiveLimits) -> Result<ValidationReport, ValidationError> {
	let mut report = ValidationReport::default();

	for entry in WalkDir::new(root).follow_links(false) {
		let entry = entry?;
		if entry.file_type().is_dir() {
			continue;
		}

		let path = entry.path();
		let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();

		if file_extension(path).is_some_and(|ext| is_denied_extension(&ext)) {
			warn!(path = %relative.display(), "Disallowed file type in archive");
			return Err(ValidationError::DisallowedFile { path: relative });
		}

		let size = entry.metadata()?.len();
		if size > limits.max_file_bytes {
			warn!(
				path = %relative.display(),
				size,
				limit = limits.max_file_bytes,
				"Oversized file in archive"
			);
			return Err(ValidationError::FileTooLarge {
				path: relative,
				size,
				limit: limits.max_file_bytes,
			});
		}

		report.files += 1;
		report.bytes += size;
	}

	debug!(files = report.files, bytes = report.bytes, "Validated tree");
	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn test_clean_tree_passes() {
		let tmp = TempDir::new().unwrap();
		fs::create_dir_all(tmp.path().join("assets")).unwrap();
		fs::write(tmp.path().join("widget.php"), "<?php").unwrap();
		fs::write(tmp.path().join("assets/style.css"), "body{}").unwrap();
		fs::write(tmp.path().join("README"), "hi").unwrap();

		let report = validate_tree(tmp.path(), &ArchiveLimits::default()).unwrap();
		assert_eq!(report.files, 3);
		assert_eq!(report.bytes, 13);
	}

	#[test]
	fn test_denylisted_file_rejected() {
		let tmp = TempDir::new().unwrap();
		fs::create_dir_all(tmp.path().join("bin")).unwrap();
		fs::write(tmp.path().join("widget.php"), "<?php").unwrap();
		fs::write(tmp.path().join("bin/Setup.EXE"), "MZ").unwrap();

		let err = validate_tree(tmp.path(), &ArchiveLimits::default()).unwrap_err();
		match err {
			ValidationError::DisallowedFile { path } => {
				assert_eq!(path, Path::new("bin/Setup.EXE"));
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn test_dotfile_extension_rejected() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join(".sh"), "#!/bin/sh").unwrap();
		assert!(validate_tree(tmp.path(), &ArchiveLimits::default()).is_err());
	}

	#[test]
	fn test_oversized_file_rejected() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join("big.bin"), vec![0u8; 65]).unwrap();
		let limits = ArchiveLimits {
			max_total_bytes: 1024,
			max_file_bytes: 64,
		};

		let err = validate_tree(tmp.path(), &limits).unwrap_err();
		assert!(matches!(
			err,
			ValidationError::FileTooLarge { size: 65, limit: 64, .. }
		));
	}

	#[test]
	fn test_file_extension() {
		assert_eq!(file_extension(Path::new("a/b/run.sh")).as_deref(), Some("sh"));
		assert_eq!(file_extension(Path::new("archive.tar.gz")).as_deref(), Some("gz"));
		assert_eq!(file_extension(Path::new("Makefile")), None);
	}

	proptest! {
		/// Any denylisted extension is caught regardless of case.
		#[test]
		fn prop_denylist_ignores_case(
			idx in 0usize..crate::limits::DENIED_EXTENSIONS.len(),
			upper in proptest::collection::vec(any::<bool>(), 3),
		) {
			let ext: String = crate::limits::DENIED_EXTENSIONS[idx]
				.chars()
				.enumerate()
				.map(|(i, c)| if upper.get(i).copied().unwrap_or(false) { c.to_ascii_uppercase() } else { c })
				.collect();
			let tmp = TempDir::new().unwrap();
			fs::write(tmp.path().join(format!("payload.{ext}")), "x").unwrap();
			prop_assert!(validate_tree(tmp.path(), &ArchiveLimits::default()).is_err());
		}
	}
}

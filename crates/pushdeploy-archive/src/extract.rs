// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded zip extraction.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::ArchiveError;
use crate::limits::ArchiveLimits;

/// Sum the declared uncompressed sizes and reject unsafe names.
///
/// Runs before anything is written. Returns the declared total.
pub fn check_declared_sizes<R: Read + Seek>(
	archive: &mut ZipArchive<R>,
	limits: &ArchiveLimits,
) -> Result<u64, ArchiveError> {
	let mut total: u64 = 0;

	for index in 0..archive.len() {
		let entry = archive
			.by_index_raw(index)
			.map_err(|source| ArchiveError::Extract {
				entry: format!("#{index}"),
				source,
			})?;

		if entry.enclosed_name().is_none() {
			warn!(entry = %entry.name(), "Rejecting archive entry outside extraction root");
			return Err(ArchiveError::UnsafeEntry(entry.name().to_string()));
		}

		total = total.saturating_add(entry.size());
		if total > limits.max_total_bytes {
			warn!(
				declared = total,
				limit = limits.max_total_bytes,
				"Archive declared size exceeds limit"
			);
			return Err(ArchiveError::TooLarge {
				limit: limits.max_total_bytes,
			});
		}
	}

	Ok(total)
}

/// Extract `archive_path` into `dest`.
///
/// Declared sizes are checked first. Bytes actually written are capped at
/// the same ceiling, since declared sizes can lie.
pub fn extract_archive(
	archive_path: &Path,
	dest: &Path,
	limits: &ArchiveLimits,
) -> Result<u64, ArchiveError> {
	let file = File::open(archive_path).map_err(|e| ArchiveError::io(archive_path, e))?;
	let mut archive = ZipArchive::new(file).map_err(ArchiveError::Open)?;
	let declared = check_declared_sizes(&mut archive, limits)?;

	let mut written: u64 = 0;
	for index in 0..archive.len() {
		let mut entry = archive
			.by_index(index)
			.map_err(|source| ArchiveError::Extract {
				entry: format!("#{index}"),
				source,
			})?;

		let Some(relative) = entry.enclosed_name() else {
			return Err(ArchiveError::UnsafeEntry(entry.name().to_string()));
		};
		let target = dest.join(relative);

		if entry.is_dir() {
			fs::create_dir_all(&target).map_err(|e| ArchiveError::io(&target, e))?;
			continue;
		}

		if let Some(parent) = target.parent() {
			fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
		}

		let mut out = File::create(&target).map_err(|e| ArchiveError::io(&target, e))?;
		let budget = limits.max_total_bytes - written;
		let copied = io::copy(&mut (&mut entry).take(budget.saturating_add(1)), &mut out)
			.map_err(|e| ArchiveError::io(&target, e))?;

		written += copied;
		if written > limits.max_total_bytes {
			warn!(
				written,
				limit = limits.max_total_bytes,
				"Archive inflated past its size limit"
			);
			return Err(ArchiveError::TooLarge {
				limit: limits.max_total_bytes,
			});
		}
	}

	debug!(
		entries = archive.len(),
		declared,
		written,
		dest = %dest.display(),
		"Extracted archive"
	);
	Ok(written)
}

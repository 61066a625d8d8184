// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

/// Extensions that are never allowed inside a deployed tree. Compared
/// case-insensitively.
pub const DENIED_EXTENSIONS: [&str; 10] = [
	"exe", "bat", "cmd", "com", "pif", "scr", "vbs", "jar", "sh", "ps1",
];

pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Size ceilings applied to an archive and its extracted files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
	/// Ceiling on the summed uncompressed size of all entries.
	pub max_total_bytes: u64,
	/// Ceiling on any single extracted file.
	pub max_file_bytes: u64,
}

impl Default for ArchiveLimits {
	fn default() -> Self {
		Self {
			max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
			max_file_bytes: DEFAULT_MAX_FILE_BYTES,
		}
	}
}

/// Whether `extension` (without the dot) is on the denylist.
pub fn is_denied_extension(extension: &str) -> bool {
	DENIED_EXTENSIONS
		.iter()
		.any(|denied| denied.eq_ignore_ascii_case(extension))
}

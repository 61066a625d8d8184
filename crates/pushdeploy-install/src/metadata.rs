// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Local version lookup from component header files.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use pushdeploy_common_core::{CanonicalName, ComponentType};

/// Only this much of a header file is scanned.
const HEADER_SCAN_BYTES: u64 = 8 * 1024;

/// Parse a `Version:` header line out of `text`.
///
/// Header lines may be prefixed with comment punctuation (` * Version: 1.2`).
fn parse_version(text: &str) -> Option<String> {
	text.lines().find_map(|line| {
		let line = line.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '/' | '*' | '#' | '@'));
		let (key, value) = line.split_once(':')?;
		if !key.eq_ignore_ascii_case("version") {
			return None;
		}
		let value = value.trim().trim_end_matches("*/").trim();
		(!value.is_empty()).then(|| value.to_string())
	})
}

/// Read the `Version:` header from the first 8 KiB of `path`.
pub fn read_version_header(path: &Path) -> io::Result<Option<String>> {
	let mut buf = Vec::new();
	File::open(path)?
		.take(HEADER_SCAN_BYTES)
		.read_to_end(&mut buf)?;
	Ok(parse_version(&String::from_utf8_lossy(&buf)))
}

fn version_of(path: &Path) -> Option<String> {
	if !path.is_file() {
		return None;
	}
	read_version_header(path).ok().flatten()
}

fn plugin_version(dir: &Path, name: &CanonicalName) -> Option<String> {
	let candidates = [
		format!("{name}.php"),
		format!("{name}-main.php"),
		format!("{name}-plugin.php"),
		"index.php".to_string(),
		"main.php".to_string(),
	];
	if let Some(version) = candidates.iter().find_map(|c| version_of(&dir.join(c))) {
		return Some(version);
	}

	let mut php_files: Vec<_> = fs::read_dir(dir)
		.ok()?
		.flatten()
		.map(|entry| entry.path())
		.filter(|path| {
			path.extension()
				.is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
		})
		.collect();
	php_files.sort();
	php_files.iter().find_map(|path| version_of(path))
}

/// Version of the component installed at `dir`, or `None` when it cannot be
/// determined.
pub fn current_version(
	dir: &Path,
	component_type: ComponentType,
	name: &CanonicalName,
) -> Option<String> {
	match component_type {
		ComponentType::Plugin => plugin_version(dir, name),
		ComponentType::Theme => version_of(&dir.join("style.css")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn name(raw: &str) -> CanonicalName {
		CanonicalName::parse(raw).unwrap()
	}

	#[test]
	fn test_parse_version_plugin_header() {
		let header = "<?php\n/**\n * Plugin Name: Widget\n * Version: 1.4.2\n * Author: Acme\n */";
		assert_eq!(parse_version(header).as_deref(), Some("1.4.2"));
	}

	#[test]
	fn test_parse_version_theme_header() {
		let header = "/*\nTheme Name: Twenty\nversion:   3.0 */\n";
		assert_eq!(parse_version(header).as_deref(), Some("3.0"));
	}

	#[test]
	fn test_parse_version_ignores_other_keys() {
		assert_eq!(parse_version("Requires PHP: 7.4\nTested up to: 6.5"), None);
		assert_eq!(parse_version("Version:"), None);
	}

	#[test]
	fn test_plugin_version_candidate_order() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("index.php"), "<?php // Version: 0.1").unwrap();
		std::fs::write(tmp.path().join("widget.php"), "<?php\n * Version: 2.0\n").unwrap();

		assert_eq!(
			current_version(tmp.path(), ComponentType::Plugin, &name("widget")).as_deref(),
			Some("2.0")
		);
	}

	#[test]
	fn test_plugin_version_falls_back_to_any_php() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("b.php"), "<?php\n * Version: 9.0\n").unwrap();
		std::fs::write(tmp.path().join("a.php"), "<?php\n * Version: 1.0\n").unwrap();
		std::fs::write(tmp.path().join("notes.txt"), "Version: 5").unwrap();

		assert_eq!(
			current_version(tmp.path(), ComponentType::Plugin, &name("widget")).as_deref(),
			Some("1.0")
		);
	}

	#[test]
	fn test_theme_version() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("style.css"), "/*\nTheme Name: T\nVersion: 1.1\n*/").unwrap();
		assert_eq!(
			current_version(tmp.path(), ComponentType::Theme, &name("t")).as_deref(),
			Some("1.1")
		);
	}

	#[test]
	fn test_missing_directory() {
		let tmp = TempDir::new().unwrap();
		assert_eq!(
			current_version(&tmp.path().join("absent"), ComponentType::Plugin, &name("x")),
			None
		);
	}

	#[test]
	fn test_header_beyond_scan_window_ignored() {
		let tmp = TempDir::new().unwrap();
		let mut body = "x".repeat(9000);
		body.push_str("\nVersion: 1.0\n");
		std::fs::write(tmp.path().join("style.css"), body).unwrap();
		assert_eq!(read_version_header(&tmp.path().join("style.css")).unwrap(), None);
	}
}

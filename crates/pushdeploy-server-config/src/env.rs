// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment lookups, including `*_FILE` secrets.

use std::path::PathBuf;

use pushdeploy_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("both {name} and {name}_FILE are set")]
	Conflict { name: String },

	#[error("failed to read {name}_FILE at {path}: {source}")]
	FileRead {
		name: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Variable lookup. The process environment in production, a map in tests.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a variable from the process environment, treating empty as unset.
pub fn process_env(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Load a secret from `name`, or from the file named by `{name}_FILE`.
///
/// A trailing newline in the file is stripped. Setting both is an error.
pub fn load_secret_with(name: &str, lookup: Lookup<'_>) -> Result<Option<SecretString>, SecretEnvError> {
	let direct = lookup(name);
	let file = lookup(&format!("{name}_FILE"));

	match (direct, file) {
		(Some(_), Some(_)) => Err(SecretEnvError::Conflict {
			name: name.to_string(),
		}),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => {
			let path = PathBuf::from(path);
			let mut value = std::fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
				name: name.to_string(),
				path: path.clone(),
				source,
			})?;
			let trimmed = value.trim_end_matches(&['\r', '\n'][..]).len();
			value.truncate(trimmed);
			Ok(Some(SecretString::new(value)))
		}
		(None, None) => Ok(None),
	}
}

/// [`load_secret_with`] against the process environment.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	load_secret_with(name, &process_env)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;

	fn lookup_from(vars: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect();
		move |name| map.get(name).cloned()
	}

	#[test]
	fn test_direct_value() {
		let lookup = lookup_from(&[("TOKEN", "abc".to_string())]);
		let secret = load_secret_with("TOKEN", &lookup).unwrap().unwrap();
		assert_eq!(secret.expose(), "abc");
	}

	#[test]
	fn test_file_value_strips_newline() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();
		let lookup = lookup_from(&[("TOKEN_FILE", file.path().display().to_string())]);

		let secret = load_secret_with("TOKEN", &lookup).unwrap().unwrap();
		assert_eq!(secret.expose(), "from-file");
	}

	#[test]
	fn test_both_set_conflicts() {
		let lookup = lookup_from(&[
			("TOKEN", "a".to_string()),
			("TOKEN_FILE", "/tmp/x".to_string()),
		]);
		assert!(matches!(
			load_secret_with("TOKEN", &lookup),
			Err(SecretEnvError::Conflict { .. })
		));
	}

	#[test]
	fn test_missing_file() {
		let lookup = lookup_from(&[("TOKEN_FILE", "/nonexistent/secret".to_string())]);
		assert!(matches!(
			load_secret_with("TOKEN", &lookup),
			Err(SecretEnvError::FileRead { .. })
		));
	}

	#[test]
	fn test_unset() {
		let lookup = lookup_from(&[]);
		assert!(load_secret_with("TOKEN", &lookup).unwrap().is_none());
	}
}

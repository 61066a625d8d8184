// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Record of what pushdeploy has installed.
//!
//! Stored as `installed.json` in the data directory and rewritten through a
//! temporary file and rename so a crash never leaves it half-written.
//! Read-modify-write cycles hold an advisory lock on `installed.json.lock`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pushdeploy_common_core::{CanonicalName, ComponentType, ProjectRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::InstallError;
use crate::lease::lock_file;

pub const MANIFEST_FILE: &str = "installed.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
	pub canonical_name: CanonicalName,
	pub component_type: ComponentType,
	pub project: ProjectRef,
	pub git_ref: String,
	pub installed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
	#[serde(default)]
	pub installed: Vec<ManifestEntry>,
}

impl Manifest {
	pub fn get(&self, component_type: ComponentType, name: &CanonicalName) -> Option<&ManifestEntry> {
		self.installed
			.iter()
			.find(|e| e.component_type == component_type && &e.canonical_name == name)
	}

	/// Insert or replace the entry for the entry's type and name.
	pub fn upsert(&mut self, entry: ManifestEntry) {
		self.remove(entry.component_type, &entry.canonical_name);
		self.installed.push(entry);
		self.installed
			.sort_by(|a, b| a.canonical_name.as_str().cmp(b.canonical_name.as_str()));
	}

	pub fn remove(&mut self, component_type: ComponentType, name: &CanonicalName) -> Option<ManifestEntry> {
		let index = self
			.installed
			.iter()
			.position(|e| e.component_type == component_type && &e.canonical_name == name)?;
		Some(self.installed.remove(index))
	}

	/// Entries for `project` of the same type installed under a different
	/// name, i.e. leftovers of a rename.
	pub fn stale_for(
		&self,
		project: &ProjectRef,
		component_type: ComponentType,
		keep: &CanonicalName,
	) -> Vec<ManifestEntry> {
		self.installed
			.iter()
			.filter(|e| {
				e.component_type == component_type
					&& &e.canonical_name != keep
					&& e.project.matches_full_name(&project.full_name())
			})
			.cloned()
			.collect()
	}
}

/// Loads and saves the manifest file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
	path: PathBuf,
}

impl ManifestStore {
	pub fn new(data_dir: &Path) -> Self {
		Self {
			path: data_dir.join(MANIFEST_FILE),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Exclusive lock over read-modify-write cycles, across processes.
	/// Released when the returned file is dropped.
	pub fn lock(&self) -> Result<File, InstallError> {
		lock_file(&self.path.with_extension("json.lock"))
	}

	/// A missing file is an empty manifest.
	pub fn load(&self) -> Result<Manifest, InstallError> {
		let raw = match fs::read(&self.path) {
			Ok(raw) => raw,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Manifest::default()),
			Err(e) => return Err(InstallError::io(&self.path, e)),
		};
		serde_json::from_slice(&raw).map_err(|source| InstallError::Manifest {
			path: self.path.clone(),
			source,
		})
	}

	/// Like [`load`](Self::load), but an unparseable file is moved aside to
	/// `installed.json.corrupt-<uuid>` and replaced by an empty manifest.
	pub fn load_or_recover(&self) -> Result<Manifest, InstallError> {
		match self.load() {
			Err(InstallError::Manifest { source, .. }) => {
				let aside = self
					.path
					.with_extension(format!("json.corrupt-{}", Uuid::new_v4().simple()));
				fs::rename(&self.path, &aside).map_err(|e| InstallError::io(&self.path, e))?;
				warn!(
					path = %self.path.display(),
					moved_to = %aside.display(),
					error = %source,
					"Manifest was corrupt; starting a new one"
				);
				Ok(Manifest::default())
			}
			other => other,
		}
	}

	pub fn save(&self, manifest: &Manifest) -> Result<(), InstallError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
		}
		let json = serde_json::to_vec_pretty(manifest).map_err(|source| InstallError::Manifest {
			path: self.path.clone(),
			source,
		})?;

		let tmp = self.path.with_extension(format!("json.{}.tmp", Uuid::new_v4()));
		fs::write(&tmp, json).map_err(|e| InstallError::io(&tmp, e))?;
		if let Err(e) = fs::rename(&tmp, &self.path) {
			let _ = fs::remove_file(&tmp);
			return Err(InstallError::io(&self.path, e));
		}
		debug!(path = %self.path.display(), entries = manifest.installed.len(), "Saved manifest");
		Ok(())
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Staged, rename-based install of component trees.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use pushdeploy_common_core::{copy_tree, remove_tree, CanonicalName, ComponentType, RepositoryConfig};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::InstallError;
use crate::lease::InstallLeases;
use crate::manifest::{Manifest, ManifestEntry, ManifestStore};
use crate::metadata;

const STAGING_PREFIX: &str = ".pushdeploy-staging-";
const PREVIOUS_PREFIX: &str = ".pushdeploy-previous-";
const LOCK_DIR: &str = "locks";

/// Activation state as reported by the host application.
pub trait ComponentCatalog: Send + Sync {
	/// `None` when the host cannot say.
	fn is_active(&self, component_type: ComponentType, name: &CanonicalName) -> Option<bool>;
}

/// Catalog for deployments with no host integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownActivation;

impl ComponentCatalog for UnknownActivation {
	fn is_active(&self, _component_type: ComponentType, _name: &CanonicalName) -> Option<bool> {
		None
	}
}

/// Derived view of one installed component. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledArtifact {
	pub canonical_name: CanonicalName,
	pub component_type: ComponentType,
	pub current_version: Option<String>,
	pub active: Option<bool>,
	/// Ref of the last deploy recorded in the manifest.
	pub deployed_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
	pub target: PathBuf,
	pub replaced_previous: bool,
	pub removed_stale: Vec<CanonicalName>,
	/// False when the tree is live but the manifest could not be updated.
	pub recorded: bool,
}

/// Owns the plugin and theme roots, the install manifest and the
/// per-component leases kept under `<data_dir>/locks`.
#[derive(Debug)]
pub struct Installer {
	plugins_dir: PathBuf,
	themes_dir: PathBuf,
	manifest: ManifestStore,
	leases: InstallLeases,
}

impl Installer {
	pub fn new(plugins_dir: impl Into<PathBuf>, themes_dir: impl Into<PathBuf>, data_dir: &Path) -> Self {
		Self {
			plugins_dir: plugins_dir.into(),
			themes_dir: themes_dir.into(),
			manifest: ManifestStore::new(data_dir),
			leases: InstallLeases::new(data_dir.join(LOCK_DIR)),
		}
	}

	pub fn root_for(&self, component_type: ComponentType) -> &Path {
		match component_type {
			ComponentType::Plugin => &self.plugins_dir,
			ComponentType::Theme => &self.themes_dir,
		}
	}

	pub fn target_path(&self, repo: &RepositoryConfig) -> PathBuf {
		self.root_for(repo.component_type).join(&repo.canonical_name)
	}

	pub fn manifest(&self) -> &ManifestStore {
		&self.manifest
	}

	/// Callers hold the lease for a component across install and uninstall.
	pub fn leases(&self) -> &InstallLeases {
		&self.leases
	}

	fn with_manifest<T>(
		&self,
		f: impl FnOnce(&mut Manifest) -> Result<(T, bool), InstallError>,
	) -> Result<T, InstallError> {
		let _lock = self.manifest.lock()?;
		let mut manifest = self.manifest.load_or_recover()?;
		let (value, dirty) = f(&mut manifest)?;
		if dirty {
			self.manifest.save(&manifest)?;
		}
		Ok(value)
	}

	/// Replace the live tree for `repo` with the contents of `source`.
	///
	/// Stale installs of the same project under another name are removed
	/// first. The previous version stays in place unless the new tree is
	/// fully staged and renamed in. Once the new tree is live, a manifest
	/// failure is logged and reported through [`InstallOutcome::recorded`].
	#[instrument(skip_all, fields(project = %repo.project, canonical_name = %repo.canonical_name, git_ref = %git_ref))]
	pub fn install(
		&self,
		source: &Path,
		repo: &RepositoryConfig,
		git_ref: &str,
	) -> Result<InstallOutcome, InstallError> {
		if !source.is_dir() {
			return Err(InstallError::MissingSource(source.to_path_buf()));
		}

		let root = self.root_for(repo.component_type);
		fs::create_dir_all(root).map_err(|e| InstallError::io(root, e))?;

		let stale = self.with_manifest(|manifest| {
			let removed = remove_stale(manifest, root, repo)?;
			let dirty = !removed.is_empty();
			Ok((removed, dirty))
		});
		let removed_stale = match stale {
			Ok(removed) => removed,
			Err(e @ (InstallError::Manifest { .. } | InstallError::Lock { .. } | InstallError::Io { .. })) => {
				warn!(error = %e, "Manifest unavailable; skipping stale install cleanup");
				Vec::new()
			}
			Err(e) => return Err(e),
		};

		let replaced_previous = swap_in(source, root, &repo.canonical_name)?;

		let recorded = self
			.with_manifest(|manifest| {
				manifest.upsert(ManifestEntry {
					canonical_name: repo.canonical_name.clone(),
					component_type: repo.component_type,
					project: repo.project.clone(),
					git_ref: git_ref.to_string(),
					installed_at: Utc::now(),
				});
				Ok(((), true))
			})
			.inspect_err(|e| error!(error = %e, "Installed, but failed to record the install in the manifest"))
			.is_ok();

		let target = self.target_path(repo);
		info!(
			target = %target.display(),
			replaced_previous,
			stale_removed = removed_stale.len(),
			recorded,
			"Installed component"
		);
		Ok(InstallOutcome {
			target,
			replaced_previous,
			removed_stale,
			recorded,
		})
	}

	/// Remove the installed tree and its manifest entry. Returns whether
	/// anything was there.
	#[instrument(skip_all, fields(canonical_name = %repo.canonical_name))]
	pub fn uninstall(&self, repo: &RepositoryConfig) -> Result<bool, InstallError> {
		let target = self.target_path(repo);
		let existed = target.exists();
		remove_tree(&target)?;

		let recorded = self.with_manifest(|manifest| {
			let removed = manifest
				.remove(repo.component_type, &repo.canonical_name)
				.is_some();
			Ok((removed, removed))
		})?;

		if existed || recorded {
			info!(target = %target.display(), "Uninstalled component");
		}
		Ok(existed || recorded)
	}

	pub fn current_version(&self, repo: &RepositoryConfig) -> Option<String> {
		metadata::current_version(
			&self.target_path(repo),
			repo.component_type,
			&repo.canonical_name,
		)
	}

	pub fn inspect(&self, repo: &RepositoryConfig, catalog: &dyn ComponentCatalog) -> InstalledArtifact {
		let deployed_ref = match self.manifest.load() {
			Ok(manifest) => manifest
				.get(repo.component_type, &repo.canonical_name)
				.map(|entry| entry.git_ref.clone()),
			Err(e) => {
				warn!(error = %e, "Ignoring unreadable manifest");
				None
			}
		};

		InstalledArtifact {
			canonical_name: repo.canonical_name.clone(),
			component_type: repo.component_type,
			current_version: self.current_version(repo),
			active: catalog.is_active(repo.component_type, &repo.canonical_name),
			deployed_ref,
		}
	}
}

fn remove_stale(
	manifest: &mut Manifest,
	root: &Path,
	repo: &RepositoryConfig,
) -> Result<Vec<CanonicalName>, InstallError> {
	let mut removed = Vec::new();
	for stale in manifest.stale_for(&repo.project, repo.component_type, &repo.canonical_name) {
		let path = root.join(&stale.canonical_name);
		remove_tree(&path)?;
		manifest.remove(stale.component_type, &stale.canonical_name);
		info!(stale = %stale.canonical_name, "Removed stale install");
		removed.push(stale.canonical_name);
	}
	Ok(removed)
}

fn discard(path: &Path) {
	if let Err(e) = remove_tree(path) {
		warn!(error = %e, "Failed to remove staging leftovers");
	}
}

/// Name of a staging or set-aside directory: `<prefix><uuid>-<name>`.
fn scratch_name(prefix: &str, token: &Uuid, name: &CanonicalName) -> String {
	format!("{prefix}{}-{name}", token.simple())
}

/// Whether `file_name` is a scratch directory belonging to exactly `name`.
fn is_leftover_of(file_name: &str, name: &CanonicalName) -> bool {
	[STAGING_PREFIX, PREVIOUS_PREFIX].into_iter().any(|prefix| {
		file_name
			.strip_prefix(prefix)
			.and_then(|rest| rest.split_once('-'))
			.is_some_and(|(token, owner)| {
				owner == name.as_str() && token.len() == 32 && Uuid::try_parse(token).is_ok()
			})
	})
}

/// Remove staging and set-aside directories left by an interrupted install.
fn sweep_leftovers(root: &Path, name: &CanonicalName) {
	let Ok(entries) = fs::read_dir(root) else {
		return;
	};
	for entry in entries.flatten() {
		let file_name = entry.file_name();
		if is_leftover_of(&file_name.to_string_lossy(), name) {
			debug!(path = %entry.path().display(), "Sweeping leftover from interrupted install");
			discard(&entry.path());
		}
	}
}

/// Stage `source` beside the target and rename it into place. Returns
/// whether a previous tree was replaced.
fn swap_in(source: &Path, root: &Path, name: &CanonicalName) -> Result<bool, InstallError> {
	sweep_leftovers(root, name);

	let target = root.join(name);
	let token = Uuid::new_v4();
	let staging = root.join(scratch_name(STAGING_PREFIX, &token, name));

	if let Err(e) = copy_tree(source, &staging) {
		discard(&staging);
		return Err(e.into());
	}

	let aside = match fs::symlink_metadata(&target) {
		Ok(_) => {
			let aside = root.join(scratch_name(PREVIOUS_PREFIX, &token, name));
			if let Err(e) = fs::rename(&target, &aside) {
				discard(&staging);
				return Err(InstallError::io(&target, e));
			}
			Some(aside)
		}
		Err(e) if e.kind() == io::ErrorKind::NotFound => None,
		Err(e) => {
			discard(&staging);
			return Err(InstallError::io(&target, e));
		}
	};

	if let Err(source) = fs::rename(&staging, &target) {
		discard(&staging);
		let restored = match &aside {
			Some(aside) => fs::rename(aside, &target).is_ok(),
			None => true,
		};
		error!(target = %target.display(), restored, error = %source, "Failed to swap staged tree into place");
		return Err(InstallError::Swap {
			target,
			restored,
			source,
		});
	}

	let replaced = aside.is_some();
	if let Some(aside) = aside {
		discard(&aside);
	}
	Ok(replaced)
}

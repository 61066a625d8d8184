// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Per-component mutual exclusion for deploys.
//!
//! A lease is an in-process async mutex plus an advisory lock on
//! `<lock_dir>/<name>.lock`, so the server and a CLI invocation sharing a
//! data directory also exclude each other.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use fs2::FileExt;
use pushdeploy_common_core::CanonicalName;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::InstallError;

/// Open (creating if needed) a lock file. The lock is released when the
/// returned file is dropped.
pub(crate) fn open_lock_file(path: &Path) -> Result<File, InstallError> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
	}
	OpenOptions::new()
		.create(true)
		.truncate(false)
		.read(true)
		.write(true)
		.open(path)
		.map_err(|e| InstallError::io(path, e))
}

/// Block until `path` is exclusively locked.
pub(crate) fn lock_file(path: &Path) -> Result<File, InstallError> {
	let file = open_lock_file(path)?;
	file.lock_exclusive().map_err(|source| InstallError::Lock {
		path: path.to_path_buf(),
		source,
	})?;
	Ok(file)
}

fn is_contended(e: &io::Error) -> bool {
	e.kind() == io::ErrorKind::WouldBlock
		|| e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Hands out one lease per canonical name. Deploys of the same name
/// serialize; different names proceed in parallel.
#[derive(Debug, Clone)]
pub struct InstallLeases {
	lock_dir: PathBuf,
	locks: Arc<Mutex<HashMap<CanonicalName, Arc<AsyncMutex<()>>>>>,
}

/// Held for the duration of a fetch-validate-install run.
#[derive(Debug)]
pub struct InstallLease {
	name: CanonicalName,
	_file: File,
	_guard: OwnedMutexGuard<()>,
}

impl InstallLease {
	pub fn name(&self) -> &CanonicalName {
		&self.name
	}
}

impl InstallLeases {
	pub fn new(lock_dir: impl Into<PathBuf>) -> Self {
		Self {
			lock_dir: lock_dir.into(),
			locks: Arc::default(),
		}
	}

	pub fn lock_dir(&self) -> &Path {
		&self.lock_dir
	}

	fn lock_path(&self, name: &CanonicalName) -> PathBuf {
		self.lock_dir.join(format!("{name}.lock"))
	}

	fn lock_for(&self, name: &CanonicalName) -> Arc<AsyncMutex<()>> {
		let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
		locks.entry(name.clone()).or_default().clone()
	}

	/// Wait for and take the lease for `name`.
	pub async fn acquire(&self, name: &CanonicalName) -> Result<InstallLease, InstallError> {
		let guard = self.lock_for(name).lock_owned().await;

		let path = self.lock_path(name);
		let file = tokio::task::spawn_blocking(move || lock_file(&path))
			.await
			.map_err(|e| InstallError::Lock {
				path: self.lock_path(name),
				source: io::Error::other(e),
			})??;

		debug!(canonical_name = %name, "Acquired install lease");
		Ok(InstallLease {
			name: name.clone(),
			_file: file,
			_guard: guard,
		})
	}

	/// Take the lease only if nobody, in this process or another, holds it.
	pub fn try_acquire(&self, name: &CanonicalName) -> Result<Option<InstallLease>, InstallError> {
		let Ok(guard) = self.lock_for(name).try_lock_owned() else {
			return Ok(None);
		};

		let path = self.lock_path(name);
		let file = open_lock_file(&path)?;
		match file.try_lock_exclusive() {
			Ok(()) => Ok(Some(InstallLease {
				name: name.clone(),
				_file: file,
				_guard: guard,
			})),
			Err(e) if is_contended(&e) => Ok(None),
			Err(source) => Err(InstallError::Lock { path, source }),
		}
	}
}

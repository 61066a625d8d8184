// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Installs validated component trees into the host's plugin and theme
//! directories.
//!
//! A deploy stages the new tree beside the live one and swaps it in with two
//! renames, so a failure leaves the previous version in place. Installs are
//! recorded in a JSON manifest, which is also how renamed leftovers of a
//! project are found and removed.

pub mod error;
pub mod installer;
pub mod lease;
pub mod manifest;
pub mod metadata;

pub use error::InstallError;
pub use installer::{
	ComponentCatalog, InstallOutcome, InstalledArtifact, Installer, UnknownActivation,
};
pub use lease::{InstallLease, InstallLeases};
pub use manifest::{Manifest, ManifestEntry, ManifestStore};
pub use metadata::{current_version, read_version_header};

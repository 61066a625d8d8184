// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Core types shared by every pushdeploy crate.
//!
//! - [`RepositoryConfig`]: one configured deploy target
//! - [`ProjectRef`] / [`CanonicalName`]: validated identifiers
//! - [`tree`]: recursive copy/remove with aggregated error reporting

pub mod error;
pub mod tree;
pub mod types;

pub use error::TypeError;
pub use tree::{copy_tree, remove_tree, CopyStats, TreeError, TreeFailure, TreeOp};
pub use types::{CanonicalName, ComponentType, DeployRequest, ProjectRef, RepositoryConfig};

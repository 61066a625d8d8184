// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Untrusted zipball handling.
//!
//! A GitHub zipball holds one top-level directory named after the commit.
//! [`StagedArchive`] takes a downloaded zipball through extraction, re-roots
//! it under the component's canonical name and validates the result, then
//! removes every temporary file when dropped.

pub mod error;
pub mod extract;
pub mod limits;
pub mod restructure;
pub mod staged;
pub mod validate;

pub use error::{ArchiveError, StageError, ValidationError};
pub use extract::{check_declared_sizes, extract_archive};
pub use limits::{ArchiveLimits, DENIED_EXTENSIONS};
pub use restructure::restructure;
pub use staged::StagedArchive;
pub use validate::{validate_tree, ValidationReport};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors produced when parsing identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
	#[error("Invalid project reference '{0}': expected owner/name")]
	InvalidProjectRef(String),

	#[error("Invalid canonical name '{name}': {reason}")]
	InvalidCanonicalName { name: String, reason: &'static str },

	#[error("Unknown component type '{0}': expected plugin or theme")]
	UnknownComponentType(String),
}

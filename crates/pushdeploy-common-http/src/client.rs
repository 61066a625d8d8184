// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Creates a new HTTP client builder with the standard pushdeploy User-Agent.
///
/// # Example
/// ```ignore
/// let client = pushdeploy_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a builder with the standard User-Agent and a whole-request timeout.
pub fn builder_with_timeout(timeout: Duration) -> ClientBuilder {
	builder().timeout(timeout)
}

/// Returns the standard pushdeploy User-Agent string.
///
/// Format: `pushdeploy/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"pushdeploy/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		assert!(ua.starts_with("pushdeploy/"));
		assert!(ua.contains(std::env::consts::OS));
	}

	#[test]
	fn builder_with_timeout_builds() {
		let client = builder_with_timeout(Duration::from_secs(5)).build();
		assert!(client.is_ok());
	}
}

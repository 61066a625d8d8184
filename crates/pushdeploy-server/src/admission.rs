// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Gate run on every webhook delivery before the body is looked at.

use std::sync::Arc;

use pushdeploy_common_secret::SecretString;
use pushdeploy_common_webhook::verify_signature_header;
use thiserror::Error;

use crate::rate_limit::{RateLimiter, WEBHOOK_BUCKET};

/// Why a delivery was refused. Logged, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionFailure {
	#[error("webhook rate limit exceeded")]
	RateLimited,
	#[error("no webhook secret configured")]
	MissingSecret,
	#[error("missing X-Hub-Signature-256 header")]
	MissingSignature,
	#[error("webhook signature mismatch")]
	BadSignature,
}

#[derive(Clone)]
pub struct AdmissionGate {
	limiter: Arc<dyn RateLimiter>,
	secret: Option<SecretString>,
}

impl std::fmt::Debug for AdmissionGate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AdmissionGate")
			.field("secret", &self.secret)
			.finish_non_exhaustive()
	}
}

impl AdmissionGate {
	pub fn new(limiter: Arc<dyn RateLimiter>, secret: Option<SecretString>) -> Self {
		Self { limiter, secret }
	}

	/// Count the attempt, then verify the signature over the raw body.
	pub fn check(&self, body: &[u8], signature: Option<&str>) -> Result<(), AdmissionFailure> {
		if !self.limiter.try_acquire(WEBHOOK_BUCKET) {
			return Err(AdmissionFailure::RateLimited);
		}

		let secret = self
			.secret
			.as_ref()
			.filter(|s| !s.is_empty())
			.ok_or(AdmissionFailure::MissingSecret)?;
		let signature = signature.ok_or(AdmissionFailure::MissingSignature)?;

		if !verify_signature_header(secret.expose(), body, Some(signature)) {
			return Err(AdmissionFailure::BadSignature);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rate_limit::InMemoryRateLimiter;
	use proptest::prelude::*;
	use pushdeploy_common_webhook::compute_signature_header;
	use std::time::Duration;

	const SECRET: &str = "s3cret";

	fn gate(limit: u32, secret: Option<&str>) -> AdmissionGate {
		AdmissionGate::new(
			Arc::new(InMemoryRateLimiter::new(limit, Duration::from_secs(60))),
			secret.map(SecretString::from),
		)
	}

	#[test]
	fn test_valid_signature_admitted() {
		let body = br#"{"zen":"ok"}"#;
		let sig = compute_signature_header(SECRET, body);
		assert_eq!(gate(10, Some(SECRET)).check(body, Some(&sig)), Ok(()));
	}

	#[test]
	fn test_missing_secret() {
		let body = b"{}";
		let sig = compute_signature_header(SECRET, body);
		assert_eq!(
			gate(10, None).check(body, Some(&sig)),
			Err(AdmissionFailure::MissingSecret)
		);
		assert_eq!(
			gate(10, Some("")).check(body, Some(&sig)),
			Err(AdmissionFailure::MissingSecret)
		);
	}

	#[test]
	fn test_missing_header() {
		assert_eq!(
			gate(10, Some(SECRET)).check(b"{}", None),
			Err(AdmissionFailure::MissingSignature)
		);
	}

	#[test]
	fn test_rate_limit_checked_before_signature() {
		let gate = gate(1, Some(SECRET));
		assert_eq!(
			gate.check(b"{}", None),
			Err(AdmissionFailure::MissingSignature)
		);
		let sig = compute_signature_header(SECRET, b"{}");
		assert_eq!(
			gate.check(b"{}", Some(&sig)),
			Err(AdmissionFailure::RateLimited)
		);
	}

	proptest! {
		#[test]
		fn prop_body_tampering_rejected(
			body in proptest::collection::vec(any::<u8>(), 1..256),
			idx in any::<prop::sample::Index>(),
			flip in 1u8..=255,
		) {
			let sig = compute_signature_header(SECRET, &body);
			let mut tampered = body.clone();
			let i = idx.index(tampered.len());
			tampered[i] ^= flip;
			let gate = gate(u32::MAX, Some(SECRET));
			prop_assert_eq!(gate.check(&body, Some(&sig)), Ok(()));
			prop_assert_eq!(gate.check(&tampered, Some(&sig)), Err(AdmissionFailure::BadSignature));
		}
	}
}

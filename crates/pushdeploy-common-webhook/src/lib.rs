// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HMAC-SHA256 webhook signature utilities.
//!
//! GitHub signs every delivery with the shared webhook secret and sends the
//! digest in the `X-Hub-Signature-256` header as `sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Prefix GitHub puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Hex digest of `payload` keyed with `secret`, without the prefix.
pub fn compute_hmac_sha256(secret: &[u8], payload: &[u8]) -> String {
	hex::encode(keyed(secret).chain_update(payload).finalize().into_bytes())
}

/// Constant-time check of a bare hex digest. Malformed hex never matches.
pub fn verify_hmac_sha256(secret: &[u8], payload: &[u8], signature: &str) -> bool {
	hex::decode(signature).is_ok_and(|expected| {
		keyed(secret)
			.chain_update(payload)
			.verify_slice(&expected)
			.is_ok()
	})
}

fn keyed(secret: &[u8]) -> HmacSha256 {
	HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length")
}

/// Compute the full `sha256=<hex>` header value for a payload.
pub fn compute_signature_header(secret: &str, body: &[u8]) -> String {
	format!(
		"{SIGNATURE_PREFIX}{}",
		compute_hmac_sha256(secret.as_bytes(), body)
	)
}

/// Verify a delivery against the configured secret.
///
/// Returns `false` (never an error) when the secret is empty, the header is
/// absent, the prefix is wrong, or the digest does not match.
pub fn verify_signature_header(secret: &str, body: &[u8], signature_header: Option<&str>) -> bool {
	if secret.is_empty() {
		warn!("No webhook secret configured, rejecting delivery");
		return false;
	}

	let Some(header) = signature_header else {
		warn!("Missing {SIGNATURE_HEADER} header");
		return false;
	};

	let Some(expected_hex) = header.strip_prefix(SIGNATURE_PREFIX) else {
		warn!("Invalid webhook signature format: missing '{SIGNATURE_PREFIX}' prefix");
		return false;
	};

	if verify_hmac_sha256(secret.as_bytes(), body, expected_hex) {
		debug!("Webhook signature verified successfully");
		true
	} else {
		warn!("Webhook signature verification failed");
		false
	}
}

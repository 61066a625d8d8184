// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fixed-window request counting for the webhook endpoint.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Bucket shared by every webhook delivery.
pub const WEBHOOK_BUCKET: &str = "webhook";

/// Admission counter consulted before any webhook work is done.
pub trait RateLimiter: Send + Sync {
	/// Count one attempt against `key`. Returns `false` when the window is
	/// already full; rejected attempts are not counted.
	fn try_acquire(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Window {
	count: u32,
	expires_at: Instant,
}

/// Single-process counter with an expiry that moves forward on every
/// admitted request.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
	limit: u32,
	window: Duration,
	buckets: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimiter {
	pub fn new(limit: u32, window: Duration) -> Self {
		Self {
			limit,
			window,
			buckets: Mutex::new(HashMap::new()),
		}
	}

	pub fn limit(&self) -> u32 {
		self.limit
	}

	pub fn window(&self) -> Duration {
		self.window
	}

	/// [`RateLimiter::try_acquire`] with an explicit clock.
	pub fn try_acquire_at(&self, key: &str, now: Instant) -> bool {
		let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

		let count = match buckets.get(key) {
			Some(window) if window.expires_at > now => window.count,
			_ => 0,
		};

		if count >= self.limit {
			debug!(key, count, limit = self.limit, "Rate limit window full");
			return false;
		}

		buckets.insert(
			key.to_string(),
			Window {
				count: count + 1,
				expires_at: now + self.window,
			},
		);
		true
	}
}

impl RateLimiter for InMemoryRateLimiter {
	fn try_acquire(&self, key: &str) -> bool {
		self.try_acquire_at(key, Instant::now())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn limiter() -> InMemoryRateLimiter {
		InMemoryRateLimiter::new(10, Duration::from_secs(60))
	}

	#[test]
	fn test_eleventh_request_rejected() {
		let limiter = limiter();
		let start = Instant::now();
		for i in 0..10 {
			assert!(
				limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(i)),
				"request {i} should be admitted"
			);
		}
		assert!(!limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(10)));
	}

	#[test]
	fn test_admits_again_after_window() {
		let limiter = limiter();
		let start = Instant::now();
		for _ in 0..10 {
			assert!(limiter.try_acquire_at(WEBHOOK_BUCKET, start));
		}
		assert!(!limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(59)));
		assert!(limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(60)));
	}

	#[test]
	fn test_admitted_request_extends_expiry() {
		let limiter = InMemoryRateLimiter::new(2, Duration::from_secs(60));
		let start = Instant::now();
		assert!(limiter.try_acquire_at(WEBHOOK_BUCKET, start));
		assert!(limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(50)));
		// Window now runs until start+110.
		assert!(!limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(100)));
		assert!(limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(110)));
	}

	#[test]
	fn test_rejection_does_not_extend_expiry() {
		let limiter = InMemoryRateLimiter::new(1, Duration::from_secs(60));
		let start = Instant::now();
		assert!(limiter.try_acquire_at(WEBHOOK_BUCKET, start));
		assert!(!limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(30)));
		assert!(limiter.try_acquire_at(WEBHOOK_BUCKET, start + Duration::from_secs(60)));
	}

	#[test]
	fn test_keys_are_independent() {
		let limiter = InMemoryRateLimiter::new(1, Duration::from_secs(60));
		let now = Instant::now();
		assert!(limiter.try_acquire_at("a", now));
		assert!(!limiter.try_acquire_at("a", now));
		assert!(limiter.try_acquire_at("b", now));
	}

	#[test]
	fn test_zero_limit_rejects_everything() {
		let limiter = InMemoryRateLimiter::new(0, Duration::from_secs(60));
		assert!(!limiter.try_acquire(WEBHOOK_BUCKET));
	}
}

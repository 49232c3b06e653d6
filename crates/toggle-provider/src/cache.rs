// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cache of evaluation responses keyed by context fingerprint.
//!
//! The whole toggle mapping for a context is the unit of caching; single
//! flags are never stored on their own. Reads of absent or expired entries
//! return an empty mapping so lookups degrade to "flag not found".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use toggle_core::Toggles;
use tracing::debug;

/// Storage for evaluation responses.
pub trait CacheStore: Send + Sync {
	/// Stores `toggles` under `fingerprint`, replacing any previous entry.
	fn put(&self, fingerprint: &str, toggles: Toggles, ttl: Duration);

	/// Returns the toggles for `fingerprint`, or an empty mapping.
	fn get(&self, fingerprint: &str) -> Arc<Toggles>;

	/// Removes every entry.
	fn clear(&self);

	/// Number of stored entries, including ones that have expired but not yet been swept.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Debug)]
struct CacheEntry {
	toggles: Arc<Toggles>,
	inserted_at: Instant,
	ttl: Duration,
}

impl CacheEntry {
	fn is_expired(&self, now: Instant) -> bool {
		now > self.inserted_at + self.ttl
	}
}

/// In-memory cache where each entry expires individually.
///
/// Expired entries are evicted by the read that observes them and swept on
/// every write, so the map never holds more than the live entries plus those
/// that expired since the last `put`.
#[derive(Debug, Default)]
pub struct TtlCache {
	entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TtlCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Drops every expired entry.
	pub fn purge_expired(&self) {
		let now = Instant::now();
		let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
		entries.retain(|_, entry| !entry.is_expired(now));
	}
}

impl CacheStore for TtlCache {
	fn put(&self, fingerprint: &str, toggles: Toggles, ttl: Duration) {
		debug!(fingerprint = %fingerprint, toggles = toggles.len(), ttl_secs = ttl.as_secs(), "Caching evaluations");

		let now = Instant::now();
		let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
		entries.retain(|_, entry| !entry.is_expired(now));
		entries.insert(
			fingerprint.to_string(),
			CacheEntry {
				toggles: Arc::new(toggles),
				inserted_at: now,
				ttl,
			},
		);
	}

	fn get(&self, fingerprint: &str) -> Arc<Toggles> {
		let now = Instant::now();

		{
			let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
			match entries.get(fingerprint) {
				Some(entry) if !entry.is_expired(now) => return Arc::clone(&entry.toggles),
				Some(_) => {}
				None => {
					debug!(fingerprint = %fingerprint, "Cache miss");
					return Arc::new(Toggles::new());
				}
			}
		}

		let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
		// Re-check: a concurrent put may have refreshed the entry.
		if let Some(entry) = entries.get(fingerprint) {
			if !entry.is_expired(now) {
				return Arc::clone(&entry.toggles);
			}
		}
		entries.remove(fingerprint);
		debug!(fingerprint = %fingerprint, "Cache entry expired");
		Arc::new(Toggles::new())
	}

	fn clear(&self) {
		let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
		entries.clear();
	}

	fn len(&self) -> usize {
		self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use toggle_core::{Evaluation, FlagType};

	fn toggles() -> Toggles {
		let mut toggles = Toggles::new();
		toggles.insert(
			"flag".to_string(),
			Evaluation::new("flag", FlagType::Boolean, json!(true)),
		);
		toggles
	}

	#[test]
	fn put_then_get() {
		let cache = TtlCache::new();
		cache.put("fp", toggles(), Duration::from_secs(60));

		let got = cache.get("fp");
		assert_eq!(got.len(), 1);
		assert!(got.contains_key("flag"));
	}

	#[test]
	fn miss_returns_empty_mapping() {
		let cache = TtlCache::new();
		assert!(cache.get("unknown").is_empty());
	}

	#[test]
	fn expired_entry_is_evicted_on_read() {
		let cache = TtlCache::new();
		cache.put("fp", toggles(), Duration::from_millis(5));
		assert_eq!(cache.len(), 1);

		std::thread::sleep(Duration::from_millis(20));

		assert!(cache.get("fp").is_empty());
		assert_eq!(cache.len(), 0);
	}

	#[test]
	fn put_replaces_existing_entry() {
		let cache = TtlCache::new();
		cache.put("fp", toggles(), Duration::from_secs(60));
		cache.put("fp", Toggles::new(), Duration::from_secs(60));

		assert!(cache.get("fp").is_empty());
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn clear_removes_everything() {
		let cache = TtlCache::new();
		cache.put("a", toggles(), Duration::from_secs(60));
		cache.put("b", toggles(), Duration::from_secs(60));

		cache.clear();
		assert!(cache.is_empty());
	}

	#[test]
	fn put_sweeps_expired_entries() {
		let cache = TtlCache::new();
		for i in 0..1000 {
			cache.put(&format!("ctx-{i}"), toggles(), Duration::from_millis(1));
		}

		std::thread::sleep(Duration::from_millis(20));
		cache.put("latest", toggles(), Duration::from_secs(60));

		assert_eq!(cache.len(), 1);
		assert!(!cache.get("latest").is_empty());
	}

	#[test]
	fn purge_expired_keeps_live_entries() {
		let cache = TtlCache::new();
		cache.put("short", toggles(), Duration::from_millis(5));
		cache.put("long", toggles(), Duration::from_secs(60));

		std::thread::sleep(Duration::from_millis(20));
		cache.purge_expired();

		assert_eq!(cache.len(), 1);
		assert!(!cache.get("long").is_empty());
	}
}

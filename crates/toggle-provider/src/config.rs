// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provider options.
//!
//! Options are assembled with [`ProviderOptions::builder`] and validated once
//! in [`ProviderOptionsBuilder::build`]. After that they are immutable.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use toggle_common_http::DEFAULT_REQUEST_TIMEOUT;
use toggle_core::{default_base_url, fingerprint, validate_environment, EvaluationContext};

use crate::error::{Result, ToggleError};

/// Default lifetime of a cached evaluation response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Custom cache key function. Must be deterministic for equal contexts.
pub type CacheKeyFn = Arc<dyn Fn(&EvaluationContext) -> String + Send + Sync>;

/// How evaluation responses are cached.
#[derive(Clone)]
pub struct CachePolicy {
	pub ttl: Duration,
	pub key_fn: Option<CacheKeyFn>,
}

impl Default for CachePolicy {
	fn default() -> Self {
		Self {
			ttl: DEFAULT_CACHE_TTL,
			key_fn: None,
		}
	}
}

impl fmt::Debug for CachePolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CachePolicy")
			.field("ttl", &self.ttl)
			.field("key_fn", &self.key_fn.as_ref().map(|_| "<custom>"))
			.finish()
	}
}

/// Validated provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
	public_key: String,
	application: String,
	environment: String,
	horizon_urls: Vec<String>,
	default_url: String,
	enable_toggle_usage: bool,
	cache: CachePolicy,
	request_timeout: Duration,
}

impl ProviderOptions {
	pub fn builder() -> ProviderOptionsBuilder {
		ProviderOptionsBuilder::new()
	}

	pub fn public_key(&self) -> &str {
		&self.public_key
	}

	pub fn application(&self) -> &str {
		&self.application
	}

	pub fn environment(&self) -> &str {
		&self.environment
	}

	pub fn enable_toggle_usage(&self) -> bool {
		self.enable_toggle_usage
	}

	pub fn cache_policy(&self) -> &CachePolicy {
		&self.cache
	}

	pub fn cache_ttl(&self) -> Duration {
		self.cache.ttl
	}

	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}

	/// Endpoints to try in order: caller URLs first, then the default.
	pub fn candidate_urls(&self) -> Vec<String> {
		let mut urls: Vec<String> = Vec::with_capacity(self.horizon_urls.len() + 1);
		for url in self.horizon_urls.iter().chain(std::iter::once(&self.default_url)) {
			if !urls.contains(url) {
				urls.push(url.clone());
			}
		}
		urls
	}

	/// Cache key for a context, honoring the custom key function if set.
	pub fn cache_key(&self, context: &EvaluationContext) -> String {
		match &self.cache.key_fn {
			Some(key_fn) => key_fn(context),
			None => fingerprint(context),
		}
	}
}

/// Builder for [`ProviderOptions`].
#[derive(Debug, Default)]
pub struct ProviderOptionsBuilder {
	public_key: Option<String>,
	application: Option<String>,
	environment: Option<String>,
	horizon_urls: Vec<String>,
	default_url: Option<String>,
	enable_toggle_usage: Option<bool>,
	cache: CachePolicy,
	request_timeout: Option<Duration>,
}

impl ProviderOptionsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the public key sent as `x-api-key`.
	pub fn public_key(mut self, key: impl Into<String>) -> Self {
		self.public_key = Some(key.into());
		self
	}

	pub fn application(mut self, application: impl Into<String>) -> Self {
		self.application = Some(application.into());
		self
	}

	/// Sets the environment: a project environment id or an alias such as `production`.
	pub fn environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());
		self
	}

	/// Adds a candidate endpoint tried before the default one.
	pub fn horizon_url(mut self, url: impl Into<String>) -> Self {
		self.horizon_urls.push(url.into());
		self
	}

	pub fn horizon_urls<I, S>(mut self, urls: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.horizon_urls.extend(urls.into_iter().map(Into::into));
		self
	}

	/// Overrides the last-resort endpoint instead of deriving it from the public key.
	pub fn default_url(mut self, url: impl Into<String>) -> Self {
		self.default_url = Some(url.into());
		self
	}

	/// Enables or disables usage telemetry. Default: enabled.
	pub fn enable_toggle_usage(mut self, enabled: bool) -> Self {
		self.enable_toggle_usage = Some(enabled);
		self
	}

	pub fn cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache.ttl = ttl;
		self
	}

	pub fn cache_ttl_secs(self, secs: u64) -> Self {
		self.cache_ttl(Duration::from_secs(secs))
	}

	/// Replaces the default context fingerprint with a custom cache key function.
	pub fn cache_key_fn<F>(mut self, key_fn: F) -> Self
	where
		F: Fn(&EvaluationContext) -> String + Send + Sync + 'static,
	{
		self.cache.key_fn = Some(Arc::new(key_fn));
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);
		self
	}

	/// Validates and builds the options.
	pub fn build(self) -> Result<ProviderOptions> {
		let public_key = required(self.public_key, "public key")?;
		let application = required(self.application, "application")?;
		let environment = required(self.environment, "environment")?;
		validate_environment(&environment)?;

		let horizon_urls = self
			.horizon_urls
			.iter()
			.map(|url| normalize_url(url))
			.filter(|url| !url.is_empty())
			.collect();

		let default_url = match self.default_url {
			Some(url) => normalize_url(&url),
			None => default_base_url(&public_key),
		};

		Ok(ProviderOptions {
			public_key,
			application,
			environment,
			horizon_urls,
			default_url,
			enable_toggle_usage: self.enable_toggle_usage.unwrap_or(true),
			cache: self.cache,
			request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
		})
	}
}

fn required(value: Option<String>, field: &str) -> Result<String> {
	match value {
		Some(v) if !v.trim().is_empty() => Ok(v),
		_ => Err(ToggleError::Configuration(format!("{field} is required"))),
	}
}

fn normalize_url(url: &str) -> String {
	url.trim().trim_end_matches('/').to_string()
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The evaluation engine.
//!
//! [`ToggleProvider`] fetches evaluations for a context, caches them under the
//! context's fingerprint, and answers typed lookups from that cache.
//!
//! # Lifecycle
//!
//! ```text
//! NotReady --initialize--> (fetch) --ok--> Ready --context change--> Stale --ok--> Ready
//!                                  \--err--> Error                         \--err--> Error
//! ```
//!
//! Lookups never fail. In the `Error` state they keep serving whatever is
//! cached; there is no automatic retry, the next context change or an explicit
//! `initialize` triggers the next fetch.
//!
//! # Concurrency
//!
//! Fetches are not serialized and cannot be cancelled. Each fetch is tagged
//! with a generation number; when it completes, its response is always cached
//! under its own context's fingerprint, but only the most recent generation may
//! move the current context and status. Two fetches for the *same* fingerprint
//! that complete out of order leave the cache holding whichever finished last.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use toggle_core::{
	coerce, prepare_context, ErrorCode, EvaluationContext, FlagValue, ResolutionDetails,
};
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, TtlCache};
use crate::config::ProviderOptions;
use crate::error::Result;
use crate::hooks::{Hook, ToggleHooks};
use crate::transport::Transport;

/// Name reported in provider metadata.
pub const PROVIDER_NAME: &str = "toggle-provider-rust";

/// Readiness of the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
	/// No successful fetch yet.
	NotReady,
	/// The cache holds evaluations for the current context.
	Ready,
	/// A fetch for a new context is in flight; lookups use the previous data.
	Stale,
	/// The most recent fetch failed.
	Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
	pub name: String,
}

#[derive(Debug)]
struct EngineState {
	status: ProviderStatus,
	current_context: Option<EvaluationContext>,
	last_error: Option<String>,
}

/// Contract the host evaluation framework calls into.
#[async_trait]
pub trait FeatureProvider: Send + Sync {
	fn metadata(&self) -> &ProviderMetadata;

	/// Hooks the host runs around every resolve call.
	fn hooks(&self) -> Vec<Arc<dyn Hook>>;

	fn status(&self) -> ProviderStatus;

	async fn initialize(&self, context: Option<&EvaluationContext>) -> Result<()>;

	async fn on_context_change(
		&self,
		old: Option<&EvaluationContext>,
		new: Option<&EvaluationContext>,
	) -> Result<()>;

	fn resolve_boolean(
		&self,
		flag_key: &str,
		default_value: bool,
		context: &EvaluationContext,
	) -> ResolutionDetails<bool>;

	fn resolve_string(
		&self,
		flag_key: &str,
		default_value: String,
		context: &EvaluationContext,
	) -> ResolutionDetails<String>;

	fn resolve_number(
		&self,
		flag_key: &str,
		default_value: f64,
		context: &EvaluationContext,
	) -> ResolutionDetails<f64>;

	fn resolve_object(
		&self,
		flag_key: &str,
		default_value: Value,
		context: &EvaluationContext,
	) -> ResolutionDetails<Value>;
}

/// Feature toggle provider backed by the remote decision service.
pub struct ToggleProvider {
	options: Arc<ProviderOptions>,
	transport: Arc<Transport>,
	cache: Arc<dyn CacheStore>,
	hooks: Arc<ToggleHooks>,
	state: RwLock<EngineState>,
	generation: AtomicU64,
	metadata: ProviderMetadata,
}

impl ToggleProvider {
	/// Creates a provider with an in-memory TTL cache.
	pub fn new(options: ProviderOptions) -> Result<Self> {
		Self::with_cache(options, Arc::new(TtlCache::new()))
	}

	/// Creates a provider with a caller-supplied cache store.
	pub fn with_cache(options: ProviderOptions, cache: Arc<dyn CacheStore>) -> Result<Self> {
		let transport = Arc::new(Transport::new(&options)?);
		let options = Arc::new(options);
		let hooks = Arc::new(ToggleHooks::new(Arc::clone(&options), Arc::clone(&transport)));

		info!(
			application = %options.application(),
			environment = %options.environment(),
			endpoints = transport.urls().len(),
			toggle_usage = options.enable_toggle_usage(),
			"Toggle provider created"
		);

		Ok(Self {
			options,
			transport,
			cache,
			hooks,
			state: RwLock::new(EngineState {
				status: ProviderStatus::NotReady,
				current_context: None,
				last_error: None,
			}),
			generation: AtomicU64::new(0),
			metadata: ProviderMetadata {
				name: PROVIDER_NAME.to_string(),
			},
		})
	}

	pub fn options(&self) -> &ProviderOptions {
		&self.options
	}

	pub fn status(&self) -> ProviderStatus {
		self.read_state().status
	}

	/// Message of the most recent failed fetch, if the provider is in `Error`.
	pub fn last_error(&self) -> Option<String> {
		self.read_state().last_error.clone()
	}

	/// The prepared context of the most recent successful fetch.
	pub fn current_context(&self) -> Option<EvaluationContext> {
		self.read_state().current_context.clone()
	}

	pub fn clear_cache(&self) {
		self.cache.clear();
	}

	/// Fetches and caches evaluations for `context`.
	///
	/// Does nothing when the context or its targeting key is absent, so an
	/// application can defer initialization until the user is known.
	pub async fn initialize(&self, context: Option<&EvaluationContext>) -> Result<()> {
		match context {
			Some(ctx) if ctx.has_targeting_key() => self.refresh(ctx).await,
			_ => {
				debug!("No targeting key, deferring initialization");
				Ok(())
			}
		}
	}

	/// Refetches when the new context differs from the old one.
	pub async fn on_context_change(
		&self,
		old: Option<&EvaluationContext>,
		new: Option<&EvaluationContext>,
	) -> Result<()> {
		if self.is_context_equal(old, new) {
			debug!("Context unchanged, keeping cached evaluations");
			return Ok(());
		}

		info!("Evaluation context changed");
		self.initialize(new).await
	}

	/// Two contexts are equal when both are present, their targeting keys
	/// match, and the cache keys of their prepared forms match.
	pub fn is_context_equal(
		&self,
		old: Option<&EvaluationContext>,
		new: Option<&EvaluationContext>,
	) -> bool {
		match (old, new) {
			(Some(old), Some(new)) => {
				old.targeting_key == new.targeting_key
					&& self.cache_key(old) == self.cache_key(new)
			}
			_ => false,
		}
	}

	/// Cache key for a context as it would be sent to the service.
	pub fn cache_key(&self, context: &EvaluationContext) -> String {
		self.options.cache_key(&self.prepare(context))
	}

	/// Resolves `flag_key` as `T` from the cached evaluations for `context`.
	///
	/// Outcomes in priority order: flag absent (`FLAG_NOT_FOUND`), server-side
	/// error (`GENERAL`), declared type differs from `T` (`TYPE_MISMATCH`),
	/// otherwise the coerced value.
	pub fn resolve<T: FlagValue>(
		&self,
		flag_key: &str,
		default_value: T,
		context: &EvaluationContext,
	) -> ResolutionDetails<T> {
		let toggles = self.cache.get(&self.cache_key(context));

		let Some(evaluation) = toggles.get(flag_key) else {
			debug!(flag_key = %flag_key, "Flag not found in cache");
			return ResolutionDetails::error(default_value, ErrorCode::FlagNotFound, None);
		};

		if let Some(message) = &evaluation.error_message {
			debug!(flag_key = %flag_key, error = %message, "Server reported evaluation error");
			return ResolutionDetails::error(
				default_value,
				ErrorCode::General,
				Some(message.clone()),
			);
		}

		let requested = T::FLAG_TYPE;
		if evaluation.flag_type != requested {
			debug!(
				flag_key = %flag_key,
				declared = %evaluation.flag_type,
				requested = %requested,
				"Flag type mismatch"
			);
			return ResolutionDetails::error(
				default_value,
				ErrorCode::TypeMismatch,
				Some(format!(
					"flag {flag_key} is {}, requested {requested}",
					evaluation.flag_type
				)),
			);
		}

		match coerce(evaluation.flag_type, &evaluation.value) {
			Ok(typed) => {
				let variant = typed.variant();
				match T::from_typed(typed) {
					Some(value) => ResolutionDetails::resolved(value, variant, evaluation.reason.clone()),
					None => ResolutionDetails::error(default_value, ErrorCode::TypeMismatch, None),
				}
			}
			Err(e) => {
				debug!(flag_key = %flag_key, error = %e, "Flag value could not be decoded");
				ResolutionDetails::error(default_value, ErrorCode::TypeMismatch, Some(e.to_string()))
			}
		}
	}

	pub fn resolve_boolean(
		&self,
		flag_key: &str,
		default_value: bool,
		context: &EvaluationContext,
	) -> ResolutionDetails<bool> {
		self.resolve(flag_key, default_value, context)
	}

	pub fn resolve_string(
		&self,
		flag_key: &str,
		default_value: impl Into<String>,
		context: &EvaluationContext,
	) -> ResolutionDetails<String> {
		self.resolve(flag_key, default_value.into(), context)
	}

	pub fn resolve_number(
		&self,
		flag_key: &str,
		default_value: f64,
		context: &EvaluationContext,
	) -> ResolutionDetails<f64> {
		self.resolve(flag_key, default_value, context)
	}

	pub fn resolve_object(
		&self,
		flag_key: &str,
		default_value: Value,
		context: &EvaluationContext,
	) -> ResolutionDetails<Value> {
		self.resolve(flag_key, default_value, context)
	}

	pub fn hooks(&self) -> Vec<Arc<dyn Hook>> {
		vec![Arc::clone(&self.hooks) as Arc<dyn Hook>]
	}

	fn prepare(&self, context: &EvaluationContext) -> EvaluationContext {
		prepare_context(
			context,
			self.options.application(),
			self.options.environment(),
		)
	}

	async fn refresh(&self, context: &EvaluationContext) -> Result<()> {
		let prepared = self.prepare(context);
		prepared.validate()?;

		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let cache_key = self.options.cache_key(&prepared);
		self.mark_fetching();

		debug!(generation, cache_key = %cache_key, "Fetching evaluations");

		match self.transport.evaluate(&prepared).await {
			Ok(response) => {
				let count = response.toggles.len();
				self.cache.put(&cache_key, response.toggles, self.options.cache_ttl());

				let mut state = self.write_state();
				if self.is_latest(generation) {
					state.status = ProviderStatus::Ready;
					state.current_context = Some(prepared);
					state.last_error = None;
					info!(toggles = count, "Evaluations fetched");
				} else {
					debug!(generation, "Fetch superseded by a newer context");
				}
				Ok(())
			}
			Err(e) => {
				let mut state = self.write_state();
				if self.is_latest(generation) {
					state.status = ProviderStatus::Error;
					state.last_error = Some(e.to_string());
				}
				warn!(generation, error = %e, "Failed to fetch evaluations");
				Err(e)
			}
		}
	}

	fn mark_fetching(&self) {
		let mut state = self.write_state();
		state.status = if state.current_context.is_some() {
			ProviderStatus::Stale
		} else {
			ProviderStatus::NotReady
		};
	}

	fn is_latest(&self, generation: u64) -> bool {
		self.generation.load(Ordering::SeqCst) == generation
	}

	fn read_state(&self) -> std::sync::RwLockReadGuard<'_, EngineState> {
		self.state.read().unwrap_or_else(|e| e.into_inner())
	}

	fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, EngineState> {
		self.state.write().unwrap_or_else(|e| e.into_inner())
	}
}

impl std::fmt::Debug for ToggleProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ToggleProvider")
			.field("options", &self.options)
			.field("status", &self.status())
			.field("cached_contexts", &self.cache.len())
			.finish()
	}
}

#[async_trait]
impl FeatureProvider for ToggleProvider {
	fn metadata(&self) -> &ProviderMetadata {
		&self.metadata
	}

	fn hooks(&self) -> Vec<Arc<dyn Hook>> {
		ToggleProvider::hooks(self)
	}

	fn status(&self) -> ProviderStatus {
		ToggleProvider::status(self)
	}

	async fn initialize(&self, context: Option<&EvaluationContext>) -> Result<()> {
		ToggleProvider::initialize(self, context).await
	}

	async fn on_context_change(
		&self,
		old: Option<&EvaluationContext>,
		new: Option<&EvaluationContext>,
	) -> Result<()> {
		ToggleProvider::on_context_change(self, old, new).await
	}

	fn resolve_boolean(
		&self,
		flag_key: &str,
		default_value: bool,
		context: &EvaluationContext,
	) -> ResolutionDetails<bool> {
		self.resolve(flag_key, default_value, context)
	}

	fn resolve_string(
		&self,
		flag_key: &str,
		default_value: String,
		context: &EvaluationContext,
	) -> ResolutionDetails<String> {
		self.resolve(flag_key, default_value, context)
	}

	fn resolve_number(
		&self,
		flag_key: &str,
		default_value: f64,
		context: &EvaluationContext,
	) -> ResolutionDetails<f64> {
		self.resolve(flag_key, default_value, context)
	}

	fn resolve_object(
		&self,
		flag_key: &str,
		default_value: Value,
		context: &EvaluationContext,
	) -> ResolutionDetails<Value> {
		self.resolve(flag_key, default_value, context)
	}
}

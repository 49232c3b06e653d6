// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hook pipeline run around every flag resolution.
//!
//! The host evaluation framework calls hooks in a fixed order:
//!
//! | Stage | When | Provider behaviour |
//! |-------|------|--------------------|
//! | `before` | before resolving | injects application/environment, resolves the targeting key, validates |
//! | `after` | after a successful resolve | posts a usage event when toggle usage is enabled |
//! | `error` | any stage failed | logs the error |
//!
//! `after` is the only stage that returns a failure of its own (a telemetry
//! post that exhausted every endpoint). Hosts treat hook errors as advisory:
//! the resolved value is still returned to the caller.
//!
//! [`evaluate_with_hooks`] runs the pipeline the same way a host does.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use toggle_core::{
	prepare_context, ErrorCode, EvaluationContext, FlagType, FlagValue, ResolutionDetails,
	TelemetryPayload, ToggleUsage,
};
use tracing::{debug, error};

use crate::config::ProviderOptions;
use crate::error::{Result, ToggleError};
use crate::provider::ToggleProvider;
use crate::transport::Transport;

/// Opaque hints passed through the pipeline unchanged.
pub type HookHints = Map<String, Value>;

/// What a hook knows about the flag being evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct HookContext {
	pub flag_key: String,
	pub flag_type: FlagType,
	pub default_value: Value,
	pub context: EvaluationContext,
}

impl HookContext {
	pub fn new(
		flag_key: impl Into<String>,
		flag_type: FlagType,
		default_value: Value,
		context: EvaluationContext,
	) -> Self {
		Self {
			flag_key: flag_key.into(),
			flag_type,
			default_value,
			context,
		}
	}
}

/// A stage handler in the hook pipeline.
#[async_trait]
pub trait Hook: Send + Sync {
	/// Runs before resolution. A returned context replaces the evaluation context.
	async fn before(
		&self,
		_hook_context: &HookContext,
		_hints: &HookHints,
	) -> Result<Option<EvaluationContext>> {
		Ok(None)
	}

	/// Runs after a successful resolution.
	async fn after(
		&self,
		_hook_context: &HookContext,
		_details: &ResolutionDetails<Value>,
		_hints: &HookHints,
	) -> Result<()> {
		Ok(())
	}

	/// Runs when any stage failed. Must not fail itself.
	async fn error(&self, _hook_context: &HookContext, _error: &ToggleError, _hints: &HookHints) {}
}

/// The provider's own hooks.
#[derive(Debug, Clone)]
pub struct ToggleHooks {
	options: Arc<ProviderOptions>,
	transport: Arc<Transport>,
}

impl ToggleHooks {
	pub fn new(options: Arc<ProviderOptions>, transport: Arc<Transport>) -> Self {
		Self { options, transport }
	}
}

#[async_trait]
impl Hook for ToggleHooks {
	async fn before(
		&self,
		hook_context: &HookContext,
		_hints: &HookHints,
	) -> Result<Option<EvaluationContext>> {
		let prepared = prepare_context(
			&hook_context.context,
			self.options.application(),
			self.options.environment(),
		);
		prepared.validate()?;
		Ok(Some(prepared))
	}

	async fn after(
		&self,
		hook_context: &HookContext,
		details: &ResolutionDetails<Value>,
		_hints: &HookHints,
	) -> Result<()> {
		if !self.options.enable_toggle_usage() {
			return Ok(());
		}

		let payload = TelemetryPayload::new(
			hook_context.context.clone(),
			ToggleUsage {
				key: hook_context.flag_key.clone(),
				value: details.value.clone(),
				flag_type: hook_context.flag_type,
				reason: details.reason.clone(),
			},
		);

		self.transport.post_telemetry(&payload).await.map_err(|e| {
			error!(flag_key = %hook_context.flag_key, error = %e, "Failed to report toggle usage");
			ToggleError::Telemetry(Box::new(e))
		})?;

		debug!(flag_key = %hook_context.flag_key, "Toggle usage reported");
		Ok(())
	}

	async fn error(&self, hook_context: &HookContext, error: &ToggleError, _hints: &HookHints) {
		error!(flag_key = %hook_context.flag_key, error = %error, "Flag evaluation hook error");
	}
}

/// Resolves a flag with the provider's hooks wrapped around it.
///
/// A failing `before` stage returns the default with `INVALID_CONTEXT` (for
/// configuration errors) or `GENERAL`. A failing `after` stage is reported to
/// the error hooks and the resolved details are returned unchanged.
pub async fn evaluate_with_hooks<T: FlagValue>(
	provider: &ToggleProvider,
	flag_key: &str,
	default_value: T,
	context: &EvaluationContext,
	hints: &HookHints,
) -> ResolutionDetails<T> {
	let hooks = provider.hooks();
	let mut hook_context = HookContext::new(
		flag_key,
		T::FLAG_TYPE,
		default_value.clone().into_typed().to_json(),
		context.clone(),
	);

	for hook in &hooks {
		match hook.before(&hook_context, hints).await {
			Ok(Some(updated)) => hook_context.context = updated,
			Ok(None) => {}
			Err(e) => {
				run_error_hooks(&hooks, &hook_context, &e, hints).await;
				let code = if e.is_configuration() {
					ErrorCode::InvalidContext
				} else {
					ErrorCode::General
				};
				return ResolutionDetails::error(default_value, code, Some(e.to_string()));
			}
		}
	}

	let details = provider.resolve(flag_key, default_value, &hook_context.context);
	let erased = details.to_json();

	for hook in hooks.iter().rev() {
		if let Err(e) = hook.after(&hook_context, &erased, hints).await {
			run_error_hooks(&hooks, &hook_context, &e, hints).await;
		}
	}

	details
}

async fn run_error_hooks(
	hooks: &[Arc<dyn Hook>],
	hook_context: &HookContext,
	error: &ToggleError,
	hints: &HookHints,
) {
	for hook in hooks.iter().rev() {
		hook.error(hook_context, error, hints).await;
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-side feature toggle provider.
//!
//! This crate evaluates feature toggles against a remote decision service. The
//! service computes every flag for a context in one call; the provider caches
//! that response under a fingerprint of the context and serves typed lookups
//! from the cache until the context changes or the entry expires.
//!
//! # Features
//!
//! - **Ordered endpoint fallback**: caller-supplied endpoints are tried first,
//!   then a default derived from the public key
//! - **Context-keyed cache**: per-entry TTL, optional custom cache key function
//! - **Typed lookups**: boolean, string, number, and object flags with type checks
//! - **Hook pipeline**: context enrichment before resolution, usage telemetry after
//!
//! # Example
//!
//! ```ignore
//! use toggle_provider::{EvaluationContext, ProviderOptions, ToggleProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ProviderOptions::builder()
//!         .public_key("public_xxx")
//!         .application("my-app")
//!         .environment("production")
//!         .build()?;
//!
//!     let provider = ToggleProvider::new(options)?;
//!
//!     let context = EvaluationContext::new("user-123")
//!         .with_attribute("plan", serde_json::json!("enterprise"));
//!     provider.initialize(Some(&context)).await?;
//!
//!     let enabled = provider.resolve_boolean("new-checkout", false, &context);
//!     println!("new-checkout = {}", enabled.value);
//!
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod hooks;
mod provider;
mod transport;

pub use cache::{CacheStore, TtlCache};
pub use config::{
	CacheKeyFn, CachePolicy, ProviderOptions, ProviderOptionsBuilder, DEFAULT_CACHE_TTL,
};
pub use error::{Result, ToggleError};
pub use hooks::{evaluate_with_hooks, Hook, HookContext, HookHints, ToggleHooks};
pub use provider::{
	FeatureProvider, ProviderMetadata, ProviderStatus, ToggleProvider, PROVIDER_NAME,
};
pub use transport::Transport;

// Re-export core types for convenience
pub use toggle_core::{
	ErrorCode, Evaluation, EvaluationContext, EvaluationResponse, FlagType, FlagValue,
	ResolutionDetails, TelemetryPayload, Toggles, TypedValue, UserContext,
};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the feature toggle provider.
//!
//! This crate holds everything that does not touch the network: the wire
//! types exchanged with the decision service, context preparation and
//! fingerprinting, type coercion of server values, and identity helpers
//! (environment validation, public key decoding). It is used by the
//! provider crate (`toggle-provider`).
//!
//! # Example
//!
//! ```
//! use toggle_core::{coerce, prepare_context, EvaluationContext, FlagType, TypedValue};
//!
//! let ctx = EvaluationContext::new("user-1")
//!     .with_attribute("plan", serde_json::json!("enterprise"));
//! let prepared = prepare_context(&ctx, "my-app", "production");
//! assert!(prepared.validate().is_ok());
//!
//! let typed = coerce(FlagType::Boolean, &serde_json::json!("true")).unwrap();
//! assert_eq!(typed, TypedValue::Boolean(true));
//! ```

pub mod coerce;
pub mod context;
pub mod environment;
pub mod error;
pub mod evaluation;
pub mod fingerprint;
pub mod public_key;
pub mod resolution;

pub use coerce::{coerce, FlagValue, TypedValue};
pub use context::{anonymous_targeting_key, prepare_context, EvaluationContext, UserContext};
pub use environment::{is_environment_alias, is_project_environment_id, validate_environment};
pub use error::{CoreError, Result};
pub use evaluation::{
	Evaluation, EvaluationResponse, FlagType, TelemetryData, TelemetryPayload, ToggleUsage, Toggles,
};
pub use fingerprint::fingerprint;
pub use public_key::{default_base_url, org_id_from_public_key, PUBLIC_KEY_PREFIX, SERVICE_DOMAIN};
pub use resolution::{ErrorCode, ResolutionDetails};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation context sent to the decision service.
//!
//! A context identifies who a flag is being evaluated for. Before it is sent
//! anywhere it is *prepared*: the configured application and environment are
//! injected and a targeting key is guaranteed to be present. Preparation is a
//! pure function so the before-hook, initialization, and resolve-time cache
//! lookups all derive the same context from the same input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Length of the random suffix used for anonymous targeting keys.
const ANONYMOUS_SUFFIX_LEN: usize = 7;

/// User record nested inside an evaluation context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub custom_attributes: Map<String, Value>,
}

impl UserContext {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: Some(id.into()),
			..Default::default()
		}
	}

	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());
		self
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
		self.custom_attributes.insert(key.into(), value);
		self
	}
}

/// Context for a flag evaluation.
///
/// `application` and `environment` are normally left empty by callers; they are
/// overwritten from the provider options during preparation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub targeting_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ip_address: Option<String>,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub custom_attributes: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user: Option<UserContext>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub application: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub environment: Option<String>,
}

impl EvaluationContext {
	/// Creates a context for the given targeting key.
	pub fn new(targeting_key: impl Into<String>) -> Self {
		Self {
			targeting_key: Some(targeting_key.into()),
			..Default::default()
		}
	}

	/// Creates a context with no identity at all.
	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
		self.ip_address = Some(ip.into());
		self
	}

	pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
		self.custom_attributes.insert(key.into(), value);
		self
	}

	pub fn with_user(mut self, user: UserContext) -> Self {
		self.user = Some(user);
		self
	}

	/// Returns the targeting key if it is present and non-empty.
	pub fn targeting_key(&self) -> Option<&str> {
		non_empty(self.targeting_key.as_deref())
	}

	/// Returns true if a non-empty targeting key was supplied.
	pub fn has_targeting_key(&self) -> bool {
		self.targeting_key().is_some()
	}

	/// Checks that the fields required by the decision service are present.
	pub fn validate(&self) -> Result<()> {
		if self.targeting_key().is_none() {
			return Err(CoreError::MissingField("targetingKey"));
		}
		if non_empty(self.application.as_deref()).is_none() {
			return Err(CoreError::MissingField("application"));
		}
		if non_empty(self.environment.as_deref()).is_none() {
			return Err(CoreError::MissingField("environment"));
		}
		Ok(())
	}
}

/// Injects application and environment and resolves a targeting key.
///
/// The targeting key is kept if the caller set one, otherwise it falls back to
/// the user id, otherwise a fresh `{application}-{environment}-{random}` key is
/// synthesized. The random key is new on every call, so anonymous contexts never
/// share a cache entry.
pub fn prepare_context(
	context: &EvaluationContext,
	application: &str,
	environment: &str,
) -> EvaluationContext {
	let mut prepared = context.clone();
	prepared.application = Some(application.to_string());
	prepared.environment = Some(environment.to_string());

	if !prepared.has_targeting_key() {
		let derived = context
			.user
			.as_ref()
			.and_then(|user| non_empty(user.id.as_deref()))
			.map(str::to_string)
			.unwrap_or_else(|| anonymous_targeting_key(application, environment));
		prepared.targeting_key = Some(derived);
	}

	prepared
}

/// Builds a random targeting key for a context with no identity.
pub fn anonymous_targeting_key(application: &str, environment: &str) -> String {
	let suffix: String = std::iter::repeat_with(|| fastrand::alphanumeric().to_ascii_lowercase())
		.take(ANONYMOUS_SUFFIX_LEN)
		.collect();
	format!("{application}-{environment}-{suffix}")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.is_empty())
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the toggle provider.

use thiserror::Error;
use toggle_core::CoreError;

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ToggleError>;

/// Errors surfaced by the provider.
///
/// Flag lookups never return these; they encode failures in
/// [`ResolutionDetails`](toggle_core::ResolutionDetails) instead.
#[derive(Debug, Error)]
pub enum ToggleError {
	/// Missing or invalid option or context field. Never recovered.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// HTTP request failed before a response was received.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Endpoint answered with a non-success status.
	#[error("server error from {url} (status {status}): {message}")]
	ServerError {
		url: String,
		status: u16,
		message: String,
	},

	/// The candidate endpoint list is empty.
	#[error("no endpoints configured")]
	NoEndpoints,

	/// Usage telemetry could not be delivered.
	#[error("telemetry failed: {0}")]
	Telemetry(Box<ToggleError>),
}

impl ToggleError {
	/// Returns true for setup errors the application should fail fast on.
	pub fn is_configuration(&self) -> bool {
		matches!(self, ToggleError::Configuration(_))
	}
}

impl From<CoreError> for ToggleError {
	fn from(err: CoreError) -> Self {
		ToggleError::Configuration(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn core_errors_become_configuration_errors() {
		let err: ToggleError = CoreError::MissingField("application").into();
		assert!(err.is_configuration());
		assert_eq!(
			err.to_string(),
			"configuration error: missing required field: application"
		);
	}

	#[test]
	fn server_error_message() {
		let err = ToggleError::ServerError {
			url: "https://a.example/evaluate".to_string(),
			status: 503,
			message: "unavailable".to_string(),
		};
		assert!(!err.is_configuration());
		assert_eq!(
			err.to_string(),
			"server error from https://a.example/evaluate (status 503): unavailable"
		);
	}

	#[test]
	fn telemetry_wraps_cause() {
		let err = ToggleError::Telemetry(Box::new(ToggleError::NoEndpoints));
		assert_eq!(err.to_string(), "telemetry failed: no endpoints configured");
	}
}

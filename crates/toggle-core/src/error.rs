// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the toggle core crate.

use thiserror::Error;

use crate::evaluation::FlagType;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while validating identity data or coercing flag values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
	/// The public key is not `public_<base64>` with a valid organization segment.
	#[error("invalid public key")]
	InvalidPublicKey,

	/// The environment is neither a project environment id nor a valid alias.
	#[error("invalid environment: {0}")]
	InvalidEnvironment(String),

	/// A required field is absent or empty.
	#[error("missing required field: {0}")]
	MissingField(&'static str),

	/// The declared type of an evaluation does not match the requested type,
	/// or the raw value cannot be represented as the declared type.
	#[error("type mismatch: expected {expected}, found {found}")]
	TypeMismatch {
		/// The type the caller asked for.
		expected: FlagType,
		/// What was actually found.
		found: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn type_mismatch_message_names_both_sides() {
		let err = CoreError::TypeMismatch {
			expected: FlagType::Number,
			found: "\"abc\"".to_string(),
		};
		assert_eq!(err.to_string(), "type mismatch: expected number, found \"abc\"");
	}

	#[test]
	fn missing_field_message() {
		let err = CoreError::MissingField("targetingKey");
		assert_eq!(err.to_string(), "missing required field: targetingKey");
	}
}

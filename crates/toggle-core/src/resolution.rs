// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed results returned from a flag lookup.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::FlagValue;

/// Machine-readable reason a lookup fell back to the default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	FlagNotFound,
	TypeMismatch,
	General,
	InvalidContext,
}

impl ErrorCode {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorCode::FlagNotFound => "FLAG_NOT_FOUND",
			ErrorCode::TypeMismatch => "TYPE_MISMATCH",
			ErrorCode::General => "GENERAL",
			ErrorCode::InvalidContext => "INVALID_CONTEXT",
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Result of resolving one flag.
///
/// On failure `value` is the caller's default and `error_code` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionDetails<T> {
	pub value: T,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub variant: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_code: Option<ErrorCode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
}

impl<T> ResolutionDetails<T> {
	pub fn resolved(value: T, variant: impl Into<String>, reason: Option<String>) -> Self {
		Self {
			value,
			variant: Some(variant.into()),
			reason,
			error_code: None,
			error_message: None,
		}
	}

	pub fn error(default_value: T, code: ErrorCode, message: Option<String>) -> Self {
		Self {
			value: default_value,
			variant: None,
			reason: None,
			error_code: Some(code),
			error_message: message,
		}
	}

	pub fn is_error(&self) -> bool {
		self.error_code.is_some()
	}
}

impl<T: FlagValue> ResolutionDetails<T> {
	/// Erases the value type so hooks can handle any flag uniformly.
	pub fn to_json(&self) -> ResolutionDetails<Value> {
		ResolutionDetails {
			value: self.value.clone().into_typed().to_json(),
			variant: self.variant.clone(),
			reason: self.reason.clone(),
			error_code: self.error_code,
			error_message: self.error_message.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn resolved_serializes_without_error_fields() {
		let details = ResolutionDetails::resolved(true, "true", Some("EVALUATED".to_string()));
		assert_eq!(
			serde_json::to_value(&details).unwrap(),
			json!({ "value": true, "variant": "true", "reason": "EVALUATED" })
		);
		assert!(!details.is_error());
	}

	#[test]
	fn error_serializes_code_in_wire_form() {
		let details =
			ResolutionDetails::error("default".to_string(), ErrorCode::FlagNotFound, None);
		assert_eq!(
			serde_json::to_value(&details).unwrap(),
			json!({ "value": "default", "errorCode": "FLAG_NOT_FOUND" })
		);
		assert!(details.is_error());
	}

	#[test]
	fn error_code_display_matches_serde() {
		for code in [
			ErrorCode::FlagNotFound,
			ErrorCode::TypeMismatch,
			ErrorCode::General,
			ErrorCode::InvalidContext,
		] {
			assert_eq!(serde_json::to_value(code).unwrap(), json!(code.to_string()));
		}
	}

	#[test]
	fn only_produced_codes_deserialize() {
		assert_eq!(
			serde_json::from_value::<ErrorCode>(json!("INVALID_CONTEXT")).unwrap(),
			ErrorCode::InvalidContext
		);
		for unknown in ["PARSE_ERROR", "TARGETING_KEY_MISSING", "PROVIDER_NOT_READY"] {
			assert!(serde_json::from_value::<ErrorCode>(json!(unknown)).is_err());
		}
	}

	#[test]
	fn to_json_erases_type() {
		let details = ResolutionDetails::resolved(2.5f64, "2.5", None);
		let erased = details.to_json();
		assert_eq!(erased.value, json!(2.5));
		assert_eq!(erased.variant.as_deref(), Some("2.5"));
	}
}

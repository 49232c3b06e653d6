// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types exchanged with the decision service.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::EvaluationContext;

/// Type declared by the server for a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
	Boolean,
	String,
	Number,
	Object,
}

impl FlagType {
	pub fn as_str(&self) -> &'static str {
		match self {
			FlagType::Boolean => "boolean",
			FlagType::String => "string",
			FlagType::Number => "number",
			FlagType::Object => "object",
		}
	}
}

impl fmt::Display for FlagType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One server-computed flag decision.
///
/// `value` is kept as raw JSON and only decoded when a caller asks for it with
/// a specific type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
	pub key: String,
	#[serde(default)]
	pub value: Value,
	#[serde(rename = "type")]
	pub flag_type: FlagType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
}

impl Evaluation {
	pub fn new(key: impl Into<String>, flag_type: FlagType, value: Value) -> Self {
		Self {
			key: key.into(),
			value,
			flag_type,
			reason: None,
			error_message: None,
		}
	}

	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());
		self
	}

	pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
		self.error_message = Some(message.into());
		self
	}
}

/// All evaluations for one context, keyed by flag key.
pub type Toggles = HashMap<String, Evaluation>;

/// Body of a successful `POST /evaluate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
	#[serde(default)]
	pub toggles: Toggles,
}

/// A single evaluated flag reported by the usage hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleUsage {
	pub key: String,
	pub value: Value,
	#[serde(rename = "type")]
	pub flag_type: FlagType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryData {
	pub toggle: ToggleUsage,
}

/// Body of `POST /telemetry`. One payload per evaluated flag; never batched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPayload {
	pub context: EvaluationContext,
	pub data: TelemetryData,
}

impl TelemetryPayload {
	pub fn new(context: EvaluationContext, toggle: ToggleUsage) -> Self {
		Self {
			context,
			data: TelemetryData { toggle },
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stable fingerprints of evaluation contexts, used as cache keys.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::context::EvaluationContext;

/// Computes the default fingerprint of a context.
///
/// The context is rendered as canonical JSON (object keys sorted at every
/// level) and hashed with SHA-256, so equal contexts always produce the same
/// fingerprint regardless of attribute insertion order.
pub fn fingerprint(context: &EvaluationContext) -> String {
	let value = serde_json::to_value(context).unwrap_or(Value::Null);
	let mut canonical = String::new();
	write_canonical(&value, &mut canonical);

	let mut hasher = Sha256::new();
	hasher.update(canonical.as_bytes());
	hex::encode(hasher.finalize())
}

fn write_canonical(value: &Value, out: &mut String) {
	match value {
		Value::Object(map) => {
			let mut keys: Vec<&String> = map.keys().collect();
			keys.sort();
			out.push('{');
			for (i, key) in keys.into_iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				out.push_str(&Value::String(key.clone()).to_string());
				out.push(':');
				write_canonical(&map[key], out);
			}
			out.push('}');
		}
		Value::Array(items) => {
			out.push('[');
			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				write_canonical(item, out);
			}
			out.push(']');
		}
		scalar => out.push_str(&scalar.to_string()),
	}
}

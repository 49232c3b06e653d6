// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conversion of raw server values into the type a caller requested.
//!
//! Every [`FlagType`] has exactly one coercion rule:
//!
//! | Declared | Accepted raw values |
//! |----------|---------------------|
//! | `boolean` | JSON booleans, the strings `"true"` / `"false"` |
//! | `string` | JSON strings, booleans and numbers rendered as text |
//! | `number` | JSON numbers, strings that parse as a float |
//! | `object` | JSON objects and arrays, strings holding serialized JSON |
//!
//! Anything else is a type mismatch.

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::evaluation::FlagType;

/// A flag value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
	Boolean(bool),
	String(String),
	Number(f64),
	Object(Value),
}

impl TypedValue {
	pub fn flag_type(&self) -> FlagType {
		match self {
			TypedValue::Boolean(_) => FlagType::Boolean,
			TypedValue::String(_) => FlagType::String,
			TypedValue::Number(_) => FlagType::Number,
			TypedValue::Object(_) => FlagType::Object,
		}
	}

	/// Display string used as the resolution variant.
	pub fn variant(&self) -> String {
		match self {
			TypedValue::Boolean(b) => b.to_string(),
			TypedValue::String(s) => s.clone(),
			TypedValue::Number(n) => n.to_string(),
			TypedValue::Object(v) => v.to_string(),
		}
	}

	pub fn to_json(&self) -> Value {
		match self {
			TypedValue::Boolean(b) => Value::Bool(*b),
			TypedValue::String(s) => Value::String(s.clone()),
			TypedValue::Number(n) => serde_json::Number::from_f64(*n)
				.map(Value::Number)
				.unwrap_or(Value::Null),
			TypedValue::Object(v) => v.clone(),
		}
	}
}

/// Decodes `raw` according to the server-declared type.
pub fn coerce(declared: FlagType, raw: &Value) -> Result<TypedValue> {
	let mismatch = || CoreError::TypeMismatch {
		expected: declared,
		found: raw.to_string(),
	};

	match declared {
		FlagType::Boolean => match raw {
			Value::Bool(b) => Ok(TypedValue::Boolean(*b)),
			Value::String(s) => s.parse::<bool>().map(TypedValue::Boolean).map_err(|_| mismatch()),
			_ => Err(mismatch()),
		},
		FlagType::String => match raw {
			Value::String(s) => Ok(TypedValue::String(s.clone())),
			Value::Bool(_) | Value::Number(_) => Ok(TypedValue::String(raw.to_string())),
			_ => Err(mismatch()),
		},
		FlagType::Number => {
			let parsed = match raw {
				Value::Number(n) => n.as_f64(),
				Value::String(s) => s.trim().parse::<f64>().ok(),
				_ => None,
			};
			match parsed {
				Some(n) if !n.is_nan() => Ok(TypedValue::Number(n)),
				_ => Err(mismatch()),
			}
		}
		FlagType::Object => match raw {
			Value::Object(_) | Value::Array(_) => Ok(TypedValue::Object(raw.clone())),
			Value::String(s) => serde_json::from_str::<Value>(s)
				.ok()
				.filter(|v| v.is_object() || v.is_array())
				.map(TypedValue::Object)
				.ok_or_else(mismatch),
			_ => Err(mismatch()),
		},
	}
}

/// A Rust type a flag can be resolved as.
pub trait FlagValue: Sized + Clone + Send + Sync + 'static {
	/// The declared type this Rust type corresponds to.
	const FLAG_TYPE: FlagType;

	/// Extracts `Self` from a coerced value of the matching type.
	fn from_typed(value: TypedValue) -> Option<Self>;

	fn into_typed(self) -> TypedValue;
}

impl FlagValue for bool {
	const FLAG_TYPE: FlagType = FlagType::Boolean;

	fn from_typed(value: TypedValue) -> Option<Self> {
		match value {
			TypedValue::Boolean(b) => Some(b),
			_ => None,
		}
	}

	fn into_typed(self) -> TypedValue {
		TypedValue::Boolean(self)
	}
}

impl FlagValue for String {
	const FLAG_TYPE: FlagType = FlagType::String;

	fn from_typed(value: TypedValue) -> Option<Self> {
		match value {
			TypedValue::String(s) => Some(s),
			_ => None,
		}
	}

	fn into_typed(self) -> TypedValue {
		TypedValue::String(self)
	}
}

impl FlagValue for f64 {
	const FLAG_TYPE: FlagType = FlagType::Number;

	fn from_typed(value: TypedValue) -> Option<Self> {
		match value {
			TypedValue::Number(n) => Some(n),
			_ => None,
		}
	}

	fn into_typed(self) -> TypedValue {
		TypedValue::Number(self)
	}
}

impl FlagValue for Value {
	const FLAG_TYPE: FlagType = FlagType::Object;

	fn from_typed(value: TypedValue) -> Option<Self> {
		match value {
			TypedValue::Object(v) => Some(v),
			_ => None,
		}
	}

	fn into_typed(self) -> TypedValue {
		TypedValue::Object(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn boolean_accepts_bool_and_text() {
		assert_eq!(coerce(FlagType::Boolean, &json!(true)), Ok(TypedValue::Boolean(true)));
		assert_eq!(coerce(FlagType::Boolean, &json!("false")), Ok(TypedValue::Boolean(false)));
		assert!(coerce(FlagType::Boolean, &json!("yes")).is_err());
		assert!(coerce(FlagType::Boolean, &json!(1)).is_err());
	}

	#[test]
	fn string_passes_through() {
		assert_eq!(
			coerce(FlagType::String, &json!("blue")),
			Ok(TypedValue::String("blue".to_string()))
		);
		assert_eq!(
			coerce(FlagType::String, &json!(42)),
			Ok(TypedValue::String("42".to_string()))
		);
		assert!(coerce(FlagType::String, &Value::Null).is_err());
	}

	#[test]
	fn number_parses_floats() {
		assert_eq!(coerce(FlagType::Number, &json!(1.5)), Ok(TypedValue::Number(1.5)));
		assert_eq!(coerce(FlagType::Number, &json!("42")), Ok(TypedValue::Number(42.0)));
		assert_eq!(coerce(FlagType::Number, &json!(" -3.25 ")), Ok(TypedValue::Number(-3.25)));
	}

	#[test]
	fn number_rejects_non_numeric() {
		let err = coerce(FlagType::Number, &json!("abc")).unwrap_err();
		assert!(matches!(err, CoreError::TypeMismatch { expected: FlagType::Number, .. }));
		assert!(coerce(FlagType::Number, &json!("NaN")).is_err());
		assert!(coerce(FlagType::Number, &json!(true)).is_err());
	}

	#[test]
	fn object_decodes_serialized_form() {
		assert_eq!(
			coerce(FlagType::Object, &json!(r#"{"theme":"dark"}"#)),
			Ok(TypedValue::Object(json!({ "theme": "dark" })))
		);
		assert_eq!(
			coerce(FlagType::Object, &json!({ "a": 1 })),
			Ok(TypedValue::Object(json!({ "a": 1 })))
		);
	}

	#[test]
	fn object_rejects_malformed_input() {
		assert!(coerce(FlagType::Object, &json!("{not json")).is_err());
		assert!(coerce(FlagType::Object, &json!("3")).is_err());
		assert!(coerce(FlagType::Object, &json!(3)).is_err());
	}

	#[test]
	fn variant_strings() {
		assert_eq!(TypedValue::Boolean(true).variant(), "true");
		assert_eq!(TypedValue::Number(2.0).variant(), "2");
		assert_eq!(TypedValue::Number(0.5).variant(), "0.5");
		assert_eq!(TypedValue::Object(json!({ "a": 1 })).variant(), r#"{"a":1}"#);
	}

	#[test]
	fn flag_value_round_trips_through_typed() {
		assert_eq!(bool::from_typed(true.into_typed()), Some(true));
		assert_eq!(f64::from_typed(TypedValue::Boolean(true)), None);
		assert_eq!(String::FLAG_TYPE, FlagType::String);
		assert_eq!(Value::FLAG_TYPE, FlagType::Object);
	}
}

#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	fn any_flag_type() -> impl Strategy<Value = FlagType> {
		prop_oneof![
			Just(FlagType::Boolean),
			Just(FlagType::String),
			Just(FlagType::Number),
			Just(FlagType::Object),
		]
	}

	proptest! {
		#[test]
		fn coerced_value_has_declared_type(ty in any_flag_type(), s in ".{0,20}") {
			if let Ok(typed) = coerce(ty, &Value::String(s)) {
				prop_assert_eq!(typed.flag_type(), ty);
			}
		}

		#[test]
		fn numbers_survive_text_form(n in -1.0e9f64..1.0e9f64) {
			let typed = coerce(FlagType::Number, &Value::String(n.to_string())).unwrap();
			prop_assert_eq!(typed, TypedValue::Number(n));
		}

		#[test]
		fn strings_always_coerce_to_string(s in ".{0,40}") {
			let typed = coerce(FlagType::String, &Value::String(s.clone())).unwrap();
			prop_assert_eq!(typed.variant(), s);
		}
	}
}

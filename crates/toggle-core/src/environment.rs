// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment identifier validation.
//!
//! An environment is accepted in one of two forms:
//! - a project environment id: `pevr_` followed by 24 lowercase hex digits
//! - an alias: 1-25 characters of `[a-z0-9_-]`, where no hyphen-separated
//!   segment is the reserved word `environments`

use crate::error::{CoreError, Result};

const PROJECT_ENVIRONMENT_PREFIX: &str = "pevr_";
const PROJECT_ENVIRONMENT_ID_LEN: usize = 24;
const MAX_ALIAS_LEN: usize = 25;
const RESERVED_ALIAS: &str = "environments";

/// Returns true for `pevr_<24 hex>`.
pub fn is_project_environment_id(value: &str) -> bool {
	match value.strip_prefix(PROJECT_ENVIRONMENT_PREFIX) {
		Some(id) => {
			id.len() == PROJECT_ENVIRONMENT_ID_LEN
				&& id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
		}
		None => false,
	}
}

/// Returns true for a short alias such as `production` or `staging-eu`.
pub fn is_environment_alias(value: &str) -> bool {
	if value.is_empty() || value.len() > MAX_ALIAS_LEN {
		return false;
	}

	let charset_ok = value
		.chars()
		.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

	// `_` is a word character, so only `-` separates the reserved word.
	charset_ok && !value.split('-').any(|segment| segment == RESERVED_ALIAS)
}

/// Validates an environment in either accepted form.
pub fn validate_environment(value: &str) -> Result<()> {
	if is_project_environment_id(value) || is_environment_alias(value) {
		Ok(())
	} else {
		Err(CoreError::InvalidEnvironment(value.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn accepts_project_environment_ids() {
		assert!(is_project_environment_id("pevr_0123456789abcdef01234567"));
		assert!(validate_environment("pevr_0123456789abcdef01234567").is_ok());
	}

	#[test]
	fn rejects_malformed_project_environment_ids() {
		assert!(!is_project_environment_id("pevr_0123"));
		assert!(!is_project_environment_id("pevr_0123456789ABCDEF01234567"));
		assert!(!is_project_environment_id("penv_0123456789abcdef01234567"));
	}

	#[test]
	fn accepts_aliases() {
		for alias in ["production", "staging", "dev", "qa-1", "eu_west", "a"] {
			assert!(validate_environment(alias).is_ok(), "{alias} should be valid");
		}
	}

	#[test]
	fn rejects_bad_aliases() {
		assert!(validate_environment("").is_err());
		assert!(validate_environment("Production").is_err());
		assert!(validate_environment("prod env").is_err());
		assert!(validate_environment("prod.eu").is_err());
		assert!(validate_environment("abcdefghijklmnopqrstuvwxyz").is_err());
	}

	#[test]
	fn rejects_reserved_word() {
		assert!(validate_environment("environments").is_err());
		assert!(validate_environment("my-environments").is_err());
		assert!(validate_environment("environments-2").is_err());
		// Joined by `_` it is part of a longer word.
		assert!(validate_environment("environments_2").is_ok());
		assert!(validate_environment("environment").is_ok());
	}

	#[test]
	fn error_carries_value() {
		assert_eq!(
			validate_environment("Bad Env"),
			Err(CoreError::InvalidEnvironment("Bad Env".to_string()))
		);
	}

	proptest! {
		#[test]
		fn generated_aliases_are_valid(s in "[a-d0-9_][a-d0-9_-]{0,24}") {
			prop_assert!(is_environment_alias(&s));
		}

		#[test]
		fn uppercase_is_never_an_alias(s in "[A-Z][a-z0-9]{0,10}") {
			prop_assert!(!is_environment_alias(&s));
		}

		#[test]
		fn generated_project_ids_are_valid(id in "[0-9a-f]{24}") {
			let env = format!("pevr_{id}");
			prop_assert!(validate_environment(&env).is_ok());
		}
	}
}

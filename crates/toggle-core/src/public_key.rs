// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public key decoding and default endpoint derivation.
//!
//! Public keys have the form `public_<base64>`, where the decoded payload is
//! `<org_id>:<rest>`. The organization id selects the tenant-specific endpoint.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{CoreError, Result};

/// Prefix every public key starts with.
pub const PUBLIC_KEY_PREFIX: &str = "public_";

/// Domain of the hosted decision service.
pub const SERVICE_DOMAIN: &str = "toggle.hyphen.cloud";

/// Standard alphabet; keys are accepted with or without `=` padding.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Extracts the organization id embedded in a public key.
pub fn org_id_from_public_key(public_key: &str) -> Result<String> {
	let encoded = public_key
		.strip_prefix(PUBLIC_KEY_PREFIX)
		.ok_or(CoreError::InvalidPublicKey)?;

	let decoded = KEY_ENGINE
		.decode(encoded)
		.map_err(|_| CoreError::InvalidPublicKey)?;
	let decoded = String::from_utf8(decoded).map_err(|_| CoreError::InvalidPublicKey)?;

	let org_id = decoded.split(':').next().unwrap_or_default();
	if is_valid_org_id(org_id) {
		Ok(org_id.to_string())
	} else {
		Err(CoreError::InvalidPublicKey)
	}
}

/// Returns the default endpoint for a public key.
///
/// Falls back to the shared service domain when the key cannot be decoded.
pub fn default_base_url(public_key: &str) -> String {
	match org_id_from_public_key(public_key) {
		Ok(org_id) => format!("https://{org_id}.{SERVICE_DOMAIN}"),
		Err(_) => format!("https://{SERVICE_DOMAIN}"),
	}
}

fn is_valid_org_id(org_id: &str) -> bool {
	!org_id.is_empty()
		&& org_id
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
	use super::*;
	use base64::engine::general_purpose::STANDARD;

	fn key_for(payload: &str) -> String {
		format!("{PUBLIC_KEY_PREFIX}{}", STANDARD.encode(payload))
	}

	#[test]
	fn decodes_org_id() {
		let key = key_for("org_abc123:proj_1:secret");
		assert_eq!(org_id_from_public_key(&key), Ok("org_abc123".to_string()));
	}

	#[test]
	fn org_id_without_separator() {
		let key = key_for("my-org");
		assert_eq!(org_id_from_public_key(&key), Ok("my-org".to_string()));
	}

	#[test]
	fn accepts_key_without_padding() {
		assert_eq!(org_id_from_public_key("public_YWNtZTpwcg=="), Ok("acme".to_string()));
		assert_eq!(org_id_from_public_key("public_YWNtZTpwcg"), Ok("acme".to_string()));
		assert_eq!(
			default_base_url("public_YWNtZTpwcg"),
			"https://acme.toggle.hyphen.cloud"
		);
	}

	#[test]
	fn rejects_missing_prefix() {
		let key = STANDARD.encode("org:rest");
		assert_eq!(org_id_from_public_key(&key), Err(CoreError::InvalidPublicKey));
	}

	#[test]
	fn rejects_non_base64() {
		assert_eq!(
			org_id_from_public_key("public_!!!not-base64!!!"),
			Err(CoreError::InvalidPublicKey)
		);
	}

	#[test]
	fn rejects_invalid_org_characters() {
		let key = key_for("org.with.dots:rest");
		assert_eq!(org_id_from_public_key(&key), Err(CoreError::InvalidPublicKey));

		let key = key_for(":rest");
		assert_eq!(org_id_from_public_key(&key), Err(CoreError::InvalidPublicKey));
	}

	#[test]
	fn default_url_uses_org_subdomain() {
		let key = key_for("acme:proj");
		assert_eq!(default_base_url(&key), "https://acme.toggle.hyphen.cloud");
	}

	#[test]
	fn default_url_falls_back_to_shared_domain() {
		assert_eq!(default_base_url("garbage"), "https://toggle.hyphen.cloud");
	}
}

#[cfg(test)]
mod proptests {
	use super::*;
	use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn encoded_org_ids_decode(org in "[a-zA-Z0-9_-]{1,30}", rest in "[a-z0-9:]{0,20}") {
			let key = format!("{PUBLIC_KEY_PREFIX}{}", STANDARD.encode(format!("{org}:{rest}")));
			prop_assert_eq!(org_id_from_public_key(&key), Ok(org));
		}

		#[test]
		fn padding_is_optional(org in "[a-zA-Z0-9_-]{1,30}", rest in "[a-z0-9:]{0,20}") {
			let payload = format!("{org}:{rest}");
			let padded = format!("{PUBLIC_KEY_PREFIX}{}", STANDARD.encode(&payload));
			let unpadded = format!("{PUBLIC_KEY_PREFIX}{}", STANDARD_NO_PAD.encode(&payload));
			prop_assert_eq!(org_id_from_public_key(&padded), org_id_from_public_key(&unpadded));
		}
	}
}

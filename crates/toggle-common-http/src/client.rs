// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::debug;

/// Timeout applied when the caller does not configure one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const SDK_NAME: &str = "toggle-provider-rust";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a new HTTP client builder with the standard User-Agent header.
///
/// Use this when you need to customize the client further.
///
/// # Example
/// ```ignore
/// let client = toggle_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client with a custom timeout and the standard User-Agent.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	debug!(timeout_ms = timeout.as_millis() as u64, "Building HTTP client");
	builder().timeout(timeout).build()
}

/// Returns the standard User-Agent string.
///
/// Format: `toggle-provider-rust/{version}`
pub fn user_agent() -> String {
	format!("{SDK_NAME}/{SDK_VERSION}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 2);
		assert_eq!(parts[0], "toggle-provider-rust");
		assert_eq!(parts[1], env!("CARGO_PKG_VERSION"));
	}

	#[tokio::test]
	async fn client_with_timeout_builds() {
		let client = new_client_with_timeout(Duration::from_secs(5));
		assert!(client.is_ok());
	}
}

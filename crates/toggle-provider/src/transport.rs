// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport with ordered endpoint fallback.
//!
//! Every request is tried against the candidate endpoints in order. A
//! non-success status, a connection failure, or an undecodable body moves on
//! to the next endpoint. The first success wins; if every endpoint fails the
//! error from the last one is returned.

use std::future::Future;

use reqwest::Client;
use serde::Serialize;
use toggle_core::{EvaluationContext, EvaluationResponse, TelemetryPayload};
use tracing::{debug, error, warn};

use crate::config::ProviderOptions;
use crate::error::{Result, ToggleError};

const API_KEY_HEADER: &str = "x-api-key";
const EVALUATE_PATH: &str = "evaluate";
const TELEMETRY_PATH: &str = "telemetry";

/// Client for the decision service.
#[derive(Debug, Clone)]
pub struct Transport {
	http_client: Client,
	public_key: String,
	urls: Vec<String>,
}

impl Transport {
	pub fn new(options: &ProviderOptions) -> Result<Self> {
		let http_client = toggle_common_http::new_client_with_timeout(options.request_timeout())?;
		Ok(Self::with_client(
			http_client,
			options.public_key(),
			options.candidate_urls(),
		))
	}

	/// Creates a transport around an existing HTTP client.
	pub fn with_client(http_client: Client, public_key: impl Into<String>, urls: Vec<String>) -> Self {
		Self {
			http_client,
			public_key: public_key.into(),
			urls,
		}
	}

	pub fn urls(&self) -> &[String] {
		&self.urls
	}

	/// Fetches evaluations for a prepared context.
	pub async fn evaluate(&self, context: &EvaluationContext) -> Result<EvaluationResponse> {
		self.with_fallback(EVALUATE_PATH, move |url| async move {
			let response = self.post(&url, context).await?;
			Ok(response.json::<EvaluationResponse>().await?)
		})
		.await
	}

	/// Reports one evaluated flag. The response body is ignored.
	pub async fn post_telemetry(&self, payload: &TelemetryPayload) -> Result<()> {
		self.with_fallback(TELEMETRY_PATH, move |url| async move {
			self.post(&url, payload).await?;
			Ok(())
		})
		.await
	}

	async fn with_fallback<T, F, Fut>(&self, path: &str, mut attempt: F) -> Result<T>
	where
		F: FnMut(String) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut last_error = None;

		for base in &self.urls {
			let url = format!("{base}/{path}");
			debug!(url = %url, "Sending request");

			match attempt(url.clone()).await {
				Ok(value) => return Ok(value),
				Err(e) => {
					warn!(url = %url, error = %e, "Endpoint failed, trying next");
					last_error = Some(e);
				}
			}
		}

		let err = last_error.unwrap_or(ToggleError::NoEndpoints);
		error!(path = %path, error = %err, "All endpoints failed");
		Err(err)
	}

	async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
		let response = self
			.http_client
			.post(url)
			.header(API_KEY_HEADER, &self.public_key)
			.json(body)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(ToggleError::ServerError {
				url: url.to_string(),
				status: status.as_u16(),
				message,
			});
		}

		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn empty_url_list_fails_with_no_endpoints() {
		let transport = Transport::with_client(Client::new(), "public_key", vec![]);
		let err = transport
			.evaluate(&EvaluationContext::new("u1"))
			.await
			.unwrap_err();
		assert!(matches!(err, ToggleError::NoEndpoints));
	}

	#[test]
	fn new_uses_candidate_urls() {
		let options = ProviderOptions::builder()
			.public_key("public_key")
			.application("app")
			.environment("production")
			.horizon_url("https://a.example")
			.default_url("https://b.example")
			.build()
			.unwrap();

		let transport = Transport::new(&options).unwrap();
		assert_eq!(transport.urls(), ["https://a.example", "https://b.example"]);
	}
}

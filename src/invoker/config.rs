//! Builder-style configuration for [`Invoker`](crate::Invoker).

// self
use crate::{_prelude::*, http::HttpClientConfig};

/// Configuration shared by every invocation made through one [`Invoker`](crate::Invoker).
#[derive(Clone, Debug)]
pub struct InvokerConfig {
	/// HTTP client knobs applied to both the token exchange and the target request.
	pub http: HttpClientConfig,
	/// Token endpoint override; `None` uses each key's `token_uri`.
	pub token_endpoint: Option<Url>,
	/// Remaining lifetime below which a cached ID token is replaced.
	pub preemptive_window: Duration,
}
impl InvokerConfig {
	/// Default preemptive refresh window.
	pub const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Replaces the HTTP client configuration.
	pub fn with_http(mut self, http: HttpClientConfig) -> Self {
		self.http = http;

		self
	}

	/// Routes token exchanges to `endpoint`.
	pub fn with_token_endpoint(mut self, endpoint: Url) -> Self {
		self.token_endpoint = Some(endpoint);

		self
	}

	/// Sets the preemptive refresh window; negative values clamp to zero.
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}
}
impl Default for InvokerConfig {
	fn default() -> Self {
		Self {
			http: HttpClientConfig::default(),
			token_endpoint: None,
			preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW,
		}
	}
}

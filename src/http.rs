//! HTTP client construction for the token endpoint and the target request.
//!
//! Every invocation builds its own [`ReqwestHttpClient`] from an [`HttpClientConfig`] and drops
//! it when the call returns, so connection pools never outlive the request that opened them.

// std
use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
use reqwest::redirect::Policy;
// self
use crate::{_prelude::*, error::ConfigError};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str =
	concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Knobs applied to every HTTP client the invoker builds.
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
	/// Total timeout per request, including body download; `None` disables it.
	pub request_timeout: Option<StdDuration>,
	/// TCP + TLS connect timeout; `None` disables it.
	pub connect_timeout: Option<StdDuration>,
	/// Value of the `User-Agent` header.
	pub user_agent: String,
}
impl HttpClientConfig {
	/// Sets or clears the total request timeout.
	pub fn with_request_timeout(mut self, timeout: Option<StdDuration>) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Sets or clears the connect timeout.
	pub fn with_connect_timeout(mut self, timeout: Option<StdDuration>) -> Self {
		self.connect_timeout = timeout;

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Builds a client for the outbound request to the target URI.
	pub fn build(&self) -> Result<ReqwestHttpClient, ConfigError> {
		self.builder().build().map(ReqwestHttpClient).map_err(ConfigError::from)
	}

	/// Builds a client for token exchanges.
	///
	/// Token endpoints answer directly, so redirects are never followed.
	pub fn build_for_token_endpoint(&self) -> Result<ReqwestHttpClient, ConfigError> {
		self.builder()
			.redirect(Policy::none())
			.build()
			.map(ReqwestHttpClient)
			.map_err(ConfigError::from)
	}

	fn builder(&self) -> reqwest::ClientBuilder {
		let mut builder = ReqwestClient::builder().user_agent(self.user_agent.clone());

		if let Some(timeout) = self.request_timeout {
			builder = builder.timeout(timeout);
		}
		if let Some(timeout) = self.connect_timeout {
			builder = builder.connect_timeout(timeout);
		}

		builder
	}
}
impl Default for HttpClientConfig {
	fn default() -> Self {
		Self {
			request_timeout: Some(StdDuration::from_secs(60)),
			connect_timeout: Some(StdDuration::from_secs(10)),
			user_agent: DEFAULT_USER_AGENT.into(),
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

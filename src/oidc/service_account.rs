//! JWT-bearer exchange of a service-account assertion for a Google-signed ID token.

// self
use crate::{
	_prelude::*,
	auth::{Audience, IdToken, ServiceAccountKey},
	error::{ConfigError, TokenError},
	http::HttpClientConfig,
	oidc::{IdTokenMinter, MintFuture, assertion},
};

const ERROR_BODY_PREVIEW: usize = 256;

/// Mints a fresh ID token on every call by exchanging a signed assertion at the token endpoint.
///
/// Each exchange builds its own HTTP client from [`HttpClientConfig`], with redirects disabled.
#[derive(Clone, Debug, Default)]
pub struct ServiceAccountMinter {
	http: HttpClientConfig,
	token_endpoint: Option<Url>,
}
impl ServiceAccountMinter {
	/// Creates a minter that posts to each key's own `token_uri`.
	pub fn new(http: HttpClientConfig) -> Self {
		Self { http, token_endpoint: None }
	}

	/// Sends exchanges to `endpoint` instead of the key's `token_uri`.
	///
	/// The assertion's `aud` claim still names the key's `token_uri`.
	pub fn with_token_endpoint(mut self, endpoint: Url) -> Self {
		self.token_endpoint = Some(endpoint);

		self
	}

	async fn exchange(&self, key: &ServiceAccountKey, audience: &Audience) -> Result<IdToken> {
		let endpoint = match &self.token_endpoint {
			Some(endpoint) => endpoint.clone(),
			None => key.token_url()?,
		};
		let jwt = assertion::sign(key, audience, OffsetDateTime::now_utc())?;
		let client = self.http.build_for_token_endpoint()?;
		let response = client
			.post(endpoint)
			.form(&[
				("grant_type", assertion::JWT_BEARER_GRANT_TYPE),
				("assertion", jwt.as_str()),
			])
			.send()
			.await
			.map_err(map_reqwest_error)?;
		let status = response.status().as_u16();
		let body = response.bytes().await.map_err(TokenError::network)?;

		if !(200..300).contains(&status) {
			return Err(rejection(status, &body).into());
		}

		let parsed: TokenResponse = parse_json(status, &body)?;
		let raw = parsed
			.id_token
			.filter(|token| !token.is_empty())
			.ok_or(TokenError::MissingIdToken)?;

		Ok(IdToken::from_jwt(audience.clone(), raw)?)
	}
}
impl IdTokenMinter for ServiceAccountMinter {
	fn mint<'a>(&'a self, key: &'a ServiceAccountKey, audience: &'a Audience) -> MintFuture<'a> {
		Box::pin(self.exchange(key, audience))
	}
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	#[serde(default)]
	id_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

fn parse_json<T>(status: u16, body: &[u8]) -> Result<T, TokenError>
where
	T: for<'de> Deserialize<'de>,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TokenError::ResponseParse { status, source })
}

fn rejection(status: u16, body: &[u8]) -> TokenError {
	if let Ok(ErrorResponse { error, error_description }) = serde_json::from_slice(body) {
		return TokenError::Rejected { status, error, description: error_description };
	}

	let text = String::from_utf8_lossy(body);
	let text = text.trim();
	let description = if text.is_empty() {
		None
	} else {
		Some(text.chars().take(ERROR_BODY_PREVIEW).collect())
	};

	TokenError::Rejected { status, error: None, description }
}

fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TokenError::network(err).into()
}

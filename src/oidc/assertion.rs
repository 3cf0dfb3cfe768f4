//! Self-signed JWT assertions exchanged for ID tokens.

// crates.io
use jsonwebtoken::{Algorithm, Header};
// self
use crate::{
	_prelude::*,
	auth::{Audience, ServiceAccountKey},
	error::TokenError,
};

/// Grant type for the RFC 7523 JWT-bearer exchange.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Backdating applied to `iat` so token endpoints with a slower clock accept the assertion.
pub const CLOCK_SKEW_MARGIN: Duration = Duration::seconds(10);
/// Lifetime of each assertion.
pub const ASSERTION_LIFETIME: Duration = Duration::hours(1);

/// Claims of the assertion requesting an ID token for `target_audience`.
#[derive(Clone, Debug, Serialize)]
pub struct AssertionClaims<'a> {
	/// Service account email.
	pub iss: &'a str,
	/// Service account email.
	pub sub: &'a str,
	/// Token endpoint receiving the assertion.
	pub aud: &'a str,
	/// Audience the issued ID token is bound to.
	pub target_audience: &'a str,
	/// Issued-at instant.
	#[serde(with = "time::serde::timestamp")]
	pub iat: OffsetDateTime,
	/// Expiry instant.
	#[serde(with = "time::serde::timestamp")]
	pub exp: OffsetDateTime,
}
impl<'a> AssertionClaims<'a> {
	/// Builds claims for `key` and `audience` as of `now`.
	pub fn new(key: &'a ServiceAccountKey, audience: &'a Audience, now: OffsetDateTime) -> Self {
		let iat = now - CLOCK_SKEW_MARGIN;

		Self {
			iss: &key.client_email,
			sub: &key.client_email,
			aud: &key.token_uri,
			target_audience: audience.as_str(),
			iat,
			exp: iat + ASSERTION_LIFETIME,
		}
	}
}

/// Signs an RS256 assertion for `audience`, tagging it with the key id when present.
pub fn sign(key: &ServiceAccountKey, audience: &Audience, now: OffsetDateTime) -> Result<String> {
	let mut header = Header::new(Algorithm::RS256);

	if !key.private_key_id.is_empty() {
		header.kid = Some(key.private_key_id.clone());
	}

	let signing_key = key.signing_key()?;
	let claims = AssertionClaims::new(key, audience, now);

	jsonwebtoken::encode(&header, &claims, &signing_key)
		.map_err(|source| TokenError::Signing { source }.into())
}

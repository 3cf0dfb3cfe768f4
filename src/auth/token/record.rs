//! Identity token records, lifecycle helpers, and JWT claim decoding.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{
	_prelude::*,
	auth::{Audience, token::secret::TokenSecret},
	error::TokenError,
};

/// Google-signed OIDC identity token bound to one audience.
#[derive(Clone)]
pub struct IdToken {
	/// Audience the token was minted for.
	pub audience: Audience,
	/// Raw JWT; callers must avoid logging it.
	pub token: TokenSecret,
	/// Issued-at instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
}
impl IdToken {
	/// Wraps a JWT issued by the token endpoint, reading `iat` and `exp` from its payload.
	///
	/// The signature is not verified; the receiving service does that. A missing `iat` falls back
	/// to the current clock.
	pub fn from_jwt(audience: Audience, jwt: impl Into<String>) -> Result<Self, TokenError> {
		#[derive(Deserialize)]
		struct Claims {
			exp: i64,
			#[serde(default)]
			iat: Option<i64>,
		}

		let jwt = jwt.into();
		let mut segments = jwt.split('.');
		let (Some(_header), Some(payload), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(TokenError::malformed("expected three dot-separated segments"));
		};
		let decoded = URL_SAFE_NO_PAD
			.decode(payload.trim_end_matches('='))
			.map_err(|e| TokenError::malformed(format!("payload is not base64url: {e}")))?;
		let claims: Claims = serde_json::from_slice(&decoded)
			.map_err(|e| TokenError::malformed(format!("payload claims are invalid: {e}")))?;
		let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
			.map_err(|e| TokenError::malformed(format!("exp is out of range: {e}")))?;
		let issued_at = match claims.iat {
			Some(iat) => OffsetDateTime::from_unix_timestamp(iat)
				.map_err(|e| TokenError::malformed(format!("iat is out of range: {e}")))?,
			None => OffsetDateTime::now_utc(),
		};

		Ok(Self { audience, token: TokenSecret::new(jwt), issued_at, expires_at })
	}

	/// Returns `true` once `instant` reaches the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Lifetime left at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Returns `true` when the token expires within `window` of `instant`.
	pub fn expires_within(&self, window: Duration, instant: OffsetDateTime) -> bool {
		self.is_expired_at(instant) || self.remaining_at(instant) <= window
	}
}
impl Debug for IdToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdToken")
			.field("audience", &self.audience)
			.field("token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

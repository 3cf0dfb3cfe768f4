//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::io::Write;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use tempfile::NamedTempFile;
use time::{Duration, OffsetDateTime};

pub const FIXTURE: &str = include_str!("../fixtures/service_account.json");

/// Writes the fixture key to a temporary file with its `token_uri` replaced.
pub fn write_credentials(token_uri: &str) -> NamedTempFile {
	let mut json: serde_json::Value =
		serde_json::from_str(FIXTURE).expect("Fixture credentials should be valid JSON.");

	json["token_uri"] = token_uri.into();

	let mut file = NamedTempFile::new().expect("Temporary credentials file should be created.");

	file.write_all(json.to_string().as_bytes())
		.expect("Temporary credentials file should be writable.");

	file
}

/// Builds an unsigned JWT-shaped ID token; only its claims are ever read.
pub fn fake_id_token(
	audience: &str,
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
	let claims = serde_json::json!({
		"aud": audience,
		"iss": "https://accounts.google.com",
		"iat": issued_at.unix_timestamp(),
		"exp": expires_at.unix_timestamp(),
	});

	format!("{header}.{}.c2lnbmF0dXJl", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

/// Returns an ID token and the token endpoint body that carries it.
pub fn id_token_body(
	audience: &str,
	issued_at: OffsetDateTime,
	lifetime: Duration,
) -> (String, String) {
	let token = fake_id_token(audience, issued_at, issued_at + lifetime);
	let body = serde_json::json!({ "id_token": token }).to_string();

	(token, body)
}

//! Service-account key loading and validation.

// std
use std::env;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use jsonwebtoken::EncodingKey;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::TokenSecret, error::CredentialsError};

/// Environment variable consulted for Application Default Credentials discovery.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Token endpoint used when a key omits `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Parsed service-account key file.
///
/// Only the fields needed to mint ID tokens are required; everything else in the standard key
/// format is tolerated and ignored.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
	/// Credential type; must be `service_account`.
	#[serde(rename = "type")]
	pub key_type: String,
	/// Service account email, used as the assertion issuer and subject.
	pub client_email: String,
	/// Identifier of the private key, sent as the JWT `kid` header.
	#[serde(default)]
	pub private_key_id: String,
	/// PEM-encoded RSA private key.
	pub private_key: TokenSecret,
	/// OAuth 2.0 token endpoint the assertion is exchanged at.
	#[serde(default = "default_token_uri")]
	pub token_uri: String,
	/// Project owning the service account.
	#[serde(default)]
	pub project_id: Option<String>,
	/// Numeric client identifier.
	#[serde(default)]
	pub client_id: Option<String>,
	/// Universe domain the key belongs to.
	#[serde(default)]
	pub universe_domain: Option<String>,
}
impl ServiceAccountKey {
	/// Reads and validates a key file without blocking the runtime.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CredentialsError> {
		let path = path.as_ref();
		let bytes = tokio::fs::read(path)
			.await
			.map_err(|source| CredentialsError::Read { path: path.to_owned(), source })?;

		Self::parse(&bytes, Some(path))
	}

	/// Parses and validates a key from raw JSON bytes.
	pub fn from_slice(bytes: &[u8]) -> Result<Self, CredentialsError> {
		Self::parse(bytes, None)
	}

	/// Parses and validates a key from a JSON string.
	pub fn from_json_str(json: &str) -> Result<Self, CredentialsError> {
		Self::from_slice(json.as_bytes())
	}

	/// Returns the RSA signing key derived from the PEM private key.
	pub fn signing_key(&self) -> Result<EncodingKey, CredentialsError> {
		EncodingKey::from_rsa_pem(self.private_key.expose().as_bytes())
			.map_err(|source| CredentialsError::InvalidPrivateKey { source })
	}

	/// Returns the parsed token endpoint.
	pub fn token_url(&self) -> Result<Url, CredentialsError> {
		Url::parse(&self.token_uri).map_err(|source| CredentialsError::InvalidTokenUri { source })
	}

	/// Stable digest identifying this key without retaining key material.
	///
	/// Two keys share a fingerprint only when their email, key id, and token endpoint match.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		for part in [&self.client_email, &self.private_key_id, &self.token_uri] {
			hasher.update(part.as_bytes());
			hasher.update([0]);
		}

		STANDARD_NO_PAD.encode(hasher.finalize())
	}

	fn parse(bytes: &[u8], path: Option<&Path>) -> Result<Self, CredentialsError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let key: Self = serde_path_to_error::deserialize(&mut de).map_err(|source| {
			CredentialsError::Parse { path: path.map(Path::to_path_buf), source }
		})?;

		key.validate()?;

		Ok(key)
	}

	fn validate(&self) -> Result<(), CredentialsError> {
		if self.key_type != SERVICE_ACCOUNT_TYPE {
			return Err(CredentialsError::UnsupportedCredentialType {
				found: self.key_type.clone(),
			});
		}
		if self.client_email.trim().is_empty() {
			return Err(CredentialsError::MissingField { field: "client_email" });
		}
		if self.private_key.expose().trim().is_empty() {
			return Err(CredentialsError::MissingField { field: "private_key" });
		}

		self.token_url()?;
		self.signing_key()?;

		Ok(())
	}
}
impl Debug for ServiceAccountKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ServiceAccountKey")
			.field("client_email", &self.client_email)
			.field("private_key_id", &self.private_key_id)
			.field("private_key", &"<redacted>")
			.field("token_uri", &self.token_uri)
			.field("project_id", &self.project_id)
			.finish()
	}
}

/// Resolves the key path from `GOOGLE_APPLICATION_CREDENTIALS`, ignoring empty values.
pub fn default_credentials_path() -> Option<PathBuf> {
	env::var_os(CREDENTIALS_ENV).filter(|value| !value.is_empty()).map(PathBuf::from)
}

fn default_token_uri() -> String {
	DEFAULT_TOKEN_URI.into()
}

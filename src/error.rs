//! Invoker-level error types, one family per pipeline stage.

// self
use crate::_prelude::*;

/// Invoker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// A non-success HTTP status from the target URI is never mapped into this type; it is returned
/// as a normal response for the caller to inspect.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credentials file is missing, unreadable, or malformed.
	#[error(transparent)]
	Credentials(#[from] CredentialsError),
	/// ID token issuance failed.
	#[error(transparent)]
	Token(#[from] TokenError),
	/// Transport failure on the outbound request (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The invocation was abandoned because its cancellation token fired.
	#[error("Invocation was cancelled.")]
	Cancelled,
}
impl Error {
	/// Returns `true` when the invocation was abandoned through cancellation.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

/// Failures raised while loading a service-account key.
#[derive(Debug, ThisError)]
pub enum CredentialsError {
	/// No credentials path was supplied and none could be discovered.
	#[error("No credentials path was provided and GOOGLE_APPLICATION_CREDENTIALS is unset.")]
	MissingPath,
	/// Credentials file could not be read.
	#[error("Failed to read credentials file {}.", .path.display())]
	Read {
		/// Path that failed to load.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Credentials are not valid service-account JSON.
	#[error("{}", malformed_credentials(.path))]
	Parse {
		/// Path that failed to parse; `None` for in-memory sources.
		path: Option<PathBuf>,
		/// Structured parsing failure naming the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Credentials describe something other than a service account.
	#[error("Credentials type `{found}` is not supported; expected `service_account`.")]
	UnsupportedCredentialType {
		/// The `type` field found in the file.
		found: String,
	},
	/// A required field is present but empty.
	#[error("Credentials field `{field}` must not be empty.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// The private key could not be loaded as an RSA signing key.
	#[error("Credentials private key is not a valid RSA PEM key.")]
	InvalidPrivateKey {
		/// Underlying key parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// The token URI cannot be parsed.
	#[error("Credentials token_uri is invalid.")]
	InvalidTokenUri {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Failures raised while minting an ID token.
#[derive(Debug, ThisError)]
pub enum TokenError {
	/// The JWT assertion could not be signed.
	#[error("Failed to sign the token request assertion.")]
	Signing {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Network failure while calling the token endpoint.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint rejected the request (invalid audience, revoked key, and so on).
	#[error(
		"Token endpoint rejected the request with status {status}: {}.",
		rejection_detail(.error, .description)
	)]
	Rejected {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// OAuth `error` code, when supplied.
		error: Option<String>,
		/// OAuth `error_description`, when supplied.
		description: Option<String>,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint succeeded but did not include an `id_token`.
	#[error("Token endpoint response is missing id_token.")]
	MissingIdToken,
	/// The minter returned a token bound to a different audience than requested.
	#[error("Minted ID token is bound to `{found}`, not the requested `{expected}`.")]
	AudienceMismatch {
		/// Audience the invocation targets.
		expected: String,
		/// Audience the returned token carries.
		found: String,
	},
	/// The issued ID token is not a decodable JWT.
	#[error("Issued ID token is malformed: {reason}.")]
	MalformedIdToken {
		/// What was wrong with the token.
		reason: String,
	},
}
impl TokenError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Creates a [`TokenError::MalformedIdToken`] from a reason string.
	pub fn malformed(reason: impl Into<String>) -> Self {
		Self::MalformedIdToken { reason: reason.into() }
	}
}

fn malformed_credentials(path: &Option<PathBuf>) -> String {
	match path {
		Some(path) => format!("Credentials file {} is malformed.", path.display()),
		None => "Credentials JSON is malformed.".into(),
	}
}

fn rejection_detail<'a>(error: &'a Option<String>, description: &'a Option<String>) -> &'a str {
	description.as_deref().or(error.as_deref()).unwrap_or("no details")
}

/// Transport-level failures on the outbound request.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the target URI.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Target URI is empty or whitespace.
	#[error("Target URI must not be empty.")]
	EmptyTargetUri,
	/// Target URI cannot be parsed.
	#[error("Target URI is invalid.")]
	InvalidTargetUri {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Target URI uses a scheme other than http or https.
	#[error("Target URI scheme `{scheme}` is not supported; expected http or https.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejected_message_prefers_description() {
		let err = TokenError::Rejected {
			status: 400,
			error: Some("invalid_grant".into()),
			description: Some("Invalid JWT Signature".into()),
		};

		assert_eq!(
			err.to_string(),
			"Token endpoint rejected the request with status 400: Invalid JWT Signature."
		);

		let err = TokenError::Rejected { status: 403, error: None, description: None };

		assert_eq!(
			err.to_string(),
			"Token endpoint rejected the request with status 403: no details."
		);
	}

	#[test]
	fn cancelled_is_distinct_from_other_kinds() {
		assert!(Error::Cancelled.is_cancelled());
		assert!(!Error::from(ConfigError::EmptyTargetUri).is_cancelled());
		assert!(!Error::from(CredentialsError::MissingPath).is_cancelled());
	}
}

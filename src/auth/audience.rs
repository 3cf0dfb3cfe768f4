//! Target audience bound into every minted ID token.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::{_prelude::*, error::ConfigError};

/// Exact target URI an ID token is minted for and dispatched to.
///
/// The caller's string is preserved verbatim because the token endpoint embeds it in the `aud`
/// claim and the receiving proxy compares it byte for byte. The parsed [`Url`] is kept alongside
/// for dispatch so both views always describe the same endpoint.
#[derive(Clone)]
pub struct Audience {
	raw: String,
	url: Url,
}
impl Audience {
	/// Validates a target URI as a non-empty absolute `http`/`https` URL.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ConfigError> {
		let raw = value.as_ref();

		if raw.trim().is_empty() {
			return Err(ConfigError::EmptyTargetUri);
		}

		let url = Url::parse(raw).map_err(|source| ConfigError::InvalidTargetUri { source })?;

		match url.scheme() {
			"http" | "https" => {},
			scheme => return Err(ConfigError::UnsupportedScheme { scheme: scheme.to_owned() }),
		}

		Ok(Self { raw: raw.to_owned(), url })
	}

	/// Returns the audience exactly as supplied by the caller.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Returns the parsed URL used for dispatch.
	pub fn url(&self) -> &Url {
		&self.url
	}
}
impl Deref for Audience {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.raw
	}
}
impl AsRef<str> for Audience {
	fn as_ref(&self) -> &str {
		&self.raw
	}
}
impl Borrow<str> for Audience {
	fn borrow(&self) -> &str {
		&self.raw
	}
}
impl PartialEq for Audience {
	fn eq(&self, other: &Self) -> bool {
		self.raw == other.raw
	}
}
impl Eq for Audience {}
impl std::hash::Hash for Audience {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.raw.hash(state);
	}
}
impl Debug for Audience {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Audience({})", self.raw)
	}
}
impl Display for Audience {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.raw)
	}
}
impl FromStr for Audience {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn audience_keeps_caller_string_verbatim() {
		let audience = Audience::new("https://hello-abc123-uc.a.run.app")
			.expect("Cloud Run audience fixture should be valid.");

		assert_eq!(audience.as_str(), "https://hello-abc123-uc.a.run.app");
		assert_eq!(audience.url().as_str(), "https://hello-abc123-uc.a.run.app/");
	}

	#[test]
	fn audience_rejects_empty_relative_and_foreign_schemes() {
		assert!(matches!(Audience::new(""), Err(ConfigError::EmptyTargetUri)));
		assert!(matches!(Audience::new("   "), Err(ConfigError::EmptyTargetUri)));
		assert!(matches!(
			Audience::new("/relative/path"),
			Err(ConfigError::InvalidTargetUri { .. })
		));
		assert!(matches!(
			Audience::new("ftp://example.com/file"),
			Err(ConfigError::UnsupportedScheme { scheme }) if scheme == "ftp"
		));
	}

	#[test]
	fn equality_follows_the_raw_string() {
		let bare = Audience::new("https://example.com").expect("Bare audience should be valid.");
		let slashed =
			Audience::new("https://example.com/").expect("Slashed audience should be valid.");

		assert_eq!(bare.url(), slashed.url());
		assert_ne!(bare, slashed);
	}
}

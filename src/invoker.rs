//! Request invoker: credentials → ID token → bearer-authenticated GET.

mod config;

pub use config::*;

// self
use crate::{
	_prelude::*,
	auth::{self, Audience, IdToken, ServiceAccountKey},
	cancel,
	error::{ConfigError, CredentialsError, TokenError, TransportError},
	obs::{self, Stage},
	oidc::{CachingMinter, IdTokenMinter, ServiceAccountMinter},
};

/// Calls `target_uri` with a freshly minted ID token for the service account in
/// `credentials_path`.
///
/// A new [`Invoker`] is built per call, so no token is reused across calls. Keep an [`Invoker`]
/// around to benefit from its token cache.
pub async fn invoke(
	credentials_path: impl AsRef<Path>,
	target_uri: &str,
	cancellation: Option<&CancellationToken>,
) -> Result<ReqwestResponse> {
	Invoker::default().invoke(credentials_path, target_uri, cancellation).await
}

/// Same as [`invoke`], with the key path read from `GOOGLE_APPLICATION_CREDENTIALS`.
pub async fn invoke_with_default_credentials(
	target_uri: &str,
	cancellation: Option<&CancellationToken>,
) -> Result<ReqwestResponse> {
	Invoker::default().invoke_default(target_uri, cancellation).await
}

/// Long-lived invoker that owns a token minter and the HTTP configuration.
///
/// Invokers built with [`Invoker::new`] cache one ID token per key + audience and refresh it once
/// less than [`InvokerConfig::preemptive_window`] of its lifetime remains. The HTTP client used
/// for the target request is created per call and dropped before the call returns.
#[derive(Clone)]
pub struct Invoker {
	config: InvokerConfig,
	minter: Arc<dyn IdTokenMinter>,
}
impl Invoker {
	/// Creates an invoker backed by a caching service-account minter.
	pub fn new(config: InvokerConfig) -> Self {
		let mut minter = ServiceAccountMinter::new(config.http.clone());

		if let Some(endpoint) = &config.token_endpoint {
			minter = minter.with_token_endpoint(endpoint.clone());
		}

		let minter = CachingMinter::new(minter).with_preemptive_window(config.preemptive_window);

		Self::with_minter(config, Arc::new(minter))
	}

	/// Creates an invoker that obtains tokens from a caller-supplied minter.
	pub fn with_minter(config: InvokerConfig, minter: Arc<dyn IdTokenMinter>) -> Self {
		Self { config, minter }
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &InvokerConfig {
		&self.config
	}

	/// Loads the key at `credentials_path` and calls `target_uri` with an ID token bound to it.
	///
	/// A non-2xx status from the target is returned as a normal response.
	pub async fn invoke(
		&self,
		credentials_path: impl AsRef<Path>,
		target_uri: &str,
		cancellation: Option<&CancellationToken>,
	) -> Result<ReqwestResponse> {
		cancel::ensure_not_cancelled(cancellation)?;

		let audience = Audience::new(target_uri)?;
		let key = run_stage(
			Stage::LoadCredentials,
			cancellation,
			ServiceAccountKey::from_file(credentials_path.as_ref()),
		)
		.await?;

		self.authorize_and_dispatch(&key, &audience, cancellation).await
	}

	/// Calls `target_uri` using an already loaded key.
	pub async fn invoke_with_key(
		&self,
		key: &ServiceAccountKey,
		target_uri: &str,
		cancellation: Option<&CancellationToken>,
	) -> Result<ReqwestResponse> {
		cancel::ensure_not_cancelled(cancellation)?;

		let audience = Audience::new(target_uri)?;

		self.authorize_and_dispatch(key, &audience, cancellation).await
	}

	/// Calls `target_uri` with the key named by `GOOGLE_APPLICATION_CREDENTIALS`.
	pub async fn invoke_default(
		&self,
		target_uri: &str,
		cancellation: Option<&CancellationToken>,
	) -> Result<ReqwestResponse> {
		cancel::ensure_not_cancelled(cancellation)?;

		let path = auth::default_credentials_path().ok_or(CredentialsError::MissingPath)?;

		self.invoke(path, target_uri, cancellation).await
	}

	async fn authorize_and_dispatch(
		&self,
		key: &ServiceAccountKey,
		audience: &Audience,
		cancellation: Option<&CancellationToken>,
	) -> Result<ReqwestResponse> {
		let token =
			run_stage(Stage::MintToken, cancellation, self.minter.mint(key, audience)).await?;

		if token.audience != *audience {
			return Err(TokenError::AudienceMismatch {
				expected: audience.to_string(),
				found: token.audience.to_string(),
			}
			.into());
		}

		run_stage(Stage::Dispatch, cancellation, self.dispatch(audience, &token)).await
	}

	async fn dispatch(&self, audience: &Audience, token: &IdToken) -> Result<ReqwestResponse> {
		let client = self.config.http.build()?;

		client
			.get(audience.url().clone())
			.bearer_auth(token.token.expose())
			.send()
			.await
			.map_err(map_reqwest_error)
	}
}
impl Default for Invoker {
	fn default() -> Self {
		Self::new(InvokerConfig::default())
	}
}
impl Debug for Invoker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Invoker").field("config", &self.config).finish_non_exhaustive()
	}
}

async fn run_stage<T, E, F>(
	stage: Stage,
	cancellation: Option<&CancellationToken>,
	fut: F,
) -> Result<T>
where
	F: Future<Output = Result<T, E>>,
	Error: From<E>,
{
	obs::observe(stage, async move {
		let output = cancel::run_until_cancelled(cancellation, fut).await??;

		Ok::<_, Error>(output)
	})
	.await
}

fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::fake_id_token, oidc::MintFuture};

	const FIXTURE: &str = include_str!("../tests/fixtures/service_account.json");

	/// Minter whose failure is distinguishable from every validation error.
	struct UnreachableMinter;
	impl IdTokenMinter for UnreachableMinter {
		fn mint<'a>(
			&'a self,
			_key: &'a ServiceAccountKey,
			_audience: &'a Audience,
		) -> MintFuture<'a> {
			Box::pin(async { Err::<IdToken, Error>(TokenError::MissingIdToken.into()) })
		}
	}

	/// Minter returning a long-lived placeholder token.
	struct StaticMinter;
	impl IdTokenMinter for StaticMinter {
		fn mint<'a>(
			&'a self,
			_key: &'a ServiceAccountKey,
			audience: &'a Audience,
		) -> MintFuture<'a> {
			Box::pin(async move {
				let now = OffsetDateTime::now_utc();
				let token = IdToken::from_jwt(
					audience.clone(),
					fake_id_token(audience.as_str(), now, now + Duration::hours(1)),
				)?;

				Ok::<_, Error>(token)
			})
		}
	}

	/// Minter that ignores the requested audience.
	struct MisboundMinter;
	impl IdTokenMinter for MisboundMinter {
		fn mint<'a>(
			&'a self,
			_key: &'a ServiceAccountKey,
			_audience: &'a Audience,
		) -> MintFuture<'a> {
			Box::pin(async move {
				let now = OffsetDateTime::now_utc();
				let elsewhere = Audience::new("https://elsewhere.example.com")?;
				let token = IdToken::from_jwt(
					elsewhere.clone(),
					fake_id_token(elsewhere.as_str(), now, now + Duration::hours(1)),
				)?;

				Ok::<_, Error>(token)
			})
		}
	}

	fn key() -> ServiceAccountKey {
		ServiceAccountKey::from_json_str(FIXTURE).expect("Fixture key should parse.")
	}

	#[tokio::test]
	async fn invalid_targets_fail_before_minting() {
		let invoker = Invoker::with_minter(InvokerConfig::default(), Arc::new(UnreachableMinter));
		let key = key();

		for target in ["", "   ", "not a uri", "ftp://files.example.com/a"] {
			let err = invoker
				.invoke_with_key(&key, target, None)
				.await
				.expect_err("Invalid target should be rejected.");

			assert!(matches!(err, Error::Config(_)), "Unexpected error for {target:?}: {err:?}.");
		}
	}

	#[tokio::test]
	async fn pre_cancelled_invocations_do_no_work() {
		let invoker = Invoker::with_minter(InvokerConfig::default(), Arc::new(UnreachableMinter));
		let token = CancellationToken::new();

		token.cancel();

		let err = invoker
			.invoke("/definitely/not/here.json", "not a uri", Some(&token))
			.await
			.expect_err("Cancelled invocation should fail.");

		assert!(err.is_cancelled());
	}

	#[tokio::test]
	async fn dispatch_failures_surface_as_transport_errors() {
		let invoker = Invoker::with_minter(
			InvokerConfig::default().with_http(
				crate::http::HttpClientConfig::default()
					.with_connect_timeout(Some(std::time::Duration::from_millis(500))),
			),
			Arc::new(StaticMinter),
		);
		let err = invoker
			.invoke_with_key(&key(), "http://127.0.0.1:9/unreachable", None)
			.await
			.expect_err("Closed port should fail.");

		assert!(matches!(err, Error::Transport(_)), "Unexpected error: {err:?}.");
	}

	#[tokio::test]
	async fn tokens_for_other_audiences_are_never_sent() {
		let invoker = Invoker::with_minter(InvokerConfig::default(), Arc::new(MisboundMinter));
		let err = invoker
			.invoke_with_key(&key(), "http://127.0.0.1:9/target", None)
			.await
			.expect_err("Misbound token should be rejected.");

		match err {
			Error::Token(TokenError::AudienceMismatch { expected, found }) => {
				assert_eq!(expected, "http://127.0.0.1:9/target");
				assert_eq!(found, "https://elsewhere.example.com");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
